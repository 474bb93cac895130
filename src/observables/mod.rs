/// The emission contract consumed by the HMM
pub mod opdf;
/// Univariate Gaussian emissions
pub mod opdf_gaussian;
/// Discrete emissions over `0..n`
pub mod opdf_integer;
/// Multivariate Gaussian emissions
pub mod opdf_multi_gaussian;

pub use opdf::Opdf;
pub use opdf_gaussian::OpdfGaussian;
pub use opdf_integer::OpdfInteger;
pub use opdf_multi_gaussian::OpdfMultiGaussian;
