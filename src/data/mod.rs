/// Numeric value traits
pub mod number;
/// Observation types emitted by HMM states
pub mod observation;

pub use number::RealNumber;
pub use observation::{ObservationInteger, ObservationReal, ObservationVector};
