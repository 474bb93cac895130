/// Observation sequence generator
pub mod generator;
/// HMM parameter container
pub mod model;

pub use generator::MarkovGenerator;
pub use model::Hmm;
