pub mod classifier;

pub use classifier::{EmissionParams, RegimeClassifier};
