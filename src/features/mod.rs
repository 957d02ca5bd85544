pub mod extractor;
pub mod set;

pub use extractor::{
    dark_pool_imbalance, event_proximity, options_aggregates, FeatureExtractor, FlowAggregates,
};
pub use set::{Feature, FeatureSet};
