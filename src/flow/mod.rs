pub mod kernel;

pub use kernel::{
    expected_vol_shift, recency_weight, CalibrationOutcome, FlowImpactKernel, FlowParams,
    FlowSample, SkipReason, BILLION, MILLION,
};
