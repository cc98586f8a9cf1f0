//! Data preprocessing module
//!
//! Feature scaling fitted on the training split and reused, unchanged, for
//! the test split and for single-record prediction.

mod scaler;

pub use scaler::{Scaler, ScalerParams, ScalerType};
