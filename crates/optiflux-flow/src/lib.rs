#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the flow module.
pub mod error;

/// spatial image gradient module.
pub mod gradient;

/// block-sampled Lucas-Kanade solver module.
pub mod solver;

/// consecutive-frame processing module.
pub mod stream;

pub use crate::error::FlowError;
pub use crate::solver::{FlowField, FlowParams, FlowSolver, FlowVector};
pub use crate::stream::FlowStream;
