use std::time::Instant;

use optiflux_image::{Image, PlaneView};

use crate::error::FlowError;
use crate::solver::{FlowField, FlowParams, FlowSolver};

/// Drives a [`FlowSolver`] over a sequence of consecutive frames.
///
/// The stream retains a tight copy of the last frame it was fed; each new
/// frame is estimated against that copy. The first frame has nothing to
/// compare against and yields an empty field.
pub struct FlowStream {
    solver: FlowSolver,
    previous: Option<Image<u8>>,
}

impl FlowStream {
    /// Create a stream bound to the given configuration.
    ///
    /// # Errors
    ///
    /// If the configuration holds degenerate values, an error is returned.
    pub fn new(params: FlowParams) -> Result<Self, FlowError> {
        Ok(Self {
            solver: FlowSolver::new(params)?,
            previous: None,
        })
    }

    /// Get the bound configuration.
    pub fn params(&self) -> &FlowParams {
        self.solver.params()
    }

    /// Feed the next frame and estimate flow against the retained one.
    ///
    /// # Errors
    ///
    /// If the frame view is smaller than the configured frame, an error is
    /// returned and the retained frame is left unchanged.
    pub fn process(&mut self, frame: &PlaneView<'_>) -> Result<FlowField, FlowError> {
        self.solver.check_view(frame)?;

        let field = match &self.previous {
            Some(prev) => {
                let start = Instant::now();
                let field = self.solver.compute(&prev.as_view(), frame)?;
                log::debug!(
                    "computed {} flow vectors in {:?}",
                    field.len(),
                    start.elapsed()
                );
                field
            }
            None => FlowField::default(),
        };

        self.previous = Some(frame.to_image());
        Ok(field)
    }

    /// Drop the retained frame; the next call to [`FlowStream::process`]
    /// starts a fresh sequence.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
