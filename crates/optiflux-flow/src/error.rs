use optiflux_image::ImageError;

/// Errors that can occur during flow estimation.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FlowError {
    /// The configured frame dimensions are degenerate.
    #[error("frame dimensions must be > 0, got {0}x{1}")]
    InvalidFrameSize(usize, usize),

    /// The configured grid stride is degenerate.
    #[error("cell size must be > 0, got {0}")]
    InvalidCellSize(usize),

    /// The configured window radius is degenerate.
    #[error("window size must be > 0, got {0}")]
    InvalidWindowSize(usize),

    /// A frame view does not cover the configured frame geometry.
    #[error("frame view ({0}x{1}) is smaller than the configured frame ({2}x{3})")]
    FrameViewTooSmall(usize, usize, usize, usize),

    /// The two gradient maps do not have the same geometry.
    #[error("gradient maps ({0}x{1}) and ({2}x{3}) do not match")]
    GradientSizeMismatch(usize, usize, usize, usize),

    /// Error coming from the image container crate.
    #[error(transparent)]
    Image(#[from] ImageError),
}
