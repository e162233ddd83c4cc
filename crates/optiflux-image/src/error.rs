/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    /// Error when the data length does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidDataLength(usize, usize),

    /// Error when the row stride is smaller than the logical width.
    #[error("Row stride ({0}) is smaller than the image width ({1})")]
    InvalidStride(usize, usize),

    /// Error when the pixel stride is zero.
    #[error("Pixel stride must be greater than zero")]
    InvalidPixelStride,

    /// Error when a buffer cannot hold the described plane layout.
    #[error("Buffer length ({0}) is too small for the plane layout ({1})")]
    BufferTooSmall(usize, usize),
}
