use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the logical size of an image plane in pixels.
///
/// # Examples
///
/// ```
/// use optiflux_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Get the number of pixels covered by this size.
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// Owned, tightly packed, single-channel image plane.
///
/// The pixel data is stored row-major with no row padding; use [`PlaneView`]
/// to read frames that still carry a sensor/row pitch.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T> Image<T> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image, row-major, tightly packed.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use optiflux_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8>::new(
    ///    ImageSize {
    ///       width: 10,
    ///       height: 20,
    ///    },
    ///    vec![0u8; 10 * 20],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        if data.len() != size.num_pixels() {
            return Err(ImageError::InvalidDataLength(data.len(), size.num_pixels()));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size filled with a default value.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Image::new(size, vec![val; size.num_pixels()])
    }

    /// Create a new image with the given size from a slice of pixel data.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    pub fn from_size_slice(size: ImageSize, data: &[T]) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Image::new(size, data.to_vec())
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the pixel data as a flat slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the pixel data as a mutable flat slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Get the pixel value at the given coordinates, or `None` when out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.data.get(y * self.size.width + x)
    }
}

impl Image<u8> {
    /// Borrow the image as a [`PlaneView`] with a tight stride.
    pub fn as_view(&self) -> PlaneView<'_> {
        PlaneView {
            data: &self.data,
            size: self.size,
            stride: self.size.width,
        }
    }

    /// Repack a strided camera plane into a tightly packed image.
    ///
    /// Camera pipelines deliver luma planes with a row stride (row pitch) and,
    /// for some formats, a pixel stride between horizontally adjacent samples.
    /// Both are expressed in bytes of the source buffer.
    ///
    /// # Arguments
    ///
    /// * `data` - The raw plane buffer.
    /// * `size` - The logical size of the plane in pixels.
    /// * `row_stride` - Distance between the starts of consecutive rows.
    /// * `pixel_stride` - Distance between horizontally adjacent samples.
    ///
    /// # Errors
    ///
    /// If the strides are degenerate or the buffer is too small for the
    /// described layout, an error is returned.
    pub fn from_packed_plane(
        data: &[u8],
        size: ImageSize,
        row_stride: usize,
        pixel_stride: usize,
    ) -> Result<Self, ImageError> {
        if pixel_stride == 0 {
            return Err(ImageError::InvalidPixelStride);
        }

        let row_span = if size.width == 0 {
            0
        } else {
            (size.width - 1) * pixel_stride + 1
        };
        if row_stride < row_span {
            return Err(ImageError::InvalidStride(row_stride, row_span));
        }

        let required = if size.height == 0 {
            0
        } else {
            (size.height - 1) * row_stride + row_span
        };
        if data.len() < required {
            return Err(ImageError::BufferTooSmall(data.len(), required));
        }

        if pixel_stride == 1 && row_stride == size.width {
            return Image::from_size_slice(size, &data[..size.num_pixels()]);
        }

        let mut pixels = Vec::with_capacity(size.num_pixels());
        for y in 0..size.height {
            let row = y * row_stride;
            for x in 0..size.width {
                pixels.push(data[row + x * pixel_stride]);
            }
        }

        Ok(Self { size, data: pixels })
    }
}

/// Borrowed, read-only view over a raw 8-bit grayscale plane.
///
/// The view carries the logical geometry together with the buffer's row
/// stride, so padded source buffers can be consumed without copying. The
/// stride may exceed the logical width; two views over different buffers may
/// have independent strides.
///
/// # Examples
///
/// ```
/// use optiflux_image::{ImageSize, PlaneView};
///
/// // a 4x2 frame stored with a row pitch of 6 pixels
/// let data = [
///     1, 2, 3, 4, 0, 0,
///     5, 6, 7, 8, 0, 0,
/// ];
/// let view = PlaneView::new(&data, ImageSize { width: 4, height: 2 }, 6).unwrap();
///
/// assert_eq!(view.get(3, 1), Some(8));
/// assert_eq!(view.row(0), Some(&[1, 2, 3, 4][..]));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct PlaneView<'a> {
    data: &'a [u8],
    size: ImageSize,
    stride: usize,
}

impl<'a> PlaneView<'a> {
    /// Create a new view over a raw plane buffer.
    ///
    /// # Arguments
    ///
    /// * `data` - The raw plane buffer.
    /// * `size` - The logical size of the plane in pixels.
    /// * `stride` - The row pitch of the buffer in pixels; must be at least
    ///   the logical width.
    ///
    /// # Errors
    ///
    /// If the stride is smaller than the width, or the buffer cannot hold
    /// `stride * (height - 1) + width` pixels (a tight final row is legal),
    /// an error is returned.
    pub fn new(data: &'a [u8], size: ImageSize, stride: usize) -> Result<Self, ImageError> {
        if stride < size.width {
            return Err(ImageError::InvalidStride(stride, size.width));
        }

        let required = if size.height == 0 || size.width == 0 {
            0
        } else {
            stride * (size.height - 1) + size.width
        };
        if data.len() < required {
            return Err(ImageError::BufferTooSmall(data.len(), required));
        }

        Ok(Self { data, size, stride })
    }

    /// Get the logical size of the plane in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the logical width of the plane in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the logical height of the plane in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the row pitch of the underlying buffer in pixels.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Get the underlying buffer, including any row padding.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Get the pixel value at the given coordinates, or `None` when out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.data.get(y * self.stride + x).copied()
    }

    /// Get one logical row (without padding), or `None` when out of bounds.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.size.height {
            return None;
        }
        let start = y * self.stride;
        Some(&self.data[start..start + self.size.width])
    }

    /// Copy the viewed plane into a tightly packed [`Image`].
    pub fn to_image(&self) -> Image<u8> {
        let mut data = Vec::with_capacity(self.size.num_pixels());
        for y in 0..self.size.height {
            let start = y * self.stride;
            data.extend_from_slice(&self.data[start..start + self.size.width]);
        }

        Image {
            size: self.size,
            data,
        }
    }
}
