use optiflux_image::{Image, ImageSize, PlaneView};

use crate::error::FlowError;
use crate::gradient::spatial_gradient;

/// Determinant magnitude below which the structure tensor is treated as
/// singular and the divisor is clamped, preserving its sign.
const MIN_DETERMINANT: f32 = 1e-6;

/// Geometry configuration for block-sampled flow estimation.
///
/// The configuration is a plain caller-owned value; it is bound to a
/// [`FlowSolver`] at construction, so independent solver instances with
/// different geometries can coexist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowParams {
    /// Logical width of the frame grid in pixels.
    pub frame_width: usize,
    /// Logical height of the frame grid in pixels.
    pub frame_height: usize,
    /// Grid stride between sampled window centers in pixels.
    pub cell_size: usize,
    /// Half-width of the square accumulation window in pixels.
    pub window_size: usize,
}

impl FlowParams {
    /// Create a new configuration value.
    pub fn new(
        frame_width: usize,
        frame_height: usize,
        cell_size: usize,
        window_size: usize,
    ) -> Self {
        Self {
            frame_width,
            frame_height,
            cell_size,
            window_size,
        }
    }

    /// Check the configuration for degenerate values.
    ///
    /// A geometry that merely yields no grid centers (window covering the
    /// whole frame) is not an error; it produces an empty flow field.
    ///
    /// # Errors
    ///
    /// If any of the four parameters is zero, an error is returned.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(FlowError::InvalidFrameSize(
                self.frame_width,
                self.frame_height,
            ));
        }
        if self.cell_size == 0 {
            return Err(FlowError::InvalidCellSize(self.cell_size));
        }
        if self.window_size == 0 {
            return Err(FlowError::InvalidWindowSize(self.window_size));
        }
        Ok(())
    }

    /// Get the configured frame geometry as an [`ImageSize`].
    pub fn frame_size(&self) -> ImageSize {
        ImageSize {
            width: self.frame_width,
            height: self.frame_height,
        }
    }

    /// Number of sampled window centers along one axis.
    fn axis_count(&self, dim: usize) -> usize {
        dim.saturating_sub(2 * self.window_size)
            .div_ceil(self.cell_size)
    }

    /// Number of flow vectors the configured grid produces.
    pub fn grid_len(&self) -> usize {
        self.axis_count(self.frame_width) * self.axis_count(self.frame_height)
    }
}

/// A single estimated displacement at a sampled window center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowVector {
    /// The x-coordinate of the window center in pixels.
    pub x: f32,
    /// The y-coordinate of the window center in pixels.
    pub y: f32,
    /// The estimated horizontal displacement in pixels.
    pub u: f32,
    /// The estimated vertical displacement in pixels.
    pub v: f32,
    /// The Euclidean norm of (u, v).
    pub magnitude: f32,
}

/// An ordered sequence of flow vectors, one per sampled grid center.
///
/// Vectors are enumerated row-major over the sampling grid: y ascending
/// outer, x ascending inner.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowField {
    vectors: Vec<FlowVector>,
}

impl FlowField {
    /// Number of floats per vector in the flattened representation.
    pub const FLOATS_PER_VECTOR: usize = 5;

    /// Number of vectors in the field.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the field holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Get the vectors as a slice, in grid order.
    pub fn as_slice(&self) -> &[FlowVector] {
        &self.vectors
    }

    /// Iterate over the vectors in grid order.
    pub fn iter(&self) -> std::slice::Iter<'_, FlowVector> {
        self.vectors.iter()
    }

    /// Flatten the field into the wire layout consumed by host bindings:
    /// five floats per vector, in the fixed field order x, y, u, v,
    /// magnitude, concatenated in grid order.
    pub fn flatten(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vectors.len() * Self::FLOATS_PER_VECTOR);
        for f in &self.vectors {
            out.extend_from_slice(&[f.x, f.y, f.u, f.v, f.magnitude]);
        }
        out
    }
}

impl std::ops::Index<usize> for FlowField {
    type Output = FlowVector;

    fn index(&self, index: usize) -> &Self::Output {
        &self.vectors[index]
    }
}

impl<'a> IntoIterator for &'a FlowField {
    type Item = &'a FlowVector;
    type IntoIter = std::slice::Iter<'a, FlowVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.iter()
    }
}

/// Block-sampled Lucas-Kanade flow estimator.
///
/// For each sampled window center the solver accumulates the structure
/// tensor of the current frame's gradients together with the temporal
/// intensity difference over a square window, and solves the 2x2 system for
/// a displacement vector.
///
/// # Examples
///
/// ```
/// use optiflux_flow::{FlowParams, FlowSolver};
/// use optiflux_image::{ImageSize, PlaneView};
///
/// let size = ImageSize { width: 16, height: 16 };
/// let frame = vec![128u8; 16 * 16];
///
/// let solver = FlowSolver::new(FlowParams::new(16, 16, 8, 4)).unwrap();
/// let previous = PlaneView::new(&frame, size, 16).unwrap();
/// let current = PlaneView::new(&frame, size, 16).unwrap();
///
/// let field = solver.compute(&previous, &current).unwrap();
/// assert_eq!(field.len(), 1);
/// assert_eq!(field[0].magnitude, 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct FlowSolver {
    params: FlowParams,
}

impl FlowSolver {
    /// Create a solver bound to the given configuration.
    ///
    /// # Errors
    ///
    /// If the configuration holds degenerate values, an error is returned.
    pub fn new(params: FlowParams) -> Result<Self, FlowError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Get the bound configuration.
    pub fn params(&self) -> &FlowParams {
        &self.params
    }

    pub(crate) fn check_view(&self, view: &PlaneView<'_>) -> Result<(), FlowError> {
        if view.width() < self.params.frame_width || view.height() < self.params.frame_height {
            return Err(FlowError::FrameViewTooSmall(
                view.width(),
                view.height(),
                self.params.frame_width,
                self.params.frame_height,
            ));
        }
        Ok(())
    }

    /// Estimate the flow field between two consecutive frames.
    ///
    /// Gradients are computed from the current frame only; both frames are
    /// read through their own row strides. Views larger than the configured
    /// frame are accepted, the configured geometry selects their top-left
    /// region. The solver retains no reference to either buffer past this
    /// call.
    ///
    /// A configuration whose window leaves no room for grid centers yields
    /// an empty field, which is a valid outcome rather than an error.
    ///
    /// # Errors
    ///
    /// If either view is smaller than the configured frame, an error is
    /// returned.
    pub fn compute(
        &self,
        previous: &PlaneView<'_>,
        current: &PlaneView<'_>,
    ) -> Result<FlowField, FlowError> {
        self.check_view(previous)?;
        self.check_view(current)?;

        let mut dx = Image::from_size_val(self.params.frame_size(), 0.0f32)?;
        let mut dy = Image::from_size_val(self.params.frame_size(), 0.0f32)?;
        spatial_gradient(current, &mut dx, &mut dy)?;

        let w = self.params.frame_width;
        let h = self.params.frame_height;
        let r = self.params.window_size;
        let ix = dx.as_slice();
        let iy = dy.as_slice();
        let prev_data = previous.as_slice();
        let cur_data = current.as_slice();
        let prev_stride = previous.stride();
        let cur_stride = current.stride();

        let mut vectors = Vec::with_capacity(self.params.grid_len());
        for y in (r..h.saturating_sub(r)).step_by(self.params.cell_size) {
            for x in (r..w.saturating_sub(r)).step_by(self.params.cell_size) {
                let mut a11 = 0.0f32;
                let mut a12 = 0.0f32;
                let mut a22 = 0.0f32;
                let mut b1 = 0.0f32;
                let mut b2 = 0.0f32;

                for yy in (y - r)..=(y + r) {
                    let grad_row = yy * w;
                    let prev_row = yy * prev_stride;
                    let cur_row = yy * cur_stride;
                    for xx in (x - r)..=(x + r) {
                        let gx = ix[grad_row + xx];
                        let gy = iy[grad_row + xx];
                        let it = cur_data[cur_row + xx] as f32 - prev_data[prev_row + xx] as f32;
                        a11 += gx * gx;
                        a12 += gx * gy;
                        a22 += gy * gy;
                        b1 += gx * it;
                        b2 += gy * it;
                    }
                }

                let det = clamp_determinant(a11, a12, a22);
                let u = -(a22 * b1 - a12 * b2) / det;
                let v = -(-a12 * b1 + a11 * b2) / det;

                vectors.push(FlowVector {
                    x: x as f32,
                    y: y as f32,
                    u,
                    v,
                    magnitude: (u * u + v * v).sqrt(),
                });
            }
        }

        Ok(FlowField { vectors })
    }
}

/// Determinant of the accumulated structure tensor, clamped away from zero
/// so near-singular (textureless) windows do not blow up the solve.
fn clamp_determinant(a11: f32, a12: f32, a22: f32) -> f32 {
    let det = a11 * a22 - a12 * a12;
    if det.abs() < MIN_DETERMINANT {
        if det < 0.0 {
            -MIN_DETERMINANT
        } else {
            MIN_DETERMINANT
        }
    } else {
        det
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(data: &[u8], width: usize, height: usize) -> PlaneView<'_> {
        PlaneView::new(
            data,
            ImageSize { width, height },
            width,
        )
        .unwrap()
    }

    #[test]
    fn test_params_validation() {
        assert!(FlowParams::new(64, 64, 8, 4).validate().is_ok());
        assert_eq!(
            FlowParams::new(0, 64, 8, 4).validate(),
            Err(FlowError::InvalidFrameSize(0, 64))
        );
        assert_eq!(
            FlowParams::new(64, 64, 0, 4).validate(),
            Err(FlowError::InvalidCellSize(0))
        );
        assert_eq!(
            FlowParams::new(64, 64, 8, 0).validate(),
            Err(FlowError::InvalidWindowSize(0))
        );
    }

    #[test]
    fn test_grid_len() {
        assert_eq!(FlowParams::new(64, 64, 8, 4).grid_len(), 49);
        assert_eq!(FlowParams::new(64, 32, 8, 4).grid_len(), 7 * 3);
        // window covering the frame leaves no centers
        assert_eq!(FlowParams::new(16, 16, 4, 8).grid_len(), 0);
        assert_eq!(FlowParams::new(16, 16, 4, 100).grid_len(), 0);
    }

    #[test]
    fn test_clamp_determinant() {
        // well conditioned tensors pass through
        assert_eq!(clamp_determinant(2.0, 0.0, 3.0), 6.0);
        // near-singular tensors clamp to the sign-preserving floor
        assert_eq!(clamp_determinant(0.0, 0.0, 0.0), MIN_DETERMINANT);
        assert_eq!(clamp_determinant(1.0, 1.0, 1.0), MIN_DETERMINANT);
        assert_eq!(clamp_determinant(1e-4, 1.1e-4, 1e-4), -MIN_DETERMINANT);
        assert_eq!(clamp_determinant(1.0, 2.0, 1.0), -3.0);
    }

    #[test]
    fn test_grid_order_row_major() -> Result<(), FlowError> {
        let frame = vec![100u8; 24 * 20];
        let solver = FlowSolver::new(FlowParams::new(24, 20, 8, 4))?;
        let field = solver.compute(&view(&frame, 24, 20), &view(&frame, 24, 20))?;

        // centers: x in {4, 12}, y in {4, 12}, y outer
        let centers: Vec<(f32, f32)> = field.iter().map(|f| (f.x, f.y)).collect();
        assert_eq!(
            centers,
            vec![(4.0, 4.0), (12.0, 4.0), (4.0, 12.0), (12.0, 12.0)]
        );
        assert_eq!(field.len(), solver.params().grid_len());
        assert_eq!((field[1].x, field[1].y), (12.0, 4.0));
        assert_eq!((field[3].x, field[3].y), (12.0, 12.0));

        Ok(())
    }

    #[test]
    fn test_identical_frames_yield_zero() -> Result<(), FlowError> {
        // a textured frame compared against itself has It == 0 everywhere
        let data: Vec<u8> = (0..32 * 32).map(|i| (i * 31 % 253) as u8).collect();
        let solver = FlowSolver::new(FlowParams::new(32, 32, 8, 4))?;
        let field = solver.compute(&view(&data, 32, 32), &view(&data, 32, 32))?;

        assert!(!field.is_empty());
        for f in &field {
            assert_eq!((f.u, f.v, f.magnitude), (0.0, 0.0, 0.0));
        }

        Ok(())
    }

    #[test]
    fn test_empty_grid_is_ok() -> Result<(), FlowError> {
        let frame = vec![0u8; 16 * 16];
        let solver = FlowSolver::new(FlowParams::new(16, 16, 4, 8))?;
        let field = solver.compute(&view(&frame, 16, 16), &view(&frame, 16, 16))?;
        assert!(field.is_empty());

        Ok(())
    }

    #[test]
    fn test_view_too_small() -> Result<(), FlowError> {
        let frame = vec![0u8; 16 * 16];
        let small = vec![0u8; 8 * 8];
        let solver = FlowSolver::new(FlowParams::new(16, 16, 4, 2))?;

        let res = solver.compute(&view(&small, 8, 8), &view(&frame, 16, 16));
        assert_eq!(res, Err(FlowError::FrameViewTooSmall(8, 8, 16, 16)));

        Ok(())
    }

    #[test]
    fn test_larger_view_uses_top_left_region() -> Result<(), FlowError> {
        // estimating on a 16x16 grid inside a 24x24 frame must match the
        // same pixels seen through a cropped view with the same stride
        let data: Vec<u8> = (0..24 * 24).map(|i| (i * 17 % 249) as u8).collect();
        let shifted: Vec<u8> = (0..24 * 24).map(|i| (i * 29 % 247) as u8).collect();

        let solver = FlowSolver::new(FlowParams::new(16, 16, 4, 2))?;
        let full = solver.compute(
            &view(&shifted, 24, 24),
            &view(&data, 24, 24),
        )?;

        let size = ImageSize {
            width: 16,
            height: 16,
        };
        let cropped = solver.compute(
            &PlaneView::new(&shifted, size, 24)?,
            &PlaneView::new(&data, size, 24)?,
        )?;

        assert_eq!(full, cropped);

        Ok(())
    }

    #[test]
    fn test_flatten_layout() -> Result<(), FlowError> {
        let frame = vec![50u8; 24 * 24];
        let solver = FlowSolver::new(FlowParams::new(24, 24, 8, 4))?;
        let field = solver.compute(&view(&frame, 24, 24), &view(&frame, 24, 24))?;

        let flat = field.flatten();
        assert_eq!(flat.len(), field.len() * FlowField::FLOATS_PER_VECTOR);
        for (i, f) in field.iter().enumerate() {
            assert_eq!(
                &flat[i * 5..i * 5 + 5],
                &[f.x, f.y, f.u, f.v, f.magnitude]
            );
        }

        Ok(())
    }
}
