use optiflux_image::{Image, PlaneView};
use rayon::prelude::*;

use crate::error::FlowError;

/// Compute the first order image derivative in both x and y using a 3x3 Sobel operator.
///
/// The kernels are normalized by 1/8 so a unit intensity ramp yields a unit
/// gradient. Input pixels are addressed through the view's row stride, while
/// the output maps are indexed by their own logical geometry, which selects
/// the top-left region of a larger source view.
///
/// The outermost one-pixel border of both maps is left at zero: the kernel
/// requires a full 3x3 neighborhood.
///
/// # Arguments
///
/// * `src` - The source grayscale plane.
/// * `dx` - The destination map for the horizontal derivative.
/// * `dy` - The destination map for the vertical derivative.
///
/// # Errors
///
/// If the two maps differ in size, or the source view does not cover the map
/// geometry, an error is returned.
pub fn spatial_gradient(
    src: &PlaneView<'_>,
    dx: &mut Image<f32>,
    dy: &mut Image<f32>,
) -> Result<(), FlowError> {
    if dx.size() != dy.size() {
        return Err(FlowError::GradientSizeMismatch(
            dx.width(),
            dx.height(),
            dy.width(),
            dy.height(),
        ));
    }

    if src.width() < dx.width() || src.height() < dx.height() {
        return Err(FlowError::FrameViewTooSmall(
            src.width(),
            src.height(),
            dx.width(),
            dx.height(),
        ));
    }

    let cols = dx.width();
    let rows = dx.height();
    if cols == 0 || rows == 0 {
        return Ok(());
    }

    let stride = src.stride();
    let src_data = src.as_slice();

    dx.as_slice_mut()
        .par_chunks_exact_mut(cols)
        .zip(dy.as_slice_mut().par_chunks_exact_mut(cols))
        .enumerate()
        .for_each(|(row_idx, (dx_row, dy_row))| {
            if row_idx == 0 || row_idx == rows - 1 {
                dx_row.fill(0.0);
                dy_row.fill(0.0);
                return;
            }

            dx_row[0] = 0.0;
            dy_row[0] = 0.0;
            dx_row[cols - 1] = 0.0;
            dy_row[cols - 1] = 0.0;

            let prev_row = (row_idx - 1) * stride;
            let curr_row = row_idx * stride;
            let next_row = (row_idx + 1) * stride;

            for col_idx in 1..cols - 1 {
                let v11 = src_data[prev_row + col_idx - 1] as f32;
                let v12 = src_data[prev_row + col_idx] as f32;
                let v13 = src_data[prev_row + col_idx + 1] as f32;
                let v21 = src_data[curr_row + col_idx - 1] as f32;
                let v23 = src_data[curr_row + col_idx + 1] as f32;
                let v31 = src_data[next_row + col_idx - 1] as f32;
                let v32 = src_data[next_row + col_idx] as f32;
                let v33 = src_data[next_row + col_idx + 1] as f32;

                dx_row[col_idx] = (-v11 - 2.0 * v21 - v31 + v13 + 2.0 * v23 + v33) / 8.0;
                dy_row[col_idx] = (v11 + 2.0 * v12 + v13 - v31 - 2.0 * v32 - v33) / 8.0;
            }
        });

    Ok(())
}
