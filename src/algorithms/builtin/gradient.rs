//! Sobel gradient magnitude with border clamping.
//!
//! Input levels are normalised to `[0, 1]` first, so a full black-to-white
//! step produces a magnitude of 4.
use crate::image::{ImageF32, ImageView, ImageViewMut};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

const LEVEL_SCALE: f32 = 1.0 / 255.0;

/// Per-pixel `sqrt(gx² + gy²)` of a level channel.
pub fn sobel_magnitude(l: &ImageF32) -> ImageF32 {
    let (w, h) = (l.w, l.h);
    let mut mag = ImageF32::new(w, h);
    if w == 0 || h == 0 {
        return mag;
    }

    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        let rows = [l.row(y_idx[0]), l.row(y_idx[1]), l.row(y_idx[2])];
        let out = mag.row_mut(y);
        for (x, out_px) in out.iter_mut().enumerate() {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, row) in rows.iter().enumerate() {
                for (kx, &xi) in x_idx.iter().enumerate() {
                    let v = row[xi] * LEVEL_SCALE;
                    sum_x += v * SOBEL_KERNEL_X[ky][kx];
                    sum_y += v * SOBEL_KERNEL_Y[ky][kx];
                }
            }
            *out_px = (sum_x * sum_x + sum_y * sum_y).sqrt();
        }
    }
    mag
}
