//! Separable 3×3 mean filter.
//!
//! Border pixels average only their in-bounds neighbours: a corner pixel is
//! the mean of a 2×2 window, an edge pixel of a 2×3 window. Because the
//! in-bounds window is always a rectangle, averaging the horizontal means
//! vertically yields exactly the 2D window mean.
use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Horizontal pass: `dst(x, y) = mean(src(x-1..=x+1, y))` clipped to the row.
fn mean_rows(src: &ImageF32, dst: &mut ImageF32) {
    let w = src.w;
    for y in 0..src.h {
        let src_row = src.row(y);
        let dst_row = dst.row_mut(y);
        for (x, dst_px) in dst_row.iter_mut().enumerate() {
            let lo = x.saturating_sub(1);
            let hi = (x + 1).min(w - 1);
            let sum: f32 = src_row[lo..=hi].iter().sum();
            *dst_px = sum / (hi - lo + 1) as f32;
        }
    }
}

/// Vertical pass: `dst(x, y) = mean(src(x, y-1..=y+1))` clipped to the column.
fn mean_cols(src: &ImageF32, dst: &mut ImageF32) {
    let h = src.h;
    for y in 0..h {
        let lo = y.saturating_sub(1);
        let hi = (y + 1).min(h - 1);
        let norm = 1.0 / (hi - lo + 1) as f32;
        let dst_row = dst.row_mut(y);
        dst_row.fill(0.0);
        for sy in lo..=hi {
            for (dst_px, &v) in dst_row.iter_mut().zip(src.row(sy)) {
                *dst_px += v;
            }
        }
        for dst_px in dst_row.iter_mut() {
            *dst_px *= norm;
        }
    }
}

/// Apply the 3×3 mean filter to `image` in place, using `scratch` as the
/// intermediate buffer. `scratch` is resized to match `image` if needed.
pub fn box_mean_3x3_in_place(image: &mut ImageF32, scratch: &mut ImageF32) {
    if image.w == 0 || image.h == 0 {
        return;
    }
    if scratch.w != image.w || scratch.h != image.h {
        *scratch = ImageF32::new(image.w, image.h);
    }
    mean_rows(image, scratch);
    mean_cols(scratch, image);
}
