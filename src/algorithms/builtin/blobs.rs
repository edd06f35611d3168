//! Blob detection on a level channel: Otsu foreground + 4-connected labelling.
use crate::image::ImageF32;
use crate::preprocess::LevelHistogram;
use log::debug;

/// One connected foreground region.
#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    /// Number of pixels in the region.
    pub area: usize,
    /// Mean pixel position `[x, y]`.
    pub centroid: [f32; 2],
    /// Mean channel level over the region.
    pub mean_level: f32,
}

/// Size limits for accepted blobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlobLimits {
    pub min_area: usize,
    /// Upper bound as a fraction of the image area; larger regions are
    /// treated as background texture rather than discrete objects.
    pub max_area_fraction: f32,
}

impl Default for BlobLimits {
    fn default() -> Self {
        Self {
            min_area: 4,
            max_area_fraction: 0.05,
        }
    }
}

struct RegionStats {
    area: usize,
    sum_x: f64,
    sum_y: f64,
    sum_level: f64,
}

/// Detect blobs brighter than the channel's Otsu threshold.
///
/// Scan order is row-major, so the output order is deterministic. A channel
/// with a single level has no threshold and yields no blobs.
pub fn detect_blobs(channel: &ImageF32, limits: BlobLimits) -> Vec<Blob> {
    let (w, h) = (channel.w, channel.h);
    let Some(threshold) = LevelHistogram::from_channel(channel).otsu_threshold() else {
        return Vec::new();
    };
    let max_area = ((w * h) as f32 * limits.max_area_fraction).max(limits.min_area as f32) as usize;

    let foreground: Vec<bool> = channel
        .data
        .iter()
        .map(|&v| LevelHistogram::quantize(v) > threshold)
        .collect();
    let mut visited = vec![false; w * h];
    let mut stack = Vec::new();
    let mut blobs = Vec::new();

    for start in 0..w * h {
        if !foreground[start] || visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);
        let mut stats = RegionStats {
            area: 0,
            sum_x: 0.0,
            sum_y: 0.0,
            sum_level: 0.0,
        };
        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            stats.area += 1;
            stats.sum_x += x as f64;
            stats.sum_y += y as f64;
            stats.sum_level += channel.data[idx] as f64;

            let mut visit = |n: usize| {
                if foreground[n] && !visited[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            };
            if x > 0 {
                visit(idx - 1);
            }
            if x + 1 < w {
                visit(idx + 1);
            }
            if y > 0 {
                visit(idx - w);
            }
            if y + 1 < h {
                visit(idx + w);
            }
        }

        if stats.area < limits.min_area || stats.area > max_area {
            continue;
        }
        let n = stats.area as f64;
        blobs.push(Blob {
            area: stats.area,
            centroid: [(stats.sum_x / n) as f32, (stats.sum_y / n) as f32],
            mean_level: (stats.sum_level / n) as f32,
        });
    }
    debug!("blobs: otsu={} accepted={}", threshold, blobs.len());
    blobs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dots(w: usize, h: usize, spacing: usize, size: usize) -> ImageF32 {
        let mut img = ImageF32::filled(w, h, 20.0);
        for y in 0..h {
            for x in 0..w {
                if x % spacing < size && y % spacing < size {
                    img.set(x, y, 220.0);
                }
            }
        }
        img
    }

    #[test]
    fn counts_separated_dots() {
        let img = dots(40, 40, 8, 3);
        let blobs = detect_blobs(&img, BlobLimits::default());
        assert_eq!(blobs.len(), 25);
        assert!(blobs.iter().all(|b| b.area == 9));
        assert_eq!(blobs[0].centroid, [1.0, 1.0]);
    }

    #[test]
    fn uniform_channel_has_no_blobs() {
        let img = ImageF32::filled(16, 16, 128.0);
        assert!(detect_blobs(&img, BlobLimits::default()).is_empty());
    }

    #[test]
    fn tiny_regions_are_ignored() {
        let img = dots(40, 40, 8, 1);
        let blobs = detect_blobs(&img, BlobLimits::default());
        assert!(blobs.is_empty());
    }
}
