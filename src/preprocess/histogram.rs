use crate::image::ImageF32;

/// Number of quantisation levels used for equalisation.
pub const LEVELS: usize = 256;

/// 256-bin histogram over a channel holding values in 0..=255.
#[derive(Clone, Debug)]
pub struct LevelHistogram {
    bins: Vec<u64>,
    total: u64,
}

impl LevelHistogram {
    /// Quantise a level value to its bin: `round(clamp(v, 0, 255))`.
    #[inline]
    pub fn quantize(value: f32) -> usize {
        if !value.is_finite() {
            return 0;
        }
        value.round().clamp(0.0, (LEVELS - 1) as f32) as usize
    }

    pub fn from_channel(channel: &ImageF32) -> Self {
        let mut bins = vec![0u64; LEVELS];
        for &v in &channel.data {
            bins[Self::quantize(v)] += 1;
        }
        Self {
            bins,
            total: channel.data.len() as u64,
        }
    }

    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of occupied bins.
    pub fn distinct_levels(&self) -> usize {
        self.bins.iter().filter(|&&c| c > 0).count()
    }

    /// Distance between the lowest and highest occupied bin; 0 when empty.
    pub fn occupied_span(&self) -> usize {
        let lo = self.bins.iter().position(|&c| c > 0);
        let hi = self.bins.iter().rposition(|&c| c > 0);
        match (lo, hi) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => 0,
        }
    }

    /// Cumulative distribution, `cdf[i] = Σ bins[0..=i]`.
    pub fn cumulative(&self) -> Vec<u64> {
        let mut acc = 0u64;
        self.bins
            .iter()
            .map(|&c| {
                acc += c;
                acc
            })
            .collect()
    }

    /// Level → level lookup table for histogram equalisation.
    ///
    /// `cdf_min` is the CDF at the first occupied bin. Returns `None` when the
    /// histogram is degenerate (`cdf_max == cdf_min`), in which case callers
    /// must leave the channel untouched.
    pub fn equalization_lut(&self) -> Option<Vec<f32>> {
        let cdf = self.cumulative();
        let cdf_min = cdf.iter().copied().find(|&c| c > 0)?;
        let cdf_max = self.total;
        if cdf_max == cdf_min {
            return None;
        }
        let span = (cdf_max - cdf_min) as f64;
        let lut = cdf
            .iter()
            .map(|&c| {
                let v = c.saturating_sub(cdf_min) as f64 / span * (LEVELS - 1) as f64;
                v.round().clamp(0.0, (LEVELS - 1) as f64) as f32
            })
            .collect();
        Some(lut)
    }

    /// Otsu's threshold: the level maximising between-class variance.
    ///
    /// Pixels with `level > threshold` form the foreground. Returns `None`
    /// when fewer than two levels are occupied.
    pub fn otsu_threshold(&self) -> Option<usize> {
        if self.distinct_levels() < 2 {
            return None;
        }
        let total = self.total as f64;
        let sum_all: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &c)| i as f64 * c as f64)
            .sum();
        let mut weight_bg = 0.0f64;
        let mut sum_bg = 0.0f64;
        let mut best: Option<(usize, f64)> = None;
        for (level, &count) in self.bins.iter().enumerate() {
            weight_bg += count as f64;
            if weight_bg == 0.0 {
                continue;
            }
            let weight_fg = total - weight_bg;
            if weight_fg == 0.0 {
                break;
            }
            sum_bg += level as f64 * count as f64;
            let mean_bg = sum_bg / weight_bg;
            let mean_fg = (sum_all - sum_bg) / weight_fg;
            let between = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
            if best.map_or(true, |(_, b)| between > b) {
                best = Some((level, between));
            }
        }
        best.map(|(level, _)| level)
    }
}

/// Histogram-equalise a level channel in place.
///
/// Returns `false` and leaves every pixel bit-identical when the channel
/// holds a single distinct level.
pub fn equalize_in_place(channel: &mut ImageF32) -> bool {
    let hist = LevelHistogram::from_channel(channel);
    let Some(lut) = hist.equalization_lut() else {
        return false;
    };
    for v in channel.data.iter_mut() {
        *v = lut[LevelHistogram::quantize(*v)];
    }
    true
}
