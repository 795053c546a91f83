//! Field-to-8-bit stretches.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::array::{RawArray, RenderedImage};
use crate::error::{RenderError, RenderResult};

/// Minimum pixels to benefit from parallel pixel mapping
const PARALLEL_THRESHOLD: usize = 4096;

/// How float values map to 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderMode {
    /// Per-channel clip between two percentiles, then rescale
    PercentileStretch { qmin: f64, qmax: f64 },
    /// `clamp(x * multiplier, 0, 255)`, truncated
    FixedScale { multiplier: f32 },
    /// Global min/max normalisation with gamma correction
    MinMax { gamma: f32 },
}

impl Default for RenderMode {
    fn default() -> Self {
        Self::PercentileStretch { qmin: 1.0, qmax: 99.0 }
    }
}

impl RenderMode {
    pub fn validate(&self) -> RenderResult<()> {
        match *self {
            Self::PercentileStretch { qmin, qmax } => {
                if !(0.0..=100.0).contains(&qmin) || !(0.0..=100.0).contains(&qmax) || qmin >= qmax {
                    return Err(RenderError::InvalidMode(format!(
                        "percentiles must satisfy 0 <= qmin < qmax <= 100, got {qmin}/{qmax}"
                    )));
                }
            }
            Self::FixedScale { multiplier } => {
                if !multiplier.is_finite() {
                    return Err(RenderError::InvalidMode(format!("non-finite multiplier {multiplier}")));
                }
            }
            Self::MinMax { gamma } => {
                if !gamma.is_finite() || gamma <= 0.0 {
                    return Err(RenderError::InvalidMode(format!("gamma must be positive, got {gamma}")));
                }
            }
        }
        Ok(())
    }
}

/// Render a raw array to 8-bit.
///
/// Three identical channels collapse to a single grayscale channel first.
/// A channel with no spread (max == min) renders as all zeros.
pub fn render(array: &RawArray, mode: RenderMode) -> RenderResult<RenderedImage> {
    mode.validate()?;
    let array = array.clone().collapse_identical_channels();
    let channels = array.channels;

    let planes: Vec<Vec<u8>> = match mode {
        RenderMode::PercentileStretch { qmin, qmax } => (0..channels)
            .map(|c| {
                let mut plane = array.channel(c);
                nan_to_zero(&mut plane);
                let lo = percentile(&plane, qmin);
                let hi = percentile(&plane, qmax);
                debug!(channel = c, lo = lo, hi = hi, "Percentile stretch bounds");
                linear(&plane, lo, hi, 1.0)
            })
            .collect(),
        RenderMode::FixedScale { multiplier } => (0..channels)
            .map(|c| {
                let plane = array.channel(c);
                map_pixels(&plane, |v| {
                    let v = if v.is_nan() { 0.0 } else { v };
                    (v * multiplier).clamp(0.0, 255.0) as u8
                })
            })
            .collect(),
        RenderMode::MinMax { gamma } => {
            let mut zeroed: Vec<Vec<f32>> = (0..channels).map(|c| array.channel(c)).collect();
            zeroed.iter_mut().for_each(|plane| nan_to_zero(plane));
            let (lo, hi) = value_range(zeroed.iter().flatten().copied());
            debug!(lo = lo, hi = hi, gamma = gamma, "Min/max stretch bounds");
            zeroed
                .iter()
                .map(|plane| linear(plane, lo as f64, hi as f64, gamma))
                .collect()
        }
    };

    let data = if channels == 1 {
        planes.into_iter().next().unwrap_or_default()
    } else {
        let mut data = Vec::with_capacity(array.pixel_count() * channels);
        for i in 0..array.pixel_count() {
            for plane in &planes {
                data.push(plane[i]);
            }
        }
        data
    };

    RenderedImage::new(array.height, array.width, channels, data)
}

/// Linear-interpolated percentile (numpy's default method). `q` in 0..=100.
pub fn percentile(values: &[f32], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f32> = values.to_vec();
    if sorted.len() >= PARALLEL_THRESHOLD {
        sorted.par_sort_unstable_by(|a, b| a.total_cmp(b));
    } else {
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    }

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac
}

/// `round(255 * ((clip(x, lo, hi) - lo) / (hi - lo)) ^ (1 / gamma))`; NaN and
/// degenerate ranges map to zero.
fn linear(plane: &[f32], lo: f64, hi: f64, gamma: f32) -> Vec<u8> {
    let span = hi - lo;
    if span <= 0.0 || !span.is_finite() {
        return vec![0; plane.len()];
    }
    let inv_gamma = 1.0 / gamma as f64;
    map_pixels(plane, move |v| {
        if v.is_nan() {
            return 0;
        }
        let mut t = ((v as f64 - lo) / span).clamp(0.0, 1.0);
        if inv_gamma != 1.0 {
            t = t.powf(inv_gamma);
        }
        (t * 255.0).round() as u8
    })
}

fn map_pixels<F>(plane: &[f32], f: F) -> Vec<u8>
where
    F: Fn(f32) -> u8 + Sync + Send,
{
    if plane.len() >= PARALLEL_THRESHOLD {
        plane.par_iter().map(|&v| f(v)).collect()
    } else {
        plane.iter().map(|&v| f(v)).collect()
    }
}

fn nan_to_zero(plane: &mut [f32]) {
    for v in plane.iter_mut() {
        if v.is_nan() {
            *v = 0.0;
        }
    }
}

/// `(min, max)` of the values; `(0, 0)` when there are none.
fn value_range(values: impl IntoIterator<Item = f32>) -> (f32, f32) {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        (0.0, 0.0)
    } else {
        (lo, hi)
    }
}
