//! In-memory float and 8-bit rasters.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

const ALLCLOSE_RTOL: f32 = 1e-5;
const ALLCLOSE_ATOL: f32 = 1e-8;

/// Resampled field: row-major, channel-last, NaN marks no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArray {
    pub height: usize,
    pub width: usize,
    /// 1 or 3
    pub channels: usize,
    pub data: Vec<f32>,
}

impl RawArray {
    pub fn new(height: usize, width: usize, channels: usize, data: Vec<f32>) -> RenderResult<Self> {
        if channels != 1 && channels != 3 {
            return Err(RenderError::InvalidShape(format!(
                "expected 1 or 3 channels, got {channels}"
            )));
        }
        if height == 0 || width == 0 {
            return Err(RenderError::InvalidShape(format!("empty array {height}x{width}")));
        }
        if data.len() != height * width * channels {
            return Err(RenderError::InvalidShape(format!(
                "{} values for shape ({height}, {width}, {channels})",
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// Single-band array.
    pub fn single(height: usize, width: usize, data: Vec<f32>) -> RenderResult<Self> {
        Self::new(height, width, 1, data)
    }

    /// Stack three single-band arrays of equal shape into one 3-channel array.
    pub fn stack(bands: &[RawArray]) -> RenderResult<Self> {
        let [first, second, third] = bands else {
            return Err(RenderError::InvalidShape(format!(
                "stacking needs exactly 3 bands, got {}",
                bands.len()
            )));
        };
        for band in [first, second, third] {
            if band.channels != 1 || band.height != first.height || band.width != first.width {
                return Err(RenderError::InvalidShape(format!(
                    "cannot stack ({}, {}, {}) onto ({}, {}, 1)",
                    band.height, band.width, band.channels, first.height, first.width
                )));
            }
        }

        let mut data = Vec::with_capacity(first.data.len() * 3);
        for i in 0..first.data.len() {
            data.push(first.data[i]);
            data.push(second.data[i]);
            data.push(third.data[i]);
        }
        Self::new(first.height, first.width, 3, data)
    }

    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    /// Copy out one channel plane.
    pub fn channel(&self, c: usize) -> Vec<f32> {
        self.data.iter().skip(c).step_by(self.channels).copied().collect()
    }

    /// Reduce a 3-channel array to one channel when all three are the same
    /// within `allclose` tolerance. NaN matches NaN.
    pub fn collapse_identical_channels(self) -> Self {
        if self.channels != 3 {
            return self;
        }
        let identical = self.data.chunks_exact(3).all(|px| close(px[1], px[0]) && close(px[2], px[0]));
        if !identical {
            return self;
        }
        Self {
            height: self.height,
            width: self.width,
            channels: 1,
            data: self.channel(0),
        }
    }
}

fn close(a: f32, b: f32) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    (a - b).abs() <= ALLCLOSE_ATOL + ALLCLOSE_RTOL * b.abs()
}

/// 8-bit raster ready for encoding, same layout as [`RawArray`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl RenderedImage {
    pub fn new(height: usize, width: usize, channels: usize, data: Vec<u8>) -> RenderResult<Self> {
        if (channels != 1 && channels != 3) || data.len() != height * width * channels {
            return Err(RenderError::InvalidShape(format!(
                "{} bytes for image ({height}, {width}, {channels})",
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_length() {
        assert!(RawArray::new(2, 2, 1, vec![0.0; 3]).is_err());
        assert!(RawArray::new(2, 2, 2, vec![0.0; 8]).is_err());
        assert!(RawArray::new(2, 2, 3, vec![0.0; 12]).is_ok());
    }

    #[test]
    fn test_stack_interleaves() {
        let a = RawArray::single(1, 2, vec![1.0, 2.0]).unwrap();
        let b = RawArray::single(1, 2, vec![3.0, 4.0]).unwrap();
        let c = RawArray::single(1, 2, vec![5.0, 6.0]).unwrap();
        let stacked = RawArray::stack(&[a, b, c]).unwrap();
        assert_eq!(stacked.channels, 3);
        assert_eq!(stacked.data, vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
        assert_eq!(stacked.channel(1), vec![3.0, 4.0]);
    }

    #[test]
    fn test_stack_rejects_mismatch() {
        let a = RawArray::single(1, 2, vec![1.0, 2.0]).unwrap();
        let b = RawArray::single(2, 1, vec![3.0, 4.0]).unwrap();
        assert!(RawArray::stack(&[a.clone(), b, a.clone()]).is_err());
        assert!(RawArray::stack(&[a.clone(), a]).is_err());
    }

    #[test]
    fn test_collapse_identical() {
        let arr = RawArray::new(1, 2, 3, vec![1.0, 1.0, 1.0, f32::NAN, f32::NAN, f32::NAN]).unwrap();
        let collapsed = arr.collapse_identical_channels();
        assert_eq!(collapsed.channels, 1);
        assert_eq!(collapsed.data[0], 1.0);
        assert!(collapsed.data[1].is_nan());
    }

    #[test]
    fn test_collapse_keeps_distinct() {
        let arr = RawArray::new(1, 1, 3, vec![1.0, 1.1, 1.0]).unwrap();
        assert_eq!(arr.collapse_identical_channels().channels, 3);
    }
}
