//! Synthetic raster generators.
//!
//! These generators create predictable, verifiable band data that can be
//! used across the test suite. All buffers are row-major `f32`.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);
/// assert_eq!(grid[10], 1.0);
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a reflectance-like ramp from `min` (first pixel) to `max` (last pixel).
pub fn create_ramp(width: usize, height: usize, min: f32, max: f32) -> Vec<f32> {
    let n = width * height;
    if n <= 1 {
        return vec![min; n];
    }
    let step = (max - min) / (n - 1) as f32;
    (0..n).map(|i| min + step * i as f32).collect()
}

/// Creates a grid where every cell holds `value`.
pub fn create_constant(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates brightness-temperature-like values between 200K and 300K.
///
/// Colder at the top rows, like cloud tops over a warm surface.
pub fn create_brightness_temperature(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let frac = if height > 1 {
            row as f32 / (height - 1) as f32
        } else {
            0.0
        };
        for _ in 0..width {
            data.push(200.0 + 100.0 * frac);
        }
    }
    data
}

/// Interleaves per-channel planes into a channel-last buffer.
pub fn interleave(planes: &[Vec<f32>]) -> Vec<f32> {
    let len = planes.first().map(|p| p.len()).unwrap_or(0);
    let mut out = Vec::with_capacity(len * planes.len());
    for i in 0..len {
        for plane in planes {
            out.push(plane[i]);
        }
    }
    out
}

/// Replaces the cells at `indices` with NaN (no-data).
pub fn with_no_data(mut data: Vec<f32>, indices: &[usize]) -> Vec<f32> {
    for &i in indices {
        if let Some(v) = data.get_mut(i) {
            *v = f32::NAN;
        }
    }
    data
}
