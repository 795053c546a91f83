//! Minimal NPY codec for float rasters.
//!
//! Writes format 1.0 little-endian `<f4` C-order arrays of shape `(H, W)` or
//! `(H, W, 3)`. Reads `<f4`/`<f8` arrays of rank 2 or 3 in either
//! channel-last or channel-first order.

use std::io::Write;
use std::path::Path;

use crate::array::RawArray;
use crate::atomic::write_atomic;
use crate::error::{RenderError, RenderResult};

const MAGIC: &[u8] = b"\x93NUMPY";
const HEADER_ALIGN: usize = 64;

/// Encode an array to NPY bytes.
pub fn encode_npy(array: &RawArray) -> Vec<u8> {
    let shape = if array.channels == 1 {
        format!("({}, {})", array.height, array.width)
    } else {
        format!("({}, {}, {})", array.height, array.width, array.channels)
    };
    let mut header = format!("{{'descr': '<f4', 'fortran_order': False, 'shape': {shape}, }}");

    // magic(6) + version(2) + header length(2) + header + '\n'
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(unpadded + padding + array.data.len() * 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in &array.data {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Write an array as `.npy`, atomically.
pub fn write_npy(array: &RawArray, path: &Path) -> RenderResult<()> {
    let bytes = encode_npy(array);
    write_atomic(path, |writer| {
        writer.write_all(&bytes)?;
        Ok(())
    })
}

pub fn read_npy(path: &Path) -> RenderResult<RawArray> {
    let bytes = std::fs::read(path)?;
    decode_npy(&bytes)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Dtype {
    F4,
    F8,
}

/// Decode NPY bytes into a channel-last array.
pub fn decode_npy(bytes: &[u8]) -> RenderResult<RawArray> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(RenderError::Npy("missing NPY magic".to_string()));
    }
    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(RenderError::Npy("truncated header".to_string()));
            }
            (u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize, 12)
        }
        v => return Err(RenderError::Npy(format!("unsupported NPY version {v}"))),
    };
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(RenderError::Npy("truncated header".to_string()));
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| RenderError::Npy("header is not UTF-8".to_string()))?;

    let dtype = match dict_value(header, "descr")?.trim_matches(|c| c == '\'' || c == '"') {
        "<f4" => Dtype::F4,
        "<f8" => Dtype::F8,
        other => return Err(RenderError::Npy(format!("unsupported dtype {other}"))),
    };
    if dict_value(header, "fortran_order")?.starts_with("True") {
        return Err(RenderError::Npy("Fortran-ordered arrays are not supported".to_string()));
    }
    let shape = parse_shape(dict_value(header, "shape")?)?;

    let values = decode_values(&bytes[data_start..], dtype)?;
    let expected: usize = shape.iter().product();
    if values.len() != expected {
        return Err(RenderError::Npy(format!(
            "shape {shape:?} needs {expected} values, found {}",
            values.len()
        )));
    }

    match shape.as_slice() {
        [h, w] => RawArray::new(*h, *w, 1, values),
        [h, w, c] if *c == 1 || *c == 3 => RawArray::new(*h, *w, *c, values),
        [c, h, w] if *c == 1 || *c == 3 => RawArray::new(*h, *w, *c, channel_first_to_last(&values, *c, *h * *w)),
        _ => Err(RenderError::Npy(format!("unsupported shape {shape:?}"))),
    }
}

/// Text after `'key':` up to the next top-level comma.
fn dict_value<'a>(header: &'a str, key: &str) -> RenderResult<&'a str> {
    let needle = format!("'{key}':");
    let start = header
        .find(&needle)
        .ok_or_else(|| RenderError::Npy(format!("header has no '{key}'")))?
        + needle.len();
    let rest = header[start..].trim_start();
    let mut depth = 0usize;
    for (i, ch) in rest.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' | '}' if depth == 0 => return Ok(rest[..i].trim()),
            _ => {}
        }
    }
    Ok(rest.trim())
}

fn parse_shape(text: &str) -> RenderResult<Vec<usize>> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| RenderError::Npy(format!("bad shape {text}")))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|_| RenderError::Npy(format!("bad shape {text}"))))
        .collect()
}

fn decode_values(data: &[u8], dtype: Dtype) -> RenderResult<Vec<f32>> {
    let width = match dtype {
        Dtype::F4 => 4,
        Dtype::F8 => 8,
    };
    if data.len() % width != 0 {
        return Err(RenderError::Npy("data length is not a whole number of elements".to_string()));
    }
    let values = match dtype {
        Dtype::F4 => data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
        Dtype::F8 => data
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect(),
    };
    Ok(values)
}

fn channel_first_to_last(values: &[f32], channels: usize, plane: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..plane {
        for c in 0..channels {
            out.push(values[c * plane + i]);
        }
    }
    out
}
