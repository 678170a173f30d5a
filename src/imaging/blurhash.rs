//! BlurHash placeholder encoding.
//!
//! Turns a small RGBA image into a short base-83 string that the front end
//! decodes into a blurred preview. The layout of the string is:
//!
//! ```text
//! [size flag: 1][max AC: 1][DC: 4][AC: 2 per component]
//! ```
//!
//! With the default 4×4 grid that is `1 + 1 + 4 + 15 × 2 = 36` characters.
//! The encoding follows the reference BlurHash algorithm so any stock decoder
//! can render the result.

use super::backend::BackendError;
use std::f64::consts::PI;

const BASE83_CHARS: &[u8; 83] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz#$%*+,-.:;=?@[]^_{|}~";

/// Encode RGBA8 pixels into a BlurHash string.
///
/// `components` is the `(x, y)` detail grid; each value must be 1–9.
pub fn encode(
    rgba: &[u8],
    width: u32,
    height: u32,
    components: (u32, u32),
) -> Result<String, BackendError> {
    let (cx, cy) = components;
    if !(1..=9).contains(&cx) || !(1..=9).contains(&cy) {
        return Err(BackendError::ProcessingFailed(format!(
            "BlurHash components must be 1-9, got {cx}x{cy}"
        )));
    }
    if width == 0 || height == 0 {
        return Err(BackendError::ProcessingFailed(
            "cannot hash an empty image".into(),
        ));
    }
    let (w, h) = (width as usize, height as usize);
    if rgba.len() != w * h * 4 {
        return Err(BackendError::ProcessingFailed(format!(
            "pixel buffer is {} bytes, expected {} for {width}x{height}",
            rgba.len(),
            w * h * 4
        )));
    }

    let linear: Vec<[f64; 3]> = rgba
        .chunks_exact(4)
        .map(|px| {
            [
                srgb_to_linear(px[0]),
                srgb_to_linear(px[1]),
                srgb_to_linear(px[2]),
            ]
        })
        .collect();
    let cos_x = basis_table(cx as usize, w);
    let cos_y = basis_table(cy as usize, h);

    let mut factors = Vec::with_capacity((cx * cy) as usize);
    for j in 0..cy as usize {
        for i in 0..cx as usize {
            let normalisation = if i == 0 && j == 0 { 1.0 } else { 2.0 };
            let mut sum = [0.0f64; 3];
            for y in 0..h {
                let basis_y = cos_y[j * h + y];
                let row = &linear[y * w..(y + 1) * w];
                for (x, px) in row.iter().enumerate() {
                    let basis = basis_y * cos_x[i * w + x];
                    sum[0] += basis * px[0];
                    sum[1] += basis * px[1];
                    sum[2] += basis * px[2];
                }
            }
            let scale = normalisation / (w * h) as f64;
            factors.push([sum[0] * scale, sum[1] * scale, sum[2] * scale]);
        }
    }

    let (dc, ac) = factors.split_first().ok_or_else(|| {
        BackendError::ProcessingFailed("BlurHash produced no factors".into())
    })?;

    let mut hash = String::with_capacity(4 + 2 * factors.len());
    push_base83(&mut hash, (cx - 1) + (cy - 1) * 9, 1);

    let maximum_value = if ac.is_empty() {
        push_base83(&mut hash, 0, 1);
        1.0
    } else {
        let actual_max = ac
            .iter()
            .flat_map(|f| f.iter())
            .fold(0.0f64, |max, v| max.max(v.abs()));
        let quantised = (actual_max * 166.0 - 0.5).floor().clamp(0.0, 82.0) as u32;
        push_base83(&mut hash, quantised, 1);
        (quantised as f64 + 1.0) / 166.0
    };

    push_base83(&mut hash, encode_dc(dc), 4);
    for factor in ac {
        push_base83(&mut hash, encode_ac(factor, maximum_value), 2);
    }
    Ok(hash)
}

/// `cos(π · k · p / n)` for every component `k` and pixel position `p`,
/// laid out as `table[k * n + p]`.
fn basis_table(components: usize, n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(components * n);
    for k in 0..components {
        for p in 0..n {
            table.push((PI * k as f64 * p as f64 / n as f64).cos());
        }
    }
    table
}

fn encode_dc(value: &[f64; 3]) -> u32 {
    let r = linear_to_srgb(value[0]);
    let g = linear_to_srgb(value[1]);
    let b = linear_to_srgb(value[2]);
    (r << 16) + (g << 8) + b
}

fn encode_ac(value: &[f64; 3], maximum_value: f64) -> u32 {
    let quantise = |v: f64| -> u32 {
        (sign_pow(v / maximum_value, 0.5) * 9.0 + 9.5)
            .floor()
            .clamp(0.0, 18.0) as u32
    };
    quantise(value[0]) * 19 * 19 + quantise(value[1]) * 19 + quantise(value[2])
}

fn sign_pow(value: f64, exp: f64) -> f64 {
    value.abs().powf(exp).copysign(value)
}

pub(crate) fn srgb_to_linear(value: u8) -> f64 {
    let v = value as f64 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

pub(crate) fn linear_to_srgb(value: f64) -> u32 {
    let v = value.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        (v * 12.92 * 255.0 + 0.5) as u32
    } else {
        ((1.055 * v.powf(1.0 / 2.4) - 0.055) * 255.0 + 0.5) as u32
    }
}

/// Append `value` as exactly `length` base-83 digits, most significant first.
fn push_base83(out: &mut String, value: u32, length: u32) {
    for i in 1..=length {
        let digit = (value / 83u32.pow(length - i)) % 83;
        out.push(BASE83_CHARS[digit as usize] as char);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        (0..width * height)
            .flat_map(|_| [rgb[0], rgb[1], rgb[2], 255])
            .collect()
    }

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        let mut pixels = Vec::new();
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 255 / width) as u8, (y * 255 / height) as u8, 64, 255]);
            }
        }
        pixels
    }

    fn base83(value: u32, length: u32) -> String {
        let mut s = String::new();
        push_base83(&mut s, value, length);
        s
    }

    // =========================================================================
    // base83
    // =========================================================================

    #[test]
    fn base83_single_digits() {
        assert_eq!(base83(0, 1), "0");
        assert_eq!(base83(10, 1), "A");
        assert_eq!(base83(82, 1), "~");
    }

    #[test]
    fn base83_pads_to_length() {
        assert_eq!(base83(1, 4), "0001");
        assert_eq!(base83(83, 2), "10");
    }

    // =========================================================================
    // color conversion
    // =========================================================================

    #[test]
    fn srgb_linear_endpoints() {
        assert_eq!(srgb_to_linear(0), 0.0);
        assert!((srgb_to_linear(255) - 1.0).abs() < 1e-12);
        assert_eq!(linear_to_srgb(0.0), 0);
        assert_eq!(linear_to_srgb(1.0), 255);
    }

    #[test]
    fn srgb_linear_roundtrip() {
        for v in [0u8, 1, 17, 64, 128, 200, 254, 255] {
            assert_eq!(linear_to_srgb(srgb_to_linear(v)), v as u32);
        }
    }

    #[test]
    fn linear_to_srgb_clamps() {
        assert_eq!(linear_to_srgb(-0.5), 0);
        assert_eq!(linear_to_srgb(3.0), 255);
    }

    // =========================================================================
    // encode
    // =========================================================================

    #[test]
    fn four_by_four_hash_is_36_chars() {
        let hash = encode(&gradient(32, 24), 32, 24, (4, 4)).unwrap();
        assert_eq!(hash.len(), 36);
        // size flag (4-1) + (4-1)*9 = 30 → 'U'
        assert!(hash.starts_with('U'));
    }

    #[test]
    fn matches_reference_encoder() {
        let (width, height) = (37u32, 23u32);
        let mut pixels = Vec::new();
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[
                    ((x * 7) % 256) as u8,
                    ((y * 11) % 256) as u8,
                    ((x * y) % 256) as u8,
                    255,
                ]);
            }
        }
        assert_eq!(
            encode(&pixels, width, height, (4, 4)).unwrap(),
            "U#HU?[2lwtX3l[WUjvfAgFflfTfkn#WsjufN"
        );
    }

    #[test]
    fn hash_length_follows_components() {
        let hash = encode(&gradient(16, 16), 16, 16, (3, 2)).unwrap();
        assert_eq!(hash.len(), 4 + 2 * 3 * 2);
    }

    #[test]
    fn single_component_has_no_ac() {
        let hash = encode(&solid(8, 8, [255, 255, 255]), 8, 8, (1, 1)).unwrap();
        // flag 0, max 0, DC white = 0xFFFFFF
        assert_eq!(hash, format!("00{}", base83(0xFF_FF_FF, 4)));
    }

    #[test]
    fn dc_encodes_average_color() {
        let hash = encode(&solid(8, 8, [255, 0, 0]), 8, 8, (1, 1)).unwrap();
        assert_eq!(&hash[2..], base83(0xFF_00_00, 4));
    }

    #[test]
    fn encoding_is_deterministic() {
        let pixels = gradient(20, 10);
        let a = encode(&pixels, 20, 10, (4, 4)).unwrap();
        let b = encode(&pixels, 20, 10, (4, 4)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_images_differ() {
        let a = encode(&solid(10, 10, [0, 0, 0]), 10, 10, (4, 4)).unwrap();
        let b = encode(&gradient(10, 10), 10, 10, (4, 4)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_bad_components() {
        assert!(encode(&solid(2, 2, [0, 0, 0]), 2, 2, (0, 4)).is_err());
        assert!(encode(&solid(2, 2, [0, 0, 0]), 2, 2, (4, 10)).is_err());
    }

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(encode(&[0u8; 12], 2, 2, (4, 4)).is_err());
    }

    #[test]
    fn rejects_empty_image() {
        assert!(encode(&[], 0, 0, (4, 4)).is_err());
    }
}
