/***************************************************************************************************
 * Copyright (c) 2021, 2022 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice (including the next
 * paragraph) shall be included in all copies or substantial portions of the
 * Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * libcbor_rs byte loaders
 *
 * Pure, unchecked, fixed-width big-endian reads from a byte slice at a given offset. Callers
 * (the streaming decoder in `crate::decode`) are responsible for bounds-checking before calling
 * any of these; that is what keeps the `NeedMoreData` bookkeeping in one place.
 **************************************************************************************************/
#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// Read a big-endian `u8` at `buf[offset]`. Caller must ensure `offset < buf.len()`.
#[inline]
#[cfg_attr(feature = "trace", trace)]
pub fn load_u8(buf: &[u8], offset: usize) -> u8 {
    buf[offset]
}

/// Read a big-endian `u16` at `buf[offset..offset+2]`. Caller must ensure the range is in bounds.
#[inline]
#[cfg_attr(feature = "trace", trace)]
pub fn load_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// Read a big-endian `u32` at `buf[offset..offset+4]`. Caller must ensure the range is in bounds.
#[inline]
#[cfg_attr(feature = "trace", trace)]
pub fn load_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Read a big-endian `u64` at `buf[offset..offset+8]`. Caller must ensure the range is in bounds.
#[inline]
#[cfg_attr(feature = "trace", trace)]
pub fn load_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_be_bytes(bytes)
}

/// Read an IEEE-754 binary64 (`f64`) at `buf[offset..offset+8]`.
#[cfg(feature = "float")]
#[inline]
#[cfg_attr(feature = "trace", trace)]
pub fn load_f64(buf: &[u8], offset: usize) -> f64 {
    f64::from_bits(load_u64(buf, offset))
}

/// Read an IEEE-754 binary32 (`f32`) at `buf[offset..offset+4]`.
#[cfg(feature = "float")]
#[inline]
#[cfg_attr(feature = "trace", trace)]
pub fn load_f32(buf: &[u8], offset: usize) -> f32 {
    f32::from_bits(load_u32(buf, offset))
}

/// Read an IEEE-754 binary16 (half precision) at `buf[offset..offset+2]` and expand it to binary32,
/// rebiasing the sign/exponent/mantissa and scaling subnormals, with infinities and NaNs preserved.
///
/// The expansion itself is delegated to `half::f16`, which implements exactly this rule set; we
/// only own the big-endian byte read.
#[cfg(feature = "float")]
#[inline]
#[cfg_attr(feature = "trace", trace)]
pub fn load_f16_as_f32(buf: &[u8], offset: usize) -> f32 {
    half::f16::from_be_bytes([buf[offset], buf[offset + 1]]).to_f32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        assert_eq!(load_u8(&[0x42], 0), 0x42);
        assert_eq!(load_u16(&[0x01, 0x02], 0), 0x0102);
        assert_eq!(load_u32(&[0x00, 0x0f, 0x42, 0x40], 0), 1_000_000);
        assert_eq!(
            load_u64(&[0, 0, 0, 0, 0, 0, 0, 1], 0),
            1
        );
    }

    #[test]
    fn reads_at_offset() {
        let buf = [0xffu8, 0x00, 0x01];
        assert_eq!(load_u16(&buf, 1), 0x0001);
    }

    #[cfg(feature = "float")]
    #[test]
    fn expands_half_precision() {
        // 1.0 in binary16 is 0x3C00.
        assert_eq!(load_f16_as_f32(&[0x3C, 0x00], 0), 1.0f32);
        // Infinity round-trips.
        assert!(load_f16_as_f32(&[0x7C, 0x00], 0).is_infinite());
    }

    #[cfg(feature = "float")]
    #[test]
    fn reads_doubles_and_singles() {
        let bits = 1.5f64.to_bits().to_be_bytes();
        assert_eq!(load_f64(&bits, 0), 1.5f64);
        let bits = 1.5f32.to_bits().to_be_bytes();
        assert_eq!(load_f32(&bits, 0), 1.5f32);
    }
}
