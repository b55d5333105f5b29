/***************************************************************************************************
 * Copyright (c) 2021 Qualcomm Innovation Center, Inc. All rights reserved.
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
 * libcbor_rs CBOR constants
 *
 * Bit layout constants for the initial byte of a CBOR data item: the top three bits are the
 * major type (MT), the bottom five are the additional information (AI).
 **************************************************************************************************/

/// Additional-information bitmask (bottom 5 bits of the initial byte).
pub const AI_MASK: u8 = 0b000_11111;
/// Major-type shift: `byte >> MT_SHIFT` yields MT in 0..=7.
pub const MT_SHIFT: u8 = 5;

/// Major type 0: unsigned integer.
pub const MT_UINT: u8 = 0;
/// Major type 1: negative integer.
pub const MT_NINT: u8 = 1;
/// Major type 2: byte string.
pub const MT_BSTR: u8 = 2;
/// Major type 3: text string.
pub const MT_TSTR: u8 = 3;
/// Major type 4: array.
pub const MT_ARRAY: u8 = 4;
/// Major type 5: map.
pub const MT_MAP: u8 = 5;
/// Major type 6: tag.
pub const MT_TAG: u8 = 6;
/// Major type 7: floats and simple values.
pub const MT_FLOAT_SIMPLE: u8 = 7;

/// Largest AI value whose argument is simply the AI itself.
pub const AI_MAX_DIRECT: u8 = 23;
/// AI value indicating the argument follows as one big-endian byte.
pub const AI_ONE_BYTE: u8 = 24;
/// AI value indicating the argument follows as two big-endian bytes.
pub const AI_TWO_BYTES: u8 = 25;
/// AI value indicating the argument follows as four big-endian bytes.
pub const AI_FOUR_BYTES: u8 = 26;
/// AI value indicating the argument follows as eight big-endian bytes.
pub const AI_EIGHT_BYTES: u8 = 27;
/// Smallest reserved AI value (28, 29, 30 are all reserved).
pub const AI_RESERVED_LO: u8 = 28;
/// Largest reserved AI value.
pub const AI_RESERVED_HI: u8 = 30;
/// AI value marking an indefinite-length construct, or the "break" stop code under MT 7.
pub const AI_INDEFINITE: u8 = 31;

/// Major type 7, AI values below this are simple values encoded directly in the AI.
pub const SIMPLE_DIRECT_MAX: u8 = 19;
pub const SIMPLE_FALSE: u8 = 20;
pub const SIMPLE_TRUE: u8 = 21;
pub const SIMPLE_NULL: u8 = 22;
pub const SIMPLE_UNDEFINED: u8 = 23;
/// Major type 7, AI 24: simple value follows as one more byte, valid range 32..=255.
pub const SIMPLE_ONE_BYTE: u8 = 24;
pub const SIMPLE_ONE_BYTE_MIN: u8 = 32;
/// Major type 7, AI 25/26/27: half/single/double precision float follows.
pub const FLOAT_HALF: u8 = 25;
pub const FLOAT_SINGLE: u8 = 26;
pub const FLOAT_DOUBLE: u8 = 27;

/// Split an initial byte into (major type 0..=7, additional information 0..=31).
#[inline]
pub fn split_initial_byte(byte: u8) -> (u8, u8) {
    (byte >> MT_SHIFT, byte & AI_MASK)
}
