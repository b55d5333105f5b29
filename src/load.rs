/***************************************************************************************************
 * Copyright (c) 2022-2023 Qualcomm Innovation Center, Inc. All rights reserved.
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
 * libcbor_rs load driver
 *
 * Repeatedly invokes `decode_one` against a `TreeBuilder` until the builder's stack empties out
 * into a single root item, or an error is detected. This is the only entry point most callers
 * need; `decode_one`/`TreeBuilder` remain available directly for callers who want to drive
 * decoding themselves (e.g. over a buffer they refill incrementally).
 **************************************************************************************************/
use crate::alloc_policy::{AllocPolicy, UnboundedAllocator};
use crate::builder::TreeBuilder;
use crate::decode::{decode_one, DecodeStatus};
use crate::item::ItemRef;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// The caller-visible error codes from §6, each paired with the byte offset into the input at
/// which the violation was detected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadErrorCode {
    /// The input was empty.
    NoData,
    /// The input ended mid-item.
    NotEnoughData,
    /// A reserved encoding or decoder-level protocol violation was found.
    Malformed,
    /// The configured allocation policy refused an allocation.
    MemError,
    /// A builder-level protocol violation was found (misplaced break, illegal nesting).
    SyntaxError,
}

/// A load failure: the stable error code plus the byte position at which it was detected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadError {
    pub code: LoadErrorCode,
    pub position: usize,
}

/// Decode exactly one top-level CBOR data item from `bytes`, using the default allocator policy
/// (never refuses). Trailing bytes after the first complete item are left unconsumed and are not
/// an error.
pub fn load(bytes: &[u8]) -> Result<ItemRef, LoadError> {
    load_with_policy(bytes, &mut UnboundedAllocator)
}

/// As [`load`], but consults `policy` before every item allocation; used by tests to simulate an
/// allocator that fails its k-th call.
#[cfg_attr(feature = "trace", trace)]
pub fn load_with_policy(bytes: &[u8], policy: &mut dyn AllocPolicy) -> Result<ItemRef, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError { code: LoadErrorCode::NoData, position: 0 });
    }

    let mut builder = TreeBuilder::new(policy);
    let mut position = 0usize;

    loop {
        if position == bytes.len() && !builder.is_complete() {
            builder.abandon();
            return Err(LoadError { code: LoadErrorCode::NotEnoughData, position });
        }

        let item_start = position;
        match decode_one(&bytes[position..], &mut builder) {
            DecodeStatus::NeedMoreData => {
                builder.abandon();
                return Err(LoadError { code: LoadErrorCode::NotEnoughData, position });
            }
            DecodeStatus::Malformed => {
                builder.abandon();
                return Err(LoadError { code: LoadErrorCode::Malformed, position });
            }
            DecodeStatus::Finished { bytes_read } => {
                position += bytes_read;

                if builder.allocation_failed {
                    builder.abandon();
                    return Err(LoadError { code: LoadErrorCode::MemError, position: item_start });
                }
                if builder.syntax_error {
                    builder.abandon();
                    return Err(LoadError { code: LoadErrorCode::SyntaxError, position: item_start });
                }

                if builder.is_complete() {
                    if let Some(root) = builder.take_root() {
                        return Ok(root);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc_policy::CountingAllocator;
    use crate::item::{self, IntWidth};

    #[test]
    fn scenario_uint8_zero() {
        let item = load(&[0x00]).unwrap();
        assert_eq!(item::width(&item), Some(IntWidth::W8));
        assert_eq!(<u64 as core::convert::TryFrom<&crate::item::Item>>::try_from(&item).unwrap(), 0);
    }

    #[test]
    fn scenario_uint32_million() {
        let item = load(&[0x1a, 0x00, 0x0f, 0x42, 0x40]).unwrap();
        assert_eq!(item::width(&item), Some(IntWidth::W32));
    }

    #[test]
    fn scenario_definite_array() {
        let item = load(&[0x83, 0x01, 0x02, 0x03]).unwrap();
        assert_eq!(item::size(&item), Some(3));
    }

    #[test]
    fn scenario_indefinite_bytestring_collapses() {
        let item = load(&[0x5f, 0x42, 0x01, 0x02, 0x43, 0x03, 0x04, 0x05, 0xff]).unwrap();
        assert!(!item::is_definite(&item));
        assert_eq!(item::chunk_count(&item), Some(2));
        let collapsed = item::copy_definite(&item);
        assert!(item::is_definite(&collapsed));
        assert_eq!(&*item::bytes(&collapsed).unwrap(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn scenario_tag_with_text() {
        let bytes: alloc::vec::Vec<u8> = alloc::vec![
            0xc0, 0x74, 0x32, 0x30, 0x31, 0x33, 0x2d, 0x30, 0x33, 0x2d, 0x32, 0x31, 0x54, 0x32,
            0x30, 0x3a, 0x30, 0x34, 0x3a, 0x30, 0x30, 0x5a,
        ];
        let item = load(&bytes).unwrap();
        assert_eq!(item::tag_value(&item), Some(0));
        let child = item::tag_child(&item).unwrap();
        assert_eq!(item::as_str(&child).as_deref(), Some("2013-03-21T20:04:00Z"));
    }

    #[test]
    fn scenario_bare_break_is_syntax_error() {
        let err = load(&[0xff]).unwrap_err();
        assert_eq!(err, LoadError { code: LoadErrorCode::SyntaxError, position: 0 });
    }

    #[test]
    fn scenario_truncated_array() {
        let err = load(&[0x82, 0x01]).unwrap_err();
        assert_eq!(err, LoadError { code: LoadErrorCode::NotEnoughData, position: 2 });
    }

    #[test]
    fn empty_input_is_no_data() {
        let err = load(&[]).unwrap_err();
        assert_eq!(err, LoadError { code: LoadErrorCode::NoData, position: 0 });
    }

    #[test]
    fn reserved_ai_is_malformed() {
        let err = load(&[0x1c]).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::Malformed);
    }

    #[test]
    fn allocator_failure_reports_mem_error() {
        let mut policy = CountingAllocator::failing_at(2);
        let err = load_with_policy(&[0x83, 0x01, 0x02, 0x03], &mut policy).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::MemError);
    }
}
