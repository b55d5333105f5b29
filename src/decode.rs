/***************************************************************************************************
 * Copyright (c) 2020-2023 Qualcomm Innovation Center, Inc. All rights reserved.
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
 * CBOR streaming decoder
 *
 * `decode_one` reads at most one CBOR data item header (plus any immediate payload such as a
 * definite byte string's bytes) from the front of a buffer, dispatches exactly one callback, and
 * reports how many bytes it consumed. It never looks past the slice it is given and never
 * allocates; all state it needs lives in its caller's stack frame or in the `Callbacks`
 * implementation it drives. This is the single-shot primitive the tree builder in `crate::builder`
 * repeatedly invokes to assemble a complete item tree.
 **************************************************************************************************/
use crate::constants::*;
use crate::loader::{load_u16, load_u32, load_u64, load_u8};

#[cfg(feature = "float")]
use crate::loader::{load_f16_as_f32, load_f32, load_f64};

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// The width class an argument (or float) was encoded at, derived from the AI class rather than
/// from the numeric value itself: AI<=23 is always width 8, even if the value would fit in fewer
/// bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
}

/// One decoded event, handed to exactly one `Callbacks` method per `decode_one` call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Event<'a> {
    Uint(Width, u64),
    Negint(Width, u64),
    ByteString(&'a [u8]),
    ByteStringStart,
    TextString(&'a [u8]),
    TextStringStart,
    ArrayStart(u64),
    IndefArrayStart,
    MapStart(u64),
    IndefMapStart,
    Tag(u64),
    Boolean(bool),
    Null,
    Undefined,
    Simple(u8),
    #[cfg(feature = "float")]
    Float2(f32),
    #[cfg(feature = "float")]
    Float4(f32),
    #[cfg(feature = "float")]
    Float8(f64),
    IndefBreak,
}

/// Implemented by anything that wants to receive decoded events. `crate::builder::TreeBuilder` is
/// the only implementation shipped in this crate, but `decode_one` only depends on this trait, so
/// the decode loop and the tree assembly stay decoupled.
pub trait Callbacks {
    fn on_event(&mut self, event: Event<'_>);
}

/// The outcome of one `decode_one` call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Exactly one callback fired; `bytes_read` bytes were consumed from the front of the buffer.
    Finished { bytes_read: usize },
    /// Not enough bytes were available to complete the item header (or its immediate payload).
    /// No callback fired and no input was consumed.
    NeedMoreData,
    /// The bytes at the front of the buffer cannot be a valid CBOR item header. No callback
    /// fired and no input was consumed.
    Malformed,
}

/// Read at most one CBOR data item header (plus any definite byte/text string payload) from the
/// front of `buffer`, dispatching exactly one callback on `callbacks` on success. Never reads past
/// `buffer.len()`.
#[cfg_attr(feature = "trace", trace)]
pub fn decode_one<C: Callbacks + ?Sized>(buffer: &[u8], callbacks: &mut C) -> DecodeStatus {
    if buffer.is_empty() {
        return DecodeStatus::NeedMoreData;
    }
    let ib = buffer[0];
    let (mt, ai) = split_initial_byte(ib);

    let (width, arg, header_len) = match decode_argument(buffer, ai) {
        Ok(a) => a,
        Err(status) => return status,
    };

    match mt {
        MT_UINT => {
            let arg = match arg {
                Some(v) => v,
                None => return DecodeStatus::Malformed,
            };
            callbacks.on_event(Event::Uint(width, arg));
            DecodeStatus::Finished { bytes_read: header_len }
        }
        MT_NINT => {
            let arg = match arg {
                Some(v) => v,
                None => return DecodeStatus::Malformed,
            };
            callbacks.on_event(Event::Negint(width, arg));
            DecodeStatus::Finished { bytes_read: header_len }
        }
        MT_BSTR | MT_TSTR => match arg {
            Some(len) => {
                let len = len as usize;
                let total = match header_len.checked_add(len) {
                    Some(t) => t,
                    None => return DecodeStatus::Malformed,
                };
                if buffer.len() < total {
                    return DecodeStatus::NeedMoreData;
                }
                let payload = &buffer[header_len..total];
                if mt == MT_BSTR {
                    callbacks.on_event(Event::ByteString(payload));
                } else {
                    callbacks.on_event(Event::TextString(payload));
                }
                DecodeStatus::Finished { bytes_read: total }
            }
            None => {
                if mt == MT_BSTR {
                    callbacks.on_event(Event::ByteStringStart);
                } else {
                    callbacks.on_event(Event::TextStringStart);
                }
                DecodeStatus::Finished { bytes_read: header_len }
            }
        },
        MT_ARRAY => {
            match arg {
                Some(n) => callbacks.on_event(Event::ArrayStart(n)),
                None => callbacks.on_event(Event::IndefArrayStart),
            }
            DecodeStatus::Finished { bytes_read: header_len }
        }
        MT_MAP => {
            match arg {
                Some(n) => callbacks.on_event(Event::MapStart(n)),
                None => callbacks.on_event(Event::IndefMapStart),
            }
            DecodeStatus::Finished { bytes_read: header_len }
        }
        MT_TAG => {
            let arg = match arg {
                Some(v) => v,
                None => return DecodeStatus::Malformed,
            };
            callbacks.on_event(Event::Tag(arg));
            DecodeStatus::Finished { bytes_read: header_len }
        }
        MT_FLOAT_SIMPLE => decode_float_or_simple(buffer, ai, callbacks),
        _ => DecodeStatus::Malformed,
    }
}

/// Decode the argument that follows the initial byte, given its AI. Returns the width class, the
/// argument value (`None` for the indefinite-length marker), and the total number of bytes the
/// initial byte plus argument occupy. AI 28/29/30 are reserved and reported as `Malformed`; a
/// truncated argument is reported as `NeedMoreData`.
fn decode_argument(buffer: &[u8], ai: u8) -> Result<(Width, Option<u64>, usize), DecodeStatus> {
    if ai <= AI_MAX_DIRECT {
        return Ok((Width::W8, Some(ai as u64), 1));
    }
    match ai {
        AI_ONE_BYTE => {
            if buffer.len() < 2 {
                return Err(DecodeStatus::NeedMoreData);
            }
            Ok((Width::W8, Some(load_u8(buffer, 1) as u64), 2))
        }
        AI_TWO_BYTES => {
            if buffer.len() < 3 {
                return Err(DecodeStatus::NeedMoreData);
            }
            Ok((Width::W16, Some(load_u16(buffer, 1) as u64), 3))
        }
        AI_FOUR_BYTES => {
            if buffer.len() < 5 {
                return Err(DecodeStatus::NeedMoreData);
            }
            Ok((Width::W32, Some(load_u32(buffer, 1) as u64), 5))
        }
        AI_EIGHT_BYTES => {
            if buffer.len() < 9 {
                return Err(DecodeStatus::NeedMoreData);
            }
            Ok((Width::W64, Some(load_u64(buffer, 1)), 9))
        }
        AI_RESERVED_LO..=AI_RESERVED_HI => Err(DecodeStatus::Malformed),
        AI_INDEFINITE => Ok((Width::W8, None, 1)),
        _ => Err(DecodeStatus::Malformed),
    }
}

#[cfg_attr(feature = "trace", trace)]
fn decode_float_or_simple<C: Callbacks + ?Sized>(
    buffer: &[u8],
    ai: u8,
    callbacks: &mut C,
) -> DecodeStatus {
    match ai {
        0..=SIMPLE_DIRECT_MAX => {
            callbacks.on_event(Event::Simple(ai));
            DecodeStatus::Finished { bytes_read: 1 }
        }
        SIMPLE_FALSE => {
            callbacks.on_event(Event::Boolean(false));
            DecodeStatus::Finished { bytes_read: 1 }
        }
        SIMPLE_TRUE => {
            callbacks.on_event(Event::Boolean(true));
            DecodeStatus::Finished { bytes_read: 1 }
        }
        SIMPLE_NULL => {
            callbacks.on_event(Event::Null);
            DecodeStatus::Finished { bytes_read: 1 }
        }
        SIMPLE_UNDEFINED => {
            callbacks.on_event(Event::Undefined);
            DecodeStatus::Finished { bytes_read: 1 }
        }
        SIMPLE_ONE_BYTE => {
            if buffer.len() < 2 {
                return DecodeStatus::NeedMoreData;
            }
            let code = load_u8(buffer, 1);
            if code < SIMPLE_ONE_BYTE_MIN {
                return DecodeStatus::Malformed;
            }
            callbacks.on_event(Event::Simple(code));
            DecodeStatus::Finished { bytes_read: 2 }
        }
        #[cfg(feature = "float")]
        FLOAT_HALF => {
            if buffer.len() < 3 {
                return DecodeStatus::NeedMoreData;
            }
            callbacks.on_event(Event::Float2(load_f16_as_f32(buffer, 1)));
            DecodeStatus::Finished { bytes_read: 3 }
        }
        #[cfg(not(feature = "float"))]
        FLOAT_HALF => DecodeStatus::Malformed,
        #[cfg(feature = "float")]
        FLOAT_SINGLE => {
            if buffer.len() < 5 {
                return DecodeStatus::NeedMoreData;
            }
            callbacks.on_event(Event::Float4(load_f32(buffer, 1)));
            DecodeStatus::Finished { bytes_read: 5 }
        }
        #[cfg(not(feature = "float"))]
        FLOAT_SINGLE => DecodeStatus::Malformed,
        #[cfg(feature = "float")]
        FLOAT_DOUBLE => {
            if buffer.len() < 9 {
                return DecodeStatus::NeedMoreData;
            }
            callbacks.on_event(Event::Float8(load_f64(buffer, 1)));
            DecodeStatus::Finished { bytes_read: 9 }
        }
        #[cfg(not(feature = "float"))]
        FLOAT_DOUBLE => DecodeStatus::Malformed,
        AI_RESERVED_LO..=AI_RESERVED_HI => DecodeStatus::Malformed,
        AI_INDEFINITE => {
            callbacks.on_event(Event::IndefBreak);
            DecodeStatus::Finished { bytes_read: 1 }
        }
        _ => DecodeStatus::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    struct Recorder {
        events: Vec<alloc::string::String>,
    }

    impl Recorder {
        fn new() -> Self {
            Recorder { events: Vec::new() }
        }
    }

    impl Callbacks for Recorder {
        fn on_event(&mut self, event: Event<'_>) {
            self.events.push(alloc::format!("{:?}", event));
        }
    }

    #[test]
    fn decodes_uint8_zero() {
        let mut r = Recorder::new();
        let status = decode_one(&[0x00], &mut r);
        assert_eq!(status, DecodeStatus::Finished { bytes_read: 1 });
        assert_eq!(r.events.len(), 1);
        assert_eq!(r.events[0], alloc::format!("{:?}", Event::Uint(Width::W8, 0)));
    }

    #[test]
    fn decodes_uint32() {
        let mut r = Recorder::new();
        let status = decode_one(&[0x1a, 0x00, 0x0f, 0x42, 0x40], &mut r);
        assert_eq!(status, DecodeStatus::Finished { bytes_read: 5 });
        assert_eq!(
            r.events[0],
            alloc::format!("{:?}", Event::Uint(Width::W32, 1_000_000))
        );
    }

    #[test]
    fn decodes_negint() {
        let mut r = Recorder::new();
        let status = decode_one(&[0x20], &mut r);
        assert_eq!(status, DecodeStatus::Finished { bytes_read: 1 });
        assert_eq!(r.events[0], alloc::format!("{:?}", Event::Negint(Width::W8, 0)));
    }

    #[test]
    fn decodes_definite_array_header() {
        let mut r = Recorder::new();
        let status = decode_one(&[0x83, 0x01, 0x02, 0x03], &mut r);
        assert_eq!(status, DecodeStatus::Finished { bytes_read: 1 });
        assert_eq!(r.events[0], alloc::format!("{:?}", Event::ArrayStart(3)));
    }

    #[test]
    fn decodes_indefinite_array_header() {
        let mut r = Recorder::new();
        let status = decode_one(&[0x9f, 0x01], &mut r);
        assert_eq!(status, DecodeStatus::Finished { bytes_read: 1 });
        assert_eq!(r.events[0], alloc::format!("{:?}", Event::IndefArrayStart));
    }

    #[test]
    fn decodes_definite_bytestring_payload() {
        let mut r = Recorder::new();
        let status = decode_one(&[0x42, 0x01, 0x02, 0xff], &mut r);
        assert_eq!(status, DecodeStatus::Finished { bytes_read: 3 });
        assert_eq!(
            r.events[0],
            alloc::format!("{:?}", Event::ByteString(&[0x01, 0x02]))
        );
    }

    #[test]
    fn truncated_bytestring_needs_more_data() {
        let mut r = Recorder::new();
        let status = decode_one(&[0x42, 0x01], &mut r);
        assert_eq!(status, DecodeStatus::NeedMoreData);
        assert!(r.events.is_empty());
    }

    #[test]
    fn reserved_additional_info_is_malformed() {
        for ai in [28u8, 29, 30] {
            let mut r = Recorder::new();
            let status = decode_one(&[ai], &mut r);
            assert_eq!(status, DecodeStatus::Malformed);
            assert!(r.events.is_empty());
        }
    }

    #[test]
    fn lone_break_is_finished_at_decoder_level() {
        // the decoder itself just reports the event; the builder rejects a break with no
        // matching frame.
        let mut r = Recorder::new();
        let status = decode_one(&[0xff], &mut r);
        assert_eq!(status, DecodeStatus::Finished { bytes_read: 1 });
        assert_eq!(r.events[0], alloc::format!("{:?}", Event::IndefBreak));
    }

    #[test]
    fn empty_buffer_needs_more_data() {
        let mut r = Recorder::new();
        assert_eq!(decode_one(&[], &mut r), DecodeStatus::NeedMoreData);
    }

    #[test]
    fn tag_header() {
        let mut r = Recorder::new();
        let status = decode_one(&[0xc0], &mut r);
        assert_eq!(status, DecodeStatus::Finished { bytes_read: 1 });
        assert_eq!(r.events[0], alloc::format!("{:?}", Event::Tag(0)));
    }

    #[test]
    fn simple_value_second_byte_below_32_is_malformed() {
        let mut r = Recorder::new();
        let status = decode_one(&[0xf8, 0x10], &mut r);
        assert_eq!(status, DecodeStatus::Malformed);
    }

    #[cfg(feature = "float")]
    #[test]
    fn decodes_double() {
        let mut r = Recorder::new();
        let mut buf = alloc::vec![0xfbu8];
        buf.extend_from_slice(&1.5f64.to_bits().to_be_bytes());
        let status = decode_one(&buf, &mut r);
        assert_eq!(status, DecodeStatus::Finished { bytes_read: 9 });
        assert_eq!(r.events[0], alloc::format!("{:?}", Event::Float8(1.5)));
    }
}
