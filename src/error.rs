/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved.
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
 * libcbor_rs CBOR error API
 *
 * Error types shared across the byte loaders, the streaming decoder, the item model and the
 * tree builder.
 **************************************************************************************************/
use core::result;

#[cfg(feature = "std")]
use thiserror::Error;

/// An alias for `Result<T, CborError>` used throughout this crate.
pub type Result<T> = result::Result<T, CborError>;

/// `CborError` reports why a decode, construction or mutation step failed.
///
/// These are the item/decoder-level errors. [`crate::load::load`] wraps the subset that can
/// escape a full load, together with its own driver-level conditions, in the caller-visible
/// [`crate::load::LoadError`], which additionally carries a byte position (see §6/§7 of the
/// specification this crate implements).
#[cfg_attr(feature = "std", derive(Error))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CborError {
    /// The additional-information field used a reserved encoding (28, 29 or 30).
    #[cfg_attr(feature = "std", error("reserved additional information encoding"))]
    ReservedAdditionalInfo,
    /// Indefinite length (AI=31) is not permitted for this major type (0, 1 or 6).
    #[cfg_attr(feature = "std", error("indefinite length not permitted for this major type"))]
    IndefiniteNotAllowed,
    /// A major-type-7 second byte encoded a simple value below 32, which is reserved.
    #[cfg_attr(feature = "std", error("simple value second byte must encode 32..=255"))]
    BadSimpleValue,
    /// Not enough bytes remain in the buffer to complete the current item header or payload.
    #[cfg_attr(feature = "std", error("buffer ended before the item was complete"))]
    NeedMoreData,
    /// An item was expected to be of one major type but was of another.
    #[cfg_attr(feature = "std", error("item has an incompatible major type for this operation"))]
    IncompatibleType,
    /// A numeric conversion over- or under-flowed the target type's range.
    #[cfg_attr(feature = "std", error("value out of range for target type"))]
    OutOfRange,
    /// An append/attach operation was attempted on a container that is already complete.
    #[cfg_attr(feature = "std", error("container already holds its declared number of children"))]
    ContainerComplete,
    /// A chunk offered to a chunked byte/text string was not a definite-length string of the
    /// matching kind.
    #[cfg_attr(feature = "std", error("chunk is not a definite-length string of the expected kind"))]
    BadChunk,
    /// The builder observed an event illegal given the current stack state: a break with no
    /// matching indefinite frame, a break mid-pair in an indefinite map, or a chunk of the
    /// wrong string kind.
    #[cfg_attr(feature = "std", error("builder-level protocol violation"))]
    SyntaxError,
    /// The configured allocation policy refused this allocation.
    #[cfg_attr(feature = "std", error("allocator refused allocation"))]
    MemError,
    /// Float decoding was requested but the `float` feature is not enabled.
    #[cfg_attr(feature = "std", error("float support not compiled in"))]
    FloatNotSupported,
}
