/***************************************************************************************************
 * Copyright (c) 2020-2022, Qualcomm Innovation Center, Inc. All rights reserved.
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
 * libcbor_rs module definition
 *
 * A streaming CBOR (RFC8949) decoder, reference-counted item model and tree builder, designed for
 * use in constrained systems: the default configuration requires neither the Rust standard library
 * nor (beyond a global allocator) anything but `alloc`.
 **************************************************************************************************/

#![no_std]
#![warn(missing_docs)]

//! # libcbor_rs
//!
//! `libcbor_rs` decodes CBOR ([RFC 8949](https://datatracker.ietf.org/doc/rfc8949/)) into an
//! owned, reference-counted item graph. It is built from three pieces that compose through plain
//! traits rather than inheritance:
//!
//! - [`decode::decode_one`] reads exactly one data item header (and any immediate definite-length
//!   payload) from a byte slice and dispatches a single [`decode::Event`] to a [`decode::Callbacks`]
//!   implementation.
//! - [`builder::TreeBuilder`] is the `Callbacks` implementation that assembles those events into a
//!   complete [`item::Item`] graph using a pushdown stack of pending containers.
//! - [`load::load`] drives the two repeatedly until a single root item has been produced, or an
//!   error with a byte position is returned.
//!
//! Items are owned via [`item::ItemRef`] (`Rc<Item>`); reference cycles cannot occur because
//! well-formed CBOR is a tree, so plain (non-atomic) reference counting is sufficient. See
//! [`item`] for construction, inspection, mutation and deep-copy operations.
//!
//! ## Features
//!
//! - `std`: implements `std::error::Error` for [`error::CborError`] via `thiserror`. Required by
//!   the test suite.
//! - `trace`: function entry/exit tracing via `func_trace`, for debugging decode/build issues.
//!   Implies `std`.
//! - `float`: enables half/single/double precision float decoding and item construction. Enabled
//!   by default.
//!
//! ## Example
//!
//! ```
//! use libcbor_rs::load::load;
//! use libcbor_rs::load::LoadError;
//! use libcbor_rs::item;
//!
//! fn main() -> Result<(), LoadError> {
//!     let item = load(&[0x83, 0x01, 0x02, 0x03])?;
//!     assert_eq!(item::size(&item), Some(3));
//!     Ok(())
//! }
//! ```

extern crate alloc;

#[cfg(any(feature = "std", feature = "trace", test))]
extern crate std;

pub mod alloc_policy;
pub mod builder;
pub(crate) mod constants;
pub mod decode;
/// Error types shared across the byte loaders, decoder, item model and builder.
pub mod error;
pub mod item;
pub mod load;
pub(crate) mod loader;
