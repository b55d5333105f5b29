/***************************************************************************************************
 * Copyright (c) 2020-2022 Qualcomm Innovation Center, Inc. All rights reserved.
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
 * libcbor_rs CBOR item model
 *
 * The tagged-union item representation described by the data model: eight major types, each with
 * metadata whose shape depends on the type, shared ownership via reference counting, and deep-copy
 * routines. This plays the role the teacher's `ast.rs` plays for its borrowed `CBOR<'buf>` enum,
 * but every item here owns its data so it can be built incrementally by a streaming decoder and
 * outlive the buffer it was decoded from.
 **************************************************************************************************/
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::convert::TryFrom;

use crate::alloc_policy::AllocPolicy;
use crate::error::CborError;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// A reference-counted handle to an [`Item`]. `incref`/`decref`/`refcount` in this module are
/// thin wrappers over `Rc::clone`, `Drop` and `Rc::strong_count` respectively, kept explicit so
/// the reference-counting properties are directly testable even though ordinary code using this
/// crate just relies on `Clone`/`Drop`.
pub type ItemRef = Rc<Item>;

/// The width an integer or float item was encoded (or is to be encoded) at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

/// The sub-kind of a major-type-7 (float/simple) item.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SimpleKind {
    /// A simple value (including the logical booleans, null and undefined) carried as its raw
    /// code. 20/21/22/23 are false/true/null/undefined; all other values 0..=19, 32..=255 are
    /// opaque application-defined codes.
    Ctrl0(u8),
    /// A half-precision float, already expanded to `f32` by the byte loader.
    Half(f32),
    /// A single-precision float.
    Single(f32),
    /// A double-precision float.
    Double(f64),
}

/// The eight CBOR major types, exposed as a cheap O(1) discriminant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MajorType {
    UnsignedInt,
    NegativeInt,
    ByteString,
    TextString,
    Array,
    Map,
    Tag,
    FloatOrSimple,
}

/// The backing storage of a byte/text string: either a contiguous owned buffer (definite) or an
/// ordered sequence of definite-length same-kind string items (indefinite, not yet collapsed).
#[derive(Debug)]
pub enum StringBody {
    Bytes(Rc<[u8]>),
    Chunks(Vec<ItemRef>),
}

/// Shared representation for `ByteString` and `TextString` items; the owning [`Item`] variant
/// says which one it is. Text bytes are **not** validated as UTF-8 at construction, matching the
/// specification's "bytes are not validated beyond length."
#[derive(Debug)]
pub struct StringData {
    definite: bool,
    body: RefCell<StringBody>,
}

/// Array payload: an ordered sequence of item references, with an optional declared size.
#[derive(Debug)]
pub struct ArrayData {
    definite: bool,
    declared_size: Option<usize>,
    children: RefCell<Vec<ItemRef>>,
}

/// Map payload: an ordered sequence of (key, value) pairs, duplicates permitted.
#[derive(Debug)]
pub struct MapData {
    definite: bool,
    declared_pairs: Option<usize>,
    entries: RefCell<Vec<(ItemRef, ItemRef)>>,
}

/// Tag payload: a `u64` tag value plus exactly one child item, attached after construction.
#[derive(Debug)]
pub struct TagData {
    tag: u64,
    child: RefCell<Option<ItemRef>>,
}

/// The universal CBOR value. See the module documentation for the shape of each major type's
/// metadata and payload.
#[derive(Debug)]
pub enum Item {
    UnsignedInt { width: IntWidth, value: u64 },
    NegativeInt { width: IntWidth, magnitude: u64 },
    ByteString(StringData),
    TextString(StringData),
    Array(ArrayData),
    Map(MapData),
    Tag(TagData),
    FloatOrSimple(SimpleKind),
}

/***************************************************************************************************
 * Reference counting
 **************************************************************************************************/

/// Increment the reference count and return a fresh handle to the same item.
#[inline]
#[cfg_attr(feature = "trace", trace)]
pub fn incref(item: &ItemRef) -> ItemRef {
    Rc::clone(item)
}

/// Decrement the reference count carried by `item`, dropping it and nulling the handle. If the
/// count reaches zero, children are decremented in turn by `Item`'s ordinary `Drop` glide down
/// its `Rc` children, recursively freeing the whole subtree with no extra bookkeeping required
/// here.
#[inline]
#[cfg_attr(feature = "trace", trace)]
pub fn decref(item: &mut Option<ItemRef>) {
    *item = None;
}

/// The current reference count of `item`.
#[inline]
#[cfg_attr(feature = "trace", trace)]
pub fn refcount(item: &ItemRef) -> usize {
    Rc::strong_count(item)
}

/***************************************************************************************************
 * Fallible constructors (policy-gated; used by the tree builder)
 **************************************************************************************************/

macro_rules! try_alloc_or_none {
    ($policy:expr) => {
        if !$policy.try_alloc() {
            return None;
        }
    };
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_uint(policy: &mut dyn AllocPolicy, width: IntWidth, value: u64) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::UnsignedInt { width, value }))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_negint(policy: &mut dyn AllocPolicy, width: IntWidth, magnitude: u64) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::NegativeInt { width, magnitude }))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_bytestring_from_owned(policy: &mut dyn AllocPolicy, bytes: Vec<u8>) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::ByteString(StringData {
        definite: true,
        body: RefCell::new(StringBody::Bytes(bytes.into())),
    })))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_bytestring_indefinite(policy: &mut dyn AllocPolicy) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::ByteString(StringData {
        definite: false,
        body: RefCell::new(StringBody::Chunks(Vec::new())),
    })))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_textstring_from_owned(policy: &mut dyn AllocPolicy, bytes: Vec<u8>) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::TextString(StringData {
        definite: true,
        body: RefCell::new(StringBody::Bytes(bytes.into())),
    })))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_textstring_indefinite(policy: &mut dyn AllocPolicy) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::TextString(StringData {
        definite: false,
        body: RefCell::new(StringBody::Chunks(Vec::new())),
    })))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_array_definite(policy: &mut dyn AllocPolicy, size: usize) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::Array(ArrayData {
        definite: true,
        declared_size: Some(size),
        children: RefCell::new(Vec::new()),
    })))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_array_indefinite(policy: &mut dyn AllocPolicy) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::Array(ArrayData {
        definite: false,
        declared_size: None,
        children: RefCell::new(Vec::new()),
    })))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_map_definite(policy: &mut dyn AllocPolicy, pairs: usize) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::Map(MapData {
        definite: true,
        declared_pairs: Some(pairs),
        entries: RefCell::new(Vec::new()),
    })))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_map_indefinite(policy: &mut dyn AllocPolicy) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::Map(MapData {
        definite: false,
        declared_pairs: None,
        entries: RefCell::new(Vec::new()),
    })))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_tag(policy: &mut dyn AllocPolicy, tag: u64) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::Tag(TagData {
        tag,
        child: RefCell::new(None),
    })))
}

#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_simple(policy: &mut dyn AllocPolicy, code: u8) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::FloatOrSimple(SimpleKind::Ctrl0(code))))
}

#[cfg(feature = "float")]
#[cfg_attr(feature = "trace", trace)]
pub(crate) fn try_new_float(policy: &mut dyn AllocPolicy, kind: SimpleKind) -> Option<ItemRef> {
    try_alloc_or_none!(policy);
    Some(Rc::new(Item::FloatOrSimple(kind)))
}

/***************************************************************************************************
 * Ergonomic (infallible) constructors for callers building items by hand, e.g. for encoding.
 * These build the item directly rather than routing through the policy-gated path above, since
 * there is no policy here to consult and so nothing to fail.
 **************************************************************************************************/

/// Construct an unsigned integer item. Always succeeds.
pub fn uint(width: IntWidth, value: u64) -> ItemRef {
    Rc::new(Item::UnsignedInt { width, value })
}

/// Construct a negative integer item from its raw magnitude `m` (logical value `-1 - m`).
pub fn negint(width: IntWidth, magnitude: u64) -> ItemRef {
    Rc::new(Item::NegativeInt { width, magnitude })
}

/// Construct a definite-length byte string from an owned buffer.
pub fn from_owned_bytes(bytes: Vec<u8>) -> ItemRef {
    Rc::new(Item::ByteString(StringData {
        definite: true,
        body: RefCell::new(StringBody::Bytes(bytes.into())),
    }))
}

/// Construct an (initially empty) indefinite-length byte string, ready to receive chunks via
/// [`bytestring_add_chunk`].
pub fn bytestring_indefinite() -> ItemRef {
    Rc::new(Item::ByteString(StringData {
        definite: false,
        body: RefCell::new(StringBody::Chunks(Vec::new())),
    }))
}

/// Construct a definite-length text string from owned bytes. The bytes are not validated as
/// UTF-8; use [`as_str`] to attempt validated access later.
pub fn from_owned_text(bytes: Vec<u8>) -> ItemRef {
    Rc::new(Item::TextString(StringData {
        definite: true,
        body: RefCell::new(StringBody::Bytes(bytes.into())),
    }))
}

/// Construct an (initially empty) indefinite-length text string.
pub fn textstring_indefinite() -> ItemRef {
    Rc::new(Item::TextString(StringData {
        definite: false,
        body: RefCell::new(StringBody::Chunks(Vec::new())),
    }))
}

/// Construct a definite-length array with the given declared size. Children are appended with
/// [`array_push`].
pub fn array_definite(size: usize) -> ItemRef {
    Rc::new(Item::Array(ArrayData {
        definite: true,
        declared_size: Some(size),
        children: RefCell::new(Vec::new()),
    }))
}

/// Construct an indefinite-length array.
pub fn array_indefinite() -> ItemRef {
    Rc::new(Item::Array(ArrayData {
        definite: false,
        declared_size: None,
        children: RefCell::new(Vec::new()),
    }))
}

/// Construct a definite-length map with the given declared pair count.
pub fn map_definite(pairs: usize) -> ItemRef {
    Rc::new(Item::Map(MapData {
        definite: true,
        declared_pairs: Some(pairs),
        entries: RefCell::new(Vec::new()),
    }))
}

/// Construct an indefinite-length map.
pub fn map_indefinite() -> ItemRef {
    Rc::new(Item::Map(MapData {
        definite: false,
        declared_pairs: None,
        entries: RefCell::new(Vec::new()),
    }))
}

/// Construct a tag item with the given tag value. Attach its child with [`tag_set_child`].
pub fn tag(value: u64) -> ItemRef {
    Rc::new(Item::Tag(TagData {
        tag: value,
        child: RefCell::new(None),
    }))
}

/// Construct a simple-value item from its raw code (0..=19 or 32..=255; 20..=23 are the logical
/// booleans/null/undefined, constructible via [`boolean_item`], [`null_item`], [`undefined_item`]).
pub fn simple(code: u8) -> ItemRef {
    Rc::new(Item::FloatOrSimple(SimpleKind::Ctrl0(code)))
}

/// Construct the logical boolean `true`/`false`.
pub fn boolean_item(value: bool) -> ItemRef {
    simple(if value { 21 } else { 20 })
}

/// Construct the logical `null`.
pub fn null_item() -> ItemRef {
    simple(22)
}

/// Construct the logical `undefined`.
pub fn undefined_item() -> ItemRef {
    simple(23)
}

#[cfg(feature = "float")]
pub fn half_item(value: f32) -> ItemRef {
    Rc::new(Item::FloatOrSimple(SimpleKind::Half(value)))
}

#[cfg(feature = "float")]
pub fn single_item(value: f32) -> ItemRef {
    Rc::new(Item::FloatOrSimple(SimpleKind::Single(value)))
}

#[cfg(feature = "float")]
pub fn double_item(value: f64) -> ItemRef {
    Rc::new(Item::FloatOrSimple(SimpleKind::Double(value)))
}

/***************************************************************************************************
 * Mutators
 *
 * Only legal on not-yet-completed containers (definite containers below their declared size, or
 * any indefinite container/string). Each returns whether the mutation completed the container, a
 * signal the tree builder uses to cascade frame completion (see `crate::builder`).
 **************************************************************************************************/

/// Append `child` to `arr`, adopting ownership of it. Returns `Ok(true)` if this append brought a
/// definite array to its declared size (an indefinite array never reports complete here; that is
/// signalled by `indef_break`).
#[cfg_attr(feature = "trace", trace)]
pub fn array_push(arr: &ItemRef, child: ItemRef) -> Result<bool, CborError> {
    match &**arr {
        Item::Array(data) => {
            if let Some(n) = data.declared_size {
                if data.children.borrow().len() >= n {
                    return Err(CborError::ContainerComplete);
                }
            }
            data.children.borrow_mut().push(child);
            Ok(match data.declared_size {
                Some(n) => data.children.borrow().len() == n,
                None => false,
            })
        }
        _ => Err(CborError::IncompatibleType),
    }
}

/// Add a (key, value) pair to `map`, adopting ownership of both. Returns `Ok(true)` if this pair
/// brought a definite map to its declared pair count.
#[cfg_attr(feature = "trace", trace)]
pub fn map_add(map: &ItemRef, key: ItemRef, value: ItemRef) -> Result<bool, CborError> {
    match &**map {
        Item::Map(data) => {
            if let Some(n) = data.declared_pairs {
                if data.entries.borrow().len() >= n {
                    return Err(CborError::ContainerComplete);
                }
            }
            data.entries.borrow_mut().push((key, value));
            Ok(match data.declared_pairs {
                Some(n) => data.entries.borrow().len() == n,
                None => false,
            })
        }
        _ => Err(CborError::IncompatibleType),
    }
}

/// Append a definite byte-string `chunk` to an indefinite byte string, adopting ownership.
#[cfg_attr(feature = "trace", trace)]
pub fn bytestring_add_chunk(bs: &ItemRef, chunk: ItemRef) -> Result<(), CborError> {
    match &**bs {
        Item::ByteString(data) if !data.definite => match &*chunk {
            Item::ByteString(cd) if cd.definite => {
                if let StringBody::Chunks(v) = &mut *data.body.borrow_mut() {
                    v.push(Rc::clone(&chunk));
                    Ok(())
                } else {
                    Err(CborError::IncompatibleType)
                }
            }
            _ => Err(CborError::BadChunk),
        },
        _ => Err(CborError::IncompatibleType),
    }
}

/// Append a definite text-string `chunk` to an indefinite text string, adopting ownership.
#[cfg_attr(feature = "trace", trace)]
pub fn string_add_chunk(ts: &ItemRef, chunk: ItemRef) -> Result<(), CborError> {
    match &**ts {
        Item::TextString(data) if !data.definite => match &*chunk {
            Item::TextString(cd) if cd.definite => {
                if let StringBody::Chunks(v) = &mut *data.body.borrow_mut() {
                    v.push(Rc::clone(&chunk));
                    Ok(())
                } else {
                    Err(CborError::IncompatibleType)
                }
            }
            _ => Err(CborError::BadChunk),
        },
        _ => Err(CborError::IncompatibleType),
    }
}

/// Attach `child` as the single child of `tag_item`, adopting ownership. Fails if a child is
/// already attached.
#[cfg_attr(feature = "trace", trace)]
pub fn tag_set_child(tag_item: &ItemRef, child: ItemRef) -> Result<(), CborError> {
    match &**tag_item {
        Item::Tag(data) => {
            if data.child.borrow().is_some() {
                return Err(CborError::ContainerComplete);
            }
            *data.child.borrow_mut() = Some(child);
            Ok(())
        }
        _ => Err(CborError::IncompatibleType),
    }
}

/***************************************************************************************************
 * Accessors (all O(1) except `bytes`/`structurally_equal`/`copy*`, which are linear in the size
 * of the (sub)graph they touch, as document by the operation itself).
 **************************************************************************************************/

/// The major type of `item`.
pub fn major_type(item: &Item) -> MajorType {
    match item {
        Item::UnsignedInt { .. } => MajorType::UnsignedInt,
        Item::NegativeInt { .. } => MajorType::NegativeInt,
        Item::ByteString(_) => MajorType::ByteString,
        Item::TextString(_) => MajorType::TextString,
        Item::Array(_) => MajorType::Array,
        Item::Map(_) => MajorType::Map,
        Item::Tag(_) => MajorType::Tag,
        Item::FloatOrSimple(_) => MajorType::FloatOrSimple,
    }
}

/// The declared integer width, for `UnsignedInt`/`NegativeInt` items.
pub fn width(item: &Item) -> Option<IntWidth> {
    match item {
        Item::UnsignedInt { width, .. } | Item::NegativeInt { width, .. } => Some(*width),
        _ => None,
    }
}

/// Whether this item uses definite-length encoding. Integers, tags and float/simple items are
/// always "definite" in the trivial sense that they have no length to declare; this returns
/// `true` for those so callers can treat it as "not an open-ended construct."
pub fn is_definite(item: &Item) -> bool {
    match item {
        Item::ByteString(d) | Item::TextString(d) => d.definite,
        Item::Array(d) => d.definite,
        Item::Map(d) => d.definite,
        _ => true,
    }
}

/// For a byte/text string: the byte length if definite, or the chunk count if indefinite.
pub fn string_len_or_chunk_count(item: &Item) -> Option<usize> {
    let data = match item {
        Item::ByteString(d) | Item::TextString(d) => d,
        _ => return None,
    };
    match &*data.body.borrow() {
        StringBody::Bytes(b) => Some(b.len()),
        StringBody::Chunks(c) => Some(c.len()),
    }
}

/// For an array or map: the number of entries currently held (equal to the declared size once a
/// definite container is complete; whatever has been appended so far for an indefinite one).
pub fn size(item: &Item) -> Option<usize> {
    match item {
        Item::Array(d) => Some(d.children.borrow().len()),
        Item::Map(d) => Some(d.entries.borrow().len()),
        _ => None,
    }
}

/// The number of chunks making up an indefinite-length string, or `None` for a definite one or a
/// non-string item.
pub fn chunk_count(item: &Item) -> Option<usize> {
    let data = match item {
        Item::ByteString(d) | Item::TextString(d) => d,
        _ => return None,
    };
    match &*data.body.borrow() {
        StringBody::Chunks(c) => Some(c.len()),
        StringBody::Bytes(_) => None,
    }
}

/// The `i`-th chunk of an indefinite-length string.
pub fn chunk(item: &Item, i: usize) -> Option<ItemRef> {
    let data = match item {
        Item::ByteString(d) | Item::TextString(d) => d,
        _ => return None,
    };
    match &*data.body.borrow() {
        StringBody::Chunks(c) => c.get(i).cloned(),
        StringBody::Bytes(_) => None,
    }
}

/// The contiguous byte buffer of a definite-length byte/text string. `None` for an indefinite
/// (not yet collapsed) string or a non-string item.
pub fn bytes(item: &Item) -> Option<Rc<[u8]>> {
    let data = match item {
        Item::ByteString(d) | Item::TextString(d) => d,
        _ => return None,
    };
    match &*data.body.borrow() {
        StringBody::Bytes(b) => Some(Rc::clone(b)),
        StringBody::Chunks(_) => None,
    }
}

/// Attempt to interpret a definite text string's bytes as UTF-8. Returns `None` if the item is
/// not a definite text string, or if its bytes are not valid UTF-8 (the specification does not
/// require the builder to validate this at decode time).
pub fn as_str(item: &Item) -> Option<alloc::string::String> {
    match item {
        Item::TextString(d) => match &*d.body.borrow() {
            StringBody::Bytes(b) => core::str::from_utf8(b).ok().map(|s| s.into()),
            StringBody::Chunks(_) => None,
        },
        _ => None,
    }
}

/// The codepoint count of a definite text string, if its bytes are valid UTF-8.
pub fn codepoint_count(item: &Item) -> Option<usize> {
    as_str(item).map(|s| s.chars().count())
}

/// The n-th element of an array, or the n-th array element of a definite/complete container.
pub fn array_get(item: &Item, i: usize) -> Option<ItemRef> {
    match item {
        Item::Array(d) => d.children.borrow().get(i).cloned(),
        _ => None,
    }
}

/// The n-th (key, value) pair of a map.
pub fn map_get_pair(item: &Item, i: usize) -> Option<(ItemRef, ItemRef)> {
    match item {
        Item::Map(d) => d.entries.borrow().get(i).cloned(),
        _ => None,
    }
}

/// The tag value of a `Tag` item.
pub fn tag_value(item: &Item) -> Option<u64> {
    match item {
        Item::Tag(d) => Some(d.tag),
        _ => None,
    }
}

/// The (single) child of a `Tag` item, once attached.
pub fn tag_child(item: &Item) -> Option<ItemRef> {
    match item {
        Item::Tag(d) => d.child.borrow().clone(),
        _ => None,
    }
}

/// The float payload of a `FloatOrSimple` item, widened to `f64`. `None` for a `Ctrl0` (simple
/// value) item or a non-float item.
pub fn float_value(item: &Item) -> Option<f64> {
    match item {
        Item::FloatOrSimple(SimpleKind::Half(v)) | Item::FloatOrSimple(SimpleKind::Single(v)) => {
            Some(*v as f64)
        }
        Item::FloatOrSimple(SimpleKind::Double(v)) => Some(*v),
        _ => None,
    }
}

/// The raw simple-value code of a `Ctrl0` item (including 20..=23 for false/true/null/undefined).
pub fn simple_value(item: &Item) -> Option<u8> {
    match item {
        Item::FloatOrSimple(SimpleKind::Ctrl0(code)) => Some(*code),
        _ => None,
    }
}

/// The logical boolean value, if this item is `Ctrl0(20)` or `Ctrl0(21)`.
pub fn boolean(item: &Item) -> Option<bool> {
    match simple_value(item) {
        Some(20) => Some(false),
        Some(21) => Some(true),
        _ => None,
    }
}

/// Whether this item is the logical `null` (`Ctrl0(22)`).
pub fn is_null(item: &Item) -> bool {
    simple_value(item) == Some(22)
}

/// Whether this item is the logical `undefined` (`Ctrl0(23)`).
pub fn is_undefined(item: &Item) -> bool {
    simple_value(item) == Some(23)
}

/***************************************************************************************************
 * Deep copy
 **************************************************************************************************/

/// Reproduce `item`'s structure verbatim, preserving indefinite-length flags where present.
/// Immutable byte buffers are shared (via `Rc<[u8]>` cloning) rather than duplicated, which is
/// observationally identical to a byte-for-byte copy since those buffers are never mutated again
/// after construction.
#[cfg_attr(feature = "trace", trace)]
pub fn copy(item: &ItemRef) -> ItemRef {
    match &**item {
        Item::UnsignedInt { width, value } => Rc::new(Item::UnsignedInt {
            width: *width,
            value: *value,
        }),
        Item::NegativeInt { width, magnitude } => Rc::new(Item::NegativeInt {
            width: *width,
            magnitude: *magnitude,
        }),
        Item::ByteString(d) => Rc::new(Item::ByteString(copy_string_data(d))),
        Item::TextString(d) => Rc::new(Item::TextString(copy_string_data(d))),
        Item::Array(d) => {
            let children: Vec<ItemRef> = d.children.borrow().iter().map(copy).collect();
            Rc::new(Item::Array(ArrayData {
                definite: d.definite,
                declared_size: d.declared_size,
                children: RefCell::new(children),
            }))
        }
        Item::Map(d) => {
            let entries: Vec<(ItemRef, ItemRef)> = d
                .entries
                .borrow()
                .iter()
                .map(|(k, v)| (copy(k), copy(v)))
                .collect();
            Rc::new(Item::Map(MapData {
                definite: d.definite,
                declared_pairs: d.declared_pairs,
                entries: RefCell::new(entries),
            }))
        }
        Item::Tag(d) => {
            let child = d.child.borrow().as_ref().map(copy);
            Rc::new(Item::Tag(TagData {
                tag: d.tag,
                child: RefCell::new(child),
            }))
        }
        Item::FloatOrSimple(k) => Rc::new(Item::FloatOrSimple(*k)),
    }
}

fn copy_string_data(d: &StringData) -> StringData {
    let body = match &*d.body.borrow() {
        StringBody::Bytes(b) => StringBody::Bytes(Rc::clone(b)),
        StringBody::Chunks(v) => StringBody::Chunks(v.iter().map(copy).collect()),
    };
    StringData {
        definite: d.definite,
        body: RefCell::new(body),
    }
}

/// Reproduce `item`'s structure, collapsing chunked strings to contiguous buffers and indefinite
/// arrays/maps to definite containers sized at the count of children they currently hold.
/// Integer, float and tag semantics are preserved unchanged.
#[cfg_attr(feature = "trace", trace)]
pub fn copy_definite(item: &ItemRef) -> ItemRef {
    match &**item {
        Item::UnsignedInt { width, value } => Rc::new(Item::UnsignedInt {
            width: *width,
            value: *value,
        }),
        Item::NegativeInt { width, magnitude } => Rc::new(Item::NegativeInt {
            width: *width,
            magnitude: *magnitude,
        }),
        Item::ByteString(d) => Rc::new(Item::ByteString(collapse_string_data(d))),
        Item::TextString(d) => Rc::new(Item::TextString(collapse_string_data(d))),
        Item::Array(d) => {
            let children: Vec<ItemRef> = d.children.borrow().iter().map(copy_definite).collect();
            let n = children.len();
            Rc::new(Item::Array(ArrayData {
                definite: true,
                declared_size: Some(n),
                children: RefCell::new(children),
            }))
        }
        Item::Map(d) => {
            let entries: Vec<(ItemRef, ItemRef)> = d
                .entries
                .borrow()
                .iter()
                .map(|(k, v)| (copy_definite(k), copy_definite(v)))
                .collect();
            let n = entries.len();
            Rc::new(Item::Map(MapData {
                definite: true,
                declared_pairs: Some(n),
                entries: RefCell::new(entries),
            }))
        }
        Item::Tag(d) => {
            let child = d.child.borrow().as_ref().map(copy_definite);
            Rc::new(Item::Tag(TagData {
                tag: d.tag,
                child: RefCell::new(child),
            }))
        }
        Item::FloatOrSimple(k) => Rc::new(Item::FloatOrSimple(*k)),
    }
}

fn collapse_string_data(d: &StringData) -> StringData {
    match &*d.body.borrow() {
        StringBody::Bytes(b) => StringData {
            definite: true,
            body: RefCell::new(StringBody::Bytes(Rc::clone(b))),
        },
        StringBody::Chunks(chunks) => {
            let mut buf: Vec<u8> = Vec::new();
            for c in chunks {
                if let Some(b) = bytes(c) {
                    buf.extend_from_slice(&b);
                }
            }
            StringData {
                definite: true,
                body: RefCell::new(StringBody::Bytes(buf.into())),
            }
        }
    }
}

/// Structural equality: same major type, same metadata (width/definite flags/declared sizes/tag
/// value), same payload, recursively for containers. Used by the test suite to verify the §8
/// "`copy`/`copy_definite` reproduce structure" properties; not a general `PartialEq` because CBOR
/// graphs can be deep and cyclic-looking equality checks are rarely what a consumer wants as a
/// derived trait.
pub fn structurally_equal(a: &ItemRef, b: &ItemRef) -> bool {
    match (&**a, &**b) {
        (
            Item::UnsignedInt { width: w1, value: v1 },
            Item::UnsignedInt { width: w2, value: v2 },
        ) => w1 == w2 && v1 == v2,
        (
            Item::NegativeInt { width: w1, magnitude: m1 },
            Item::NegativeInt { width: w2, magnitude: m2 },
        ) => w1 == w2 && m1 == m2,
        (Item::ByteString(d1), Item::ByteString(d2)) => string_data_equal(d1, d2),
        (Item::TextString(d1), Item::TextString(d2)) => string_data_equal(d1, d2),
        (Item::Array(d1), Item::Array(d2)) => {
            d1.definite == d2.definite
                && d1.declared_size == d2.declared_size
                && {
                    let c1 = d1.children.borrow();
                    let c2 = d2.children.borrow();
                    c1.len() == c2.len() && c1.iter().zip(c2.iter()).all(|(x, y)| structurally_equal(x, y))
                }
        }
        (Item::Map(d1), Item::Map(d2)) => {
            d1.definite == d2.definite
                && d1.declared_pairs == d2.declared_pairs
                && {
                    let e1 = d1.entries.borrow();
                    let e2 = d2.entries.borrow();
                    e1.len() == e2.len()
                        && e1.iter().zip(e2.iter()).all(|((k1, v1), (k2, v2))| {
                            structurally_equal(k1, k2) && structurally_equal(v1, v2)
                        })
                }
        }
        (Item::Tag(d1), Item::Tag(d2)) => {
            d1.tag == d2.tag
                && match (&*d1.child.borrow(), &*d2.child.borrow()) {
                    (Some(c1), Some(c2)) => structurally_equal(c1, c2),
                    (None, None) => true,
                    _ => false,
                }
        }
        (Item::FloatOrSimple(k1), Item::FloatOrSimple(k2)) => k1 == k2,
        _ => false,
    }
}

fn string_data_equal(d1: &StringData, d2: &StringData) -> bool {
    if d1.definite != d2.definite {
        return false;
    }
    match (&*d1.body.borrow(), &*d2.body.borrow()) {
        (StringBody::Bytes(b1), StringBody::Bytes(b2)) => b1 == b2,
        (StringBody::Chunks(c1), StringBody::Chunks(c2)) => {
            c1.len() == c2.len() && c1.iter().zip(c2.iter()).all(|(x, y)| structurally_equal(x, y))
        }
        _ => false,
    }
}

/***************************************************************************************************
 * Standard trait implementations: primitive conversions, mirroring the teacher's `ast.rs` but
 * adapted to the owned, refcounted item instead of a borrowed enum.
 **************************************************************************************************/

impl From<bool> for ItemRef {
    fn from(v: bool) -> Self {
        boolean_item(v)
    }
}

impl From<u8> for ItemRef {
    fn from(v: u8) -> Self {
        uint(IntWidth::W8, v as u64)
    }
}

impl From<u16> for ItemRef {
    fn from(v: u16) -> Self {
        uint(IntWidth::W16, v as u64)
    }
}

impl From<u32> for ItemRef {
    fn from(v: u32) -> Self {
        uint(IntWidth::W32, v as u64)
    }
}

impl From<u64> for ItemRef {
    fn from(v: u64) -> Self {
        uint(IntWidth::W64, v)
    }
}

impl From<i8> for ItemRef {
    fn from(v: i8) -> Self {
        if v < 0 {
            negint(IntWidth::W8, (-1 - v as i64) as u64)
        } else {
            uint(IntWidth::W8, v as u64)
        }
    }
}

impl From<i16> for ItemRef {
    fn from(v: i16) -> Self {
        if v < 0 {
            negint(IntWidth::W16, (-1 - v as i64) as u64)
        } else {
            uint(IntWidth::W16, v as u64)
        }
    }
}

impl From<i32> for ItemRef {
    fn from(v: i32) -> Self {
        if v < 0 {
            negint(IntWidth::W32, (-1 - v as i64) as u64)
        } else {
            uint(IntWidth::W32, v as u64)
        }
    }
}

impl From<i64> for ItemRef {
    fn from(v: i64) -> Self {
        if v < 0 {
            negint(IntWidth::W64, (-1 - v) as u64)
        } else {
            uint(IntWidth::W64, v as u64)
        }
    }
}

/// Attempt to convert an item into `u8`. Fails with `IncompatibleType` for non-integers and
/// `OutOfRange` for unsigned integers that overflow `u8`.
impl TryFrom<&Item> for u8 {
    type Error = CborError;

    fn try_from(item: &Item) -> Result<Self, Self::Error> {
        match item {
            Item::UnsignedInt { value, .. } if *value <= u8::MAX as u64 => Ok(*value as u8),
            Item::UnsignedInt { .. } => Err(CborError::OutOfRange),
            _ => Err(CborError::IncompatibleType),
        }
    }
}

impl TryFrom<&Item> for u16 {
    type Error = CborError;

    fn try_from(item: &Item) -> Result<Self, Self::Error> {
        match item {
            Item::UnsignedInt { value, .. } if *value <= u16::MAX as u64 => Ok(*value as u16),
            Item::UnsignedInt { .. } => Err(CborError::OutOfRange),
            _ => Err(CborError::IncompatibleType),
        }
    }
}

impl TryFrom<&Item> for u32 {
    type Error = CborError;

    fn try_from(item: &Item) -> Result<Self, Self::Error> {
        match item {
            Item::UnsignedInt { value, .. } if *value <= u32::MAX as u64 => Ok(*value as u32),
            Item::UnsignedInt { .. } => Err(CborError::OutOfRange),
            _ => Err(CborError::IncompatibleType),
        }
    }
}

impl TryFrom<&Item> for u64 {
    type Error = CborError;

    fn try_from(item: &Item) -> Result<Self, Self::Error> {
        match item {
            Item::UnsignedInt { value, .. } => Ok(*value),
            _ => Err(CborError::IncompatibleType),
        }
    }
}

/// Signed conversions follow the same rule the teacher documents: for a positive value it is
/// sufficient to check the magnitude fits, and for a negative value (`NegativeInt`, logical value
/// `-1 - m`) it is sufficient to check that `m` fits, since the representable minimum is then
/// `-1 - (2^(n-1) - 1)`, exactly `iN::MIN`.
impl TryFrom<&Item> for i8 {
    type Error = CborError;

    fn try_from(item: &Item) -> Result<Self, Self::Error> {
        match item {
            Item::UnsignedInt { value, .. } if *value <= i8::MAX as u64 => Ok(*value as i8),
            Item::UnsignedInt { .. } => Err(CborError::OutOfRange),
            Item::NegativeInt { magnitude, .. } if *magnitude <= i8::MAX as u64 => {
                Ok(-1 - *magnitude as i8)
            }
            Item::NegativeInt { .. } => Err(CborError::OutOfRange),
            _ => Err(CborError::IncompatibleType),
        }
    }
}

impl TryFrom<&Item> for i16 {
    type Error = CborError;

    fn try_from(item: &Item) -> Result<Self, Self::Error> {
        match item {
            Item::UnsignedInt { value, .. } if *value <= i16::MAX as u64 => Ok(*value as i16),
            Item::UnsignedInt { .. } => Err(CborError::OutOfRange),
            Item::NegativeInt { magnitude, .. } if *magnitude <= i16::MAX as u64 => {
                Ok(-1 - *magnitude as i16)
            }
            Item::NegativeInt { .. } => Err(CborError::OutOfRange),
            _ => Err(CborError::IncompatibleType),
        }
    }
}

impl TryFrom<&Item> for i32 {
    type Error = CborError;

    fn try_from(item: &Item) -> Result<Self, Self::Error> {
        match item {
            Item::UnsignedInt { value, .. } if *value <= i32::MAX as u64 => Ok(*value as i32),
            Item::UnsignedInt { .. } => Err(CborError::OutOfRange),
            Item::NegativeInt { magnitude, .. } if *magnitude <= i32::MAX as u64 => {
                Ok(-1 - *magnitude as i32)
            }
            Item::NegativeInt { .. } => Err(CborError::OutOfRange),
            _ => Err(CborError::IncompatibleType),
        }
    }
}

impl TryFrom<&Item> for i64 {
    type Error = CborError;

    fn try_from(item: &Item) -> Result<Self, Self::Error> {
        match item {
            Item::UnsignedInt { value, .. } if *value & (1 << 63) == 0 => Ok(*value as i64),
            Item::UnsignedInt { .. } => Err(CborError::OutOfRange),
            Item::NegativeInt { magnitude, .. } if *magnitude & (1 << 63) == 0 => {
                Ok(-1 - *magnitude as i64)
            }
            Item::NegativeInt { .. } => Err(CborError::OutOfRange),
            _ => Err(CborError::IncompatibleType),
        }
    }
}

impl TryFrom<&Item> for i128 {
    type Error = CborError;

    fn try_from(item: &Item) -> Result<Self, Self::Error> {
        match item {
            Item::UnsignedInt { value, .. } => Ok(*value as i128),
            Item::NegativeInt { magnitude, .. } => Ok(-1 - *magnitude as i128),
            _ => Err(CborError::IncompatibleType),
        }
    }
}

impl TryFrom<&Item> for bool {
    type Error = CborError;

    fn try_from(item: &Item) -> Result<Self, Self::Error> {
        boolean(item).ok_or(CborError::IncompatibleType)
    }
}
