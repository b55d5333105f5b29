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
 * libcbor_rs tree builder
 *
 * A `Callbacks` implementation that consumes the streaming decoder's events and assembles a
 * complete item tree via a pushdown stack of pending containers. Each event either starts the
 * root, appends to the top frame, or (once an append completes that frame) cascades the
 * just-completed item into the new top, possibly completing that one too.
 **************************************************************************************************/
use alloc::vec::Vec;

use crate::alloc_policy::AllocPolicy;
use crate::decode::{Callbacks, Event, Width};
use crate::item::{self, IntWidth, ItemRef, SimpleKind};

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

fn int_width(w: Width) -> IntWidth {
    match w {
        Width::W8 => IntWidth::W8,
        Width::W16 => IntWidth::W16,
        Width::W32 => IntWidth::W32,
        Width::W64 => IntWidth::W64,
    }
}

/// Which half of a map pair an indefinite or in-progress map is waiting for next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PairSlot {
    Key,
    Value,
}

/// A pending container frame on the builder's pushdown stack.
enum Frame {
    DefiniteArray { item: ItemRef, remaining: usize },
    IndefiniteArray { item: ItemRef },
    DefiniteMap { item: ItemRef, remaining_pairs: usize, slot: PairSlot, pending_key: Option<ItemRef> },
    IndefiniteMap { item: ItemRef, slot: PairSlot, pending_key: Option<ItemRef> },
    Tag { item: ItemRef },
    IndefiniteByteString { item: ItemRef },
    IndefiniteTextString { item: ItemRef },
}

/// Consumes streaming decoder events and assembles a complete item tree. Carries the sticky
/// `allocation_failed`/`syntax_error` flags the load driver checks after every decode step.
pub struct TreeBuilder<'p> {
    stack: Vec<Frame>,
    root: Option<ItemRef>,
    pub allocation_failed: bool,
    pub syntax_error: bool,
    policy: &'p mut dyn AllocPolicy,
}

impl<'p> TreeBuilder<'p> {
    pub fn new(policy: &'p mut dyn AllocPolicy) -> Self {
        TreeBuilder {
            stack: Vec::new(),
            root: None,
            allocation_failed: false,
            syntax_error: false,
            policy,
        }
    }

    /// Whether the builder has produced (and the stack has fully unwound to) a complete root
    /// item.
    pub fn is_complete(&self) -> bool {
        self.stack.is_empty() && self.root.is_some()
    }

    /// Take the completed root item, if any.
    pub fn take_root(&mut self) -> Option<ItemRef> {
        self.root.take()
    }

    /// Decref every container still pending on the stack (used by the load driver to clean up on
    /// error without leaking partially-built containers).
    pub fn abandon(&mut self) {
        self.stack.clear();
        self.root = None;
    }

    fn fail_alloc(&mut self) {
        self.allocation_failed = true;
    }

    fn fail_syntax(&mut self) {
        self.syntax_error = true;
    }

    /// An indefinite-length string-start is only legal as a value in its own right, never as a
    /// chunk offered to an already-open indefinite string (nesting of indefinite strings is
    /// forbidden by the data model).
    fn top_expects_definite_string_chunks(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame::IndefiniteByteString { .. }) | Some(Frame::IndefiniteTextString { .. })
        )
    }

    /// Install a freshly-constructed (non-`None`) item as either the root or an append to the
    /// current top frame, cascading completion as necessary. `None` signals an allocation
    /// failure from a fallible constructor/mutator and is handled uniformly here.
    fn place(&mut self, built: Option<ItemRef>) {
        let item = match built {
            Some(i) => i,
            None => {
                self.fail_alloc();
                return;
            }
        };
        self.dispatch(item);
    }

    fn dispatch(&mut self, item: ItemRef) {
        if self.stack.is_empty() {
            self.root = Some(item);
            return;
        }
        match self.append_to_top(item) {
            Ok(Some(completed)) => {
                // top frame completed; cascade the completed container into the new top (if any)
                self.pop_and_cascade(completed);
            }
            Ok(None) => {}
            Err(()) => self.fail_syntax(),
        }
    }

    /// Appends `item` to the current top frame. Returns `Ok(Some(completed_item))` if this append
    /// completed the frame (which is then popped by the caller and cascaded), `Ok(None)` if the
    /// frame remains open, or `Err(())` on a syntax violation (including an empty stack, which
    /// callers are expected to have ruled out already by checking before they get here).
    fn append_to_top(&mut self, item: ItemRef) -> Result<Option<ItemRef>, ()> {
        let top = match self.stack.last_mut() {
            Some(t) => t,
            None => return Err(()),
        };
        match top {
            Frame::DefiniteArray { item: arr, remaining } => {
                match crate::item::array_push(arr, item) {
                    Ok(_) => {
                        *remaining -= 1;
                        if *remaining == 0 {
                            let arr = arr.clone();
                            self.stack.pop();
                            Ok(Some(arr))
                        } else {
                            Ok(None)
                        }
                    }
                    Err(_) => Err(()),
                }
            }
            Frame::IndefiniteArray { item: arr } => {
                crate::item::array_push(arr, item).map_err(|_| ())?;
                Ok(None)
            }
            Frame::DefiniteMap { item: map, remaining_pairs, slot, pending_key } => match slot {
                PairSlot::Key => {
                    *pending_key = Some(item);
                    *slot = PairSlot::Value;
                    Ok(None)
                }
                PairSlot::Value => {
                    let key = pending_key.take().ok_or(())?;
                    crate::item::map_add(map, key, item).map_err(|_| ())?;
                    *slot = PairSlot::Key;
                    *remaining_pairs -= 1;
                    if *remaining_pairs == 0 {
                        let map = map.clone();
                        self.stack.pop();
                        Ok(Some(map))
                    } else {
                        Ok(None)
                    }
                }
            },
            Frame::IndefiniteMap { item: map, slot, pending_key } => match slot {
                PairSlot::Key => {
                    *pending_key = Some(item);
                    *slot = PairSlot::Value;
                    Ok(None)
                }
                PairSlot::Value => {
                    let key = pending_key.take().ok_or(())?;
                    crate::item::map_add(map, key, item).map_err(|_| ())?;
                    *slot = PairSlot::Key;
                    Ok(None)
                }
            },
            Frame::Tag { item: tag } => {
                crate::item::tag_set_child(tag, item).map_err(|_| ())?;
                let tag = tag.clone();
                self.stack.pop();
                Ok(Some(tag))
            }
            Frame::IndefiniteByteString { item: bs } => {
                crate::item::bytestring_add_chunk(bs, item).map_err(|_| ())?;
                Ok(None)
            }
            Frame::IndefiniteTextString { item: ts } => {
                crate::item::string_add_chunk(ts, item).map_err(|_| ())?;
                Ok(None)
            }
        }
    }

    /// After a frame completes, recursively feed the completed container into whatever is now
    /// the top of the stack (which may itself complete, cascading further), or install it as the
    /// root if the stack is now empty.
    fn pop_and_cascade(&mut self, completed: ItemRef) {
        if self.stack.is_empty() {
            self.root = Some(completed);
            return;
        }
        match self.append_to_top(completed) {
            Ok(Some(next_completed)) => self.pop_and_cascade(next_completed),
            Ok(None) => {}
            Err(()) => self.fail_syntax(),
        }
    }

    /// Handle an `IndefBreak` event: closes the top indefinite frame, or records a syntax error
    /// if there is no open indefinite frame, or the top frame is a map frame mid-pair (a map
    /// break is only legal on a key boundary).
    fn handle_break(&mut self) {
        let top = match self.stack.last() {
            Some(t) => t,
            None => {
                self.fail_syntax();
                return;
            }
        };
        match top {
            Frame::IndefiniteArray { item } => {
                let item = item.clone();
                self.stack.pop();
                self.pop_and_cascade(item);
            }
            Frame::IndefiniteMap { item, slot, .. } => {
                if *slot != PairSlot::Key {
                    self.fail_syntax();
                    return;
                }
                let item = item.clone();
                self.stack.pop();
                self.pop_and_cascade(item);
            }
            Frame::IndefiniteByteString { item } | Frame::IndefiniteTextString { item } => {
                let item = item.clone();
                self.stack.pop();
                self.pop_and_cascade(item);
            }
            Frame::DefiniteArray { .. } | Frame::DefiniteMap { .. } | Frame::Tag { .. } => {
                self.fail_syntax();
            }
        }
    }
}

impl<'p> Callbacks for TreeBuilder<'p> {
    #[cfg_attr(feature = "trace", trace)]
    fn on_event(&mut self, event: Event<'_>) {
        match event {
            Event::Uint(w, v) => {
                let built = item::try_new_uint(self.policy, int_width(w), v);
                self.place(built);
            }
            Event::Negint(w, m) => {
                let built = item::try_new_negint(self.policy, int_width(w), m);
                self.place(built);
            }
            Event::ByteString(bytes) => {
                let built = item::try_new_bytestring_from_owned(self.policy, bytes.to_vec());
                self.place(built);
            }
            Event::ByteStringStart => {
                if self.top_expects_definite_string_chunks() {
                    self.fail_syntax();
                    return;
                }
                match item::try_new_bytestring_indefinite(self.policy) {
                    Some(bs) => self.stack.push(Frame::IndefiniteByteString { item: bs }),
                    None => self.fail_alloc(),
                }
            }
            Event::TextString(bytes) => {
                let built = item::try_new_textstring_from_owned(self.policy, bytes.to_vec());
                self.place(built);
            }
            Event::TextStringStart => {
                if self.top_expects_definite_string_chunks() {
                    self.fail_syntax();
                    return;
                }
                match item::try_new_textstring_indefinite(self.policy) {
                    Some(ts) => self.stack.push(Frame::IndefiniteTextString { item: ts }),
                    None => self.fail_alloc(),
                }
            }
            Event::ArrayStart(n) => {
                let n = n as usize;
                match item::try_new_array_definite(self.policy, n) {
                    Some(arr) => {
                        if n == 0 {
                            self.dispatch(arr);
                        } else {
                            self.stack.push(Frame::DefiniteArray { item: arr, remaining: n });
                        }
                    }
                    None => self.fail_alloc(),
                }
            }
            Event::IndefArrayStart => match item::try_new_array_indefinite(self.policy) {
                Some(arr) => self.stack.push(Frame::IndefiniteArray { item: arr }),
                None => self.fail_alloc(),
            },
            Event::MapStart(n) => {
                let n = n as usize;
                match item::try_new_map_definite(self.policy, n) {
                    Some(map) => {
                        if n == 0 {
                            self.dispatch(map);
                        } else {
                            self.stack.push(Frame::DefiniteMap {
                                item: map,
                                remaining_pairs: n,
                                slot: PairSlot::Key,
                                pending_key: None,
                            });
                        }
                    }
                    None => self.fail_alloc(),
                }
            }
            Event::IndefMapStart => match item::try_new_map_indefinite(self.policy) {
                Some(map) => self.stack.push(Frame::IndefiniteMap {
                    item: map,
                    slot: PairSlot::Key,
                    pending_key: None,
                }),
                None => self.fail_alloc(),
            },
            Event::Tag(v) => match item::try_new_tag(self.policy, v) {
                Some(tag) => self.stack.push(Frame::Tag { item: tag }),
                None => self.fail_alloc(),
            },
            Event::Boolean(v) => {
                let built = item::try_new_simple(self.policy, if v { 21 } else { 20 });
                self.place(built);
            }
            Event::Null => {
                let built = item::try_new_simple(self.policy, 22);
                self.place(built);
            }
            Event::Undefined => {
                let built = item::try_new_simple(self.policy, 23);
                self.place(built);
            }
            Event::Simple(code) => {
                let built = item::try_new_simple(self.policy, code);
                self.place(built);
            }
            #[cfg(feature = "float")]
            Event::Float2(v) => {
                let built = item::try_new_float(self.policy, SimpleKind::Half(v));
                self.place(built);
            }
            #[cfg(feature = "float")]
            Event::Float4(v) => {
                let built = item::try_new_float(self.policy, SimpleKind::Single(v));
                self.place(built);
            }
            #[cfg(feature = "float")]
            Event::Float8(v) => {
                let built = item::try_new_float(self.policy, SimpleKind::Double(v));
                self.place(built);
            }
            Event::IndefBreak => self.handle_break(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc_policy::UnboundedAllocator;
    use crate::decode::decode_one;
    use crate::item::Item;

    fn build(bytes: &[u8]) -> TreeBuilder<'static> {
        // leaked for test convenience; tests are single-shot processes.
        let policy: &'static mut dyn AllocPolicy = alloc::boxed::Box::leak(alloc::boxed::Box::new(UnboundedAllocator));
        let mut builder = TreeBuilder::new(policy);
        let mut pos = 0;
        loop {
            match decode_one(&bytes[pos..], &mut builder) {
                crate::decode::DecodeStatus::Finished { bytes_read } => {
                    pos += bytes_read;
                    if builder.is_complete() || pos >= bytes.len() {
                        break;
                    }
                }
                _ => break,
            }
        }
        builder
    }

    #[test]
    fn builds_definite_array() {
        let mut b = build(&[0x83, 0x01, 0x02, 0x03]);
        assert!(b.is_complete());
        let root = b.take_root().unwrap();
        assert_eq!(item::size(&root), Some(3));
        match &*root {
            Item::Array(_) => {}
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn builds_indefinite_array() {
        let mut b = build(&[0x9f, 0x01, 0x02, 0xff]);
        assert!(b.is_complete());
        let root = b.take_root().unwrap();
        assert_eq!(item::size(&root), Some(2));
        assert!(!item::is_definite(&root));
    }

    #[test]
    fn builds_indefinite_map_single_entry() {
        let mut b = build(&[0xbf, 0x61, 0x61, 0x01, 0xff]);
        assert!(b.is_complete());
        let root = b.take_root().unwrap();
        assert_eq!(item::size(&root), Some(1));
        let (k, v) = item::map_get_pair(&root, 0).unwrap();
        assert_eq!(item::as_str(&k).as_deref(), Some("a"));
        assert_eq!(crate::item::width(&v), Some(IntWidth::W8));
    }

    #[test]
    fn bare_break_is_syntax_error() {
        let mut b = build(&[0xff]);
        assert!(b.syntax_error);
    }

    #[test]
    fn tag_wraps_child() {
        let mut b = build(&[0xc0, 0x61, 0x61]);
        assert!(b.is_complete());
        let root = b.take_root().unwrap();
        assert_eq!(item::tag_value(&root), Some(0));
        let child = item::tag_child(&root).unwrap();
        assert_eq!(item::as_str(&child).as_deref(), Some("a"));
    }
}
