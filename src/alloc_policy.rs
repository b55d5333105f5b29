/***************************************************************************************************
 * Copyright (c) 2022 Qualcomm Innovation Center, Inc. All rights reserved.
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
 * libcbor_rs allocation policy
 *
 * Replaces the specification's process-wide installable `malloc`/`realloc`/`free` triple with a
 * per-builder policy object, per the design note that flags the global triple as unidiomatic for
 * Rust ("implementations may choose to make this a per-library-instance field instead, removing
 * the global footgun"). Every item allocation performed while building a tree consults a policy
 * value; the default never refuses, and a counting policy lets tests simulate the k-th allocation
 * failing to exercise the `MemError` contract.
 **************************************************************************************************/

/// Consulted once per item allocation. Returning `false` causes the caller to treat the
/// allocation as failed without constructing anything.
pub trait AllocPolicy {
    /// Returns `true` if the next allocation may proceed.
    fn try_alloc(&mut self) -> bool;
}

/// The default policy: every allocation succeeds.
#[derive(Debug, Default, Copy, Clone)]
pub struct UnboundedAllocator;

impl AllocPolicy for UnboundedAllocator {
    #[inline]
    fn try_alloc(&mut self) -> bool {
        true
    }
}

/// A counting policy used in tests to simulate an allocator that fails its k-th call.
///
/// `fail_at` is 1-based: `CountingAllocator::failing_at(3)` succeeds on the first two
/// allocations and refuses the third and every one after it.
#[derive(Debug, Copy, Clone)]
pub struct CountingAllocator {
    pub allocations: usize,
    pub fail_at: Option<usize>,
}

impl CountingAllocator {
    /// A policy that never refuses, but still counts allocations (useful for leak checks).
    pub fn new() -> Self {
        CountingAllocator {
            allocations: 0,
            fail_at: None,
        }
    }

    /// A policy that refuses its `k`-th allocation onward.
    pub fn failing_at(k: usize) -> Self {
        CountingAllocator {
            allocations: 0,
            fail_at: Some(k),
        }
    }
}

impl Default for CountingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocPolicy for CountingAllocator {
    fn try_alloc(&mut self) -> bool {
        self.allocations += 1;
        match self.fail_at {
            Some(k) if self.allocations >= k => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_never_refuses() {
        let mut a = UnboundedAllocator;
        for _ in 0..100 {
            assert!(a.try_alloc());
        }
    }

    #[test]
    fn counting_refuses_from_k_onward() {
        let mut a = CountingAllocator::failing_at(3);
        assert!(a.try_alloc()); // 1
        assert!(a.try_alloc()); // 2
        assert!(!a.try_alloc()); // 3 - refused
        assert!(!a.try_alloc()); // 4 - still refused
    }
}
