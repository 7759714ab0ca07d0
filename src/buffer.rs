//! 32-byte aligned growable storage.
//!
//! [`AlignedBuf<T>`] owns a single allocation whose start address is a multiple
//! of [`ALIGNMENT`], so that full 256-bit loads and stores on it never straddle
//! an alignment boundary. It behaves like a minimal `Vec<T>`:
//!
//! - **Construction** zero-fills every element.
//! - **Clone** allocates fresh storage and copies the elements; the two buffers
//!   never alias.
//! - **Move** is a Rust move. [`AlignedBuf::take`] moves the storage out and
//!   leaves an empty, unallocated buffer behind.
//! - **Resize/push** reallocate with the same alignment when capacity runs out.
//!
//! # Allocation failure
//!
//! The infallible constructors ([`AlignedBuf::zeroed`], `resize`, `push`,
//! `clone`) call [`std::alloc::handle_alloc_error`] when the allocator returns
//! null, which aborts the process, and panic with "capacity overflow" when the
//! element count cannot be expressed as a valid layout. Use
//! [`AlignedBuf::try_zeroed`] to receive either condition as an [`Error`].

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, realloc, Layout};
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use log::trace;

use crate::error::{Error, Result};
use crate::simd::{Element, ALIGNMENT};

/// A contiguous, 32-byte aligned, zero-initialized buffer of `T`.
pub struct AlignedBuf<T: Element> {
    ptr: NonNull<T>,
    len: usize,
    capacity: usize,
}

// SAFETY: AlignedBuf uniquely owns its allocation, exactly like Vec<T>.
unsafe impl<T: Element> Send for AlignedBuf<T> {}
// SAFETY: shared references only permit reads of the owned elements.
unsafe impl<T: Element> Sync for AlignedBuf<T> {}

impl<T: Element> AlignedBuf<T> {
    /// Alignment of every allocation made for `T`.
    #[inline]
    fn align() -> usize {
        ALIGNMENT.max(mem::align_of::<T>())
    }

    fn layout_for(capacity: usize) -> Result<Layout> {
        let align = Self::align();
        let size = capacity
            .checked_mul(mem::size_of::<T>())
            .ok_or_else(|| Error::LayoutError {
                size: capacity,
                alignment: align,
                message: "element count overflows usize".to_string(),
            })?;

        Layout::from_size_align(size, align).map_err(|err| Error::LayoutError {
            size,
            alignment: align,
            message: err.to_string(),
        })
    }

    fn layout_or_panic(capacity: usize) -> Layout {
        match Self::layout_for(capacity) {
            Ok(layout) => layout,
            Err(err) => panic!("capacity overflow: {err}"),
        }
    }

    /// Creates an empty buffer without allocating.
    pub const fn new() -> Self {
        AlignedBuf {
            ptr: NonNull::dangling(),
            len: 0,
            capacity: 0,
        }
    }

    /// Allocates `len` zeroed elements.
    ///
    /// # Errors
    ///
    /// [`Error::LayoutError`] if `len` elements do not fit a valid layout,
    /// [`Error::AllocationError`] if the allocator returns null.
    pub fn try_zeroed(len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self::new());
        }

        let layout = Self::layout_for(len)?;

        // SAFETY: layout has non-zero size since len > 0 and T is a non-ZST float.
        let raw = unsafe { alloc_zeroed(layout) } as *mut T;

        let ptr = NonNull::new(raw).ok_or(Error::AllocationError {
            requested_size: layout.size(),
            requested_alignment: layout.align(),
        })?;

        Ok(AlignedBuf {
            ptr,
            len,
            capacity: len,
        })
    }

    /// Allocates `len` zeroed elements, aborting on allocation failure.
    ///
    /// # Panics
    ///
    /// Panics if `len` elements do not fit a valid layout.
    pub fn zeroed(len: usize) -> Self {
        match Self::try_zeroed(len) {
            Ok(buf) => buf,
            Err(Error::AllocationError { .. }) => handle_alloc_error(Self::layout_or_panic(len)),
            Err(err) => panic!("capacity overflow: {err}"),
        }
    }

    /// Allocates a buffer holding a copy of `values`.
    pub fn from_slice(values: &[T]) -> Self {
        let mut buf = Self::zeroed(values.len());
        buf.copy_from_slice(values);
        buf
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the current allocation can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a backing allocation exists. False for new, taken-from and
    /// zero-capacity buffers.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.capacity > 0
    }

    /// Pointer to the first element, or a dangling (non-dereferenceable)
    /// pointer when nothing is allocated.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: ptr is valid for len initialized elements (or dangling with len 0).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and &mut self guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Whether the storage start is a multiple of [`ALIGNMENT`].
    #[inline]
    pub fn is_aligned(&self) -> bool {
        (self.ptr.as_ptr() as usize) % ALIGNMENT == 0
    }

    /// Moves the storage out, leaving `self` empty and unallocated.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::new())
    }

    /// Sets the length to zero, keeping the allocation.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Changes the length to `new_len`, growing the allocation if needed.
    ///
    /// Elements past the old length are zero.
    pub fn resize(&mut self, new_len: usize) {
        if new_len > self.len {
            // Slots in [len, capacity) may hold values from before a shrink or clear.
            let stale_end = new_len.min(self.capacity);
            // SAFETY: [len, stale_end) lies inside the allocation.
            unsafe { ptr::write_bytes(self.ptr.as_ptr().add(self.len), 0, stale_end - self.len) };
            if new_len > self.capacity {
                self.grow_to(new_len);
            }
        }
        self.len = new_len;
    }

    /// Appends `value`, doubling the capacity when full.
    pub fn push(&mut self, value: T) {
        if self.len == self.capacity {
            let new_capacity = self
                .capacity
                .checked_mul(2)
                .unwrap_or_else(|| panic!("capacity overflow"))
                .max(ALIGNMENT / mem::size_of::<T>());
            self.grow_to(new_capacity);
        }
        // SAFETY: len < capacity after the growth above.
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
    }

    fn grow_to(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity > self.capacity);
        trace!(
            "growing aligned buffer from {} to {} elements",
            self.capacity,
            new_capacity
        );

        let new_layout = Self::layout_or_panic(new_capacity);

        let raw = if self.capacity == 0 {
            // SAFETY: new_capacity > 0, so the layout is non-zero sized.
            unsafe { alloc_zeroed(new_layout) }
        } else {
            let old_layout = Self::layout_or_panic(self.capacity);
            // SAFETY: ptr was allocated with old_layout; realloc keeps its alignment.
            let raw = unsafe {
                realloc(
                    self.ptr.as_ptr() as *mut u8,
                    old_layout,
                    new_layout.size(),
                )
            };
            if !raw.is_null() {
                // SAFETY: [old size, new size) is freshly reallocated, uninitialized space.
                unsafe {
                    ptr::write_bytes(
                        raw.add(old_layout.size()),
                        0,
                        new_layout.size() - old_layout.size(),
                    )
                };
            }
            raw
        };

        match NonNull::new(raw as *mut T) {
            Some(ptr) => {
                self.ptr = ptr;
                self.capacity = new_capacity;
            }
            None => handle_alloc_error(new_layout),
        }
    }
}

impl<T: Element> Drop for AlignedBuf<T> {
    fn drop(&mut self) {
        if self.capacity > 0 {
            let layout = Self::layout_or_panic(self.capacity);
            // SAFETY: ptr was allocated with exactly this layout.
            unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout) };
        }
    }
}

impl<T: Element> Clone for AlignedBuf<T> {
    /// Deep copy into a new allocation sized to the current length.
    fn clone(&self) -> Self {
        Self::from_slice(self.as_slice())
    }
}

impl<T: Element> Default for AlignedBuf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> Deref for AlignedBuf<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: Element> DerefMut for AlignedBuf<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: Element> PartialEq for AlignedBuf<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Element> fmt::Debug for AlignedBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
