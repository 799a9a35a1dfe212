//! Owning buffers

use super::family::AllocatorFamily;
use crate::logging::{log_allocation, log_deallocation};
use libc::wchar_t;
use std::alloc::{handle_alloc_error, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Uniquely owned block of interpreter memory
///
/// Released through `F::free` on drop. Never cloned.
pub struct Buffer<F: AllocatorFamily> {
    ptr: NonNull<u8>,
    len: usize,
    _family: PhantomData<F>,
}

#[cold]
fn allocation_failed(size: usize) -> ! {
    let layout = Layout::from_size_align(size.max(1), 1).unwrap_or(Layout::new::<u8>());
    handle_alloc_error(layout)
}

impl<F: AllocatorFamily> Buffer<F> {
    /// Allocate `len` uninitialized bytes (aborts on failure)
    pub fn alloc(len: usize) -> Self {
        let raw = unsafe { F::malloc(len) } as *mut u8;
        let Some(ptr) = NonNull::new(raw) else {
            allocation_failed(len)
        };
        log_allocation(len, ptr.as_ptr());
        Self {
            ptr,
            len,
            _family: PhantomData,
        }
    }

    /// Allocate and copy `bytes` into the new block
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut buffer = Self::alloc(bytes.len());
        buffer.as_bytes_mut().copy_from_slice(bytes);
        buffer
    }

    /// Adopt a block produced by this family.
    ///
    /// Returns `None` for null, so a failed foreign allocation can be
    /// reported by the caller.
    ///
    /// # Safety
    /// `ptr` must come from `F` and be valid for `len` bytes; ownership
    /// moves into the buffer.
    pub unsafe fn from_raw(ptr: *mut u8, len: usize) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self {
            ptr,
            len,
            _family: PhantomData,
        })
    }

    /// Resize in place or move; contents up to the smaller size are kept
    pub fn realloc(&mut self, len: usize) {
        let raw = unsafe { F::realloc(self.ptr.as_ptr().cast(), len) } as *mut u8;
        match NonNull::new(raw) {
            Some(ptr) => {
                self.ptr = ptr;
                self.len = len;
            }
            None => allocation_failed(len),
        }
    }

    /// Give up ownership without freeing
    pub fn into_raw(self) -> (*mut u8, usize) {
        let parts = (self.ptr.as_ptr(), self.len);
        std::mem::forget(self);
        parts
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<F: AllocatorFamily> Drop for Buffer<F> {
    fn drop(&mut self) {
        log_deallocation(self.ptr.as_ptr());
        unsafe { F::free(self.ptr.as_ptr().cast()) }
    }
}

impl<F: AllocatorFamily> fmt::Debug for Buffer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("family", &F::NAME)
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

/// NUL-terminated `wchar_t` string held in a family buffer
pub struct WideBuffer<F: AllocatorFamily> {
    buffer: Buffer<F>,
    chars: usize,
}

impl<F: AllocatorFamily> WideBuffer<F> {
    /// Adopt a NUL-terminated wide string produced by this family.
    ///
    /// # Safety
    /// `ptr` must be null or a NUL-terminated block from `F`.
    pub unsafe fn from_raw(ptr: *mut wchar_t) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        let chars = libc::wcslen(ptr);
        let bytes = (chars + 1) * std::mem::size_of::<wchar_t>();
        Buffer::from_raw(ptr.cast(), bytes).map(|buffer| Self { buffer, chars })
    }

    /// Adopt a wide string of known length (embedded NULs allowed).
    ///
    /// # Safety
    /// `ptr` must be null or a block from `F` holding `chars + 1` units,
    /// the last one 0.
    pub unsafe fn from_raw_parts(ptr: *mut wchar_t, chars: usize) -> Option<Self> {
        let bytes = (chars + 1) * std::mem::size_of::<wchar_t>();
        Buffer::from_raw(ptr.cast(), bytes).map(|buffer| Self { buffer, chars })
    }

    /// Allocate a copy of `wide` plus terminator
    pub fn from_wide(wide: &[wchar_t]) -> Self {
        let unit = std::mem::size_of::<wchar_t>();
        let mut buffer = Buffer::alloc((wide.len() + 1) * unit);
        unsafe {
            let dst = buffer.as_mut_ptr() as *mut wchar_t;
            std::ptr::copy_nonoverlapping(wide.as_ptr(), dst, wide.len());
            *dst.add(wide.len()) = 0;
        }
        Self {
            buffer,
            chars: wide.len(),
        }
    }

    /// Give up ownership without freeing
    pub fn into_raw(self) -> *mut wchar_t {
        let (ptr, _) = self.buffer.into_raw();
        ptr.cast()
    }

    /// Characters excluding the terminator
    pub fn as_wide(&self) -> &[wchar_t] {
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.chars) }
    }

    /// Characters including the terminator
    pub fn as_wide_with_nul(&self) -> &[wchar_t] {
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.chars + 1) }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const wchar_t {
        self.buffer.as_ptr() as *const wchar_t
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chars
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }

    pub fn to_string_lossy(&self) -> String {
        crate::encoding::wide_to_string_lossy(self.as_wide())
    }
}

impl<F: AllocatorFamily> fmt::Debug for WideBuffer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WideBuffer")
            .field(&self.to_string_lossy())
            .finish()
    }
}
