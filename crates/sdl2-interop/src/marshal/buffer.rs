//! [`MemoryBuffer`] <-> native heap blocks

use super::{Marshaler, Ownership};
use crate::error::Result;
use crate::ffi::exports;
use crate::memory::MemoryBuffer;
use crate::sdl::Sdl;
use std::ffi::c_void;
use std::ptr::{self, NonNull};

/// A native block as it crosses the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBuffer {
    pub ptr: *mut c_void,
    pub len: usize,
}

impl RawBuffer {
    pub const NULL: RawBuffer = RawBuffer {
        ptr: ptr::null_mut(),
        len: 0,
    };
}

/// Memory-buffer marshaler
///
/// Encoding lends the wrapper's block. Decoding wraps a native block: owning
/// under [`Ownership::Owned`] (freed when the wrapper drops), borrowed under
/// [`Ownership::LeaveAllocated`]. A null block decodes to an uninitialized
/// buffer.
pub struct MemoryBufferMarshaler<'sdl> {
    sdl: &'sdl Sdl,
    ownership: Ownership,
}

impl<'sdl> MemoryBufferMarshaler<'sdl> {
    /// Marshaler handing out or adopting blocks with the given ownership
    pub fn new(sdl: &'sdl Sdl, ownership: Ownership) -> Self {
        Self { sdl, ownership }
    }
}

impl<'sdl> Marshaler for MemoryBufferMarshaler<'sdl> {
    type Managed = MemoryBuffer<'sdl>;
    type Output = MemoryBuffer<'sdl>;
    type Native = RawBuffer;

    fn ownership(&self) -> Ownership {
        self.ownership
    }

    fn to_native(&mut self, value: &MemoryBuffer<'sdl>) -> Result<RawBuffer> {
        let (ptr, len) = value.as_raw()?;
        Ok(RawBuffer {
            ptr: ptr.as_ptr() as *mut c_void,
            len,
        })
    }

    unsafe fn to_managed(&mut self, native: RawBuffer) -> Result<MemoryBuffer<'sdl>> {
        Ok(match NonNull::new(native.ptr as *mut u8) {
            Some(ptr) => MemoryBuffer::from_raw(self.sdl, ptr, native.len, self.ownership),
            None => MemoryBuffer::new(self.sdl),
        })
    }

    unsafe fn release_native(&mut self, native: RawBuffer) -> Result<()> {
        if self.ownership == Ownership::LeaveAllocated || native.ptr.is_null() {
            return Ok(());
        }
        let free = self.sdl.resolve(exports::FREE)?;
        free(native.ptr);
        Ok(())
    }
}
