//! [`RwOps`] <-> `SDL_RWops*`

use super::{Marshaler, Ownership};
use crate::error::{Error, Result};
use crate::ffi::{exports, RawRwOps};
use crate::rwops::RwOps;
use crate::sdl::Sdl;
use std::ptr::NonNull;

/// RWops marshaler
///
/// Encoding lends the stream's native object. Decoding wraps a native
/// stream, owning it (closed on drop) under [`Ownership::Owned`]. Releasing
/// an owned native stream frees it with `SDL_FreeRW` without calling its
/// close callback.
pub struct RwOpsMarshaler<'sdl> {
    sdl: &'sdl Sdl,
    ownership: Ownership,
}

impl<'sdl> RwOpsMarshaler<'sdl> {
    /// Marshaler handing out or adopting streams with the given ownership
    pub fn new(sdl: &'sdl Sdl, ownership: Ownership) -> Self {
        Self { sdl, ownership }
    }
}

impl<'sdl> Marshaler for RwOpsMarshaler<'sdl> {
    type Managed = RwOps<'sdl>;
    type Output = RwOps<'sdl>;
    type Native = *mut RawRwOps;

    fn ownership(&self) -> Ownership {
        self.ownership
    }

    fn to_native(&mut self, value: &RwOps<'sdl>) -> Result<*mut RawRwOps> {
        Ok(value.as_ptr())
    }

    unsafe fn to_managed(&mut self, native: *mut RawRwOps) -> Result<RwOps<'sdl>> {
        let raw = NonNull::new(native)
            .ok_or_else(|| Error::precondition("wrap stream", "the native stream pointer is null"))?;
        Ok(RwOps::from_raw(self.sdl, raw, self.ownership))
    }

    unsafe fn release_native(&mut self, native: *mut RawRwOps) -> Result<()> {
        if self.ownership == Ownership::LeaveAllocated || native.is_null() {
            return Ok(());
        }
        let free_rw = self.sdl.resolve(exports::FREE_RW)?;
        free_rw(native);
        Ok(())
    }
}
