//! UTF-8 strings <-> `const char*`

use super::{type_mismatch, Marshaler, Ownership};
use crate::error::{Error, Result};
use crate::ffi::exports;
use crate::sdl::Sdl;
use std::any::Any;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

/// String marshaler
///
/// Encoded strings are NUL-terminated copies kept in custody until released
/// or until the marshaler is dropped, so pointers stay valid for the whole
/// native call. Decoding copies; a null pointer decodes to `""`.
pub struct StringMarshaler<'sdl> {
    sdl: &'sdl Sdl,
    ownership: Ownership,
    custody: Vec<CString>,
}

impl<'sdl> StringMarshaler<'sdl> {
    /// Marshaler whose decoded strings follow `ownership`
    pub fn new(sdl: &'sdl Sdl, ownership: Ownership) -> Self {
        Self {
            sdl,
            ownership,
            custody: Vec::new(),
        }
    }

    /// Encode a `String`, `&'static str` or `Box<str>` known only at runtime
    pub fn to_native_dyn<V: Any>(&mut self, value: &V) -> Result<*const c_char> {
        let value = value as &dyn Any;

        if let Some(s) = value.downcast_ref::<String>() {
            self.to_native(s)
        } else if let Some(s) = value.downcast_ref::<&'static str>() {
            self.to_native(s)
        } else if let Some(s) = value.downcast_ref::<Box<str>>() {
            self.to_native(s)
        } else {
            Err(type_mismatch::<str, V>())
        }
    }

    /// Number of encoded strings still held
    pub fn in_custody(&self) -> usize {
        self.custody.len()
    }
}

impl Marshaler for StringMarshaler<'_> {
    type Managed = str;
    type Output = String;
    type Native = *const c_char;

    fn ownership(&self) -> Ownership {
        self.ownership
    }

    fn to_native(&mut self, value: &str) -> Result<*const c_char> {
        let encoded = CString::new(value).map_err(|e| {
            Error::invalid_argument(
                "a string without NUL bytes",
                format!("a NUL byte at offset {}", e.nul_position()),
            )
        })?;

        let ptr = encoded.as_ptr();
        self.custody.push(encoded);
        Ok(ptr)
    }

    unsafe fn to_managed(&mut self, native: *const c_char) -> Result<String> {
        if native.is_null() {
            return Ok(String::new());
        }
        Ok(CStr::from_ptr(native).to_string_lossy().into_owned())
    }

    unsafe fn release_native(&mut self, native: *const c_char) -> Result<()> {
        if self.ownership == Ownership::LeaveAllocated || native.is_null() {
            return Ok(());
        }

        if let Some(index) = self.custody.iter().position(|s| s.as_ptr() == native) {
            self.custody.swap_remove(index);
            return Ok(());
        }

        // Not ours, so it came from the SDL heap
        let free = self.sdl.resolve(exports::FREE)?;
        free(native as *mut c_void);
        Ok(())
    }
}
