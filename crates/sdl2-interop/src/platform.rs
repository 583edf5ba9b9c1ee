//! Platform name

use crate::error::Result;
use crate::ffi::exports;
use crate::marshal::{Marshaler, Ownership, StringMarshaler};
use crate::sdl::Sdl;

impl Sdl {
    /// Name of the platform SDL was built for, e.g. `"Linux"` or `"Windows"`
    pub fn platform(&self) -> Result<String> {
        let get_platform = self.resolve(exports::GET_PLATFORM)?;
        // Static string inside SDL
        let mut marshaler = StringMarshaler::new(self, Ownership::LeaveAllocated);
        unsafe { marshaler.to_managed(get_platform()) }
    }
}
