//! Clipboard and primary selection text

use crate::error::Result;
use crate::ffi::{exports, SdlBool, SDL_FALSE};
use crate::marshal::{Marshaler, Ownership, StringMarshaler};
use crate::sdl::{Export, Sdl};
use std::os::raw::{c_char, c_int};

type GetText = unsafe extern "C" fn() -> *mut c_char;
type SetText = unsafe extern "C" fn(*const c_char) -> c_int;
type HasText = unsafe extern "C" fn() -> SdlBool;

impl Sdl {
    /// Text on the clipboard; needs the video subsystem
    pub fn clipboard_text(&self) -> Result<String> {
        self.get_text(exports::GET_CLIPBOARD_TEXT)
    }

    /// Replace the clipboard text; needs the video subsystem
    pub fn set_clipboard_text(&self, text: &str) -> Result<()> {
        self.set_text(exports::SET_CLIPBOARD_TEXT, text)
    }

    /// Whether the clipboard holds non-empty text
    pub fn has_clipboard_text(&self) -> Result<bool> {
        self.has_text(exports::HAS_CLIPBOARD_TEXT)
    }

    /// Text of the primary selection (SDL 2.26.0)
    pub fn primary_selection_text(&self) -> Result<String> {
        self.get_text(exports::GET_PRIMARY_SELECTION_TEXT)
    }

    /// Replace the primary selection (SDL 2.26.0)
    pub fn set_primary_selection_text(&self, text: &str) -> Result<()> {
        self.set_text(exports::SET_PRIMARY_SELECTION_TEXT, text)
    }

    /// Whether the primary selection holds non-empty text (SDL 2.26.0)
    pub fn has_primary_selection_text(&self) -> Result<bool> {
        self.has_text(exports::HAS_PRIMARY_SELECTION_TEXT)
    }

    fn get_text(&self, export: Export<GetText>) -> Result<String> {
        let get = self.resolve(export)?;
        let raw = unsafe { get() };

        // SDL hands out a fresh copy that the caller frees; null reads as ""
        let mut marshaler = StringMarshaler::new(self, Ownership::Owned);
        let text = unsafe { marshaler.to_managed(raw) };
        unsafe { marshaler.release_native(raw)? };
        text
    }

    fn set_text(&self, export: Export<SetText>, text: &str) -> Result<()> {
        let set = self.resolve(export)?;
        let mut marshaler = StringMarshaler::new(self, Ownership::Owned);
        let raw = marshaler.to_native(text)?;

        let code = unsafe { set(raw) };
        unsafe { marshaler.release_native(raw)? };
        if code < 0 {
            return Err(self.native_failure(Some(code)));
        }
        Ok(())
    }

    fn has_text(&self, export: Export<HasText>) -> Result<bool> {
        let has = self.resolve(export)?;
        Ok(unsafe { has() } != SDL_FALSE)
    }
}
