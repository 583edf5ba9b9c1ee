//! Minimal in-process SDL for unit tests
//!
//! Provides the heap, version and error exports. Counters are thread-local
//! so parallel unit tests do not observe each other.

use crate::ffi::RawVersion;
use crate::library::SymbolTable;
use crate::native_int::NativeUInt;
use crate::sdl::Sdl;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::cell::Cell;
use std::ffi::c_void;
use std::os::raw::c_char;
use std::ptr::{self, NonNull};

const HEADER: usize = 16;

thread_local! {
    static FREES: Cell<usize> = Cell::new(0);
}

fn layout(total: usize) -> Layout {
    Layout::from_size_align(total, HEADER).unwrap()
}

unsafe extern "C" fn sdl_malloc(size: NativeUInt) -> *mut c_void {
    let total = size.as_usize() + HEADER;
    let base = alloc_zeroed(layout(total));
    if base.is_null() {
        return ptr::null_mut();
    }
    *(base as *mut usize) = size.as_usize();
    base.add(HEADER) as *mut c_void
}

unsafe fn block_size(ptr: *mut c_void) -> usize {
    *((ptr as *mut u8).sub(HEADER) as *mut usize)
}

unsafe fn release(ptr: *mut c_void) {
    let base = (ptr as *mut u8).sub(HEADER);
    dealloc(base, layout(block_size(ptr) + HEADER));
}

unsafe extern "C" fn sdl_free(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    release(ptr);
    FREES.with(|f| f.set(f.get() + 1));
}

unsafe extern "C" fn sdl_realloc(ptr: *mut c_void, size: NativeUInt) -> *mut c_void {
    if ptr.is_null() {
        return sdl_malloc(size);
    }
    let grown = sdl_malloc(size);
    if !grown.is_null() {
        let keep = block_size(ptr).min(size.as_usize());
        ptr::copy_nonoverlapping(ptr as *const u8, grown as *mut u8, keep);
        release(ptr);
    }
    grown
}

unsafe extern "C" fn get_version(raw: *mut RawVersion) {
    *raw = RawVersion {
        major: 2,
        minor: 0,
        patch: 22,
    };
}

unsafe extern "C" fn get_error() -> *const c_char {
    b"unit test failure\0".as_ptr() as *const c_char
}

unsafe extern "C" fn clear_error() {}

struct UnitTable;

impl SymbolTable for UnitTable {
    fn lookup(&self, symbol: &str) -> Option<NonNull<c_void>> {
        let address = match symbol {
            "SDL_GetVersion" => get_version as usize,
            "SDL_GetError" => get_error as usize,
            "SDL_ClearError" => clear_error as usize,
            "SDL_malloc" => sdl_malloc as usize,
            "SDL_realloc" => sdl_realloc as usize,
            "SDL_free" => sdl_free as usize,
            _ => return None,
        };
        NonNull::new(address as *mut c_void)
    }

    fn describe(&self) -> String {
        "unit test SDL".to_string()
    }
}

/// Fresh instance; resets this thread's counters
pub fn sdl() -> Sdl {
    FREES.with(|f| f.set(0));
    Sdl::from_symbol_table(UnitTable)
}

/// `SDL_free` calls on this thread since [`sdl`]
pub fn frees() -> usize {
    FREES.with(Cell::get)
}

/// Copy `text` onto the fake SDL heap
pub fn sdl_string(text: &str) -> *const c_char {
    unsafe {
        let ptr = sdl_malloc(NativeUInt::from(text.len() + 1)) as *mut u8;
        ptr::copy_nonoverlapping(text.as_ptr(), ptr, text.len());
        ptr as *const c_char
    }
}

/// Free a fake SDL heap block without counting it
pub fn free_now(ptr: *mut c_void) {
    unsafe { release(ptr) }
}
