//! Raw C layouts and function-pointer types of the SDL2 ABI
//!
//! Nothing in here is safe to use directly; the wrappers elsewhere in the
//! crate are the public surface.
//!
//! # Safety
//!
//! The layouts mirror SDL2's public headers. `RawRwOps` values are always
//! allocated by SDL (`SDL_AllocRW` or one of the `SDL_RWFrom*` constructors),
//! so only the leading vtable, the type tag and the union members this crate
//! touches are declared.

pub mod exports;

use crate::native_int::NativeUInt;
use std::os::raw::{c_char, c_int, c_void};

/// `SDL_bool`
pub type SdlBool = c_int;

/// `SDL_version`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

pub type RwSizeFn = unsafe extern "C" fn(context: *mut RawRwOps) -> i64;
pub type RwSeekFn = unsafe extern "C" fn(context: *mut RawRwOps, offset: i64, whence: c_int) -> i64;
pub type RwReadFn = unsafe extern "C" fn(
    context: *mut RawRwOps,
    ptr: *mut c_void,
    size: NativeUInt,
    maxnum: NativeUInt,
) -> NativeUInt;
pub type RwWriteFn = unsafe extern "C" fn(
    context: *mut RawRwOps,
    ptr: *const c_void,
    size: NativeUInt,
    num: NativeUInt,
) -> NativeUInt;
pub type RwCloseFn = unsafe extern "C" fn(context: *mut RawRwOps) -> c_int;

/// `SDL_RWops`
#[repr(C)]
pub struct RawRwOps {
    pub size: Option<RwSizeFn>,
    pub seek: Option<RwSeekFn>,
    pub read: Option<RwReadFn>,
    pub write: Option<RwWriteFn>,
    pub close: Option<RwCloseFn>,
    pub type_: u32,
    pub hidden: RawRwOpsHidden,
}

/// Backend-specific tail of `SDL_RWops`
#[repr(C)]
#[derive(Clone, Copy)]
pub union RawRwOpsHidden {
    pub mem: RawRwOpsMem,
    pub unknown: RawRwOpsUnknown,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawRwOpsMem {
    pub base: *mut u8,
    pub here: *mut u8,
    pub stop: *mut u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawRwOpsUnknown {
    pub data1: *mut c_void,
    pub data2: *mut c_void,
}

/// `SDL_TimerCallback`
pub type TimerCallbackFn = unsafe extern "C" fn(interval: u32, param: *mut c_void) -> u32;

/// `SDL_LogOutputFunction`
pub type LogOutputFn = unsafe extern "C" fn(
    userdata: *mut c_void,
    category: c_int,
    priority: c_int,
    message: *const c_char,
);

pub const RW_SEEK_SET: c_int = 0;
pub const RW_SEEK_CUR: c_int = 1;
pub const RW_SEEK_END: c_int = 2;

pub const SDL_FALSE: SdlBool = 0;
pub const SDL_TRUE: SdlBool = 1;
