//! Every SDL2 export this crate calls, with the version that introduced it
//!
//! Keeping the `(symbol, minimum version, signature)` triples in one table
//! makes the compatibility matrix auditable without reading call sites.

use super::{LogOutputFn, RawRwOps, RawVersion, SdlBool, TimerCallbackFn};
use crate::native_int::NativeUInt;
use crate::sdl::Export;
use crate::version::Version;
use std::os::raw::{c_char, c_int, c_void};

macro_rules! exports {
    ($(
        $(#[$meta:meta])*
        $name:ident = $symbol:literal @ ($major:literal, $minor:literal, $patch:literal): $ty:ty;
    )*) => {
        $(
            $(#[$meta])*
            pub const $name: Export<$ty> =
                // SAFETY: the signature is copied from the SDL2 headers for this symbol
                unsafe { Export::new($symbol, Version::new($major, $minor, $patch)) };
        )*

        /// `(symbol, minimum version)` for every export above
        pub const ALL: &[(&str, Version)] = &[
            $(($symbol, Version::new($major, $minor, $patch)),)*
        ];
    };
}

exports! {
    // ===== Version and errors =====
    GET_VERSION = "SDL_GetVersion" @ (2, 0, 0): unsafe extern "C" fn(*mut RawVersion);
    GET_REVISION = "SDL_GetRevision" @ (2, 0, 0): unsafe extern "C" fn() -> *const c_char;
    GET_REVISION_NUMBER = "SDL_GetRevisionNumber" @ (2, 0, 0): unsafe extern "C" fn() -> c_int;
    GET_ERROR = "SDL_GetError" @ (2, 0, 0): unsafe extern "C" fn() -> *const c_char;
    CLEAR_ERROR = "SDL_ClearError" @ (2, 0, 0): unsafe extern "C" fn();

    // ===== Subsystems =====
    INIT = "SDL_Init" @ (2, 0, 0): unsafe extern "C" fn(u32) -> c_int;
    INIT_SUB_SYSTEM = "SDL_InitSubSystem" @ (2, 0, 0): unsafe extern "C" fn(u32) -> c_int;
    QUIT_SUB_SYSTEM = "SDL_QuitSubSystem" @ (2, 0, 0): unsafe extern "C" fn(u32);
    WAS_INIT = "SDL_WasInit" @ (2, 0, 0): unsafe extern "C" fn(u32) -> u32;
    QUIT = "SDL_Quit" @ (2, 0, 0): unsafe extern "C" fn();

    // ===== Heap =====
    MALLOC = "SDL_malloc" @ (2, 0, 0): unsafe extern "C" fn(NativeUInt) -> *mut c_void;
    REALLOC = "SDL_realloc" @ (2, 0, 0): unsafe extern "C" fn(*mut c_void, NativeUInt) -> *mut c_void;
    FREE = "SDL_free" @ (2, 0, 0): unsafe extern "C" fn(*mut c_void);

    // ===== SIMD =====
    SIMD_GET_ALIGNMENT = "SDL_SIMDGetAlignment" @ (2, 0, 10): unsafe extern "C" fn() -> NativeUInt;
    SIMD_ALLOC = "SDL_SIMDAlloc" @ (2, 0, 10): unsafe extern "C" fn(NativeUInt) -> *mut c_void;
    SIMD_REALLOC = "SDL_SIMDRealloc" @ (2, 0, 14): unsafe extern "C" fn(*mut c_void, NativeUInt) -> *mut c_void;
    SIMD_FREE = "SDL_SIMDFree" @ (2, 0, 10): unsafe extern "C" fn(*mut c_void);

    // ===== Timer =====
    ADD_TIMER = "SDL_AddTimer" @ (2, 0, 0): unsafe extern "C" fn(u32, Option<TimerCallbackFn>, *mut c_void) -> c_int;
    REMOVE_TIMER = "SDL_RemoveTimer" @ (2, 0, 0): unsafe extern "C" fn(c_int) -> SdlBool;
    GET_TICKS = "SDL_GetTicks" @ (2, 0, 0): unsafe extern "C" fn() -> u32;
    GET_TICKS64 = "SDL_GetTicks64" @ (2, 0, 18): unsafe extern "C" fn() -> u64;
    GET_PERFORMANCE_COUNTER = "SDL_GetPerformanceCounter" @ (2, 0, 0): unsafe extern "C" fn() -> u64;
    GET_PERFORMANCE_FREQUENCY = "SDL_GetPerformanceFrequency" @ (2, 0, 0): unsafe extern "C" fn() -> u64;
    DELAY = "SDL_Delay" @ (2, 0, 0): unsafe extern "C" fn(u32);

    // ===== Clipboard =====
    GET_CLIPBOARD_TEXT = "SDL_GetClipboardText" @ (2, 0, 0): unsafe extern "C" fn() -> *mut c_char;
    SET_CLIPBOARD_TEXT = "SDL_SetClipboardText" @ (2, 0, 0): unsafe extern "C" fn(*const c_char) -> c_int;
    HAS_CLIPBOARD_TEXT = "SDL_HasClipboardText" @ (2, 0, 0): unsafe extern "C" fn() -> SdlBool;
    GET_PRIMARY_SELECTION_TEXT = "SDL_GetPrimarySelectionText" @ (2, 26, 0): unsafe extern "C" fn() -> *mut c_char;
    SET_PRIMARY_SELECTION_TEXT = "SDL_SetPrimarySelectionText" @ (2, 26, 0): unsafe extern "C" fn(*const c_char) -> c_int;
    HAS_PRIMARY_SELECTION_TEXT = "SDL_HasPrimarySelectionText" @ (2, 26, 0): unsafe extern "C" fn() -> SdlBool;

    // ===== CPU =====
    GET_CPU_COUNT = "SDL_GetCPUCount" @ (2, 0, 0): unsafe extern "C" fn() -> c_int;
    GET_CPU_CACHE_LINE_SIZE = "SDL_GetCPUCacheLineSize" @ (2, 0, 0): unsafe extern "C" fn() -> c_int;
    GET_SYSTEM_RAM = "SDL_GetSystemRAM" @ (2, 0, 1): unsafe extern "C" fn() -> c_int;
    HAS_RDTSC = "SDL_HasRDTSC" @ (2, 0, 0): unsafe extern "C" fn() -> SdlBool;
    HAS_ALTIVEC = "SDL_HasAltiVec" @ (2, 0, 0): unsafe extern "C" fn() -> SdlBool;
    HAS_MMX = "SDL_HasMMX" @ (2, 0, 0): unsafe extern "C" fn() -> SdlBool;
    HAS_3DNOW = "SDL_Has3DNow" @ (2, 0, 0): unsafe extern "C" fn() -> SdlBool;
    HAS_SSE = "SDL_HasSSE" @ (2, 0, 0): unsafe extern "C" fn() -> SdlBool;
    HAS_SSE2 = "SDL_HasSSE2" @ (2, 0, 0): unsafe extern "C" fn() -> SdlBool;
    HAS_SSE3 = "SDL_HasSSE3" @ (2, 0, 0): unsafe extern "C" fn() -> SdlBool;
    HAS_SSE41 = "SDL_HasSSE41" @ (2, 0, 0): unsafe extern "C" fn() -> SdlBool;
    HAS_SSE42 = "SDL_HasSSE42" @ (2, 0, 0): unsafe extern "C" fn() -> SdlBool;
    HAS_AVX = "SDL_HasAVX" @ (2, 0, 2): unsafe extern "C" fn() -> SdlBool;
    HAS_AVX2 = "SDL_HasAVX2" @ (2, 0, 4): unsafe extern "C" fn() -> SdlBool;
    HAS_NEON = "SDL_HasNEON" @ (2, 0, 6): unsafe extern "C" fn() -> SdlBool;
    HAS_AVX512F = "SDL_HasAVX512F" @ (2, 0, 9): unsafe extern "C" fn() -> SdlBool;
    HAS_ARMSIMD = "SDL_HasARMSIMD" @ (2, 0, 12): unsafe extern "C" fn() -> SdlBool;
    HAS_LSX = "SDL_HasLSX" @ (2, 24, 0): unsafe extern "C" fn() -> SdlBool;
    HAS_LASX = "SDL_HasLASX" @ (2, 24, 0): unsafe extern "C" fn() -> SdlBool;

    // ===== Power and platform =====
    GET_POWER_INFO = "SDL_GetPowerInfo" @ (2, 0, 0): unsafe extern "C" fn(*mut c_int, *mut c_int) -> c_int;
    GET_PLATFORM = "SDL_GetPlatform" @ (2, 0, 0): unsafe extern "C" fn() -> *const c_char;

    // ===== Log =====
    LOG_SET_ALL_PRIORITY = "SDL_LogSetAllPriority" @ (2, 0, 0): unsafe extern "C" fn(c_int);
    LOG_SET_PRIORITY = "SDL_LogSetPriority" @ (2, 0, 0): unsafe extern "C" fn(c_int, c_int);
    LOG_GET_PRIORITY = "SDL_LogGetPriority" @ (2, 0, 0): unsafe extern "C" fn(c_int) -> c_int;
    LOG_RESET_PRIORITIES = "SDL_LogResetPriorities" @ (2, 0, 0): unsafe extern "C" fn();
    LOG = "SDL_Log" @ (2, 0, 0): unsafe extern "C" fn(*const c_char, ...);
    LOG_VERBOSE = "SDL_LogVerbose" @ (2, 0, 0): unsafe extern "C" fn(c_int, *const c_char, ...);
    LOG_DEBUG = "SDL_LogDebug" @ (2, 0, 0): unsafe extern "C" fn(c_int, *const c_char, ...);
    LOG_INFO = "SDL_LogInfo" @ (2, 0, 0): unsafe extern "C" fn(c_int, *const c_char, ...);
    LOG_WARN = "SDL_LogWarn" @ (2, 0, 0): unsafe extern "C" fn(c_int, *const c_char, ...);
    LOG_ERROR = "SDL_LogError" @ (2, 0, 0): unsafe extern "C" fn(c_int, *const c_char, ...);
    LOG_CRITICAL = "SDL_LogCritical" @ (2, 0, 0): unsafe extern "C" fn(c_int, *const c_char, ...);
    LOG_MESSAGE = "SDL_LogMessage" @ (2, 0, 0): unsafe extern "C" fn(c_int, c_int, *const c_char, ...);
    LOG_GET_OUTPUT_FUNCTION = "SDL_LogGetOutputFunction" @ (2, 0, 0): unsafe extern "C" fn(*mut Option<LogOutputFn>, *mut *mut c_void);
    LOG_SET_OUTPUT_FUNCTION = "SDL_LogSetOutputFunction" @ (2, 0, 0): unsafe extern "C" fn(Option<LogOutputFn>, *mut c_void);

    // ===== RWops =====
    RW_FROM_FILE = "SDL_RWFromFile" @ (2, 0, 0): unsafe extern "C" fn(*const c_char, *const c_char) -> *mut RawRwOps;
    RW_FROM_MEM = "SDL_RWFromMem" @ (2, 0, 0): unsafe extern "C" fn(*mut c_void, c_int) -> *mut RawRwOps;
    RW_FROM_CONST_MEM = "SDL_RWFromConstMem" @ (2, 0, 0): unsafe extern "C" fn(*const c_void, c_int) -> *mut RawRwOps;
    ALLOC_RW = "SDL_AllocRW" @ (2, 0, 0): unsafe extern "C" fn() -> *mut RawRwOps;
    FREE_RW = "SDL_FreeRW" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps);
    LOAD_FILE_RW = "SDL_LoadFile_RW" @ (2, 0, 6): unsafe extern "C" fn(*mut RawRwOps, *mut NativeUInt, c_int) -> *mut c_void;
    LOAD_FILE = "SDL_LoadFile" @ (2, 0, 10): unsafe extern "C" fn(*const c_char, *mut NativeUInt) -> *mut c_void;
    RW_SIZE = "SDL_RWsize" @ (2, 0, 10): unsafe extern "C" fn(*mut RawRwOps) -> i64;
    RW_SEEK = "SDL_RWseek" @ (2, 0, 10): unsafe extern "C" fn(*mut RawRwOps, i64, c_int) -> i64;
    RW_TELL = "SDL_RWtell" @ (2, 0, 10): unsafe extern "C" fn(*mut RawRwOps) -> i64;
    RW_READ = "SDL_RWread" @ (2, 0, 10): unsafe extern "C" fn(*mut RawRwOps, *mut c_void, NativeUInt, NativeUInt) -> NativeUInt;
    RW_WRITE = "SDL_RWwrite" @ (2, 0, 10): unsafe extern "C" fn(*mut RawRwOps, *const c_void, NativeUInt, NativeUInt) -> NativeUInt;
    RW_CLOSE = "SDL_RWclose" @ (2, 0, 10): unsafe extern "C" fn(*mut RawRwOps) -> c_int;
    READ_U8 = "SDL_ReadU8" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps) -> u8;
    READ_LE16 = "SDL_ReadLE16" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps) -> u16;
    READ_BE16 = "SDL_ReadBE16" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps) -> u16;
    READ_LE32 = "SDL_ReadLE32" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps) -> u32;
    READ_BE32 = "SDL_ReadBE32" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps) -> u32;
    READ_LE64 = "SDL_ReadLE64" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps) -> u64;
    READ_BE64 = "SDL_ReadBE64" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps) -> u64;
    WRITE_U8 = "SDL_WriteU8" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps, u8) -> NativeUInt;
    WRITE_LE16 = "SDL_WriteLE16" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps, u16) -> NativeUInt;
    WRITE_BE16 = "SDL_WriteBE16" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps, u16) -> NativeUInt;
    WRITE_LE32 = "SDL_WriteLE32" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps, u32) -> NativeUInt;
    WRITE_BE32 = "SDL_WriteBE32" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps, u32) -> NativeUInt;
    WRITE_LE64 = "SDL_WriteLE64" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps, u64) -> NativeUInt;
    WRITE_BE64 = "SDL_WriteBE64" @ (2, 0, 0): unsafe extern "C" fn(*mut RawRwOps, u64) -> NativeUInt;
}

/// Minimum version of `symbol`, if this crate knows it
pub fn minimum_version_of(symbol: &str) -> Option<Version> {
    ALL.iter()
        .find(|(name, _)| *name == symbol)
        .map(|(_, version)| *version)
}
