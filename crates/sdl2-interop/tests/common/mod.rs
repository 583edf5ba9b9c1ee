//! In-process fake SDL2 shared by the integration tests
//!
//! The fake implements the subset of SDL2 this crate calls, with SDL's
//! observable semantics: reference-counted subsystems, a single error slot,
//! heap blocks freed with `SDL_free`, memory and file streams, timer threads
//! and the log output function. Exports newer than the configured version
//! are absent, exactly like an old `libSDL2`.
//!
//! State is process-global, so every test using it runs `#[serial]`.

#![allow(dead_code)]

use parking_lot::{const_mutex, Mutex};
use sdl2_interop::ffi::exports::minimum_version_of;
use sdl2_interop::ffi::{
    LogOutputFn, RawRwOps, RawRwOpsMem, RawVersion, SdlBool, TimerCallbackFn, RW_SEEK_CUR, RW_SEEK_END,
    RW_SEEK_SET, SDL_FALSE, SDL_TRUE,
};
use sdl2_interop::{InitFlags, NativeUInt, Sdl, SymbolTable, Version};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::collections::BTreeMap;
use std::ffi::{c_void, CStr, CString};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::raw::{c_char, c_int};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Version most tests run against
pub const CURRENT: Version = Version::new(2, 28, 5);

const HEADER: usize = 16;

struct FakeTimer {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

struct FakeState {
    version: Version,
    error: Option<CString>,
    subsystems: BTreeMap<u32, u32>,
    clipboard: String,
    primary_selection: String,
    null_clipboard: bool,
    timers: BTreeMap<c_int, FakeTimer>,
    next_timer: c_int,
    fail_timers: bool,
    priorities: BTreeMap<c_int, c_int>,
    output: Option<LogOutputFn>,
    output_user_data: usize,
}

impl FakeState {
    const fn new() -> Self {
        Self {
            version: CURRENT,
            error: None,
            subsystems: BTreeMap::new(),
            clipboard: String::new(),
            primary_selection: String::new(),
            null_clipboard: false,
            timers: BTreeMap::new(),
            next_timer: 1,
            fail_timers: false,
            priorities: BTreeMap::new(),
            output: Some(default_output),
            output_user_data: 0,
        }
    }
}

static STATE: Mutex<FakeState> = const_mutex(FakeState::new());
static LOGGED: Mutex<Vec<(c_int, c_int, String)>> = const_mutex(Vec::new());
static MALLOCS: AtomicUsize = AtomicUsize::new(0);
static FREES: AtomicUsize = AtomicUsize::new(0);
static START: OnceLock<Instant> = OnceLock::new();

struct FakeLibrary {
    version: Version,
}

/// Fresh fake SDL reporting `version`
pub fn sdl(version: Version) -> Sdl {
    let stale: Vec<FakeTimer> = {
        let mut state = STATE.lock();
        let timers = std::mem::take(&mut state.timers);
        *state = FakeState::new();
        state.version = version;
        timers.into_values().collect()
    };
    for timer in stale {
        stop_timer(timer);
    }
    LOGGED.lock().clear();
    MALLOCS.store(0, Ordering::SeqCst);
    FREES.store(0, Ordering::SeqCst);

    Sdl::from_symbol_table(FakeLibrary { version })
}

/// Fake SDL at [`CURRENT`]
pub fn current() -> Sdl {
    sdl(CURRENT)
}

/// Blocks allocated on the fake heap and not yet freed
pub fn live_blocks() -> usize {
    MALLOCS.load(Ordering::SeqCst) - FREES.load(Ordering::SeqCst)
}

pub fn frees() -> usize {
    FREES.load(Ordering::SeqCst)
}

/// Subsystem reference counts as SDL_WasInit reports them
pub fn running_subsystems() -> InitFlags {
    InitFlags::from_bits_retain(unsafe { was_init(0) })
}

/// Make the next `SDL_AddTimer` calls fail
pub fn fail_timers(fail: bool) {
    STATE.lock().fail_timers = fail;
}

/// Make the clipboard getters return a null pointer
pub fn null_clipboard(null: bool) {
    STATE.lock().null_clipboard = null;
}

pub fn active_timers() -> usize {
    STATE.lock().timers.len()
}

/// Messages that reached SDL's default output function
pub fn logged() -> Vec<(c_int, c_int, String)> {
    LOGGED.lock().clone()
}

/// Put raw text into the error slot
pub fn set_error(message: &str) {
    STATE.lock().error = CString::new(message).ok();
}

// ===== Symbol table =====

impl SymbolTable for FakeLibrary {
    fn lookup(&self, symbol: &str) -> Option<NonNull<c_void>> {
        if let Some(minimum) = minimum_version_of(symbol) {
            if minimum > self.version {
                return None;
            }
        }

        let address = match symbol {
            "SDL_GetVersion" => get_version as usize,
            "SDL_GetRevision" => get_revision as usize,
            "SDL_GetRevisionNumber" => get_revision_number as usize,
            "SDL_GetError" => get_error as usize,
            "SDL_ClearError" => clear_error as usize,

            "SDL_Init" => init as usize,
            "SDL_InitSubSystem" => init as usize,
            "SDL_QuitSubSystem" => quit_sub_system as usize,
            "SDL_WasInit" => was_init as usize,
            "SDL_Quit" => quit as usize,

            "SDL_malloc" => malloc as usize,
            "SDL_realloc" => realloc as usize,
            "SDL_free" => free as usize,
            "SDL_SIMDGetAlignment" => simd_alignment as usize,
            "SDL_SIMDAlloc" => malloc as usize,
            "SDL_SIMDRealloc" => realloc as usize,
            "SDL_SIMDFree" => free as usize,

            "SDL_AddTimer" => add_timer as usize,
            "SDL_RemoveTimer" => remove_timer as usize,
            "SDL_GetTicks" => get_ticks as usize,
            "SDL_GetTicks64" => get_ticks64 as usize,
            "SDL_GetPerformanceCounter" => performance_counter as usize,
            "SDL_GetPerformanceFrequency" => performance_frequency as usize,
            "SDL_Delay" => delay as usize,

            "SDL_GetClipboardText" => get_clipboard_text as usize,
            "SDL_SetClipboardText" => set_clipboard_text as usize,
            "SDL_HasClipboardText" => has_clipboard_text as usize,
            "SDL_GetPrimarySelectionText" => get_primary_selection_text as usize,
            "SDL_SetPrimarySelectionText" => set_primary_selection_text as usize,
            "SDL_HasPrimarySelectionText" => has_primary_selection_text as usize,

            "SDL_GetCPUCount" => cpu_count as usize,
            "SDL_GetCPUCacheLineSize" => cache_line_size as usize,
            "SDL_GetSystemRAM" => system_ram as usize,
            "SDL_HasSSE" | "SDL_HasSSE2" => feature_present as usize,
            name if name.starts_with("SDL_Has") => feature_absent as usize,

            "SDL_GetPowerInfo" => power_info as usize,
            "SDL_GetPlatform" => platform as usize,

            "SDL_LogSetAllPriority" => log_set_all_priority as usize,
            "SDL_LogSetPriority" => log_set_priority as usize,
            "SDL_LogGetPriority" => log_get_priority as usize,
            "SDL_LogResetPriorities" => log_reset_priorities as usize,
            "SDL_LogGetOutputFunction" => log_get_output_function as usize,
            "SDL_LogSetOutputFunction" => log_set_output_function as usize,
            #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
            "SDL_Log" => log_application as usize,
            #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
            "SDL_LogMessage" => log_message as usize,
            #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
            "SDL_LogVerbose" => log_verbose as usize,
            #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
            "SDL_LogDebug" => log_debug as usize,
            #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
            "SDL_LogInfo" => log_info as usize,
            #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
            "SDL_LogWarn" => log_warn as usize,
            #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
            "SDL_LogError" => log_error as usize,
            #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
            "SDL_LogCritical" => log_critical as usize,

            "SDL_AllocRW" => alloc_rw as usize,
            "SDL_FreeRW" => free_rw as usize,
            "SDL_RWFromMem" => rw_from_mem as usize,
            "SDL_RWFromConstMem" => rw_from_const_mem as usize,
            "SDL_RWFromFile" => rw_from_file as usize,
            "SDL_RWsize" => rw_size as usize,
            "SDL_RWseek" => rw_seek as usize,
            "SDL_RWtell" => rw_tell as usize,
            "SDL_RWread" => rw_read as usize,
            "SDL_RWwrite" => rw_write as usize,
            "SDL_RWclose" => rw_close as usize,
            "SDL_LoadFile_RW" => load_file_rw as usize,
            "SDL_LoadFile" => load_file as usize,
            "SDL_ReadU8" => read_u8 as usize,
            "SDL_ReadLE16" => read_le16 as usize,
            "SDL_ReadBE16" => read_be16 as usize,
            "SDL_ReadLE32" => read_le32 as usize,
            "SDL_ReadBE32" => read_be32 as usize,
            "SDL_ReadLE64" => read_le64 as usize,
            "SDL_ReadBE64" => read_be64 as usize,
            "SDL_WriteU8" => write_u8 as usize,
            "SDL_WriteLE16" => write_le16 as usize,
            "SDL_WriteBE16" => write_be16 as usize,
            "SDL_WriteLE32" => write_le32 as usize,
            "SDL_WriteBE32" => write_be32 as usize,
            "SDL_WriteLE64" => write_le64 as usize,
            "SDL_WriteBE64" => write_be64 as usize,
            _ => return None,
        };
        NonNull::new(address as *mut c_void)
    }

    fn describe(&self) -> String {
        format!("fake SDL {}", self.version)
    }
}

fn fail(message: &str) {
    set_error(message);
}

// ===== Version and errors =====

unsafe extern "C" fn get_version(raw: *mut RawVersion) {
    let version = STATE.lock().version;
    *raw = RawVersion {
        major: version.major,
        minor: version.minor,
        patch: version.patch,
    };
}

unsafe extern "C" fn get_revision() -> *const c_char {
    b"fake-revision\0".as_ptr() as *const c_char
}

unsafe extern "C" fn get_revision_number() -> c_int {
    0
}

unsafe extern "C" fn get_error() -> *const c_char {
    match &STATE.lock().error {
        Some(message) => message.as_ptr(),
        None => b"\0".as_ptr() as *const c_char,
    }
}

unsafe extern "C" fn clear_error() {
    STATE.lock().error = None;
}

// ===== Subsystems =====

fn supported_flags(version: Version) -> InitFlags {
    let mut supported = InitFlags::all();
    if version < Version::new(2, 0, 9) {
        supported -= InitFlags::SENSOR;
    }
    if version >= Version::new(2, 0, 5) {
        supported -= InitFlags::NO_PARACHUTE;
    }
    supported
}

unsafe extern "C" fn init(flags: u32) -> c_int {
    let mut state = STATE.lock();
    let requested = InitFlags::from_bits_retain(flags);
    if !supported_flags(state.version).contains(requested) {
        state.error = CString::new(format!("Unsupported subsystem flags {flags:#x}")).ok();
        return -1;
    }

    for flag in (requested.implied() - InitFlags::NO_PARACHUTE).iter() {
        *state.subsystems.entry(flag.bits()).or_insert(0) += 1;
    }
    0
}

unsafe extern "C" fn quit_sub_system(flags: u32) {
    let mut state = STATE.lock();
    for flag in InitFlags::from_bits_retain(flags).implied().iter() {
        if let Some(count) = state.subsystems.get_mut(&flag.bits()) {
            *count = count.saturating_sub(1);
        }
    }
    state.subsystems.retain(|_, count| *count > 0);
}

unsafe extern "C" fn was_init(flags: u32) -> u32 {
    let running: u32 = STATE.lock().subsystems.keys().fold(0, |acc, bit| acc | bit);
    if flags == 0 {
        running
    } else {
        running & flags
    }
}

unsafe extern "C" fn quit() {
    STATE.lock().subsystems.clear();
}

fn video_running() -> bool {
    STATE.lock().subsystems.contains_key(&InitFlags::VIDEO.bits())
}

// ===== Heap =====

fn layout(total: usize) -> Layout {
    Layout::from_size_align(total, HEADER).unwrap()
}

unsafe extern "C" fn malloc(size: NativeUInt) -> *mut c_void {
    let total = size.as_usize() + HEADER;
    let base = alloc_zeroed(layout(total));
    if base.is_null() {
        return ptr::null_mut();
    }
    *(base as *mut usize) = size.as_usize();
    MALLOCS.fetch_add(1, Ordering::SeqCst);
    base.add(HEADER) as *mut c_void
}

unsafe fn block_size(ptr: *mut c_void) -> usize {
    *((ptr as *mut u8).sub(HEADER) as *mut usize)
}

unsafe extern "C" fn free(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    let size = block_size(ptr);
    dealloc((ptr as *mut u8).sub(HEADER), layout(size + HEADER));
    FREES.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn realloc(ptr: *mut c_void, size: NativeUInt) -> *mut c_void {
    if ptr.is_null() {
        return malloc(size);
    }
    let grown = malloc(size);
    if !grown.is_null() {
        let keep = block_size(ptr).min(size.as_usize());
        ptr::copy_nonoverlapping(ptr as *const u8, grown as *mut u8, keep);
        free(ptr);
    }
    grown
}

unsafe extern "C" fn simd_alignment() -> NativeUInt {
    NativeUInt::from(HEADER)
}

unsafe fn heap_string(text: &str) -> *mut c_char {
    let ptr = malloc(NativeUInt::from(text.len() + 1)) as *mut u8;
    ptr::copy_nonoverlapping(text.as_ptr(), ptr, text.len());
    ptr as *mut c_char
}

// ===== Timers =====

fn ticks_since_start() -> Duration {
    START.get_or_init(Instant::now).elapsed()
}

unsafe extern "C" fn add_timer(interval: u32, callback: Option<TimerCallbackFn>, param: *mut c_void) -> c_int {
    let mut state = STATE.lock();
    let Some(callback) = callback else {
        state.error = CString::new("Parameter 'callback' is invalid").ok();
        return 0;
    };
    if state.fail_timers {
        state.error = CString::new("Timer limit reached").ok();
        return 0;
    }

    let id = state.next_timer;
    state.next_timer += 1;
    let stop = Arc::new(AtomicBool::new(false));
    let param = param as usize;

    let running = Arc::clone(&stop);
    let thread = thread::spawn(move || {
        let mut interval = interval;
        loop {
            thread::sleep(Duration::from_millis(u64::from(interval.max(1))));
            if running.load(Ordering::SeqCst) {
                return;
            }
            interval = unsafe { callback(interval, param as *mut c_void) };
            if interval == 0 {
                return;
            }
        }
    });

    state.timers.insert(
        id,
        FakeTimer {
            stop,
            thread: Some(thread),
        },
    );
    id
}

fn stop_timer(mut timer: FakeTimer) {
    timer.stop.store(true, Ordering::SeqCst);
    if let Some(thread) = timer.thread.take() {
        let _ = thread.join();
    }
}

unsafe extern "C" fn remove_timer(id: c_int) -> SdlBool {
    let timer = STATE.lock().timers.remove(&id);
    match timer {
        Some(timer) => {
            stop_timer(timer);
            SDL_TRUE
        }
        None => SDL_FALSE,
    }
}

unsafe extern "C" fn get_ticks() -> u32 {
    ticks_since_start().as_millis() as u32
}

unsafe extern "C" fn get_ticks64() -> u64 {
    ticks_since_start().as_millis() as u64
}

unsafe extern "C" fn performance_counter() -> u64 {
    ticks_since_start().as_nanos() as u64
}

unsafe extern "C" fn performance_frequency() -> u64 {
    1_000_000_000
}

unsafe extern "C" fn delay(ms: u32) {
    thread::sleep(Duration::from_millis(u64::from(ms)));
}

// ===== Clipboard =====

unsafe extern "C" fn get_clipboard_text() -> *mut c_char {
    if !video_running() {
        fail("Video subsystem must be initialized to get clipboard text");
        return heap_string("");
    }
    let (null, text) = {
        let state = STATE.lock();
        (state.null_clipboard, state.clipboard.clone())
    };
    if null {
        return ptr::null_mut();
    }
    heap_string(&text)
}

unsafe extern "C" fn set_clipboard_text(text: *const c_char) -> c_int {
    if !video_running() {
        fail("Video subsystem must be initialized to set clipboard text");
        return -1;
    }
    let text = if text.is_null() {
        String::new()
    } else {
        CStr::from_ptr(text).to_string_lossy().into_owned()
    };
    STATE.lock().clipboard = text;
    0
}

unsafe extern "C" fn has_clipboard_text() -> SdlBool {
    if video_running() && !STATE.lock().clipboard.is_empty() {
        SDL_TRUE
    } else {
        SDL_FALSE
    }
}

unsafe extern "C" fn get_primary_selection_text() -> *mut c_char {
    if !video_running() {
        fail("Video subsystem must be initialized to get primary selection text");
        return heap_string("");
    }
    let (null, text) = {
        let state = STATE.lock();
        (state.null_clipboard, state.primary_selection.clone())
    };
    if null {
        return ptr::null_mut();
    }
    heap_string(&text)
}

unsafe extern "C" fn set_primary_selection_text(text: *const c_char) -> c_int {
    if !video_running() {
        fail("Video subsystem must be initialized to set primary selection text");
        return -1;
    }
    STATE.lock().primary_selection = CStr::from_ptr(text).to_string_lossy().into_owned();
    0
}

unsafe extern "C" fn has_primary_selection_text() -> SdlBool {
    if video_running() && !STATE.lock().primary_selection.is_empty() {
        SDL_TRUE
    } else {
        SDL_FALSE
    }
}

// ===== CPU, power, platform =====

unsafe extern "C" fn cpu_count() -> c_int {
    4
}

unsafe extern "C" fn cache_line_size() -> c_int {
    64
}

unsafe extern "C" fn system_ram() -> c_int {
    8192
}

unsafe extern "C" fn feature_present() -> SdlBool {
    SDL_TRUE
}

unsafe extern "C" fn feature_absent() -> SdlBool {
    SDL_FALSE
}

unsafe extern "C" fn power_info(seconds: *mut c_int, percentage: *mut c_int) -> c_int {
    if !seconds.is_null() {
        *seconds = 5400;
    }
    if !percentage.is_null() {
        *percentage = -1;
    }
    1
}

unsafe extern "C" fn platform() -> *const c_char {
    b"Fake\0".as_ptr() as *const c_char
}

// ===== Log =====

const DEFAULT_PRIORITY: c_int = 6;

fn default_priority(category: c_int) -> c_int {
    match category {
        0 => 3,
        2 => 4,
        8 => 1,
        _ => DEFAULT_PRIORITY,
    }
}

unsafe extern "C" fn default_output(_: *mut c_void, category: c_int, priority: c_int, message: *const c_char) {
    let message = CStr::from_ptr(message).to_string_lossy().into_owned();
    LOGGED.lock().push((category, priority, message));
}

unsafe extern "C" fn log_set_all_priority(priority: c_int) {
    let mut state = STATE.lock();
    state.priorities.clear();
    for category in 0..=18 {
        state.priorities.insert(category, priority);
    }
}

unsafe extern "C" fn log_set_priority(category: c_int, priority: c_int) {
    STATE.lock().priorities.insert(category, priority);
}

unsafe extern "C" fn log_get_priority(category: c_int) -> c_int {
    STATE
        .lock()
        .priorities
        .get(&category)
        .copied()
        .unwrap_or_else(|| default_priority(category))
}

unsafe extern "C" fn log_reset_priorities() {
    STATE.lock().priorities.clear();
}

unsafe extern "C" fn log_get_output_function(callback: *mut Option<LogOutputFn>, user_data: *mut *mut c_void) {
    let state = STATE.lock();
    if !callback.is_null() {
        *callback = state.output;
    }
    if !user_data.is_null() {
        *user_data = state.output_user_data as *mut c_void;
    }
}

unsafe extern "C" fn log_set_output_function(callback: Option<LogOutputFn>, user_data: *mut c_void) {
    let mut state = STATE.lock();
    state.output = callback;
    state.output_user_data = user_data as usize;
}

/// The variadic log exports are only ever called with `"%s", text`; on
/// x86_64 SysV those land in the same registers as a two-argument call.
unsafe fn emit(category: c_int, priority: c_int, format: *const c_char, text: *const c_char) {
    assert_eq!(CStr::from_ptr(format).to_bytes(), b"%s".as_slice());

    let (output, user_data) = {
        let state = STATE.lock();
        let threshold = state
            .priorities
            .get(&category)
            .copied()
            .unwrap_or_else(|| default_priority(category));
        if priority < threshold {
            return;
        }
        (state.output, state.output_user_data)
    };

    if let Some(output) = output {
        output(user_data as *mut c_void, category, priority, text);
    }
}

unsafe extern "C" fn log_application(format: *const c_char, text: *const c_char) {
    emit(0, 3, format, text);
}

unsafe extern "C" fn log_message(category: c_int, priority: c_int, format: *const c_char, text: *const c_char) {
    emit(category, priority, format, text);
}

unsafe extern "C" fn log_verbose(category: c_int, format: *const c_char, text: *const c_char) {
    emit(category, 1, format, text);
}

unsafe extern "C" fn log_debug(category: c_int, format: *const c_char, text: *const c_char) {
    emit(category, 2, format, text);
}

unsafe extern "C" fn log_info(category: c_int, format: *const c_char, text: *const c_char) {
    emit(category, 3, format, text);
}

unsafe extern "C" fn log_warn(category: c_int, format: *const c_char, text: *const c_char) {
    emit(category, 4, format, text);
}

unsafe extern "C" fn log_error(category: c_int, format: *const c_char, text: *const c_char) {
    emit(category, 5, format, text);
}

unsafe extern "C" fn log_critical(category: c_int, format: *const c_char, text: *const c_char) {
    emit(category, 6, format, text);
}

// ===== RWops =====

unsafe extern "C" fn alloc_rw() -> *mut RawRwOps {
    let raw = malloc(NativeUInt::from(std::mem::size_of::<RawRwOps>())) as *mut RawRwOps;
    if raw.is_null() {
        fail("Out of memory");
        return raw;
    }
    // SDL only sets the type tag; everything else is garbage
    ptr::write_bytes(raw as *mut u8, 0xAB, std::mem::size_of::<RawRwOps>());
    ptr::addr_of_mut!((*raw).type_).write(0);
    raw
}

unsafe extern "C" fn free_rw(raw: *mut RawRwOps) {
    free(raw as *mut c_void);
}

unsafe fn mem_stream(base: *mut u8, size: c_int, writable: bool) -> *mut RawRwOps {
    if base.is_null() || size <= 0 {
        fail("Parameter 'mem' is invalid");
        return ptr::null_mut();
    }
    let raw = alloc_rw();
    if raw.is_null() {
        return raw;
    }

    (*raw).size = Some(mem_size);
    (*raw).seek = Some(mem_seek);
    (*raw).read = Some(mem_read);
    (*raw).write = Some(if writable { mem_write } else { mem_write_const });
    (*raw).close = Some(mem_close);
    (*raw).type_ = if writable { 4 } else { 5 };
    (*raw).hidden.mem = RawRwOpsMem {
        base,
        here: base,
        stop: base.add(size as usize),
    };
    raw
}

unsafe extern "C" fn rw_from_mem(mem: *mut c_void, size: c_int) -> *mut RawRwOps {
    mem_stream(mem as *mut u8, size, true)
}

unsafe extern "C" fn rw_from_const_mem(mem: *const c_void, size: c_int) -> *mut RawRwOps {
    mem_stream(mem as *mut u8, size, false)
}

unsafe extern "C" fn mem_size(context: *mut RawRwOps) -> i64 {
    let mem = (*context).hidden.mem;
    mem.stop.offset_from(mem.base) as i64
}

unsafe extern "C" fn mem_seek(context: *mut RawRwOps, offset: i64, whence: c_int) -> i64 {
    let mem = (*context).hidden.mem;
    let len = mem.stop.offset_from(mem.base) as i64;
    let origin = match whence {
        RW_SEEK_SET => 0,
        RW_SEEK_CUR => mem.here.offset_from(mem.base) as i64,
        RW_SEEK_END => len,
        _ => {
            fail("Unknown value for 'whence'");
            return -1;
        }
    };
    let position = (origin + offset).clamp(0, len);
    (*context).hidden.mem.here = mem.base.add(position as usize);
    position
}

unsafe extern "C" fn mem_read(context: *mut RawRwOps, ptr: *mut c_void, size: NativeUInt, maxnum: NativeUInt) -> NativeUInt {
    let size = size.as_usize();
    if size == 0 {
        return NativeUInt::ZERO;
    }
    let mem = (*context).hidden.mem;
    let available = mem.stop.offset_from(mem.here) as usize;
    let count = maxnum.as_usize().min(available / size);
    let bytes = count * size;

    ptr::copy_nonoverlapping(mem.here, ptr as *mut u8, bytes);
    (*context).hidden.mem.here = mem.here.add(bytes);
    NativeUInt::from(count)
}

unsafe extern "C" fn mem_write(context: *mut RawRwOps, ptr: *const c_void, size: NativeUInt, num: NativeUInt) -> NativeUInt {
    let size = size.as_usize();
    if size == 0 {
        return NativeUInt::ZERO;
    }
    let mem = (*context).hidden.mem;
    let available = mem.stop.offset_from(mem.here) as usize;
    let count = num.as_usize().min(available / size);
    let bytes = count * size;

    ptr::copy_nonoverlapping(ptr as *const u8, mem.here, bytes);
    (*context).hidden.mem.here = mem.here.add(bytes);
    NativeUInt::from(count)
}

unsafe extern "C" fn mem_write_const(_: *mut RawRwOps, _: *const c_void, _: NativeUInt, _: NativeUInt) -> NativeUInt {
    fail("Can't write to read-only memory");
    NativeUInt::ZERO
}

unsafe extern "C" fn mem_close(context: *mut RawRwOps) -> c_int {
    free_rw(context);
    0
}

unsafe fn file_of<'a>(context: *mut RawRwOps) -> &'a mut File {
    &mut *((*context).hidden.unknown.data1 as *mut File)
}

unsafe extern "C" fn rw_from_file(file: *const c_char, mode: *const c_char) -> *mut RawRwOps {
    let path = CStr::from_ptr(file).to_string_lossy().into_owned();
    let mode = CStr::from_ptr(mode).to_string_lossy().replace('b', "");

    let mut options = OpenOptions::new();
    match mode.as_str() {
        "r" => options.read(true),
        "w" => options.write(true).create(true).truncate(true),
        "a" => options.append(true).create(true),
        "r+" => options.read(true).write(true),
        "w+" => options.read(true).write(true).create(true).truncate(true),
        "a+" => options.read(true).append(true).create(true),
        _ => {
            fail("Unknown file mode");
            return ptr::null_mut();
        }
    };
    let handle = match options.open(&path) {
        Ok(handle) => handle,
        Err(_) => {
            fail(&format!("Couldn't open {path}"));
            return ptr::null_mut();
        }
    };

    let raw = alloc_rw();
    if raw.is_null() {
        return raw;
    }
    (*raw).size = Some(file_size);
    (*raw).seek = Some(file_seek);
    (*raw).read = Some(file_read);
    (*raw).write = Some(file_write);
    (*raw).close = Some(file_close);
    (*raw).type_ = 2;
    (*raw).hidden.unknown.data1 = Box::into_raw(Box::new(handle)) as *mut c_void;
    (*raw).hidden.unknown.data2 = ptr::null_mut();
    raw
}

unsafe extern "C" fn file_size(context: *mut RawRwOps) -> i64 {
    match file_of(context).metadata() {
        Ok(metadata) => metadata.len() as i64,
        Err(_) => -1,
    }
}

unsafe extern "C" fn file_seek(context: *mut RawRwOps, offset: i64, whence: c_int) -> i64 {
    let position = match whence {
        RW_SEEK_SET => SeekFrom::Start(offset as u64),
        RW_SEEK_CUR => SeekFrom::Current(offset),
        RW_SEEK_END => SeekFrom::End(offset),
        _ => return -1,
    };
    match file_of(context).seek(position) {
        Ok(position) => position as i64,
        Err(_) => {
            fail("Error seeking in datastream");
            -1
        }
    }
}

unsafe extern "C" fn file_read(context: *mut RawRwOps, ptr: *mut c_void, size: NativeUInt, maxnum: NativeUInt) -> NativeUInt {
    let size = size.as_usize();
    let total = size * maxnum.as_usize();
    if total == 0 {
        return NativeUInt::ZERO;
    }
    let buf = std::slice::from_raw_parts_mut(ptr as *mut u8, total);
    let mut filled = 0;
    while filled < total {
        match file_of(context).read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => {
                fail("Error reading from datastream");
                break;
            }
        }
    }
    NativeUInt::from(filled / size)
}

unsafe extern "C" fn file_write(context: *mut RawRwOps, ptr: *const c_void, size: NativeUInt, num: NativeUInt) -> NativeUInt {
    let size = size.as_usize();
    let total = size * num.as_usize();
    if total == 0 {
        return NativeUInt::ZERO;
    }
    let buf = std::slice::from_raw_parts(ptr as *const u8, total);
    match file_of(context).write_all(buf) {
        Ok(()) => NativeUInt::from(num.as_usize()),
        Err(_) => {
            fail("Error writing to datastream");
            NativeUInt::ZERO
        }
    }
}

unsafe extern "C" fn file_close(context: *mut RawRwOps) -> c_int {
    drop(Box::from_raw((*context).hidden.unknown.data1 as *mut File));
    free_rw(context);
    0
}

unsafe extern "C" fn rw_size(context: *mut RawRwOps) -> i64 {
    match (*context).size {
        Some(size) => size(context),
        None => -1,
    }
}

unsafe extern "C" fn rw_seek(context: *mut RawRwOps, offset: i64, whence: c_int) -> i64 {
    match (*context).seek {
        Some(seek) => seek(context, offset, whence),
        None => -1,
    }
}

unsafe extern "C" fn rw_tell(context: *mut RawRwOps) -> i64 {
    rw_seek(context, 0, RW_SEEK_CUR)
}

unsafe extern "C" fn rw_read(context: *mut RawRwOps, ptr: *mut c_void, size: NativeUInt, maxnum: NativeUInt) -> NativeUInt {
    match (*context).read {
        Some(read) => read(context, ptr, size, maxnum),
        None => NativeUInt::ZERO,
    }
}

unsafe extern "C" fn rw_write(context: *mut RawRwOps, ptr: *const c_void, size: NativeUInt, num: NativeUInt) -> NativeUInt {
    match (*context).write {
        Some(write) => write(context, ptr, size, num),
        None => NativeUInt::ZERO,
    }
}

unsafe extern "C" fn rw_close(context: *mut RawRwOps) -> c_int {
    match (*context).close {
        Some(close) => close(context),
        None => -1,
    }
}

unsafe extern "C" fn load_file_rw(src: *mut RawRwOps, datasize: *mut NativeUInt, freesrc: c_int) -> *mut c_void {
    if src.is_null() {
        fail("Parameter 'src' is invalid");
        return ptr::null_mut();
    }

    let mut data = Vec::new();
    let mut chunk = [0_u8; 256];
    loop {
        let read = rw_read(src, chunk.as_mut_ptr() as *mut c_void, NativeUInt::from(1_usize), NativeUInt::from(chunk.len()));
        if read.as_usize() == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read.as_usize()]);
    }
    if freesrc != 0 {
        rw_close(src);
    }

    // SDL appends a NUL that is not counted in the size
    let block = malloc(NativeUInt::from(data.len() + 1)) as *mut u8;
    ptr::copy_nonoverlapping(data.as_ptr(), block, data.len());
    if !datasize.is_null() {
        *datasize = NativeUInt::from(data.len());
    }
    block as *mut c_void
}

unsafe extern "C" fn load_file(file: *const c_char, datasize: *mut NativeUInt) -> *mut c_void {
    let src = rw_from_file(file, b"rb\0".as_ptr() as *const c_char);
    if src.is_null() {
        return ptr::null_mut();
    }
    load_file_rw(src, datasize, 1)
}

macro_rules! endian_fns {
    ($($read:ident / $write:ident: $ty:ty, $from:ident, $to:ident;)*) => {
        $(
            unsafe extern "C" fn $read(src: *mut RawRwOps) -> $ty {
                let mut bytes = [0_u8; std::mem::size_of::<$ty>()];
                rw_read(src, bytes.as_mut_ptr() as *mut c_void, NativeUInt::from(bytes.len()), NativeUInt::from(1_usize));
                <$ty>::$from(bytes)
            }

            unsafe extern "C" fn $write(dst: *mut RawRwOps, value: $ty) -> NativeUInt {
                let bytes = value.$to();
                rw_write(dst, bytes.as_ptr() as *const c_void, NativeUInt::from(bytes.len()), NativeUInt::from(1_usize))
            }
        )*
    };
}

endian_fns! {
    read_u8 / write_u8: u8, from_le_bytes, to_le_bytes;
    read_le16 / write_le16: u16, from_le_bytes, to_le_bytes;
    read_be16 / write_be16: u16, from_be_bytes, to_be_bytes;
    read_le32 / write_le32: u32, from_le_bytes, to_le_bytes;
    read_be32 / write_be32: u32, from_be_bytes, to_be_bytes;
    read_le64 / write_le64: u64, from_le_bytes, to_le_bytes;
    read_be64 / write_be64: u64, from_be_bytes, to_be_bytes;
}
