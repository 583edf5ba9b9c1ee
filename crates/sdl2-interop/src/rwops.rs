//! SDL_RWops streams
//!
//! A stream is a native `SDL_RWops` whose vtable may come from SDL (files,
//! memory), from raw callbacks installed by the caller, or from a Rust
//! [`StreamBackend`]. Operations check the vtable entry first, so a stream
//! without e.g. a seek callback reports [`Error::PreconditionNotMet`] instead
//! of a native failure.

use crate::error::{Error, Result};
use crate::ffi::{
    exports, RawRwOps, RwCloseFn, RwReadFn, RwSeekFn, RwSizeFn, RwWriteFn, RW_SEEK_CUR,
    RW_SEEK_END, RW_SEEK_SET,
};
use crate::marshal::{handles, Marshaler, MemoryBufferMarshaler, Ownership, RawBuffer, StringMarshaler, UserData};
use crate::memory::MemoryBuffer;
use crate::native_int::NativeUInt;
use crate::sdl::Sdl;
use crate::version::{Version, VersionTable};
use bitflags::bitflags;
use parking_lot::Mutex;
use std::ffi::c_void;
use std::fmt;
use std::io::{self, SeekFrom};
use std::marker::PhantomData;
use std::os::raw::c_int;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

bitflags! {
    /// Vtable entries a stream provides
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StreamCapabilities: u8 {
        const SIZE = 0x01;
        const SEEK = 0x02;
        const READ = 0x04;
        const WRITE = 0x08;
        const CLOSE = 0x10;
    }
}

/// `SDL_RWOPS_*` stream kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RwOpsType {
    Unknown,
    WinFile,
    StdFile,
    JniFile,
    Memory,
    MemoryReadOnly,
}

impl RwOpsType {
    /// Map an `SDL_RWops::type` tag; unrecognised tags read as unknown
    pub fn from_raw(value: u32) -> Self {
        match value {
            1 => RwOpsType::WinFile,
            2 => RwOpsType::StdFile,
            3 => RwOpsType::JniFile,
            4 => RwOpsType::Memory,
            5 => RwOpsType::MemoryReadOnly,
            _ => RwOpsType::Unknown,
        }
    }

    /// The `SDL_RWops::type` tag
    pub fn to_raw(self) -> u32 {
        match self {
            RwOpsType::Unknown => 0,
            RwOpsType::WinFile => 1,
            RwOpsType::StdFile => 2,
            RwOpsType::JniFile => 3,
            RwOpsType::Memory => 4,
            RwOpsType::MemoryReadOnly => 5,
        }
    }
}

/// `fopen`-style open modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// `r`: read an existing file
    Read,
    /// `w`: truncate or create, then write
    Write,
    /// `a`: append, creating if needed
    Append,
    /// `r+`: read and write an existing file
    ReadUpdate,
    /// `w+`: truncate or create, then read and write
    WriteUpdate,
    /// `a+`: read anywhere, append writes
    AppendUpdate,
}

impl FileMode {
    /// Mode string passed to `SDL_RWFromFile`
    pub fn mode_string(self, binary: bool) -> &'static str {
        match (self, binary) {
            (FileMode::Read, false) => "r",
            (FileMode::Read, true) => "rb",
            (FileMode::Write, false) => "w",
            (FileMode::Write, true) => "wb",
            (FileMode::Append, false) => "a",
            (FileMode::Append, true) => "ab",
            (FileMode::ReadUpdate, false) => "r+",
            (FileMode::ReadUpdate, true) => "r+b",
            (FileMode::WriteUpdate, false) => "w+",
            (FileMode::WriteUpdate, true) => "w+b",
            (FileMode::AppendUpdate, false) => "a+",
            (FileMode::AppendUpdate, true) => "a+b",
        }
    }
}

/// A stream implemented in Rust
///
/// Only the operations named by [`capabilities`](Self::capabilities) get a
/// vtable entry. Closing always has one; it runs [`close`](Self::close) and
/// frees the native object.
pub trait StreamBackend: Send {
    fn capabilities(&self) -> StreamCapabilities;

    fn size(&mut self) -> io::Result<u64> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StreamBackend for io::Cursor<Vec<u8>> {
    fn capabilities(&self) -> StreamCapabilities {
        StreamCapabilities::SIZE
            | StreamCapabilities::SEEK
            | StreamCapabilities::READ
            | StreamCapabilities::WRITE
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        io::Seek::seek(self, pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(self, buf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    /// Call the vtable entry directly
    Vtable,
    /// Call the exported SDL_RW* helper
    Exported,
}

static DISPATCH: VersionTable<Dispatch> = VersionTable::new(&[
    (Version::new(2, 0, 0), Dispatch::Vtable),
    (Version::new(2, 0, 10), Dispatch::Exported),
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadFile {
    /// SDL_RWFromFile + SDL_LoadFile_RW
    ViaStream,
    /// SDL_LoadFile
    Exported,
}

static LOAD_FILE: VersionTable<LoadFile> = VersionTable::new(&[
    (Version::new(2, 0, 6), LoadFile::ViaStream),
    (Version::new(2, 0, 10), LoadFile::Exported),
]);

/// An `SDL_RWops` stream
///
/// Owned streams are closed on drop (or freed with `SDL_FreeRW` when they
/// have no close callback). Borrowed streams are left to their owner.
pub struct RwOps<'a> {
    sdl: &'a Sdl,
    raw: NonNull<RawRwOps>,
    ownership: Ownership,
    open: bool,
    _memory: PhantomData<&'a mut [u8]>,
}

impl<'a> RwOps<'a> {
    /// Open a file
    pub fn from_file(sdl: &'a Sdl, path: &Path, mode: FileMode, binary: bool) -> Result<Self> {
        let from_file = sdl.resolve(exports::RW_FROM_FILE)?;
        let path = path
            .to_str()
            .ok_or_else(|| Error::invalid_argument("a UTF-8 path", path.display().to_string()))?;

        let mut strings = StringMarshaler::new(sdl, Ownership::Owned);
        let file = strings.to_native(path)?;
        let mode = strings.to_native(mode.mode_string(binary))?;

        let raw = unsafe { from_file(file, mode) };
        unsafe {
            strings.release_native(file)?;
            strings.release_native(mode)?;
        }

        Self::adopt(sdl, raw)
    }

    /// Read-write stream over a memory buffer
    pub fn from_memory<'sdl: 'a>(buffer: &'a mut MemoryBuffer<'sdl>) -> Result<Self> {
        let sdl = buffer.sdl();
        let from_mem = sdl.resolve(exports::RW_FROM_MEM)?;
        let (ptr, len) = buffer.as_raw()?;

        let raw = unsafe { from_mem(ptr.as_ptr() as *mut c_void, native_len(len)?) };
        Self::adopt(sdl, raw)
    }

    /// Read-only stream over a memory buffer
    pub fn from_const_memory<'sdl: 'a>(buffer: &'a MemoryBuffer<'sdl>) -> Result<Self> {
        let sdl = buffer.sdl();
        let from_const_mem = sdl.resolve(exports::RW_FROM_CONST_MEM)?;
        let (ptr, len) = buffer.as_raw()?;

        let raw = unsafe { from_const_mem(ptr.as_ptr() as *const c_void, native_len(len)?) };
        Self::adopt(sdl, raw)
    }

    /// Empty stream with no callbacks installed
    pub fn allocate(sdl: &'a Sdl) -> Result<Self> {
        let alloc_rw = sdl.resolve(exports::ALLOC_RW)?;
        let mut stream = Self::adopt(sdl, unsafe { alloc_rw() })?;

        // SDL_AllocRW leaves the vtable uninitialized
        let raw = unsafe { stream.raw.as_mut() };
        raw.size = None;
        raw.seek = None;
        raw.read = None;
        raw.write = None;
        raw.close = None;
        raw.type_ = RwOpsType::Unknown.to_raw();
        Ok(stream)
    }

    /// Stream whose operations run `backend`
    pub fn from_backend(sdl: &'a Sdl, backend: impl StreamBackend + 'static) -> Result<Self> {
        let free_rw = sdl.resolve(exports::FREE_RW)?;
        let capabilities = backend.capabilities();
        let mut stream = Self::allocate(sdl)?;

        let context = BackendContext {
            backend: Mutex::new(Box::new(backend)),
            last_error: Mutex::new(None),
            free_rw,
        };
        let token = handles::register(&UserData::new(context));

        let raw = unsafe { stream.raw.as_mut() };
        raw.hidden.unknown.data1 = token as *mut c_void;
        raw.hidden.unknown.data2 = std::ptr::null_mut();
        if capabilities.contains(StreamCapabilities::SIZE) {
            raw.size = Some(backend_size);
        }
        if capabilities.contains(StreamCapabilities::SEEK) {
            raw.seek = Some(backend_seek);
        }
        if capabilities.contains(StreamCapabilities::READ) {
            raw.read = Some(backend_read);
        }
        if capabilities.contains(StreamCapabilities::WRITE) {
            raw.write = Some(backend_write);
        }
        raw.close = Some(backend_close);

        Ok(stream)
    }

    /// Wrap a stream produced by native code
    ///
    /// The vtable is read on every call, so only the entries the stream
    /// actually has are usable.
    ///
    /// # Safety
    ///
    /// `raw` must be a live `SDL_RWops`. With [`Ownership::Owned`] nothing
    /// else may close or free it.
    pub unsafe fn from_raw(sdl: &'a Sdl, raw: NonNull<RawRwOps>, ownership: Ownership) -> Self {
        Self {
            sdl,
            raw,
            ownership,
            open: true,
            _memory: PhantomData,
        }
    }

    fn adopt(sdl: &'a Sdl, raw: *mut RawRwOps) -> Result<Self> {
        let raw = NonNull::new(raw).ok_or_else(|| sdl.native_failure(None))?;
        Ok(unsafe { Self::from_raw(sdl, raw, Ownership::Owned) })
    }

    /// Give up the native stream without closing it
    pub fn into_raw(mut self) -> NonNull<RawRwOps> {
        self.open = false;
        self.raw
    }

    /// Raw `SDL_RWops` pointer for native calls
    pub fn as_ptr(&self) -> *mut RawRwOps {
        self.raw.as_ptr()
    }

    /// Whether dropping this handle closes the stream
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Stream type tag
    pub fn kind(&self) -> RwOpsType {
        RwOpsType::from_raw(unsafe { self.raw.as_ref() }.type_)
    }

    /// Overwrite the stream type tag
    pub fn set_kind(&mut self, kind: RwOpsType) {
        unsafe { self.raw.as_mut() }.type_ = kind.to_raw();
    }

    /// Entries present in the native vtable
    pub fn capabilities(&self) -> StreamCapabilities {
        let raw = unsafe { self.raw.as_ref() };
        let mut capabilities = StreamCapabilities::empty();
        capabilities.set(StreamCapabilities::SIZE, raw.size.is_some());
        capabilities.set(StreamCapabilities::SEEK, raw.seek.is_some());
        capabilities.set(StreamCapabilities::READ, raw.read.is_some());
        capabilities.set(StreamCapabilities::WRITE, raw.write.is_some());
        capabilities.set(StreamCapabilities::CLOSE, raw.close.is_some());
        capabilities
    }

    /// Replace the size callback
    ///
    /// # Safety
    ///
    /// The callback must honour the `SDL_RWops` contract for this stream.
    pub unsafe fn set_size(&mut self, callback: Option<RwSizeFn>) {
        self.raw.as_mut().size = callback;
    }

    /// Replace the seek callback
    ///
    /// # Safety
    ///
    /// See [`set_size`](Self::set_size).
    pub unsafe fn set_seek(&mut self, callback: Option<RwSeekFn>) {
        self.raw.as_mut().seek = callback;
    }

    /// Replace the read callback
    ///
    /// # Safety
    ///
    /// See [`set_size`](Self::set_size).
    pub unsafe fn set_read(&mut self, callback: Option<RwReadFn>) {
        self.raw.as_mut().read = callback;
    }

    /// Replace the write callback
    ///
    /// # Safety
    ///
    /// See [`set_size`](Self::set_size).
    pub unsafe fn set_write(&mut self, callback: Option<RwWriteFn>) {
        self.raw.as_mut().write = callback;
    }

    /// Replace the close callback
    ///
    /// # Safety
    ///
    /// See [`set_size`](Self::set_size). A close callback must free the
    /// stream, as SDL's own do.
    pub unsafe fn set_close(&mut self, callback: Option<RwCloseFn>) {
        self.raw.as_mut().close = callback;
    }

    fn dispatch(&self) -> Dispatch {
        DISPATCH
            .select(self.sdl.version())
            .copied()
            .unwrap_or(Dispatch::Vtable)
    }

    /// Context of a Rust-backed stream, looked up before the call so it
    /// outlives a close
    fn backend(&self) -> Option<Arc<BackendContext>> {
        let close = unsafe { self.raw.as_ref() }.close?;
        if close as usize != backend_close as usize {
            return None;
        }
        unsafe { backend_context(self.as_ptr()) }
    }

    /// Error for a failed call; a backend's own error wins over the error slot
    fn failure(&self, backend: Option<&BackendContext>, code: Option<i32>) -> Error {
        match backend.and_then(|ctx| ctx.last_error.lock().take()) {
            Some(e) => Error::NativeOperationFailed {
                message: e.to_string(),
                code,
            },
            None => self.sdl.native_failure(code),
        }
    }

    fn entry<F>(&self, operation: &str, name: &str, pick: impl FnOnce(&RawRwOps) -> Option<F>) -> Result<F> {
        if !self.open {
            return Err(Error::precondition(operation, "the stream is closed"));
        }
        pick(unsafe { self.raw.as_ref() })
            .ok_or_else(|| Error::precondition(operation, format!("the stream has no {name} callback")))
    }

    /// Total size in bytes
    pub fn size(&mut self) -> Result<u64> {
        let size = self.entry("query stream size", "size", |raw| raw.size)?;
        let backend = self.backend();

        let result = match self.dispatch() {
            Dispatch::Vtable => unsafe { size(self.as_ptr()) },
            Dispatch::Exported => {
                let rw_size = self.sdl.resolve(exports::RW_SIZE)?;
                unsafe { rw_size(self.as_ptr()) }
            }
        };

        u64::try_from(result).map_err(|_| self.failure(backend.as_deref(), Some(-1)))
    }

    /// Move the stream position; returns the new absolute position
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let seek = self.entry("seek stream", "seek", |raw| raw.seek)?;
        let (offset, whence) = match pos {
            SeekFrom::Start(offset) => (
                i64::try_from(offset)
                    .map_err(|_| Error::invalid_argument("an offset below 2^63", offset.to_string()))?,
                RW_SEEK_SET,
            ),
            SeekFrom::Current(offset) => (offset, RW_SEEK_CUR),
            SeekFrom::End(offset) => (offset, RW_SEEK_END),
        };
        let backend = self.backend();

        let result = match self.dispatch() {
            Dispatch::Vtable => unsafe { seek(self.as_ptr(), offset, whence) },
            Dispatch::Exported => {
                let rw_seek = self.sdl.resolve(exports::RW_SEEK)?;
                unsafe { rw_seek(self.as_ptr(), offset, whence) }
            }
        };

        u64::try_from(result).map_err(|_| self.failure(backend.as_deref(), Some(-1)))
    }

    /// Current position
    pub fn tell(&mut self) -> Result<u64> {
        let seek = self.entry("query stream position", "seek", |raw| raw.seek)?;
        let backend = self.backend();

        let result = match self.dispatch() {
            Dispatch::Vtable => unsafe { seek(self.as_ptr(), 0, RW_SEEK_CUR) },
            Dispatch::Exported => {
                let rw_tell = self.sdl.resolve(exports::RW_TELL)?;
                unsafe { rw_tell(self.as_ptr()) }
            }
        };

        u64::try_from(result).map_err(|_| self.failure(backend.as_deref(), Some(-1)))
    }

    /// Read up to `buf.len()` bytes; `Ok(0)` at end of stream
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let read = self.entry("read from stream", "read", |raw| raw.read)?;
        if buf.is_empty() {
            return Ok(0);
        }

        // 0 is both EOF and failure; only a failure sets the error slot
        // or records a backend error
        self.sdl.clear_error()?;
        let backend = self.backend();
        let ptr = buf.as_mut_ptr() as *mut c_void;
        let count = NativeUInt::from(buf.len());
        let result = match self.dispatch() {
            Dispatch::Vtable => unsafe { read(self.as_ptr(), ptr, NativeUInt::from(1_usize), count) },
            Dispatch::Exported => {
                let rw_read = self.sdl.resolve(exports::RW_READ)?;
                unsafe { rw_read(self.as_ptr(), ptr, NativeUInt::from(1_usize), count) }
            }
        };

        if result.get() == 0 {
            let recorded = backend.as_deref().map_or(false, |ctx| ctx.last_error.lock().is_some());
            if recorded || !self.sdl.last_error()?.is_empty() {
                return Err(self.failure(backend.as_deref(), None));
            }
        }
        Ok(result.as_usize())
    }

    /// Write all of `buf`
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let write = self.entry("write to stream", "write", |raw| raw.write)?;
        if buf.is_empty() {
            return Ok(0);
        }

        let backend = self.backend();
        let ptr = buf.as_ptr() as *const c_void;
        let count = NativeUInt::from(buf.len());
        let result = match self.dispatch() {
            Dispatch::Vtable => unsafe { write(self.as_ptr(), ptr, NativeUInt::from(1_usize), count) },
            Dispatch::Exported => {
                let rw_write = self.sdl.resolve(exports::RW_WRITE)?;
                unsafe { rw_write(self.as_ptr(), ptr, NativeUInt::from(1_usize), count) }
            }
        };

        if result.as_usize() < buf.len() {
            return Err(self.failure(backend.as_deref(), None));
        }
        Ok(result.as_usize())
    }

    /// Close the stream through its close callback
    ///
    /// The native object is gone afterwards even when closing reports a
    /// failure. A borrowed stream belongs to someone else and cannot be
    /// closed through this handle.
    pub fn close(mut self) -> Result<()> {
        if self.ownership == Ownership::LeaveAllocated {
            self.open = false;
            return Err(Error::precondition("close stream", "the stream is borrowed from its owner"));
        }
        let close = self.entry("close stream", "close", |raw| raw.close)?;
        let backend = self.backend();

        let result = match self.dispatch() {
            Dispatch::Vtable => unsafe { close(self.as_ptr()) },
            Dispatch::Exported => {
                let rw_close = self.sdl.resolve(exports::RW_CLOSE)?;
                unsafe { rw_close(self.as_ptr()) }
            }
        };
        self.open = false;

        if result < 0 {
            return Err(self.failure(backend.as_deref(), Some(result)));
        }
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        if !self.open || self.ownership == Ownership::LeaveAllocated {
            return Ok(());
        }
        self.open = false;

        let backend = self.backend();
        match unsafe { self.raw.as_ref() }.close {
            Some(close) => {
                if unsafe { close(self.as_ptr()) } < 0 {
                    return Err(self.failure(backend.as_deref(), None));
                }
            }
            None => {
                let free_rw = self.sdl.resolve(exports::FREE_RW)?;
                unsafe { free_rw(self.as_ptr()) };
            }
        }
        log::debug!("Released stream at {:p}", self.raw);
        Ok(())
    }
}

macro_rules! endian_io {
    ($($read:ident / $write:ident: $ty:ty => $read_export:ident / $write_export:ident;)*) => {
        impl RwOps<'_> {
            $(
                #[doc = concat!("Read one `", stringify!($ty), "` with `", stringify!($read_export), "`")]
                pub fn $read(&mut self) -> Result<$ty> {
                    self.entry("read from stream", "read", |raw| raw.read)?;
                    let read = self.sdl.resolve(exports::$read_export)?;
                    Ok(unsafe { read(self.as_ptr()) })
                }

                #[doc = concat!("Write one `", stringify!($ty), "` with `", stringify!($write_export), "`")]
                pub fn $write(&mut self, value: $ty) -> Result<()> {
                    self.entry("write to stream", "write", |raw| raw.write)?;
                    let write = self.sdl.resolve(exports::$write_export)?;
                    let backend = self.backend();
                    if unsafe { write(self.as_ptr(), value) }.get() == 0 {
                        return Err(self.failure(backend.as_deref(), None));
                    }
                    Ok(())
                }
            )*
        }
    };
}

endian_io! {
    read_u8 / write_u8: u8 => READ_U8 / WRITE_U8;
    read_le16 / write_le16: u16 => READ_LE16 / WRITE_LE16;
    read_be16 / write_be16: u16 => READ_BE16 / WRITE_BE16;
    read_le32 / write_le32: u32 => READ_LE32 / WRITE_LE32;
    read_be32 / write_be32: u32 => READ_BE32 / WRITE_BE32;
    read_le64 / write_le64: u64 => READ_LE64 / WRITE_LE64;
    read_be64 / write_be64: u64 => READ_BE64 / WRITE_BE64;
}

impl Drop for RwOps<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Closing stream failed: {}", e);
        }
    }
}

impl fmt::Debug for RwOps<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwOps")
            .field("raw", &self.raw)
            .field("ownership", &self.ownership)
            .field("open", &self.open)
            .finish()
    }
}

fn native_len(len: usize) -> Result<c_int> {
    c_int::try_from(len).map_err(|_| Error::invalid_argument("a buffer shorter than 2 GiB", len.to_string()))
}

impl Sdl {
    /// Read a whole file into an owned buffer
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<MemoryBuffer<'_>> {
        let path = path.as_ref();

        match LOAD_FILE.select(self.version()).copied().unwrap_or(LoadFile::ViaStream) {
            LoadFile::ViaStream => {
                let stream = RwOps::from_file(self, path, FileMode::Read, true)?;
                self.load_file_rw(stream)
            }
            LoadFile::Exported => {
                let load_file = self.resolve(exports::LOAD_FILE)?;
                let path = path
                    .to_str()
                    .ok_or_else(|| Error::invalid_argument("a UTF-8 path", path.display().to_string()))?;

                let mut strings = StringMarshaler::new(self, Ownership::Owned);
                let file = strings.to_native(path)?;
                let mut len = NativeUInt::ZERO;
                let data = unsafe { load_file(file, &mut len) };
                unsafe { strings.release_native(file)? };

                self.adopt_loaded(data, len)
            }
        }
    }

    /// Read the rest of a stream into an owned buffer, consuming the stream
    pub fn load_file_rw(&self, stream: RwOps<'_>) -> Result<MemoryBuffer<'_>> {
        let load_file_rw = self.resolve(exports::LOAD_FILE_RW)?;
        let free_source = c_int::from(stream.ownership() == Ownership::Owned);
        let raw = stream.into_raw();

        let mut len = NativeUInt::ZERO;
        let data = unsafe { load_file_rw(raw.as_ptr(), &mut len, free_source) };
        self.adopt_loaded(data, len)
    }

    fn adopt_loaded(&self, data: *mut c_void, len: NativeUInt) -> Result<MemoryBuffer<'_>> {
        if data.is_null() {
            return Err(self.native_failure(None));
        }

        let mut marshaler = MemoryBufferMarshaler::new(self, Ownership::Owned);
        unsafe {
            marshaler.to_managed(RawBuffer {
                ptr: data,
                len: len.as_usize(),
            })
        }
    }
}

// ===== Rust-backed stream trampolines =====

struct BackendContext {
    backend: Mutex<Box<dyn StreamBackend>>,
    /// Failure of the most recent operation; cleared when one succeeds
    last_error: Mutex<Option<io::Error>>,
    free_rw: unsafe extern "C" fn(*mut RawRwOps),
}

unsafe fn backend_token(context: *mut RawRwOps) -> usize {
    (*context).hidden.unknown.data1 as usize
}

unsafe fn backend_context(context: *mut RawRwOps) -> Option<Arc<BackendContext>> {
    handles::redeem(backend_token(context)).downcast::<BackendContext>().ok()
}

unsafe fn with_backend<R>(
    context: *mut RawRwOps,
    operation: impl FnOnce(&mut dyn StreamBackend) -> io::Result<R>,
) -> Option<R> {
    let ctx = backend_context(context)?;
    let mut backend = ctx.backend.lock();

    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| operation(&mut **backend))) {
        Ok(outcome) => outcome,
        Err(_) => {
            log::error!("Stream backend panicked");
            Err(io::Error::new(io::ErrorKind::Other, "stream backend panicked"))
        }
    };

    match outcome {
        Ok(value) => {
            *ctx.last_error.lock() = None;
            Some(value)
        }
        Err(e) => {
            log::debug!("Stream backend failed: {}", e);
            *ctx.last_error.lock() = Some(e);
            None
        }
    }
}

unsafe extern "C" fn backend_size(context: *mut RawRwOps) -> i64 {
    with_backend(context, |backend| backend.size())
        .and_then(|size| i64::try_from(size).ok())
        .unwrap_or(-1)
}

unsafe extern "C" fn backend_seek(context: *mut RawRwOps, offset: i64, whence: c_int) -> i64 {
    let pos = match whence {
        RW_SEEK_SET => match u64::try_from(offset) {
            Ok(offset) => SeekFrom::Start(offset),
            Err(_) => return -1,
        },
        RW_SEEK_CUR => SeekFrom::Current(offset),
        RW_SEEK_END => SeekFrom::End(offset),
        _ => return -1,
    };

    with_backend(context, |backend| backend.seek(pos))
        .and_then(|position| i64::try_from(position).ok())
        .unwrap_or(-1)
}

unsafe extern "C" fn backend_read(
    context: *mut RawRwOps,
    ptr: *mut c_void,
    size: NativeUInt,
    maxnum: NativeUInt,
) -> NativeUInt {
    let size = size.as_usize();
    let total = match size.checked_mul(maxnum.as_usize()) {
        Some(total) if total > 0 && !ptr.is_null() => total,
        _ => return NativeUInt::ZERO,
    };
    let buf = std::slice::from_raw_parts_mut(ptr as *mut u8, total);

    let filled = with_backend(context, |backend| {
        let mut filled = 0;
        while filled < total {
            match backend.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if filled == 0 => return Err(e),
                Err(_) => break,
            }
        }
        Ok(filled)
    });

    NativeUInt::from(filled.unwrap_or(0) / size)
}

unsafe extern "C" fn backend_write(
    context: *mut RawRwOps,
    ptr: *const c_void,
    size: NativeUInt,
    num: NativeUInt,
) -> NativeUInt {
    let size = size.as_usize();
    let total = match size.checked_mul(num.as_usize()) {
        Some(total) if total > 0 && !ptr.is_null() => total,
        _ => return NativeUInt::ZERO,
    };
    let buf = std::slice::from_raw_parts(ptr as *const u8, total);

    let written = with_backend(context, |backend| {
        let mut written = 0;
        while written < total {
            match backend.write(&buf[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if written == 0 => return Err(e),
                Err(_) => break,
            }
        }
        Ok(written)
    });

    NativeUInt::from(written.unwrap_or(0) / size)
}

unsafe extern "C" fn backend_close(context: *mut RawRwOps) -> c_int {
    let Some(ctx) = backend_context(context) else {
        return -1;
    };

    let closed = with_backend(context, |backend| backend.close());
    handles::release(backend_token(context));
    (ctx.free_rw)(context);

    if closed.is_some() {
        0
    } else {
        -1
    }
}
