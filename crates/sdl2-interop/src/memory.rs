//! Owned blocks of SDL heap memory

use crate::error::{Error, Result};
use crate::ffi::exports;
use crate::marshal::Ownership;
use crate::native_int::NativeUInt;
use crate::sdl::Sdl;
use bytemuck::Pod;
use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

#[derive(Debug, Clone, Copy)]
enum State {
    Uninitialized,
    Active {
        ptr: NonNull<u8>,
        len: usize,
        ownership: Ownership,
    },
    Released,
}

/// A block of memory on the SDL heap
///
/// States: `Uninitialized` (no block yet) -> `Active` -> `Released`.
/// Release is idempotent and also runs on drop; a borrowed block
/// ([`Ownership::LeaveAllocated`]) is never freed by the wrapper.
pub struct MemoryBuffer<'sdl> {
    sdl: &'sdl Sdl,
    state: State,
}

impl<'sdl> MemoryBuffer<'sdl> {
    /// Wrapper without a block; call [`initialize`](Self::initialize) before use
    pub fn new(sdl: &'sdl Sdl) -> Self {
        Self {
            sdl,
            state: State::Uninitialized,
        }
    }

    /// Allocate `len` bytes with `SDL_malloc`
    pub fn allocate(sdl: &'sdl Sdl, len: usize) -> Result<Self> {
        let mut buffer = Self::new(sdl);
        buffer.initialize(len)?;
        Ok(buffer)
    }

    /// Adopt a native block
    ///
    /// # Safety
    ///
    /// `ptr` must point to `len` readable and writable bytes. With
    /// [`Ownership::Owned`] it must come from the SDL heap and nothing else
    /// may free it.
    pub unsafe fn from_raw(sdl: &'sdl Sdl, ptr: NonNull<u8>, len: usize, ownership: Ownership) -> Self {
        Self {
            sdl,
            state: State::Active {
                ptr,
                len,
                ownership,
            },
        }
    }

    /// Allocate `len` bytes, or grow/shrink the owned block to `len`
    pub fn initialize(&mut self, len: usize) -> Result<()> {
        let size = NativeUInt::from(len);

        let ptr = match self.state {
            State::Uninitialized => {
                let malloc = self.sdl.resolve(exports::MALLOC)?;
                unsafe { malloc(size) }
            }
            State::Active {
                ptr,
                ownership: Ownership::Owned,
                ..
            } => {
                let realloc = self.sdl.resolve(exports::REALLOC)?;
                unsafe { realloc(ptr.as_ptr() as *mut c_void, size) }
            }
            State::Active { .. } => {
                return Err(Error::precondition(
                    "resize memory buffer",
                    "the block is borrowed from native code",
                ))
            }
            State::Released => return Err(released("initialize memory buffer")),
        };

        let ptr = NonNull::new(ptr as *mut u8).ok_or_else(|| self.sdl.native_failure(None))?;
        self.state = State::Active {
            ptr,
            len,
            ownership: Ownership::Owned,
        };
        Ok(())
    }

    /// Allocate room for `count` objects of `size` bytes each
    pub fn initialize_objects(&mut self, count: usize, size: usize) -> Result<()> {
        let len = count.checked_mul(size).ok_or_else(|| {
            Error::invalid_argument(
                "an object count and size whose product fits in usize",
                format!("{count} x {size}"),
            )
        })?;
        self.initialize(len)
    }

    /// Library instance the block belongs to
    pub fn sdl(&self) -> &'sdl Sdl {
        self.sdl
    }

    /// Length in bytes; 0 unless active
    pub fn len(&self) -> usize {
        match self.state {
            State::Active { len, .. } => len,
            _ => 0,
        }
    }

    /// True when no bytes are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once a block is allocated and not yet released
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active { .. })
    }

    /// True after [`release`](Self::release)
    pub fn is_released(&self) -> bool {
        matches!(self.state, State::Released)
    }

    /// Ownership of the held block; `None` unless active
    pub fn ownership(&self) -> Option<Ownership> {
        match self.state {
            State::Active { ownership, .. } => Some(ownership),
            _ => None,
        }
    }

    /// Address and length of the active block
    pub fn as_raw(&self) -> Result<(NonNull<u8>, usize)> {
        match self.state {
            State::Active { ptr, len, .. } => Ok((ptr, len)),
            State::Uninitialized => Err(Error::precondition(
                "access memory buffer",
                "the buffer was never initialized",
            )),
            State::Released => Err(released("access memory buffer")),
        }
    }

    /// Contents as bytes
    pub fn as_slice(&self) -> Result<&[u8]> {
        let (ptr, len) = self.as_raw()?;
        Ok(unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) })
    }

    /// Contents as mutable bytes
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        let (ptr, len) = self.as_raw()?;
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), len) })
    }

    /// Read a plain value at a byte offset
    pub fn read<T: Pod>(&self, offset: usize) -> Result<T> {
        read_pod(self.as_slice()?, offset)
    }

    /// Write a plain value at a byte offset
    pub fn write<T: Pod>(&mut self, offset: usize, value: T) -> Result<()> {
        write_pod(self.as_mut_slice()?, offset, value)
    }

    /// Give up the block without freeing it
    pub fn into_raw(mut self) -> Option<(NonNull<u8>, usize)> {
        match std::mem::replace(&mut self.state, State::Released) {
            State::Active { ptr, len, .. } => Some((ptr, len)),
            _ => None,
        }
    }

    /// Free the block; a second call does nothing
    pub fn release(&mut self) -> Result<()> {
        if let State::Active {
            ptr,
            ownership: Ownership::Owned,
            ..
        } = self.state
        {
            let free = self.sdl.resolve(exports::FREE)?;
            unsafe { free(ptr.as_ptr() as *mut c_void) };
            log::debug!("Released {} byte memory buffer", self.len());
        }
        self.state = State::Released;
        Ok(())
    }
}

impl Drop for MemoryBuffer<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Leaking memory buffer: {}", e);
        }
    }
}

impl fmt::Debug for MemoryBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBuffer").field("state", &self.state).finish()
    }
}

fn released(operation: &str) -> Error {
    Error::precondition(operation, "the native block was already released")
}

fn checked_range(offset: usize, size: usize, len: usize) -> Result<std::ops::Range<usize>> {
    match offset.checked_add(size) {
        Some(end) if end <= len => Ok(offset..end),
        _ => Err(Error::invalid_argument(
            format!("an offset with {size} bytes available below {len}"),
            offset.to_string(),
        )),
    }
}

pub(crate) fn read_pod<T: Pod>(bytes: &[u8], offset: usize) -> Result<T> {
    let range = checked_range(offset, std::mem::size_of::<T>(), bytes.len())?;
    Ok(bytemuck::pod_read_unaligned(&bytes[range]))
}

pub(crate) fn write_pod<T: Pod>(bytes: &mut [u8], offset: usize, value: T) -> Result<()> {
    let range = checked_range(offset, std::mem::size_of::<T>(), bytes.len())?;
    bytes[range].copy_from_slice(bytemuck::bytes_of(&value));
    Ok(())
}
