//! SIMD-aligned allocations

use crate::error::{Error, Result};
use crate::ffi::exports;
use crate::memory::{read_pod, write_pod};
use crate::native_int::NativeUInt;
use crate::sdl::Sdl;
use crate::version::{Version, VersionTable};
use bytemuck::Pod;
use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Realloc {
    /// SDL_SIMDAlloc + copy + SDL_SIMDFree
    AllocCopyFree,
    /// SDL_SIMDRealloc
    Native,
}

static REALLOC: VersionTable<Realloc> = VersionTable::new(&[
    (Version::new(2, 0, 10), Realloc::AllocCopyFree),
    (Version::new(2, 0, 14), Realloc::Native),
]);

/// Pointer and length always travel together
#[derive(Debug, Clone, Copy)]
struct SimdBlock {
    ptr: NonNull<u8>,
    len: usize,
}

/// Memory aligned for the widest vector unit SDL detected
///
/// The length is tracked alongside the pointer and replaced with it on every
/// reallocation; a failed reallocation leaves the old block in place.
pub struct Simd<'sdl> {
    sdl: &'sdl Sdl,
    block: Option<SimdBlock>,
}

impl Sdl {
    /// Alignment `SDL_SIMDAlloc` guarantees
    pub fn simd_alignment(&self) -> Result<usize> {
        let get_alignment = self.resolve(exports::SIMD_GET_ALIGNMENT)?;
        Ok(unsafe { get_alignment() }.as_usize())
    }

    /// Allocate `len` SIMD-aligned bytes
    pub fn simd_allocate(&self, len: usize) -> Result<Simd<'_>> {
        Simd::allocate(self, len)
    }
}

impl<'sdl> Simd<'sdl> {
    /// Allocate `len` SIMD-aligned bytes with `SDL_SIMDAlloc` (SDL 2.0.10)
    pub fn allocate(sdl: &'sdl Sdl, len: usize) -> Result<Self> {
        let alloc = sdl.resolve(exports::SIMD_ALLOC)?;
        let ptr = unsafe { alloc(NativeUInt::from(len)) };
        let ptr = NonNull::new(ptr as *mut u8).ok_or_else(|| sdl.native_failure(None))?;

        Ok(Self {
            sdl,
            block: Some(SimdBlock { ptr, len }),
        })
    }

    /// Grow or shrink to `len` bytes, keeping the common prefix
    pub fn reallocate(&mut self, len: usize) -> Result<()> {
        let old = self.block()?;
        let strategy = REALLOC
            .select(self.sdl.version())
            .copied()
            .unwrap_or(Realloc::AllocCopyFree);

        let ptr = match strategy {
            Realloc::Native => {
                let realloc = self.sdl.resolve(exports::SIMD_REALLOC)?;
                unsafe { realloc(old.ptr.as_ptr() as *mut c_void, NativeUInt::from(len)) }
            }
            Realloc::AllocCopyFree => {
                let alloc = self.sdl.resolve(exports::SIMD_ALLOC)?;
                let free = self.sdl.resolve(exports::SIMD_FREE)?;
                let fresh = unsafe { alloc(NativeUInt::from(len)) };
                if !fresh.is_null() {
                    unsafe {
                        std::ptr::copy_nonoverlapping(old.ptr.as_ptr(), fresh as *mut u8, old.len.min(len));
                        free(old.ptr.as_ptr() as *mut c_void);
                    }
                }
                fresh
            }
        };

        let ptr = NonNull::new(ptr as *mut u8).ok_or_else(|| self.sdl.native_failure(None))?;
        self.block = Some(SimdBlock { ptr, len });
        Ok(())
    }

    fn block(&self) -> Result<SimdBlock> {
        self.block.ok_or_else(|| {
            Error::precondition("access SIMD allocation", "the allocation was already released")
        })
    }

    /// Length in bytes; 0 once released
    pub fn len(&self) -> usize {
        self.block.map_or(0, |block| block.len)
    }

    /// True when the block holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True after [`release`](Self::release)
    pub fn is_released(&self) -> bool {
        self.block.is_none()
    }

    /// Start of the block
    pub fn as_ptr(&self) -> Result<NonNull<u8>> {
        Ok(self.block()?.ptr)
    }

    /// Contents as bytes
    pub fn as_slice(&self) -> Result<&[u8]> {
        let block = self.block()?;
        Ok(unsafe { std::slice::from_raw_parts(block.ptr.as_ptr(), block.len) })
    }

    /// Contents as mutable bytes
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        let block = self.block()?;
        Ok(unsafe { std::slice::from_raw_parts_mut(block.ptr.as_ptr(), block.len) })
    }

    /// Read a `T` at `offset`, bounds checked
    pub fn read<T: Pod>(&self, offset: usize) -> Result<T> {
        read_pod(self.as_slice()?, offset)
    }

    /// Write a `T` at `offset`, bounds checked
    pub fn write<T: Pod>(&mut self, offset: usize, value: T) -> Result<()> {
        write_pod(self.as_mut_slice()?, offset, value)
    }

    /// Free the block; a second call does nothing
    pub fn release(&mut self) -> Result<()> {
        if let Some(block) = self.block {
            let free = self.sdl.resolve(exports::SIMD_FREE)?;
            unsafe { free(block.ptr.as_ptr() as *mut c_void) };
            self.block = None;
            log::debug!("Released {} byte SIMD allocation", block.len);
        }
        Ok(())
    }
}

impl Drop for Simd<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Leaking SIMD allocation: {}", e);
        }
    }
}

impl fmt::Debug for Simd<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simd").field("block", &self.block).finish()
    }
}
