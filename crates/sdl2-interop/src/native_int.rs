//! Platform-width integers used by native size and count parameters
//!
//! SDL takes and returns `size_t` for allocation sizes and stream object
//! counts. Its width follows the target, so these wrappers are
//! `#[repr(transparent)]` over the pointer-width integer and can appear
//! directly in native signatures, while the rest of the crate reads them as
//! fixed 64-bit values.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Unsigned platform-width native integer (`size_t`)
#[derive(Clone, Copy, Default)]
#[repr(transparent)]
pub struct NativeUInt(usize);

/// Signed platform-width native integer (`ssize_t`)
#[derive(Clone, Copy, Default)]
#[repr(transparent)]
pub struct NativeInt(isize);

impl NativeUInt {
    pub const ZERO: NativeUInt = NativeUInt(0);

    /// Value widened to 64 bits
    pub const fn get(self) -> u64 {
        self.0 as u64
    }

    /// The value at native width
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl NativeInt {
    pub const ZERO: NativeInt = NativeInt(0);

    /// Value widened to 64 bits
    pub const fn get(self) -> i64 {
        self.0 as i64
    }

    /// The value at native width
    pub const fn as_isize(self) -> isize {
        self.0
    }
}

impl From<u32> for NativeUInt {
    fn from(value: u32) -> Self {
        // usize is at least 32 bits on every supported target
        NativeUInt(value as usize)
    }
}

impl From<usize> for NativeUInt {
    fn from(value: usize) -> Self {
        NativeUInt(value)
    }
}

impl TryFrom<u64> for NativeUInt {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        usize::try_from(value)
            .map(NativeUInt)
            .map_err(|_| Error::invalid_argument("a size that fits the platform size_t", value.to_string()))
    }
}

impl From<i32> for NativeInt {
    fn from(value: i32) -> Self {
        NativeInt(value as isize)
    }
}

impl From<isize> for NativeInt {
    fn from(value: isize) -> Self {
        NativeInt(value)
    }
}

impl TryFrom<i64> for NativeInt {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        isize::try_from(value)
            .map(NativeInt)
            .map_err(|_| Error::invalid_argument("a value that fits the platform ssize_t", value.to_string()))
    }
}

impl From<NativeUInt> for u64 {
    fn from(value: NativeUInt) -> Self {
        value.get()
    }
}

impl From<NativeInt> for i64 {
    fn from(value: NativeInt) -> Self {
        value.get()
    }
}

macro_rules! widened_comparisons {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.get() == other.get()
            }
        }

        impl Eq for $ty {}

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> Ordering {
                self.get().cmp(&other.get())
            }
        }

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.get().hash(state)
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($ty), self.get())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.get(), f)
            }
        }
    };
}

widened_comparisons!(NativeUInt);
widened_comparisons!(NativeInt);
