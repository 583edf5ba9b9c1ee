//! Marshaling between native representations and Rust values
//!
//! Each marshaler converts one kind of value across the FFI boundary:
//! - [`StringMarshaler`]: UTF-8 strings <-> `const char*`
//! - [`UserDataMarshaler`]: arbitrary shared values <-> opaque `void*` tokens
//! - [`MemoryBufferMarshaler`]: [`MemoryBuffer`](crate::MemoryBuffer) <-> native heap blocks
//! - [`RwOpsMarshaler`]: [`RwOps`](crate::RwOps) <-> `SDL_RWops*`
//!
//! # Ownership
//!
//! Every marshaler carries an [`Ownership`] cookie. With
//! [`Ownership::Owned`] the transition owns what it produced and
//! [`Marshaler::release_native`] frees it; with
//! [`Ownership::LeaveAllocated`] the other side keeps ownership and release
//! is a no-op. Call sites pick the cookie explicitly, next to the native call.

mod buffer;
mod stream;
mod string;
mod user_data;

pub use buffer::{MemoryBufferMarshaler, RawBuffer};
pub use stream::RwOpsMarshaler;
pub use string::StringMarshaler;
pub use user_data::{UserData, UserDataMarshaler};

pub(crate) use user_data::handles;

use crate::error::{Error, Result};
use std::any::{type_name, Any};

/// Who frees a value after it crossed the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ownership {
    /// This transition owns the value and releases it
    #[default]
    Owned,
    /// The other side owns the value; releasing is a no-op
    LeaveAllocated,
}

/// A codec for one kind of value crossing the FFI boundary
pub trait Marshaler {
    /// Value accepted on the Rust side
    type Managed: ?Sized;
    /// Value produced when decoding
    type Output;
    /// Native representation
    type Native: Copy;

    /// Ownership cookie this marshaler was created with
    fn ownership(&self) -> Ownership;

    /// Encode a Rust value for a native call
    fn to_native(&mut self, value: &Self::Managed) -> Result<Self::Native>;

    /// Decode a native value
    ///
    /// # Safety
    ///
    /// `native` must be a valid value of its kind (or null where the kind
    /// allows it) for the duration of the call.
    unsafe fn to_managed(&mut self, native: Self::Native) -> Result<Self::Output>;

    /// Release a native value once the transition completed
    ///
    /// No-op under [`Ownership::LeaveAllocated`].
    ///
    /// # Safety
    ///
    /// `native` must not be used afterwards, must not have been released
    /// before, and must not have been adopted by an owning
    /// [`to_managed`](Marshaler::to_managed) result.
    unsafe fn release_native(&mut self, native: Self::Native) -> Result<()>;

    /// Encode a value whose type is only known at runtime
    ///
    /// Fails with [`Error::InvalidArgumentType`] unless `value` is a
    /// `Self::Managed`.
    fn to_native_dyn<V: Any>(&mut self, value: &V) -> Result<Self::Native>
    where
        Self::Managed: Sized + 'static,
    {
        match (value as &dyn Any).downcast_ref::<Self::Managed>() {
            Some(managed) => self.to_native(managed),
            None => Err(type_mismatch::<Self::Managed, V>()),
        }
    }
}

pub(crate) fn type_mismatch<Expected: ?Sized, Found: ?Sized>() -> Error {
    Error::invalid_argument(type_name::<Expected>(), type_name::<Found>())
}
