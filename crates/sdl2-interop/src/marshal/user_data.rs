//! Arbitrary shared values <-> opaque `void*` tokens

use super::{type_mismatch, Marshaler, Ownership};
use crate::error::Result;
use std::any::Any;
use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

/// A value handed through native code as callback user data
///
/// `Null` is the explicit "no value" sentinel; it crosses the boundary as a
/// null pointer and comes back as `Null`, never as a dangling token.
#[derive(Clone, Default)]
pub enum UserData {
    #[default]
    Null,
    Value(Arc<dyn Any + Send + Sync>),
}

impl UserData {
    /// Share `value` with native callbacks
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        UserData::Value(Arc::new(value))
    }

    /// Share an existing `Arc` without re-wrapping it
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        UserData::Value(value)
    }

    /// True for the `Null` sentinel
    pub fn is_null(&self) -> bool {
        matches!(self, UserData::Null)
    }

    /// Same object, not merely an equal one
    pub fn ptr_eq(&self, other: &UserData) -> bool {
        match (self, other) {
            (UserData::Null, UserData::Null) => true,
            (UserData::Value(a), UserData::Value(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Typed access to the shared value
    pub fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        match self {
            UserData::Null => Err(type_mismatch::<T, UserData>()),
            UserData::Value(value) => Arc::clone(value)
                .downcast::<T>()
                .map_err(|_| type_mismatch::<T, dyn Any>()),
        }
    }

    /// Borrow the payload as `T` if it is one
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            UserData::Null => None,
            UserData::Value(value) => value.downcast_ref::<T>(),
        }
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserData::Null => write!(f, "UserData::Null"),
            UserData::Value(value) => write!(f, "UserData::Value({:p})", Arc::as_ptr(value)),
        }
    }
}

/// Process-wide table mapping opaque tokens to shared values
///
/// Native code only ever sees the token. A token is redeemable between
/// [`register`] and [`release`]; afterwards it redeems to `Null`, so a late
/// callback cannot reach freed state.
pub(crate) mod handles {
    use super::UserData;
    use parking_lot::{const_mutex, Mutex};
    use std::any::Any;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    static TABLE: Mutex<BTreeMap<usize, Arc<dyn Any + Send + Sync>>> = const_mutex(BTreeMap::new());
    static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(1);

    /// Register a value; `Null` maps to token 0
    pub fn register(data: &UserData) -> usize {
        match data {
            UserData::Null => 0,
            UserData::Value(value) => {
                let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
                TABLE.lock().insert(token, Arc::clone(value));
                token
            }
        }
    }

    /// Look a token up without releasing it
    pub fn redeem(token: usize) -> UserData {
        if token == 0 {
            return UserData::Null;
        }
        TABLE
            .lock()
            .get(&token)
            .map(|value| UserData::Value(Arc::clone(value)))
            .unwrap_or_default()
    }

    /// Drop the table's reference; returns whether the token was live
    pub fn release(token: usize) -> bool {
        token != 0 && TABLE.lock().remove(&token).is_some()
    }

    /// Whether `token` still refers to a registered value
    #[cfg(test)]
    pub fn is_live(token: usize) -> bool {
        TABLE.lock().contains_key(&token)
    }
}

/// User-data marshaler
///
/// Encoding registers the value in the handle table and yields its token as
/// a `void*`. Decoding redeems the token to the identical shared value.
/// Releasing an owned token removes it from the table.
#[derive(Debug, Default)]
pub struct UserDataMarshaler {
    ownership: Ownership,
}

impl UserDataMarshaler {
    /// Marshaler that releases its tokens according to `ownership`
    pub fn new(ownership: Ownership) -> Self {
        Self { ownership }
    }

    /// Wrap any shareable value and encode it
    pub fn wrap<T: Any + Send + Sync>(&mut self, value: T) -> Result<*mut c_void> {
        self.to_native(&UserData::new(value))
    }
}

impl Marshaler for UserDataMarshaler {
    type Managed = UserData;
    type Output = UserData;
    type Native = *mut c_void;

    fn ownership(&self) -> Ownership {
        self.ownership
    }

    fn to_native(&mut self, value: &UserData) -> Result<*mut c_void> {
        Ok(handles::register(value) as *mut c_void)
    }

    unsafe fn to_managed(&mut self, native: *mut c_void) -> Result<UserData> {
        Ok(handles::redeem(native as usize))
    }

    unsafe fn release_native(&mut self, native: *mut c_void) -> Result<()> {
        if self.ownership == Ownership::Owned {
            handles::release(native as usize);
        }
        Ok(())
    }
}
