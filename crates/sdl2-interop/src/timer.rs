//! Timers and tick counters
//!
//! Timer callbacks run on a thread SDL creates. The closure and its user data
//! reach that thread through a handle-table token, never a raw Rust pointer,
//! so a callback that fires after the timer was removed finds nothing and
//! cancels itself.

use crate::error::Result;
use crate::ffi::{exports, SDL_TRUE};
use crate::marshal::{Marshaler, Ownership, UserData, UserDataMarshaler};
use crate::sdl::Sdl;
use crate::version::{Version, VersionTable};
use parking_lot::Mutex;
use std::ffi::c_void;
use std::fmt;
use std::os::raw::c_int;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type Callback = Box<dyn FnMut(u32, &UserData) -> u32 + Send>;

struct TimerContext {
    callback: Mutex<Callback>,
    user_data: UserData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ticks {
    /// SDL_GetTicks widened; wraps after ~49 days
    Narrow,
    /// SDL_GetTicks64
    Wide,
}

static TICKS64: VersionTable<Ticks> = VersionTable::new(&[
    (Version::new(2, 0, 0), Ticks::Narrow),
    (Version::new(2, 0, 18), Ticks::Wide),
]);

/// A registered periodic callback
///
/// The callback returns the next interval in milliseconds, or 0 to cancel.
/// Dropping the handle removes the timer and then releases its context.
pub struct Timer<'sdl> {
    sdl: &'sdl Sdl,
    id: Option<c_int>,
    token: usize,
    context: Arc<TimerContext>,
    marshaler: UserDataMarshaler,
}

impl Sdl {
    /// Call `callback` every `interval` ms on SDL's timer thread
    ///
    /// Requires the timer subsystem. `user_data` is passed back to every
    /// invocation as the same shared object.
    pub fn add_timer<F>(&self, interval: u32, callback: F, user_data: UserData) -> Result<Timer<'_>>
    where
        F: FnMut(u32, &UserData) -> u32 + Send + 'static,
    {
        let add_timer = self.resolve(exports::ADD_TIMER)?;

        let context = Arc::new(TimerContext {
            callback: Mutex::new(Box::new(callback) as Callback),
            user_data,
        });
        let mut marshaler = UserDataMarshaler::new(Ownership::Owned);
        let token = marshaler.to_native(&UserData::from_arc(context.clone()))?;

        let id = unsafe { add_timer(interval, Some(timer_callback), token) };
        if id <= 0 {
            let error = self.native_failure(if id < 0 { Some(id) } else { None });
            unsafe { marshaler.release_native(token)? };
            return Err(error);
        }

        log::debug!("Added timer {} every {} ms", id, interval);
        Ok(Timer {
            sdl: self,
            id: Some(id),
            token: token as usize,
            context,
            marshaler,
        })
    }

    /// Milliseconds since SDL was initialized, wrapping at `u32::MAX`
    pub fn ticks(&self) -> Result<u32> {
        let get_ticks = self.resolve(exports::GET_TICKS)?;
        Ok(unsafe { get_ticks() })
    }

    /// Milliseconds since SDL was initialized
    ///
    /// Libraries older than 2.0.18 only have the 32-bit counter, which is
    /// widened here and still wraps.
    pub fn ticks64(&self) -> Result<u64> {
        match TICKS64.select(self.version()).copied().unwrap_or(Ticks::Narrow) {
            Ticks::Narrow => self.ticks().map(u64::from),
            Ticks::Wide => {
                let get_ticks64 = self.resolve(exports::GET_TICKS64)?;
                Ok(unsafe { get_ticks64() })
            }
        }
    }

    /// Current value of the high-resolution counter
    pub fn performance_counter(&self) -> Result<u64> {
        let counter = self.resolve(exports::GET_PERFORMANCE_COUNTER)?;
        Ok(unsafe { counter() })
    }

    /// Ticks of [`performance_counter`](Self::performance_counter) per second
    pub fn performance_frequency(&self) -> Result<u64> {
        let frequency = self.resolve(exports::GET_PERFORMANCE_FREQUENCY)?;
        Ok(unsafe { frequency() })
    }

    /// Block the calling thread for at least `ms` milliseconds
    pub fn delay(&self, ms: u32) -> Result<()> {
        let delay = self.resolve(exports::DELAY)?;
        unsafe { delay(ms) };
        Ok(())
    }
}

impl Timer<'_> {
    /// Native timer id; `None` once removed
    pub fn id(&self) -> Option<i32> {
        self.id
    }

    /// User data passed to every invocation
    pub fn user_data(&self) -> &UserData {
        &self.context.user_data
    }

    /// Remove the timer; returns whether SDL still knew about it
    pub fn remove(mut self) -> Result<bool> {
        self.cancel()
    }

    fn cancel(&mut self) -> Result<bool> {
        let Some(id) = self.id else {
            return Ok(false);
        };

        let remove_timer = self.sdl.resolve(exports::REMOVE_TIMER)?;
        let removed = unsafe { remove_timer(id) } == SDL_TRUE;
        self.id = None;

        // Only after removal: a callback already in flight redeems to Null
        unsafe { self.marshaler.release_native(self.token as *mut c_void)? };
        log::debug!("Removed timer {}", id);
        Ok(removed)
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.cancel() {
            log::warn!("Removing timer failed: {}", e);
        }
    }
}

impl fmt::Debug for Timer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("user_data", &self.context.user_data)
            .finish()
    }
}

unsafe extern "C" fn timer_callback(interval: u32, param: *mut c_void) -> u32 {
    let data = match UserDataMarshaler::new(Ownership::LeaveAllocated).to_managed(param) {
        Ok(data) => data,
        Err(_) => return 0,
    };
    let Ok(context) = data.downcast::<TimerContext>() else {
        return 0;
    };

    let next = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut callback = context.callback.lock();
        callback(interval, &context.user_data)
    }));

    next.unwrap_or_else(|_| {
        log::error!("Timer callback panicked; cancelling the timer");
        0
    })
}

/// Whether tick count `current` has reached `timeout`, across wraparound
pub fn ticks_passed(current: u32, timeout: u32) -> bool {
    (timeout.wrapping_sub(current) as i32) <= 0
}
