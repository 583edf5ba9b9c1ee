//! SDL's logging facility
//!
//! Messages are always passed through a `"%s"` format so caller text is never
//! interpreted by SDL's printf. A Rust output function receives every message
//! SDL logs, including SDL's own diagnostics; [`Sdl::forward_log_output`]
//! routes them into the `log` crate.

use crate::error::{Error, Result};
use crate::ffi::{exports, LogOutputFn};
use crate::marshal::{handles, Marshaler, Ownership, StringMarshaler, UserData, UserDataMarshaler};
use crate::sdl::Sdl;
use std::ffi::{c_void, CStr};
use std::fmt;
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

const FORMAT: &[u8] = b"%s\0";

/// `SDL_LOG_CATEGORY_*`
///
/// An open integer space: values from [`CUSTOM`](Self::CUSTOM) upwards are
/// free for applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogCategory(pub i32);

impl LogCategory {
    pub const APPLICATION: Self = Self(0);
    pub const ERROR: Self = Self(1);
    pub const ASSERT: Self = Self(2);
    pub const SYSTEM: Self = Self(3);
    pub const AUDIO: Self = Self(4);
    pub const VIDEO: Self = Self(5);
    pub const RENDER: Self = Self(6);
    pub const INPUT: Self = Self(7);
    pub const TEST: Self = Self(8);
    pub const RESERVED1: Self = Self(9);
    pub const RESERVED2: Self = Self(10);
    pub const RESERVED3: Self = Self(11);
    pub const RESERVED4: Self = Self(12);
    pub const RESERVED5: Self = Self(13);
    pub const RESERVED6: Self = Self(14);
    pub const RESERVED7: Self = Self(15);
    pub const RESERVED8: Self = Self(16);
    pub const RESERVED9: Self = Self(17);
    pub const RESERVED10: Self = Self(18);
    /// First application-defined category
    pub const CUSTOM: Self = Self(19);

    /// Application category `offset` places above [`CUSTOM`](Self::CUSTOM)
    pub const fn custom(offset: i32) -> Self {
        Self(Self::CUSTOM.0 + offset)
    }

    /// Whether this is an application-defined category
    pub fn is_custom(self) -> bool {
        self.0 >= Self::CUSTOM.0
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::APPLICATION => "application",
            Self::ERROR => "error",
            Self::ASSERT => "assert",
            Self::SYSTEM => "system",
            Self::AUDIO => "audio",
            Self::VIDEO => "video",
            Self::RENDER => "render",
            Self::INPUT => "input",
            Self::TEST => "test",
            other if other.is_custom() => return write!(f, "custom+{}", other.0 - Self::CUSTOM.0),
            other => return write!(f, "reserved{}", other.0 - Self::TEST.0),
        };
        f.write_str(name)
    }
}

/// `SDL_LogPriority`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum LogPriority {
    Verbose = 1,
    Debug = 2,
    Info = 3,
    Warn = 4,
    Error = 5,
    Critical = 6,
}

impl TryFrom<i32> for LogPriority {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Ok(match value {
            1 => LogPriority::Verbose,
            2 => LogPriority::Debug,
            3 => LogPriority::Info,
            4 => LogPriority::Warn,
            5 => LogPriority::Error,
            6 => LogPriority::Critical,
            other => return Err(Error::invalid_argument("a log priority in 1..=6", other.to_string())),
        })
    }
}

impl From<LogPriority> for log::Level {
    fn from(priority: LogPriority) -> Self {
        match priority {
            LogPriority::Verbose => log::Level::Trace,
            LogPriority::Debug => log::Level::Debug,
            LogPriority::Info => log::Level::Info,
            LogPriority::Warn => log::Level::Warn,
            LogPriority::Error | LogPriority::Critical => log::Level::Error,
        }
    }
}

type OutputCallback = Box<dyn Fn(LogCategory, LogPriority, &str, &UserData) + Send + Sync>;

struct OutputContext {
    callback: OutputCallback,
    user_data: UserData,
}

/// The output function SDL currently logs through
#[derive(Debug, Clone)]
pub enum LogOutputFunction {
    /// Installed outside [`Sdl::set_log_output_function`], e.g. SDL's default
    Native {
        callback: Option<LogOutputFn>,
        user_data: *mut c_void,
    },
    /// A Rust output function; carries the user data it was installed with
    Custom(UserData),
}

impl Sdl {
    /// Set the priority of every category
    pub fn log_set_all_priority(&self, priority: LogPriority) -> Result<()> {
        let set_all = self.resolve(exports::LOG_SET_ALL_PRIORITY)?;
        unsafe { set_all(priority as c_int) };
        Ok(())
    }

    /// Set the priority of one category
    pub fn log_set_priority(&self, category: LogCategory, priority: LogPriority) -> Result<()> {
        let set = self.resolve(exports::LOG_SET_PRIORITY)?;
        unsafe { set(category.0, priority as c_int) };
        Ok(())
    }

    /// Current priority of `category`
    pub fn log_priority(&self, category: LogCategory) -> Result<LogPriority> {
        let get = self.resolve(exports::LOG_GET_PRIORITY)?;
        LogPriority::try_from(unsafe { get(category.0) })
    }

    /// Restore SDL's default priority for every category
    pub fn log_reset_priorities(&self) -> Result<()> {
        let reset = self.resolve(exports::LOG_RESET_PRIORITIES)?;
        unsafe { reset() };
        Ok(())
    }

    /// Log at `Info` in the application category
    pub fn log(&self, message: &str) -> Result<()> {
        let log = self.resolve(exports::LOG)?;
        self.with_message(message, |format, text| unsafe { log(format, text) })
    }

    /// Log `message` at `priority` in `category`
    pub fn log_message(&self, category: LogCategory, priority: LogPriority, message: &str) -> Result<()> {
        let log_message = self.resolve(exports::LOG_MESSAGE)?;
        self.with_message(message, |format, text| unsafe {
            log_message(category.0, priority as c_int, format, text)
        })
    }

    fn with_message(&self, message: &str, call: impl FnOnce(*const c_char, *const c_char)) -> Result<()> {
        let mut strings = StringMarshaler::new(self, Ownership::Owned);
        let text = strings.to_native(message)?;
        call(FORMAT.as_ptr() as *const c_char, text);
        unsafe { strings.release_native(text) }
    }

    /// Send every SDL log message to `callback`
    ///
    /// Replaces any output function installed earlier; the previous Rust
    /// callback's context is released once SDL no longer references it.
    pub fn set_log_output_function<F>(&self, callback: F, user_data: UserData) -> Result<()>
    where
        F: Fn(LogCategory, LogPriority, &str, &UserData) + Send + Sync + 'static,
    {
        let set = self.resolve(exports::LOG_SET_OUTPUT_FUNCTION)?;
        let context = OutputContext {
            callback: Box::new(callback),
            user_data,
        };
        let token = UserDataMarshaler::new(Ownership::Owned).wrap(context)?;

        unsafe { set(Some(log_output), token) };
        self.swap_log_output(Some(token as usize));
        Ok(())
    }

    /// Install a native output function
    ///
    /// # Safety
    ///
    /// `callback` must be safe to call from any thread with `user_data` for
    /// as long as it stays installed.
    pub unsafe fn set_raw_log_output_function(&self, callback: Option<LogOutputFn>, user_data: *mut c_void) -> Result<()> {
        let set = self.resolve(exports::LOG_SET_OUTPUT_FUNCTION)?;
        set(callback, user_data);
        self.swap_log_output(None);
        Ok(())
    }

    /// Route SDL's log messages into the `log` crate under target `sdl2`
    pub fn forward_log_output(&self) -> Result<()> {
        self.set_log_output_function(
            |category, priority, message, _| {
                log::log!(target: "sdl2", log::Level::from(priority), "[{}] {}", category, message);
            },
            UserData::Null,
        )
    }

    /// Output function SDL currently calls
    pub fn log_output_function(&self) -> Result<LogOutputFunction> {
        let get = self.resolve(exports::LOG_GET_OUTPUT_FUNCTION)?;
        let mut callback: Option<LogOutputFn> = None;
        let mut user_data: *mut c_void = ptr::null_mut();
        unsafe { get(&mut callback, &mut user_data) };

        let installed = *self.log_output_token.lock();
        if callback.is_some() && installed.is_some() && installed == Some(user_data as usize) {
            let user_data = handles::redeem(user_data as usize)
                .downcast::<OutputContext>()
                .map(|context| context.user_data.clone())
                .unwrap_or_default();
            return Ok(LogOutputFunction::Custom(user_data));
        }

        Ok(LogOutputFunction::Native { callback, user_data })
    }

    fn swap_log_output(&self, token: Option<usize>) {
        let previous = std::mem::replace(&mut *self.log_output_token.lock(), token);
        if let Some(previous) = previous {
            handles::release(previous);
        }
    }

    /// Drop the context of the installed Rust output function
    ///
    /// SDL may keep calling the trampoline; it finds nothing and ignores the
    /// message.
    pub(crate) fn release_log_output(&self) {
        self.swap_log_output(None);
    }
}

macro_rules! log_at_priority {
    ($($name:ident => $export:ident;)*) => {
        impl Sdl {
            $(
                #[doc = concat!("Log through `", stringify!($export), "`")]
                pub fn $name(&self, category: LogCategory, message: &str) -> Result<()> {
                    let log = self.resolve(exports::$export)?;
                    self.with_message(message, |format, text| unsafe { log(category.0, format, text) })
                }
            )*
        }
    };
}

log_at_priority! {
    log_verbose => LOG_VERBOSE;
    log_debug => LOG_DEBUG;
    log_info => LOG_INFO;
    log_warn => LOG_WARN;
    log_error => LOG_ERROR;
    log_critical => LOG_CRITICAL;
}

unsafe extern "C" fn log_output(userdata: *mut c_void, category: c_int, priority: c_int, message: *const c_char) {
    let Ok(context) = handles::redeem(userdata as usize).downcast::<OutputContext>() else {
        return;
    };
    let priority = LogPriority::try_from(priority).unwrap_or(LogPriority::Info);
    let message = if message.is_null() {
        std::borrow::Cow::Borrowed("")
    } else {
        CStr::from_ptr(message).to_string_lossy()
    };

    let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
        (context.callback)(LogCategory(category), priority, &message, &context.user_data)
    }));
    if delivered.is_err() {
        log::error!("SDL log output function panicked");
    }
}
