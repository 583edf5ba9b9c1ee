//! SDL2 Interop - safe bindings over a dynamically loaded SDL2
//!
//! The native library is opened at runtime and every export is resolved by
//! name together with the minimum SDL version that ships it:
//! - Versioned export resolution with "you need vX but have vY" diagnostics
//! - Marshalers for strings, opaque user data, owned buffers and streams
//! - RAII wrappers for native memory, SIMD blocks, RWops, timers and subsystems
//! - Thin wrappers for clipboard, CPU, power, platform and logging queries
//!
//! # Example
//!
//! ```no_run
//! use sdl2_interop::{InitFlags, Sdl};
//!
//! let sdl = Sdl::load()?;
//! println!("SDL v{}", sdl.version());
//!
//! let subsystems = sdl.initialize(InitFlags::TIMER | InitFlags::EVENTS)?;
//! println!("{:?}", subsystems.initialized()?);
//! # Ok::<(), sdl2_interop::Error>(())
//! ```

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod clipboard;
pub mod cpu;
pub mod error;
pub mod ffi;
pub mod library;
pub mod logging;
pub mod marshal;
pub mod memory;
pub mod native_int;
pub mod platform;
pub mod power;
pub mod rwops;
pub mod sdl;
pub mod simd;
pub mod subsystems;
pub mod timer;
pub mod version;

// Test utilities (only available in test builds)
#[cfg(test)]
mod test_utils;

pub use error::{Error, Result};
pub use library::{NativeLibrary, SymbolTable};
pub use logging::{LogCategory, LogOutputFunction, LogPriority};
pub use marshal::{Marshaler, Ownership, UserData};
pub use memory::MemoryBuffer;
pub use native_int::{NativeInt, NativeUInt};
pub use power::{PowerInfo, PowerState};
pub use rwops::{FileMode, RwOps, RwOpsType, StreamBackend, StreamCapabilities};
pub use sdl::{Export, Sdl};
pub use simd::Simd;
pub use subsystems::{InitFlags, Subsystems};
pub use timer::{ticks_passed, Timer};
pub use version::{Version, VersionTable};
