//! Subsystem initialization

use crate::error::{Error, Result};
use crate::ffi::exports;
use crate::sdl::Sdl;
use crate::version::{Version, VersionTable};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// `SDL_INIT_*` subsystem flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InitFlags: u32 {
        const TIMER = 0x0000_0001;
        const AUDIO = 0x0000_0010;
        /// Implies `EVENTS`
        const VIDEO = 0x0000_0020;
        /// Implies `EVENTS`
        const JOYSTICK = 0x0000_0200;
        const HAPTIC = 0x0000_1000;
        /// Implies `JOYSTICK` and `EVENTS`
        const GAME_CONTROLLER = 0x0000_2000;
        const EVENTS = 0x0000_4000;
        /// Available from SDL 2.0.9
        const SENSOR = 0x0000_8000;
        /// Ignored by SDL since 2.0.5
        const NO_PARACHUTE = 0x0010_0000;

        /// Every subsystem; never includes `NO_PARACHUTE`
        const EVERYTHING = Self::TIMER.bits()
            | Self::AUDIO.bits()
            | Self::VIDEO.bits()
            | Self::JOYSTICK.bits()
            | Self::HAPTIC.bits()
            | Self::GAME_CONTROLLER.bits()
            | Self::EVENTS.bits()
            | Self::SENSOR.bits();
    }
}

/// Flags each library range accepts
static SUPPORTED: VersionTable<InitFlags> = VersionTable::new(&[
    (
        Version::new(2, 0, 0),
        InitFlags::all().difference(InitFlags::SENSOR),
    ),
    (
        Version::new(2, 0, 5),
        InitFlags::all().difference(InitFlags::SENSOR.union(InitFlags::NO_PARACHUTE)),
    ),
    (
        Version::new(2, 0, 9),
        InitFlags::all().difference(InitFlags::NO_PARACHUTE),
    ),
]);

impl InitFlags {
    /// These flags plus every subsystem they start implicitly
    pub fn implied(self) -> Self {
        let mut flags = self;
        if flags.contains(Self::GAME_CONTROLLER) {
            flags |= Self::JOYSTICK;
        }
        if flags.intersects(Self::AUDIO | Self::VIDEO | Self::JOYSTICK | Self::GAME_CONTROLLER) {
            flags |= Self::EVENTS;
        }
        flags
    }

    /// Drop flags the given library version does not accept
    ///
    /// `SENSOR` is dropped before 2.0.9 and `NO_PARACHUTE` from 2.0.5 on.
    pub fn normalized_for(self, version: Version) -> Self {
        let supported = SUPPORTED
            .select(version)
            .copied()
            .unwrap_or(InitFlags::all().difference(InitFlags::SENSOR));
        self & supported
    }
}

/// Guard for the library-wide set of started subsystems
///
/// `start` and `stop` change the global set, not state private to the guard.
/// Dropping the guard (or [`quit`](Self::quit)) shuts SDL down completely,
/// so only one guard may exist per library instance.
pub struct Subsystems<'sdl> {
    sdl: &'sdl Sdl,
    active: bool,
}

impl Sdl {
    /// Initialize SDL with `flags` and return the shutdown guard
    pub fn initialize(&self, flags: InitFlags) -> Result<Subsystems<'_>> {
        if !self.claim_subsystems() {
            return Err(Error::precondition(
                "initialize SDL",
                "a subsystem guard already exists for this library instance",
            ));
        }

        let flags = flags.normalized_for(self.version());
        let init = match self.resolve(exports::INIT) {
            Ok(init) => init,
            Err(e) => {
                self.release_subsystems();
                return Err(e);
            }
        };

        let code = unsafe { init(flags.bits()) };
        if code < 0 {
            let error = self.native_failure(Some(code));
            self.release_subsystems();
            return Err(error);
        }

        log::debug!("Initialized SDL subsystems {:?}", flags);
        Ok(Subsystems {
            sdl: self,
            active: true,
        })
    }

    /// Subsystems currently running, library-wide
    pub fn was_initialized(&self) -> Result<InitFlags> {
        let was_init = self.resolve(exports::WAS_INIT)?;
        Ok(InitFlags::from_bits_retain(unsafe { was_init(0) }))
    }
}

impl Subsystems<'_> {
    /// Start more subsystems
    pub fn start(&self, flags: InitFlags) -> Result<()> {
        let flags = flags.normalized_for(self.sdl.version());
        let init_sub_system = self.sdl.resolve(exports::INIT_SUB_SYSTEM)?;

        let code = unsafe { init_sub_system(flags.bits()) };
        if code < 0 {
            return Err(self.sdl.native_failure(Some(code)));
        }
        log::debug!("Started SDL subsystems {:?}", flags);
        Ok(())
    }

    /// Stop subsystems; SDL reference-counts each one
    pub fn stop(&self, flags: InitFlags) -> Result<()> {
        let flags = flags.normalized_for(self.sdl.version());
        let quit_sub_system = self.sdl.resolve(exports::QUIT_SUB_SYSTEM)?;

        unsafe { quit_sub_system(flags.bits()) };
        log::debug!("Stopped SDL subsystems {:?}", flags);
        Ok(())
    }

    /// Subsystems currently running, library-wide
    pub fn initialized(&self) -> Result<InitFlags> {
        self.sdl.was_initialized()
    }

    /// Shut every subsystem down
    pub fn quit(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        let quit = self.sdl.resolve(exports::QUIT)?;
        unsafe { quit() };
        self.active = false;
        self.sdl.release_subsystems();
        log::debug!("Shut SDL down");
        Ok(())
    }
}

impl Drop for Subsystems<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            self.sdl.release_subsystems();
            log::warn!("SDL shutdown failed: {}", e);
        }
    }
}

impl fmt::Debug for Subsystems<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subsystems").field("active", &self.active).finish()
    }
}
