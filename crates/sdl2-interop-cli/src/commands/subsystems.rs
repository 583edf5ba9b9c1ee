//! Subsystems command - start subsystems and report what SDL runs

use anyhow::{Context, Result};
use clap::ValueEnum;
use sdl2_interop::{InitFlags, Sdl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Subsystem {
    Timer,
    Audio,
    Video,
    Joystick,
    Haptic,
    GameController,
    Events,
    Sensor,
    Everything,
}

impl From<Subsystem> for InitFlags {
    fn from(subsystem: Subsystem) -> Self {
        match subsystem {
            Subsystem::Timer => InitFlags::TIMER,
            Subsystem::Audio => InitFlags::AUDIO,
            Subsystem::Video => InitFlags::VIDEO,
            Subsystem::Joystick => InitFlags::JOYSTICK,
            Subsystem::Haptic => InitFlags::HAPTIC,
            Subsystem::GameController => InitFlags::GAME_CONTROLLER,
            Subsystem::Events => InitFlags::EVENTS,
            Subsystem::Sensor => InitFlags::SENSOR,
            Subsystem::Everything => InitFlags::EVERYTHING,
        }
    }
}

pub fn run(sdl: &Sdl, requested: &[Subsystem]) -> Result<()> {
    let flags = requested
        .iter()
        .fold(InitFlags::empty(), |flags, subsystem| flags | InitFlags::from(*subsystem));

    let subsystems = sdl
        .initialize(flags)
        .with_context(|| format!("Failed to initialize {:?}", flags))?;
    let running = subsystems.initialized()?;

    for (name, _) in running.iter_names() {
        println!("{}", name.to_ascii_lowercase().replace('_', "-"));
    }

    subsystems.quit()?;
    Ok(())
}
