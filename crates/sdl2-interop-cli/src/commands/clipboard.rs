//! Clipboard command - the clipboard needs the video subsystem

use anyhow::{Context, Result};
use sdl2_interop::{InitFlags, Sdl};

pub fn get(sdl: &Sdl) -> Result<()> {
    let _video = sdl.initialize(InitFlags::VIDEO).context("Failed to start video")?;

    if sdl.has_clipboard_text()? {
        println!("{}", sdl.clipboard_text()?);
    }
    Ok(())
}

pub fn set(sdl: &Sdl, text: &str) -> Result<()> {
    let _video = sdl.initialize(InitFlags::VIDEO).context("Failed to start video")?;

    sdl.set_clipboard_text(text).context("Failed to set clipboard text")?;
    Ok(())
}
