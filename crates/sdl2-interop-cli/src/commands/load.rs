//! Load command - read a file through SDL's own file I/O

use anyhow::{Context, Result};
use sdl2_interop::Sdl;
use std::path::Path;

pub fn run(sdl: &Sdl, file: &Path) -> Result<()> {
    let data = sdl
        .load_file(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    println!("{}: {} bytes", file.display(), data.len());
    Ok(())
}
