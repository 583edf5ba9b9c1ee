//! Info command - describe the loaded library and the machine it runs on

use anyhow::{Context, Result};
use sdl2_interop::Sdl;

pub fn run(sdl: &Sdl) -> Result<()> {
    let revision = sdl.revision().context("Failed to query the SDL revision")?;
    println!("SDL2 v{} ({})", sdl.version(), revision);
    println!("Library: {}", sdl.describe());
    println!("Platform: {}", sdl.platform()?);

    println!(
        "CPU: {} cores, {} byte cache line",
        sdl.cpu_count()?,
        sdl.cpu_cache_line_size()?
    );
    // SDL_GetSystemRAM arrived in 2.0.1
    match sdl.system_ram() {
        Ok(ram) => println!("RAM: {} MiB", ram),
        Err(e) if e.is_version_mismatch() => println!("RAM: unknown"),
        Err(e) => return Err(e.into()),
    }

    let features: Vec<&str> = sdl
        .cpu_features()?
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| name)
        .collect();
    println!(
        "Features: {}",
        if features.is_empty() {
            String::from("none")
        } else {
            features.join(", ")
        }
    );

    let power = sdl.power_info()?;
    let mut line = format!("Power: {:?}", power.state);
    if let Some(percentage) = power.percentage_left {
        line.push_str(&format!(", {}%", percentage));
    }
    if let Some(seconds) = power.seconds_left {
        line.push_str(&format!(", {} min left", seconds / 60));
    }
    println!("{}", line);

    Ok(())
}
