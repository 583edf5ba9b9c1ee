//! Dynamic loading of the SDL2 shared library
//!
//! Uses `libloading` for the platform loader and keeps raw symbol lookup
//! separate from the version-aware diagnostics layered on top by [`crate::Sdl`].

use crate::error::{Error, Result};
use libloading::Library;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// Raw symbol lookup
///
/// Implemented once for real shared libraries; tests provide in-process tables.
pub trait SymbolTable: Send + Sync {
    /// Address of `symbol`, or `None` when the library does not export it
    fn lookup(&self, symbol: &str) -> Option<NonNull<c_void>>;

    /// Human readable description for diagnostics
    fn describe(&self) -> String;
}

/// An opened SDL2 shared library
///
/// # Safety
///
/// Loading a dynamic library runs its initialization code in this process.
/// The library must be a genuine SDL2 build; exported signatures are trusted.
pub struct NativeLibrary {
    library: Library,
    path: PathBuf,
}

impl NativeLibrary {
    /// Conventional file names of SDL2, most specific first
    pub fn candidate_names() -> &'static [&'static str] {
        if cfg!(target_os = "windows") {
            &["SDL2.dll"]
        } else if cfg!(target_os = "macos") {
            &["libSDL2.dylib", "libSDL2-2.0.0.dylib"]
        } else {
            &["libSDL2.so", "libSDL2-2.0.so.0"]
        }
    }

    /// Open the library at an explicit path
    pub fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening SDL2 from {}", path.display());

        let library = unsafe { Library::new(path) }.map_err(|e| Error::LibraryLoad {
            library: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            library,
            path: path.to_path_buf(),
        })
    }

    /// Find and open SDL2
    ///
    /// Every candidate name is tried in `search_paths`, then next to the
    /// running executable, and finally through the platform loader's own
    /// search (LD_LIBRARY_PATH, DYLD paths, PATH).
    pub fn discover(search_paths: &[PathBuf]) -> Result<Self> {
        for dir in Self::search_directories(search_paths) {
            for name in Self::candidate_names() {
                let candidate = dir.join(name);
                if candidate.exists() {
                    return Self::open(&candidate);
                }
            }
        }

        let mut last_error = String::from("no candidate found");
        for name in Self::candidate_names() {
            match unsafe { Library::new(name) } {
                Ok(library) => {
                    log::debug!("Opened SDL2 as {} through the system loader", name);
                    return Ok(Self {
                        library,
                        path: PathBuf::from(name),
                    });
                }
                Err(e) => last_error = e.to_string(),
            }
        }

        Err(Error::LibraryLoad {
            library: Self::candidate_names().join(", "),
            reason: last_error,
        })
    }

    /// Configured directories first, then the executable's directory
    fn search_directories(search_paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = search_paths.to_vec();

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            if !dirs.contains(&exe_dir) {
                dirs.push(exe_dir);
            }
        }

        dirs
    }

    /// Path (or bare name) the library was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolTable for NativeLibrary {
    fn lookup(&self, symbol: &str) -> Option<NonNull<c_void>> {
        // A data-pointer sized symbol yields the export's address
        let address = unsafe { self.library.get::<*mut c_void>(symbol.as_bytes()) }.ok()?;
        NonNull::new(*address)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary").field("path", &self.path).finish()
    }
}
