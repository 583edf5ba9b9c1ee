//! The library instance and the versioned export resolver

use crate::error::{Error, Result};
use crate::ffi::{exports, RawVersion};
use crate::library::{NativeLibrary, SymbolTable};
use crate::marshal::{Marshaler, Ownership, StringMarshaler};
use crate::version::Version;
use parking_lot::{Mutex, RwLock};
use sdl2_interop_config::InteropConfig;
use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Versioned capability: an export name, the SDL version that introduced it
/// and the function-pointer type it is called through
pub struct Export<F> {
    name: &'static str,
    minimum: Version,
    _signature: PhantomData<F>,
}

impl<F> Export<F> {
    /// Describe an export
    ///
    /// # Safety
    ///
    /// `F` must be an `unsafe extern "C" fn` type whose signature matches the
    /// native declaration of `name`; [`Sdl::resolve`] reinterprets the
    /// symbol address as `F` without further checks.
    pub const unsafe fn new(name: &'static str, minimum: Version) -> Self {
        Self {
            name,
            minimum,
            _signature: PhantomData,
        }
    }

    /// Exported symbol name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// First SDL version that ships the symbol
    pub const fn minimum(&self) -> Version {
        self.minimum
    }
}

impl<F> Clone for Export<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for Export<F> {}

impl<F> fmt::Debug for Export<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (SDL >= {})", self.name, self.minimum)
    }
}

/// A loaded SDL2 library
///
/// Every wrapper created from an instance borrows it, so none can outlive
/// the library they call into. Dropping the instance unloads the library.
pub struct Sdl {
    symbols: Box<dyn SymbolTable>,
    /// Successful lookups only; misses are re-resolved so they always report
    resolved: RwLock<HashMap<&'static str, usize>>,
    version: OnceLock<Version>,
    subsystems_claimed: AtomicBool,
    /// Handle-table token of the installed log output callback
    pub(crate) log_output_token: Mutex<Option<usize>>,
}

impl Sdl {
    /// Find and load SDL2 from the default locations
    pub fn load() -> Result<Self> {
        Ok(Self::from_symbol_table(NativeLibrary::discover(&[])?))
    }

    /// Load SDL2 from an explicit path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_symbol_table(NativeLibrary::open(path.as_ref())?))
    }

    /// Load SDL2 as described by a merged configuration
    ///
    /// An explicit `library.path` wins over discovery through
    /// `library.search_paths`; `library.minimum_version` is enforced after
    /// the library reports its version.
    pub fn load_with_config(config: &InteropConfig) -> Result<Self> {
        let library = match config.library_path() {
            Some(path) => NativeLibrary::open(path)?,
            None => NativeLibrary::discover(config.search_paths())?,
        };

        let sdl = Self::from_symbol_table(library);
        if let Some(minimum) = config.minimum_version()? {
            sdl.require_version(Version::try_from(&minimum)?)?;
        }
        Ok(sdl)
    }

    /// Wrap an already opened symbol table
    pub fn from_symbol_table(symbols: impl SymbolTable + 'static) -> Self {
        let sdl = Self {
            symbols: Box::new(symbols),
            resolved: RwLock::new(HashMap::new()),
            version: OnceLock::new(),
            subsystems_claimed: AtomicBool::new(false),
            log_output_token: Mutex::new(None),
        };
        log::debug!("Loaded SDL2 v{} from {}", sdl.version(), sdl.symbols.describe());
        sdl
    }

    /// Process-wide instance, loaded on first use and never unloaded
    pub fn shared() -> Result<&'static Sdl> {
        static SHARED: OnceLock<Sdl> = OnceLock::new();

        if let Some(sdl) = SHARED.get() {
            return Ok(sdl);
        }

        // A racing loser drops its own handle; the library stays mapped
        let sdl = Sdl::load()?;
        Ok(SHARED.get_or_init(|| sdl))
    }

    /// Unload the library
    pub fn close(self) {
        drop(self)
    }

    /// Fail with [`Error::LibraryTooOld`] when the library predates `required`
    pub fn require_version(&self, required: Version) -> Result<()> {
        let actual = self.version();
        if actual < required {
            return Err(Error::LibraryTooOld { required, actual });
        }
        Ok(())
    }

    /// Resolve an export to a callable function pointer
    ///
    /// A missing symbol means the library is older than the export, so the
    /// error carries both the required and the detected version.
    pub fn resolve<F: Copy>(&self, export: Export<F>) -> Result<F> {
        self.resolve_raw(export)
            .ok_or_else(|| Error::SymbolVersionMismatch {
                symbol: export.name().to_string(),
                required: export.minimum(),
                actual: self.version(),
            })
    }

    /// True when the export can be resolved
    pub fn supports<F: Copy>(&self, export: Export<F>) -> bool {
        self.resolve_raw(export).is_some()
    }

    fn resolve_raw<F: Copy>(&self, export: Export<F>) -> Option<F> {
        let address = self.lookup_cached(export.name())?;
        debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*mut c_void>());

        // SAFETY: `Export::new` guarantees F is the matching fn-pointer type
        Some(unsafe { std::mem::transmute_copy::<*mut c_void, F>(&address.as_ptr()) })
    }

    fn lookup_cached(&self, name: &'static str) -> Option<NonNull<c_void>> {
        if let Some(&address) = self.resolved.read().get(name) {
            return NonNull::new(address as *mut c_void);
        }

        let address = self.symbols.lookup(name);
        match address {
            Some(found) => {
                log::trace!("Resolved {} at {:p}", name, found);
                self.resolved.write().insert(name, found.as_ptr() as usize);
            }
            None => log::trace!("{} is not exported by {}", name, self.symbols.describe()),
        }
        address
    }

    /// Version of the loaded library
    ///
    /// Safe to call from any thread at any time, including before any
    /// subsystem is initialized.
    pub fn version(&self) -> Version {
        *self.version.get_or_init(|| match self.resolve_raw(exports::GET_VERSION) {
            Some(get_version) => {
                let mut raw = RawVersion::default();
                unsafe { get_version(&mut raw) };
                Version::new(raw.major, raw.minor, raw.patch)
            }
            None => Version::UNKNOWN,
        })
    }

    /// Source revision the library was built from
    pub fn revision(&self) -> Result<String> {
        let get_revision = self.resolve(exports::GET_REVISION)?;
        let mut marshaler = StringMarshaler::new(self, Ownership::LeaveAllocated);
        unsafe { marshaler.to_managed(get_revision()) }
    }

    /// Numeric source revision (always 0 on git-based builds)
    #[deprecated(note = "SDL stopped maintaining revision numbers; use `revision`")]
    pub fn revision_number(&self) -> Result<i32> {
        let get_revision_number = self.resolve(exports::GET_REVISION_NUMBER)?;
        Ok(unsafe { get_revision_number() })
    }

    /// Text of the most recent native failure
    ///
    /// The slot is overwritten by the next failing call; errors returned by
    /// this crate already carry the message captured at the failure site.
    pub fn last_error(&self) -> Result<String> {
        let get_error = self.resolve(exports::GET_ERROR)?;
        let mut marshaler = StringMarshaler::new(self, Ownership::LeaveAllocated);
        unsafe { marshaler.to_managed(get_error()) }
    }

    /// Reset the native error slot
    pub fn clear_error(&self) -> Result<()> {
        let clear_error = self.resolve(exports::CLEAR_ERROR)?;
        unsafe { clear_error() };
        Ok(())
    }

    /// Build a failure from the native error slot
    pub(crate) fn native_failure(&self, code: Option<i32>) -> Error {
        let message = match self.last_error() {
            Ok(message) if !message.is_empty() => message,
            _ => "SDL reported no error message".to_string(),
        };
        Error::NativeOperationFailed { message, code }
    }

    /// Description of the loaded library
    pub fn describe(&self) -> String {
        self.symbols.describe()
    }

    pub(crate) fn claim_subsystems(&self) -> bool {
        self.subsystems_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn release_subsystems(&self) {
        self.subsystems_claimed.store(false, Ordering::Release);
    }
}

impl Drop for Sdl {
    fn drop(&mut self) {
        self.release_log_output();
        log::debug!("Unloading SDL2 from {}", self.symbols.describe());
    }
}

impl fmt::Debug for Sdl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sdl")
            .field("library", &self.symbols.describe())
            .field("version", &self.version.get())
            .finish()
    }
}
