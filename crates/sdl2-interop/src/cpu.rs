//! CPU information and instruction-set probes

use crate::error::Result;
use crate::ffi::{exports, SdlBool, SDL_FALSE};
use crate::sdl::{Export, Sdl};

type Probe = unsafe extern "C" fn() -> SdlBool;

/// Every feature probe, in the order SDL added them
const FEATURES: &[(&str, Export<Probe>)] = &[
    ("RDTSC", exports::HAS_RDTSC),
    ("AltiVec", exports::HAS_ALTIVEC),
    ("MMX", exports::HAS_MMX),
    ("3DNow!", exports::HAS_3DNOW),
    ("SSE", exports::HAS_SSE),
    ("SSE2", exports::HAS_SSE2),
    ("SSE3", exports::HAS_SSE3),
    ("SSE4.1", exports::HAS_SSE41),
    ("SSE4.2", exports::HAS_SSE42),
    ("AVX", exports::HAS_AVX),
    ("AVX2", exports::HAS_AVX2),
    ("NEON", exports::HAS_NEON),
    ("AVX-512F", exports::HAS_AVX512F),
    ("ARM SIMD", exports::HAS_ARMSIMD),
    ("LSX", exports::HAS_LSX),
    ("LASX", exports::HAS_LASX),
];

macro_rules! feature_probes {
    ($($name:ident => $export:ident;)*) => {
        impl Sdl {
            $(
                #[doc = concat!("`", stringify!($export), "` probe")]
                pub fn $name(&self) -> Result<bool> {
                    self.probe(exports::$export)
                }
            )*
        }
    };
}

feature_probes! {
    has_rdtsc => HAS_RDTSC;
    has_altivec => HAS_ALTIVEC;
    has_mmx => HAS_MMX;
    has_3dnow => HAS_3DNOW;
    has_sse => HAS_SSE;
    has_sse2 => HAS_SSE2;
    has_sse3 => HAS_SSE3;
    has_sse41 => HAS_SSE41;
    has_sse42 => HAS_SSE42;
    has_avx => HAS_AVX;
    has_avx2 => HAS_AVX2;
    has_neon => HAS_NEON;
    has_avx512f => HAS_AVX512F;
    has_armsimd => HAS_ARMSIMD;
    has_lsx => HAS_LSX;
    has_lasx => HAS_LASX;
}

impl Sdl {
    /// Logical CPU cores
    pub fn cpu_count(&self) -> Result<i32> {
        let get = self.resolve(exports::GET_CPU_COUNT)?;
        Ok(unsafe { get() })
    }

    /// L1 cache line size in bytes
    pub fn cpu_cache_line_size(&self) -> Result<i32> {
        let get = self.resolve(exports::GET_CPU_CACHE_LINE_SIZE)?;
        Ok(unsafe { get() })
    }

    /// Installed RAM in MiB (SDL 2.0.1)
    pub fn system_ram(&self) -> Result<i32> {
        let get = self.resolve(exports::GET_SYSTEM_RAM)?;
        Ok(unsafe { get() })
    }

    /// Every probe the loaded library ships, with its result
    ///
    /// Probes newer than the library are left out instead of failing.
    pub fn cpu_features(&self) -> Result<Vec<(&'static str, bool)>> {
        FEATURES
            .iter()
            .filter(|(_, export)| self.supports(*export))
            .map(|(name, export)| Ok((*name, self.probe(*export)?)))
            .collect()
    }

    fn probe(&self, export: Export<Probe>) -> Result<bool> {
        let probe = self.resolve(export)?;
        Ok(unsafe { probe() } != SDL_FALSE)
    }
}
