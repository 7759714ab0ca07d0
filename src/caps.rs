//! Processor capability detection.
//!
//! [`Capabilities`] is an immutable snapshot of the instruction-set extensions
//! the executing CPU (and operating system) support. It is probed once per
//! process through [`Capabilities::get`] and shared by every array; hardware
//! capability cannot change while the process runs.
//!
//! [`Tier`] is the coarse ordering the dispatch layer works with: every kernel
//! table belongs to exactly one tier and a higher tier is always preferred.

use std::fmt;
use std::sync::OnceLock;

use log::debug;

#[cfg(target_arch = "x86")]
use std::arch::x86::__cpuid;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::__cpuid;

/// Process-wide capability record, filled on first use.
static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();

/// Instruction-set tier a dispatch table is built for, ordered by preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Portable one-element-at-a-time kernels.
    Scalar,
    /// 256-bit floating point kernels (8 × f32).
    Avx,
    /// AVX plus 256-bit integer operations.
    Avx2,
}

impl Tier {
    /// All tiers, lowest first.
    pub const ALL: [Tier; 3] = [Tier::Scalar, Tier::Avx, Tier::Avx2];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Scalar => "Scalar",
            Tier::Avx => "AVX",
            Tier::Avx2 => "AVX2",
        };
        f.write_str(name)
    }
}

/// Snapshot of the instruction-set extensions supported by the host.
///
/// The flags never change after construction. Use [`Capabilities::get`] for the
/// shared process-wide record; [`Capabilities::detect`] probes again and
/// [`Capabilities::baseline`] describes a processor with no extensions at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    mmx: bool,
    sse: bool,
    sse2: bool,
    sse3: bool,
    sse4_1: bool,
    sse4_2: bool,
    avx: bool,
    avx2: bool,
    fma: bool,
    htt: bool,
}

impl Capabilities {
    /// Returns the process-wide capability record, probing the CPU on first call.
    pub fn get() -> &'static Capabilities {
        CAPABILITIES.get_or_init(|| {
            let caps = Capabilities::detect();
            debug!(
                "detected processor capabilities: best tier {}, fma {}, htt {}",
                caps.best_tier(),
                caps.fma,
                caps.htt
            );
            caps
        })
    }

    /// Probes the executing CPU.
    ///
    /// AVX, AVX2 and FMA are reported only when the operating system also saves
    /// the 256-bit register state, so a `true` flag means the instructions can
    /// actually be executed.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub fn detect() -> Self {
        Capabilities {
            mmx: is_x86_feature_detected!("mmx"),
            sse: is_x86_feature_detected!("sse"),
            sse2: is_x86_feature_detected!("sse2"),
            sse3: is_x86_feature_detected!("sse3"),
            sse4_1: is_x86_feature_detected!("sse4.1"),
            sse4_2: is_x86_feature_detected!("sse4.2"),
            avx: is_x86_feature_detected!("avx"),
            avx2: is_x86_feature_detected!("avx2"),
            fma: is_x86_feature_detected!("fma"),
            htt: Self::detect_htt(),
        }
    }

    /// Probes the executing CPU. No extension used by this crate exists off x86.
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    pub fn detect() -> Self {
        Capabilities::baseline()
    }

    /// A record with every extension absent. Arrays built from it are scalar-bound.
    pub const fn baseline() -> Self {
        Capabilities {
            mmx: false,
            sse: false,
            sse2: false,
            sse3: false,
            sse4_1: false,
            sse4_2: false,
            avx: false,
            avx2: false,
            fma: false,
            htt: false,
        }
    }

    // Hyperthreading is bit 28 of EDX for CPUID leaf 1; std_detect does not expose it.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[allow(unused_unsafe)]
    fn detect_htt() -> bool {
        let highest = unsafe { __cpuid(0) }.eax;
        if highest < 1 {
            return false;
        }
        let leaf1 = unsafe { __cpuid(1) };
        leaf1.edx & (1 << 28) != 0
    }

    /// Whether the processor supports Hyperthreading Technology.
    #[inline]
    pub fn has_htt(&self) -> bool {
        self.htt
    }

    #[inline]
    pub fn has_mmx(&self) -> bool {
        self.mmx
    }

    #[inline]
    pub fn has_sse(&self) -> bool {
        self.sse
    }

    #[inline]
    pub fn has_sse2(&self) -> bool {
        self.sse2
    }

    #[inline]
    pub fn has_sse3(&self) -> bool {
        self.sse3
    }

    #[inline]
    pub fn has_sse4_1(&self) -> bool {
        self.sse4_1
    }

    #[inline]
    pub fn has_sse4_2(&self) -> bool {
        self.sse4_2
    }

    #[inline]
    pub fn has_avx(&self) -> bool {
        self.avx
    }

    #[inline]
    pub fn has_avx2(&self) -> bool {
        self.avx2
    }

    #[inline]
    pub fn has_fma(&self) -> bool {
        self.fma
    }

    /// Highest tier whose kernels may run on this processor.
    ///
    /// AVX2 is only selected together with AVX, since the AVX2 table falls back
    /// to AVX kernels for every operation it does not specialize.
    pub fn best_tier(&self) -> Tier {
        if self.avx2 && self.avx {
            Tier::Avx2
        } else if self.avx {
            Tier::Avx
        } else {
            Tier::Scalar
        }
    }

    /// Whether kernels of `tier` may run on this processor.
    #[inline]
    pub fn supports(&self, tier: Tier) -> bool {
        tier <= self.best_tier()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };
        let rows = [
            ("HTT", self.htt),
            ("MMX", self.mmx),
            ("SSE", self.sse),
            ("SSE2", self.sse2),
            ("SSE3", self.sse3),
            ("SSE4.1", self.sse4_1),
            ("SSE4.2", self.sse4_2),
            ("AVX", self.avx),
            ("AVX2", self.avx2),
            ("FMA", self.fma),
        ];
        for (name, flag) in rows {
            writeln!(f, "{name}\t{}", yes_no(flag))?;
        }
        Ok(())
    }
}
