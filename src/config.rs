//! Acceleration selection.
//!
//! A [`Config`] decides which kernel tier an array binds to. The default asks
//! for the best tier the processor supports; forcing a lower tier is how
//! benchmarks and tests compare tiers against each other on the same machine.

use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::caps::{Capabilities, Tier};
use crate::error::{Error, Result};

/// Requested acceleration level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Acceleration {
    /// Scalar kernels only.
    Serial,
    /// AVX kernels.
    Avx,
    /// AVX2 kernels, falling back to AVX for operations AVX2 does not specialize.
    Avx2,
    /// Whatever the processor supports best.
    #[default]
    Best,
}

impl Acceleration {
    /// The tier this selector names, or `None` for [`Acceleration::Best`].
    pub fn tier(self) -> Option<Tier> {
        match self {
            Acceleration::Serial => Some(Tier::Scalar),
            Acceleration::Avx => Some(Tier::Avx),
            Acceleration::Avx2 => Some(Tier::Avx2),
            Acceleration::Best => None,
        }
    }
}

impl FromStr for Acceleration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" | "scalar" => Ok(Acceleration::Serial),
            "avx" => Ok(Acceleration::Avx),
            "avx2" => Ok(Acceleration::Avx2),
            "best" | "optimum" => Ok(Acceleration::Best),
            _ => Err(Error::InvalidAcceleration(s.to_string())),
        }
    }
}

impl fmt::Display for Acceleration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Acceleration::Serial => "serial",
            Acceleration::Avx => "avx",
            Acceleration::Avx2 => "avx2",
            Acceleration::Best => "best",
        };
        f.write_str(name)
    }
}

/// Dispatch configuration for a new array.
///
/// ```rust
/// use simdarray::{Acceleration, Config};
///
/// let config = Config::new().acceleration(Acceleration::Serial).fma(false);
/// assert_eq!(config.acceleration, Acceleration::Serial);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    /// Requested tier.
    pub acceleration: Acceleration,
    /// Bind DotProduct to the fused multiply-add kernel when possible.
    pub fma: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acceleration(mut self, acceleration: Acceleration) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn fma(mut self, fma: bool) -> Self {
        self.fma = fma;
        self
    }

    /// Maps the requested acceleration onto a tier `caps` can run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedTier`] when an explicit tier above the
    /// processor's best tier is requested.
    pub fn resolve(&self, caps: &Capabilities) -> Result<Tier> {
        let available = caps.best_tier();
        match self.acceleration.tier() {
            None => Ok(available),
            Some(requested) if caps.supports(requested) => Ok(requested),
            Some(requested) => Err(Error::UnsupportedTier {
                requested,
                available,
            }),
        }
    }

    /// Whether DotProduct should bind to the FMA kernel at `tier`.
    ///
    /// An FMA request the processor or the tier cannot honour is dropped with a
    /// warning; it only affects speed and rounding of one reduction.
    pub fn use_fma(&self, caps: &Capabilities, tier: Tier) -> bool {
        if !self.fma {
            return false;
        }
        if !caps.has_fma() {
            warn!("fma requested but not supported by this processor, ignoring");
            return false;
        }
        if tier == Tier::Scalar {
            warn!("fma requested with scalar kernels, ignoring");
            return false;
        }
        true
    }
}
