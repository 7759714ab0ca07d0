//! # simdarray
//!
//! Cache-aligned numeric vectors whose arithmetic is dispatched at runtime to
//! scalar, AVX or AVX2 kernels.
//!
//! The processor is probed once per process ([`Capabilities::get`]). Each
//! [`Array`] binds a kernel table for the best supported tier when it is
//! constructed, or for a lower tier forced through a [`Config`]. The crate
//! builds for a baseline target; vector kernels are compiled with
//! `#[target_feature]` and only run after detection.
//!
//! ```rust
//! use simdarray::{Acceleration, Array, Config, Tier};
//!
//! let a: Array = (0..512).map(|i| i as f32).collect();
//! let b: Array = (0..512).map(|i| 2.0 * i as f32).collect();
//! let c = a.add(&b)?;
//! assert_eq!(c[100], 300.0);
//!
//! // Force the scalar kernels, e.g. to cross-check a vector tier.
//! let serial = Config::new().acceleration(Acceleration::Serial);
//! let s = Array::from_slice_with_config(a.as_slice(), &serial)?;
//! assert_eq!(s.tier(), Tier::Scalar);
//! assert_eq!(s.add(&Array::from_slice_with_config(b.as_slice(), &serial)?)?, c);
//! # Ok::<(), simdarray::Error>(())
//! ```
//!
//! `f32` arrays use vector kernels; `f64` arrays are supported with scalar
//! kernels on every tier.

pub mod array;
pub mod buffer;
pub mod caps;
pub mod config;
pub mod error;
pub mod simd;

pub use array::{Array, DoublePrecisionArray, SinglePrecisionArray, DEFAULT_CAPACITY};
pub use buffer::AlignedBuf;
pub use caps::{Capabilities, Tier};
pub use config::{Acceleration, Config};
pub use error::{Error, Result};
pub use simd::{Element, Kernels};
