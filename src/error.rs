//! Error types for simdarray operations.
//!
//! Only structural problems are reported here: operands of different length,
//! allocation failures surfaced by the `try_*` constructors, and configuration
//! requests the host cannot honour. Numeric domain issues (square root of a
//! negative, division by zero) follow IEEE-754 and travel through the data as
//! NaN or infinity.

use thiserror::Error;

use crate::caps::Tier;

/// Errors that can occur during simdarray operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Two operands of an elementwise or reduction operation differ in length.
    #[error("Length mismatch in {op}: expected {expected} elements, got {actual}")]
    LengthMismatch {
        /// Name of the operation that rejected its operands.
        op: &'static str,
        /// Element count of the receiving array.
        expected: usize,
        /// Element count of the offending operand.
        actual: usize,
    },

    /// Memory allocation failed.
    #[error(
        "Memory allocation failed (requested {requested_size} bytes with {requested_alignment} byte alignment)"
    )]
    AllocationError {
        /// The size that was requested to be allocated.
        requested_size: usize,
        /// The alignment that was requested.
        requested_alignment: usize,
    },

    /// Invalid layout parameters were provided.
    #[error("Invalid memory layout: {message} (size: {size}, alignment: {alignment})")]
    LayoutError {
        /// The size parameter that caused the error.
        size: usize,
        /// The alignment parameter that caused the error.
        alignment: usize,
        /// Human-readable error message.
        message: String,
    },

    /// A configuration forced a tier the processor does not support.
    #[error("Capability tier {requested} is not supported by this processor (best available: {available})")]
    UnsupportedTier {
        /// The tier the configuration asked for.
        requested: Tier,
        /// The best tier the capability record allows.
        available: Tier,
    },

    /// An acceleration selector string could not be parsed.
    #[error("Invalid acceleration type: {0:?} (expected serial, avx, avx2 or best)")]
    InvalidAcceleration(String),
}

/// Result type alias for simdarray operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns `Ok(())` when `actual == expected`, a [`Error::LengthMismatch`] otherwise.
#[inline]
pub(crate) fn check_len(op: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            op,
            expected,
            actual,
        })
    }
}
