//! Error types for pool operations.

use thiserror::Error;

use crate::pool::Address;

/// Failures reported by [`Pool`](crate::Pool) entry points.
///
/// Both kinds are recoverable and leave the pool untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  /// No free block can hold the request.
  #[error("out of memory: requested {requested} bytes, largest free block is {largest_free} bytes")]
  OutOfMemory {
    requested: usize,
    largest_free: usize,
  },

  /// The address does not resolve to a block header inside the arena.
  #[error("invalid free of address {address}")]
  InvalidFree { address: Address },
}

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, AllocError>;
