use std::fmt;

use tracing::{debug, warn};

use crate::{
  HEADER_SIZE,
  block::BlockInfo,
  diagnostics::{LayoutDump, LeakReport},
  directory::Directory,
  error::{AllocError, Result},
};

/// Capacity of [`DefaultPool`], in bytes.
pub const DEFAULT_POOL_SIZE: usize = 2048;

pub type DefaultPool = Pool<DEFAULT_POOL_SIZE>;

/// Payload address handed out by [`Pool::allocate`]: the byte offset of the
/// payload from the start of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(usize);

impl Address {
  pub const fn from_offset(offset: usize) -> Self {
    Self(offset)
  }

  pub const fn offset(self) -> usize {
    self.0
  }
}

impl fmt::Display for Address {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{:#06x}", self.0)
  }
}

/// Best-fit allocator over a fixed arena of `SIZE` bytes.
///
/// The arena is never grown or moved. Every operation takes `&mut self`, so
/// sharing a pool across threads means wrapping it in a lock.
pub struct Pool<const SIZE: usize = DEFAULT_POOL_SIZE> {
  arena: Box<[u8]>,
  directory: Directory,
}

impl<const SIZE: usize> Default for Pool<SIZE> {
  fn default() -> Self {
    Self::new()
  }
}

impl<const SIZE: usize> Pool<SIZE> {
  pub fn new() -> Self {
    const { assert!(SIZE > HEADER_SIZE, "pool must be larger than one block header") };

    Self {
      arena: vec![0; SIZE].into_boxed_slice(),
      directory: Directory::new(SIZE),
    }
  }

  /// Throws away every block and starts over with a single free block
  /// covering the arena. Outstanding addresses become meaningless.
  pub fn initialize(&mut self) {
    self.directory.reset();
  }

  pub fn capacity(&self) -> usize {
    self.directory.capacity()
  }

  /// Read-only best-fit lookup, see [`Pool::allocate`].
  pub fn find_best_fit(
    &self,
    size: usize,
  ) -> Option<BlockInfo> {
    self.directory.best_fit(size)
  }

  /// Hands out `size` bytes from the tightest free block that can hold them.
  ///
  /// ```text
  ///   before:  ┌────┬──────────────────────────────┐
  ///            │ H  │           free               │
  ///            └────┴──────────────────────────────┘
  ///   after:   ┌────┬──────────┬────┬──────────────┐
  ///            │ H  │   used   │ H  │    free      │
  ///            └────┴──────────┴────┴──────────────┘
  ///                 ▲
  ///                 └── returned address
  /// ```
  ///
  /// The block is split only when the slack can hold another header plus at
  /// least one byte; otherwise the whole block is handed out.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Address> {
    let Some(fit) = self.directory.best_fit(size) else {
      let largest_free = self.largest_free();
      warn!(requested = size, largest_free, "out of memory");

      return Err(AllocError::OutOfMemory {
        requested: size,
        largest_free,
      });
    };

    if fit.size > size + HEADER_SIZE {
      self.directory.split(fit.offset, size);
    } else if let Some(block) = self.directory.get_mut(fit.offset) {
      block.is_free = false;
    }

    let address = Address(fit.offset + HEADER_SIZE);
    debug!(id = %fit.id, requested = size, %address, "allocated");

    Ok(address)
  }

  /// Returns the block behind `address` to the pool and merges free
  /// neighbours across the whole directory.
  ///
  /// `None` is accepted and ignored. Addresses that do not point just past a
  /// block header inside the arena are rejected with
  /// [`AllocError::InvalidFree`] and leave the pool untouched.
  pub fn release(
    &mut self,
    address: impl Into<Option<Address>>,
  ) -> Result<()> {
    let Some(address) = address.into() else {
      return Ok(());
    };

    let Some(offset) = self.header_offset(address) else {
      warn!(%address, "invalid free detected");
      return Err(AllocError::InvalidFree { address });
    };

    let Some(block) = self.directory.get_mut(offset) else {
      warn!(%address, "invalid free detected: not a block start");
      return Err(AllocError::InvalidFree { address });
    };

    if block.is_free {
      warn!(id = %block.id, %address, "double free");
    }

    block.is_free = true;
    debug!(id = %block.id, size = block.size, %address, "released");

    self.directory.coalesce_all();

    Ok(())
  }

  /// Payload bytes of the used block behind `address`.
  pub fn payload(
    &self,
    address: Address,
  ) -> Option<&[u8]> {
    let (start, size) = self.used_span(address)?;
    self.arena.get(start..start + size)
  }

  pub fn payload_mut(
    &mut self,
    address: Address,
  ) -> Option<&mut [u8]> {
    let (start, size) = self.used_span(address)?;
    self.arena.get_mut(start..start + size)
  }

  /// Every block in address order.
  pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
    self.directory.iter()
  }

  pub fn block_count(&self) -> usize {
    self.directory.len()
  }

  /// Payload bytes currently available across all free blocks.
  pub fn free_bytes(&self) -> usize {
    self.blocks().filter(|b| b.free).map(|b| b.size).sum()
  }

  pub fn used_bytes(&self) -> usize {
    self.blocks().filter(|b| !b.free).map(|b| b.size).sum()
  }

  /// Size of the biggest request that can currently succeed.
  pub fn largest_free(&self) -> usize {
    self.blocks().filter(|b| b.free).map(|b| b.size).max().unwrap_or(0)
  }

  pub fn layout(&self) -> LayoutDump {
    LayoutDump::new(self.blocks())
  }

  pub fn check_leaks(&self) -> LeakReport {
    LeakReport::new(self.blocks())
  }

  /// Header offset behind `address`, if it lies inside the arena.
  fn header_offset(
    &self,
    address: Address,
  ) -> Option<usize> {
    address.0.checked_sub(HEADER_SIZE).filter(|&offset| offset < SIZE)
  }

  fn used_span(
    &self,
    address: Address,
  ) -> Option<(usize, usize)> {
    let offset = self.header_offset(address)?;
    let block = self.directory.get(offset)?;

    (!block.is_free).then_some((address.0, block.size))
  }
}
