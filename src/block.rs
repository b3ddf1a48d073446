use std::fmt;

/// Debug identifier handed to every block when it is created.
///
/// Ids grow monotonically for the lifetime of a pool and are never reused,
/// not even after the block they named has been absorbed by a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
  pub fn get(self) -> u32 {
    self.0
  }
}

impl fmt::Display for BlockId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

/// Header of a carved segment of the arena.
///
/// `size` counts payload bytes only; the header itself occupies
/// [`HEADER_SIZE`](crate::HEADER_SIZE) bytes in front of the payload.
/// `next` is the arena offset of the following header, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
  pub size: usize,
  pub is_free: bool,
  pub id: BlockId,
  pub next: Option<usize>,
}

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    id: BlockId,
    next: Option<usize>,
  ) -> Self {
    Self {
      size,
      is_free,
      id,
      next,
    }
  }
}

/// Read-only snapshot of one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  pub id: BlockId,
  /// Arena offset of the header.
  pub offset: usize,
  pub size: usize,
  pub free: bool,
}

impl BlockInfo {
  pub(crate) fn from_block(
    offset: usize,
    block: &Block,
  ) -> Self {
    Self {
      id: block.id,
      offset,
      size: block.size,
      free: block.is_free,
    }
  }
}
