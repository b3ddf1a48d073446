//! Read-only views over a pool's block directory.

use std::fmt;

use tracing::warn;

use crate::block::BlockInfo;

/// Snapshot of the directory, rendered as one row per block:
///
/// ```text
/// --- Memory Layout ---
/// [ID  1]  128 bytes | Used
/// [ID  2] 1856 bytes | Free
/// ----------------------
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDump {
  blocks: Vec<BlockInfo>,
}

impl LayoutDump {
  pub(crate) fn new(
    blocks: impl Iterator<Item = BlockInfo>,
  ) -> Self {
    Self {
      blocks: blocks.collect(),
    }
  }

  pub fn blocks(&self) -> &[BlockInfo] {
    &self.blocks
  }
}

impl fmt::Display for LayoutDump {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "--- Memory Layout ---")?;

    for block in &self.blocks {
      let state = if block.free { "Free" } else { "Used" };
      writeln!(f, "[ID {:>2}] {:>4} bytes | {}", block.id, block.size, state)?;
    }

    write!(f, "----------------------")
  }
}

/// Every block still in use at the time of the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakReport {
  leaks: Vec<BlockInfo>,
}

impl LeakReport {
  pub(crate) fn new(
    blocks: impl Iterator<Item = BlockInfo>,
  ) -> Self {
    let leaks: Vec<_> = blocks.filter(|b| !b.free).collect();

    for leak in &leaks {
      warn!(id = %leak.id, size = leak.size, offset = leak.offset, "leak detected");
    }

    Self { leaks }
  }

  pub fn is_clean(&self) -> bool {
    self.leaks.is_empty()
  }

  pub fn leaks(&self) -> &[BlockInfo] {
    &self.leaks
  }

  pub fn leaked_bytes(&self) -> usize {
    self.leaks.iter().map(|b| b.size).sum()
  }
}

impl fmt::Display for LeakReport {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    if self.is_clean() {
      return write!(f, "No memory leaks.");
    }

    for (i, leak) in self.leaks.iter().enumerate() {
      if i > 0 {
        writeln!(f)?;
      }
      write!(f, "LEAK DETECTED: Block ID {} ({} bytes) not freed.", leak.id, leak.size)?;
    }

    Ok(())
  }
}
