use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::{
  HEADER_SIZE,
  block::{Block, BlockId, BlockInfo},
};

/// Address-ordered list of block headers covering an arena of `capacity`
/// bytes.
///
/// Headers are kept in a table keyed by their arena offset instead of being
/// written into the arena itself; `Block::next` links them in address order
/// exactly as an embedded list would.
///
/// ```text
///   offset 0                                                       capacity
///   ┌────────┬──────────┬────────┬────────────────┬────────┬──────────────┐
///   │ header │ payload  │ header │    payload     │ header │   payload    │
///   └────────┴──────────┴────────┴────────────────┴────────┴──────────────┘
///   head ──────next────▶ ───────────next─────────▶ ──next──▶ None
/// ```
#[derive(Debug, Clone)]
pub struct Directory {
  blocks: BTreeMap<usize, Block>,
  head: Option<usize>,
  capacity: usize,
  next_id: u32,
}

impl Directory {
  pub fn new(
    capacity: usize,
  ) -> Self {
    let mut directory = Self {
      blocks: BTreeMap::new(),
      head: None,
      capacity,
      next_id: 1,
    };

    directory.reset();
    directory
  }

  /// Drops every header and starts over with one free block spanning the
  /// whole arena. The id counter keeps running.
  pub fn reset(&mut self) {
    let id = self.fresh_id();

    self.blocks.clear();
    self.blocks.insert(0, Block::new(self.capacity - HEADER_SIZE, true, id, None));
    self.head = Some(0);

    debug!(capacity = self.capacity, %id, "directory reset");
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn len(&self) -> usize {
    self.blocks.len()
  }

  pub fn get(
    &self,
    offset: usize,
  ) -> Option<&Block> {
    self.blocks.get(&offset)
  }

  pub fn get_mut(
    &mut self,
    offset: usize,
  ) -> Option<&mut Block> {
    self.blocks.get_mut(&offset)
  }

  /// Walks the `next` links from the head.
  pub fn iter(&self) -> Iter<'_> {
    Iter {
      directory: self,
      cursor: self.head,
    }
  }

  /// Tightest free block holding at least `size` bytes. Ties go to the
  /// lowest address.
  pub fn best_fit(
    &self,
    size: usize,
  ) -> Option<BlockInfo> {
    let mut best: Option<BlockInfo> = None;

    for info in self.iter() {
      if !info.free || info.size < size {
        continue;
      }

      if best.is_none_or(|b| info.size < b.size) {
        best = Some(info);
      }
    }

    trace!(size, best = ?best.map(|b| b.offset), "best fit search");
    best
  }

  /// Shrinks the free block at `offset` to `size` bytes, marks it used and
  /// links a new free block holding the remainder right behind it.
  ///
  /// The block must be free and larger than `size + HEADER_SIZE`.
  pub fn split(
    &mut self,
    offset: usize,
    size: usize,
  ) {
    let new_offset = offset + HEADER_SIZE + size;
    let id = self.fresh_id();

    let Some(block) = self.blocks.get_mut(&offset) else {
      return;
    };

    debug_assert!(block.is_free, "split of a used block");
    debug_assert!(block.size > size + HEADER_SIZE, "split without room for a header");

    let remainder = Block::new(block.size - size - HEADER_SIZE, true, id, block.next);
    let remainder_size = remainder.size;

    block.size = size;
    block.is_free = false;
    block.next = Some(new_offset);
    let split_id = block.id;

    self.blocks.insert(new_offset, remainder);

    debug!(%split_id, size, new_id = %id, remainder = remainder_size, "split block");
  }

  /// Merges every run of adjacent free blocks into its first block, in a
  /// single pass from the head. Returns the number of headers absorbed.
  pub fn coalesce_all(&mut self) -> usize {
    let mut absorbed = 0;
    let mut cursor = self.head;

    while let Some(offset) = cursor {
      let Some(block) = self.blocks.get(&offset) else {
        break;
      };

      let successor = block.next.filter(|next| {
        block.is_free && self.blocks.get(next).is_some_and(|b| b.is_free)
      });

      let Some(next_offset) = successor else {
        cursor = block.next;
        continue;
      };

      let Some(next) = self.blocks.remove(&next_offset) else {
        break;
      };

      if let Some(block) = self.blocks.get_mut(&offset) {
        block.size += HEADER_SIZE + next.size;
        block.next = next.next;

        debug!(id = %block.id, absorbed = %next.id, size = block.size, "merged free blocks");
      }

      absorbed += 1;
    }

    absorbed
  }

  fn fresh_id(&mut self) -> BlockId {
    let id = BlockId(self.next_id);
    self.next_id += 1;
    id
  }
}

/// Address-order iterator over a [`Directory`].
pub struct Iter<'a> {
  directory: &'a Directory,
  cursor: Option<usize>,
}

impl Iterator for Iter<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<Self::Item> {
    let offset = self.cursor?;
    let block = self.directory.blocks.get(&offset)?;
    self.cursor = block.next;

    Some(BlockInfo::from_block(offset, block))
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  /// Checks coverage, adjacency and ordering of the whole directory.
  pub(crate) fn assert_consistent(directory: &Directory) {
    let mut expected_offset = 0;
    let mut covered = 0;

    for info in directory.iter() {
      assert_eq!(info.offset, expected_offset, "gap or overlap at block {}", info.id);
      expected_offset = info.offset + HEADER_SIZE + info.size;
      covered += HEADER_SIZE + info.size;
    }

    assert_eq!(expected_offset, directory.capacity());
    assert_eq!(covered, directory.capacity());
    assert_eq!(directory.iter().count(), directory.len());
  }

  pub(crate) fn assert_no_adjacent_free(directory: &Directory) {
    let blocks: Vec<_> = directory.iter().collect();

    for pair in blocks.windows(2) {
      assert!(
        !(pair[0].free && pair[1].free),
        "blocks {} and {} are both free",
        pair[0].id,
        pair[1].id
      );
    }
  }

  /// Carves the directory into used blocks of the given sizes, then frees
  /// the ones whose index is listed in `free`, without coalescing.
  fn carve(
    capacity: usize,
    sizes: &[usize],
    free: &[usize],
  ) -> Directory {
    let mut directory = Directory::new(capacity);
    let mut offsets = Vec::new();

    for &size in sizes {
      let tail = directory.iter().last().unwrap();
      directory.split(tail.offset, size);
      offsets.push(tail.offset);
    }

    for &index in free {
      directory.get_mut(offsets[index]).unwrap().is_free = true;
    }

    directory
  }

  #[test]
  fn new_directory_is_one_free_block() {
    let directory = Directory::new(2048);
    let blocks: Vec<_> = directory.iter().collect();

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].offset, 0);
    assert_eq!(blocks[0].size, 2048 - HEADER_SIZE);
    assert!(blocks[0].free);
    assert_eq!(blocks[0].id, BlockId(1));
    assert_consistent(&directory);
  }

  #[test]
  fn reset_keeps_id_counter_running() {
    let mut directory = Directory::new(1024);
    directory.split(0, 100);
    directory.reset();

    let blocks: Vec<_> = directory.iter().collect();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].id, BlockId(3));
    assert_consistent(&directory);
  }

  #[test]
  fn split_carves_used_front_and_free_tail() {
    let mut directory = Directory::new(1024);
    let original = directory.get(0).unwrap().size;

    directory.split(0, 100);

    let blocks: Vec<_> = directory.iter().collect();
    assert_eq!(blocks.len(), 2);
    assert!(!blocks[0].free);
    assert!(blocks[1].free);
    assert_eq!(blocks[0].size, 100);
    assert_eq!(blocks[1].offset, HEADER_SIZE + 100);
    assert_eq!(blocks[0].size + blocks[1].size + HEADER_SIZE, original);
    assert_eq!(blocks[1].id, BlockId(2));
    assert_consistent(&directory);
  }

  #[test]
  fn split_links_remainder_before_old_successor() {
    let mut directory = carve(1024, &[200, 64], &[0]);
    let first = directory.get(0).unwrap().clone();
    let old_next = first.next;

    directory.split(0, 40);

    let remainder_offset = HEADER_SIZE + 40;
    assert_eq!(directory.get(0).unwrap().next, Some(remainder_offset));
    assert_eq!(directory.get(remainder_offset).unwrap().next, old_next);
    assert_eq!(directory.get(remainder_offset).unwrap().size, 200 - 40 - HEADER_SIZE);
    assert_consistent(&directory);
  }

  #[test]
  fn best_fit_prefers_tightest_block() {
    let directory = carve(2048, &[300, 16, 120, 16, 200, 16], &[0, 2, 4]);

    let fit = directory.best_fit(150).unwrap();
    assert_eq!(fit.size, 200);

    let fit = directory.best_fit(100).unwrap();
    assert_eq!(fit.size, 120);

    let fit = directory.best_fit(250).unwrap();
    assert_eq!(fit.size, 300);
  }

  #[test]
  fn best_fit_breaks_ties_by_address() {
    let directory = carve(2048, &[64, 16, 64, 16], &[0, 2]);

    let fit = directory.best_fit(64).unwrap();
    assert_eq!(fit.offset, 0);
  }

  #[test]
  fn best_fit_skips_used_and_small_blocks() {
    let directory = carve(512, &[100, 100, 100], &[1]);
    let tail = directory.iter().last().unwrap();
    assert!(tail.free && tail.size < 100);

    assert_eq!(directory.best_fit(100).unwrap().offset, HEADER_SIZE + 100);
    assert!(directory.best_fit(101).is_none());
  }

  #[test]
  fn coalesce_merges_runs_of_free_blocks() {
    let mut directory = carve(2048, &[100, 100, 100, 100], &[0, 1, 2]);
    let before = directory.len();

    let absorbed = directory.coalesce_all();

    assert_eq!(absorbed, 2);
    assert_eq!(directory.len(), before - 2);

    let first = directory.get(0).unwrap();
    assert!(first.is_free);
    assert_eq!(first.id, BlockId(1));
    assert_eq!(first.size, 300 + 2 * HEADER_SIZE);
    assert_consistent(&directory);
    assert_no_adjacent_free(&directory);
  }

  #[test]
  fn coalesce_reaches_every_pair_in_one_pass() {
    let mut directory = carve(2048, &[50, 50, 50, 50, 50], &[0, 1, 3, 4]);

    directory.coalesce_all();

    let blocks: Vec<_> = directory.iter().collect();
    assert_eq!(blocks.len(), 3);
    assert!(blocks[0].free);
    assert!(!blocks[1].free);
    assert!(blocks[2].free);
    assert_consistent(&directory);
    assert_no_adjacent_free(&directory);
  }

  #[test]
  fn coalesce_without_free_pairs_is_a_no_op() {
    let mut directory = carve(1024, &[10, 20, 30], &[1]);
    let before: Vec<_> = directory.iter().collect();

    assert_eq!(directory.coalesce_all(), 0);
    assert_eq!(directory.iter().collect::<Vec<_>>(), before);
  }
}
