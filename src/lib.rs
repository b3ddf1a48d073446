//! # rpool - A Fixed-Arena Memory Pool
//!
//! This crate provides a **best-fit pool allocator** that hands out and takes
//! back chunks of a single, fixed-size byte arena. Nothing is ever requested
//! from the operating system after the arena has been created.
//!
//! ## Overview
//!
//! The arena is partitioned into blocks. Each block is a header followed by
//! its payload, and the headers form an address-ordered list that covers the
//! arena with no gaps:
//!
//! ```text
//!   Pool<2048> after allocate(128), allocate(256), allocate(64):
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                              ARENA                                   │
//!   │                                                                      │
//!   │  ┌───┬───────┬───┬──────────────┬───┬────┬───┬──────────────────┐    │
//!   │  │ H │ A 128 │ H │    B 256     │ H │C 64│ H │    free tail     │    │
//!   │  └───┴───────┴───┴──────────────┴───┴────┴───┴──────────────────┘    │
//!   │  ▲                                                              ▲    │
//!   │  │                                                              │    │
//!   │ offset 0                                                   offset    │
//!   │                                                             2048     │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rpool
//!   ├── align        - Word alignment macro and HEADER_SIZE
//!   ├── block        - Block header, ids and snapshots
//!   ├── directory    - Address-ordered block list: best fit, split, coalesce
//!   ├── diagnostics  - Layout dump and leak report
//!   ├── error        - AllocError
//!   └── pool         - Pool implementation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rpool::DefaultPool;
//!
//! let mut pool = DefaultPool::new();
//!
//! let address = pool.allocate(64).unwrap();
//! pool.payload_mut(address).unwrap()[0] = 42;
//! assert_eq!(pool.payload(address).unwrap()[0], 42);
//!
//! pool.release(address).unwrap();
//! assert!(pool.check_leaks().is_clean());
//! ```
//!
//! ## How It Works
//!
//! **Allocation** scans every block and picks the smallest free one that is
//! large enough. If the leftover space can hold another header plus at least
//! one byte, the block is split and the leftover becomes a new free block:
//!
//! ```text
//!   ┌───┬──────────────────────────┐        ┌───┬────────┬───┬────────────┐
//!   │ H │        free 400          │  ───▶  │ H │used 100│ H │  free 268  │
//!   └───┴──────────────────────────┘        └───┴────────┴───┴────────────┘
//! ```
//!
//! **Release** marks the block free and then walks the whole list once,
//! folding every free block into a free predecessor:
//!
//! ```text
//!   ┌───┬──────┬───┬──────┬───┬──────┐        ┌───┬──────────────────────┐
//!   │ H │ free │ H │ free │ H │ free │  ───▶  │ H │        free          │
//!   └───┴──────┴───┴──────┴───┴──────┘        └───┴──────────────────────┘
//! ```
//!
//! Addresses are arena offsets rather than raw pointers, and the headers live
//! in a side table keyed by offset, so no `unsafe` code is involved.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: wrap the pool in a lock to share it
//! - **Fixed capacity**: the arena never grows
//! - **Word alignment only**: payloads are not aligned beyond the header size
//! - **Linear search**: every allocation and release walks the whole list

#[macro_use]
pub mod align;
mod block;
mod diagnostics;
mod directory;
mod error;
mod pool;

pub use align::HEADER_SIZE;
pub use block::{BlockId, BlockInfo};
pub use diagnostics::{LayoutDump, LeakReport};
pub use error::{AllocError, Result};
pub use pool::{Address, DEFAULT_POOL_SIZE, DefaultPool, Pool};
