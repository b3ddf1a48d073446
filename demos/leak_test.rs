use anyhow::Result;
use rpool::DefaultPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs the memory leak walkthrough against a fresh 2 KiB pool.
///
/// Set `RUST_LOG=rpool=debug` to watch every split and merge.
fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let mut pool = DefaultPool::new();

  println!("Memory Leak Test");
  println!("=================");
  println!("Initializing memory pool...");
  pool.initialize();
  println!("\n{}", pool.layout());

  println!("Running memory leak test...");

  // --------------------------------------------------------------------
  // 1) Carve three blocks out of the free arena.
  // --------------------------------------------------------------------
  let a = pool.allocate(128)?;
  let b = pool.allocate(256)?;
  let c = pool.allocate(64)?;
  info!(%a, %b, %c, "allocated three blocks");

  println!("\n{}", pool.layout());

  // --------------------------------------------------------------------
  // 2) Free the first two. They sit next to each other, so they merge.
  // --------------------------------------------------------------------
  pool.release(a)?;
  pool.release(b)?;

  println!("\n{}", pool.layout());

  // `c` is still in use here, so it shows up as a leak.
  println!("{}", pool.check_leaks());

  // --------------------------------------------------------------------
  // 3) Free the last block. Everything folds back into one free block.
  // --------------------------------------------------------------------
  pool.release(c)?;

  println!("\n{}", pool.layout());
  println!("{}", pool.check_leaks());

  Ok(())
}
