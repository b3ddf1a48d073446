/// Rounds `value` up to the next multiple of the machine word.
///
/// # Examples
///
/// ```rust
/// use rpool::align;
///
/// match std::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + ::core::mem::size_of::<usize>() - 1) & !(::core::mem::size_of::<usize>() - 1)
  };
}

/// Bytes reserved in front of every payload for its block header.
pub const HEADER_SIZE: usize = align!(::core::mem::size_of::<crate::block::Block>());
