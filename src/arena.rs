//! Bump allocator for protobuf message storage.
//!
//! Protobuf decoding creates many small, short-lived objects (submessages,
//! repeated-field backing arrays, copied strings) whose collective lifetime
//! equals the message's. An [`Arena`] batches these into a handful of large
//! blocks so allocation is O(1) and teardown is a single pass over the block
//! list, rather than per-object `free`.
//!
//! An arena is not [`Sync`]: it serves exactly one logical decode/encode
//! operation at a time.

use allocator_api2::alloc::Allocator;
use core::alloc::Layout;
use core::ptr::NonNull;

/// Minimum size of a block the arena allocates for itself once a
/// caller-supplied buffer (or the previous block) runs out.
const MIN_BLOCK_SIZE: usize = 4096;

/// All arena allocations are rounded up to this alignment. No field type
/// needs more: the widest scalar is `u64`/`f64` and pointers are 8 bytes on
/// every platform this crate targets.
const BLOCK_ALIGN: usize = 8;

struct Block {
    ptr: NonNull<u8>,
    capacity: usize,
    used: usize,
    /// Whether this block was allocated by `fallback` and therefore must be
    /// deallocated through it. A caller-supplied buffer (via
    /// [`Arena::from_buffer`]) is not owned and is left untouched on drop.
    owned: bool,
    layout: Layout,
}

/// Error returned when the arena cannot satisfy an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// The arena's current block (or caller-supplied buffer) is exhausted
    /// and either no fallback allocator was supplied, or the fallback itself
    /// failed.
    #[error("arena out of memory")]
    OutOfMemory,
}

/// A bump allocator over one or more linked buffers.
///
/// Allocation order has no bearing on deallocation: every block the arena
/// owns is released together when the `Arena` is dropped. `Arena` never
/// moves memory it has already handed out — blocks only ever append, they
/// never grow in place — so pointers into arena memory stay valid for the
/// arena's whole lifetime.
pub struct Arena<'a> {
    blocks: std::vec::Vec<Block>,
    fallback: Option<&'a dyn Allocator>,
}

impl<'a> Arena<'a> {
    /// Creates an arena backed entirely by `allocator`. The first block is
    /// allocated lazily, on first use.
    pub fn new(allocator: &'a dyn Allocator) -> Self {
        Arena {
            blocks: std::vec::Vec::new(),
            fallback: Some(allocator),
        }
    }

    /// Creates an arena whose first block is the caller-supplied `buf`.
    ///
    /// If `buf` is exhausted and `fallback` is `Some`, a new block is
    /// allocated from it. If `fallback` is `None`, further allocation fails
    /// cleanly with [`ArenaError::OutOfMemory`] instead of growing — there is
    /// nowhere further to grow, so we fail instead of reallocating `buf` out
    /// from under already-issued pointers (arenas never migrate pointers).
    pub fn from_buffer(buf: &'a mut [u8], fallback: Option<&'a dyn Allocator>) -> Self {
        let layout = Layout::for_value::<[u8]>(buf);
        // Safety: `buf` is a valid, non-null slice reference.
        let ptr = unsafe { NonNull::new_unchecked(buf.as_mut_ptr()) };
        Arena {
            blocks: std::vec![Block {
                ptr,
                capacity: buf.len(),
                used: 0,
                owned: false,
                layout,
            }],
            fallback,
        }
    }

    /// Allocates `size` bytes aligned to `align` (must be `<= 8`).
    pub fn alloc(&mut self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        debug_assert!(
            align <= BLOCK_ALIGN,
            "arena allocation alignment {align} exceeds {BLOCK_ALIGN}"
        );
        if let Some(block) = self.blocks.last_mut() {
            let aligned = align_up(block.used, align.max(1));
            if let Some(end) = aligned.checked_add(size) {
                if end <= block.capacity {
                    block.used = end;
                    // Safety: `aligned + size <= capacity`, within the block.
                    return Ok(unsafe { NonNull::new_unchecked(block.ptr.as_ptr().add(aligned)) });
                }
            }
        }
        self.grow_and_alloc(size)
    }

    fn grow_and_alloc(&mut self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        let allocator = self.fallback.ok_or(ArenaError::OutOfMemory)?;
        let prev_capacity = self.blocks.last().map_or(0, |b| b.capacity);
        let block_size = size.max(MIN_BLOCK_SIZE).max(prev_capacity.saturating_mul(2));
        let layout = Layout::from_size_align(block_size, BLOCK_ALIGN)
            .map_err(|_| ArenaError::OutOfMemory)?;
        let mem = allocator
            .allocate(layout)
            .map_err(|_| ArenaError::OutOfMemory)?;
        let ptr = mem.cast::<u8>();
        self.blocks.push(Block {
            ptr,
            capacity: layout.size(),
            used: size,
            owned: true,
            layout,
        });
        Ok(ptr)
    }
}

impl Drop for Arena<'_> {
    fn drop(&mut self) {
        let fallback = self.fallback;
        for block in self.blocks.drain(..) {
            if block.owned {
                let allocator =
                    fallback.expect("an owned block implies its block was grown via `fallback`");
                // Safety: `block.ptr`/`block.layout` are exactly what was
                // passed to `allocator.allocate` in `grow_and_alloc`.
                unsafe { allocator.deallocate(block.ptr, block.layout) };
            }
        }
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocator_api2::alloc::Global;

    #[test]
    fn bump_allocates_within_one_block() {
        let mut arena = Arena::new(&Global);
        let a = arena.alloc(16, 8).unwrap();
        let b = arena.alloc(16, 8).unwrap();
        assert_eq!(b.as_ptr() as usize - a.as_ptr() as usize, 16);
    }

    #[test]
    fn grows_when_block_exhausted() {
        let mut arena = Arena::new(&Global);
        arena.alloc(MIN_BLOCK_SIZE, 8).unwrap();
        // The next allocation cannot fit in the remainder of the first block.
        let ptr = arena.alloc(64, 8);
        assert!(ptr.is_ok());
    }

    #[test]
    fn from_buffer_without_fallback_fails_cleanly() {
        let mut buf = [0u8; 32];
        let mut arena = Arena::from_buffer(&mut buf, None);
        assert!(arena.alloc(16, 8).is_ok());
        assert!(arena.alloc(64, 8).is_err());
    }

    #[test]
    fn from_buffer_with_fallback_grows() {
        let mut buf = [0u8; 16];
        let mut arena = Arena::from_buffer(&mut buf, Some(&Global));
        assert!(arena.alloc(16, 8).is_ok());
        assert!(arena.alloc(64, 8).is_ok());
    }

    #[test]
    fn alignment_is_respected() {
        let mut arena = Arena::new(&Global);
        let _ = arena.alloc(1, 1).unwrap();
        let p = arena.alloc(8, 8).unwrap();
        assert_eq!(p.as_ptr() as usize % 8, 0);
    }
}
