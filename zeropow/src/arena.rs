//! Aligned memory arena for one solve at a time
//!
//! All transient bytes of a solve live in a handful of fixed regions sized
//! up front from the parameters: the initial digests, two ping-pong stage
//! value buffers, and the bucket index tables. Each region is a single
//! 64-byte aligned allocation, so every contemplated vector width can load
//! from it without crossing alignment faults and each stage streams over
//! contiguous bytes.
//!
//! The arena is allocated by `start()`, retained across solves, and released
//! by `stop()`. Nothing in it grows during a solve; the per-stage collision
//! vectors are reserved to their row bound when the arena is built.

use std::alloc::{self, Layout};
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use crate::collision::CollisionPair;
use crate::err::Error;
use crate::params::{Params, HASH_BYTES};

/// Alignment of every arena region, in bytes
pub(crate) const REGION_ALIGN: usize = 64;

/// One 64-byte aligned, zero-initialized heap region of `Copy` rows
pub(crate) struct Region<T: Copy> {
    ptr: NonNull<T>,
    len: usize,
}

impl<T: Copy> Region<T> {
    /// Allocate a zeroed region of `len` rows.
    ///
    /// Allocation failure is reported rather than aborting, so the caller
    /// can refuse the solve.
    pub(crate) fn zeroed(len: usize) -> Result<Self, Error> {
        debug_assert!(mem::align_of::<T>() <= REGION_ALIGN);
        if len == 0 {
            return Ok(Region {
                ptr: NonNull::dangling(),
                len: 0,
            });
        }
        let size = mem::size_of::<T>().checked_mul(len).ok_or(Error::Memory)?;
        let layout = Layout::from_size_align(size, REGION_ALIGN).map_err(|_| Error::Memory)?;
        // SAFETY: layout has non-zero size; the pointer is checked for null
        //         before use and freed with the same layout in Drop.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        match NonNull::new(ptr as *mut T) {
            Some(ptr) => Ok(Region { ptr, len }),
            None => Err(Error::Memory),
        }
    }
}

// SAFETY: a Region owns its allocation exclusively and holds plain Copy
//         rows, so it moves between threads like the boxed slice it is.
unsafe impl<T: Copy + Send> Send for Region<T> {}
unsafe impl<T: Copy + Sync> Sync for Region<T> {}

impl<T: Copy> Deref for Region<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: the region was allocated zeroed for exactly `len` rows and
        //         T is Copy, so all bit patterns written since are valid.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Copy> DerefMut for Region<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: as above, plus we hold the only reference.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Copy> Drop for Region<T> {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        let size = mem::size_of::<T>() * self.len;
        // SAFETY: this recomputes the exact layout used in zeroed().
        unsafe {
            let layout = Layout::from_size_align_unchecked(size, REGION_ALIGN);
            alloc::dealloc(self.ptr.as_ptr() as *mut u8, layout);
        }
    }
}

/// The preallocated working memory of a solver
pub(crate) struct Arena {
    /// Initial digests, one 32-byte row per seed index
    pub(crate) hashes: Region<[u8; HASH_BYTES]>,
    /// Ping-pong stage value buffers; input/output roles swap per stage
    pub(crate) stage_values: [Region<[u8; HASH_BYTES]>; 2],
    /// Row indices grouped by bucket key, rebuilt each stage
    pub(crate) bucket_rows: Region<u32>,
    /// Per-key run boundaries into `bucket_rows`, plus one sentinel slot
    pub(crate) bucket_bounds: Region<u32>,
    /// Accepted pair records per stage, kept for genealogy walks
    pub(crate) collisions: Vec<Vec<CollisionPair>>,
    /// Upper bound on rows appended per stage
    pub(crate) row_cap: usize,
}

impl Arena {
    /// Allocate all regions for `params`, zero-initialized.
    pub(crate) fn new(params: &Params) -> Result<Self, Error> {
        let rows = params.index_count();
        let key_count = 1usize << params.collision_bit_length();
        Ok(Arena {
            hashes: Region::zeroed(rows)?,
            stage_values: [Region::zeroed(rows)?, Region::zeroed(rows)?],
            bucket_rows: Region::zeroed(rows)?,
            bucket_bounds: Region::zeroed(key_count + 1)?,
            collisions: (0..params.stage_count())
                .map(|_| Vec::with_capacity(rows))
                .collect(),
            row_cap: rows,
        })
    }

    /// Drop pair records from a previous solve, keeping their capacity.
    pub(crate) fn reset(&mut self) {
        for stage in &mut self.collisions {
            stage.clear();
        }
    }
}
