use crate::error::MemError;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use std::sync::Mutex;

/// One growth generation of blocks. `free_table[i] == 0` means block `i` is
/// free; a non-zero value `k` at position `i` marks the start of a
/// `k`-block run and is repeated at every position of that run, so
/// `FreeMem` can recover the run length from any position it is not asked
/// to free mid-run (callers only ever free by the offset `Alloc` returned).
struct Region {
    blk_size: usize,
    num_blks: usize,
    free_table: Vec<u32>,
}

impl Region {
    fn new(blk_size: usize, num_blks: usize) -> Self {
        Region {
            blk_size,
            num_blks,
            free_table: vec![0; num_blks],
        }
    }

    fn find_first_fit(&self, n: usize) -> Option<usize> {
        if n == 0 || n > self.num_blks {
            return None;
        }
        let mut run = 0;
        for i in 0..self.num_blks {
            if self.free_table[i] == 0 {
                run += 1;
                if run == n {
                    return Some(i + 1 - n);
                }
            } else {
                run = 0;
            }
        }
        None
    }

    fn mark_used(&mut self, offset: usize, n: usize) {
        for slot in &mut self.free_table[offset..offset + n] {
            *slot = n as u32;
        }
    }

    fn mark_free(&mut self, offset: usize) -> usize {
        let n = self.free_table[offset] as usize;
        for slot in &mut self.free_table[offset..offset + n] {
            *slot = 0;
        }
        n
    }

    fn is_empty(&self) -> bool {
        self.free_table.iter().all(|&v| v == 0)
    }
}

struct GlobalState {
    blk_size_req: usize,
    num_blks_req: usize,
    page_aligned_req: bool,
    initialized: bool,
    ref_count: usize,
    regions: Vec<Option<Region>>,
    total_blks: usize,
}

impl GlobalState {
    fn new() -> Self {
        GlobalState {
            blk_size_req: 4096,
            num_blks_req: 256,
            page_aligned_req: false,
            initialized: false,
            ref_count: 0,
            regions: Vec::new(),
            total_blks: 0,
        }
    }
}

static STATE: Lazy<Mutex<GlobalState>> = Lazy::new(|| Mutex::new(GlobalState::new()));

/// Process-wide initialization. Must be called before the first `MemPool`
/// instance is created; allocations are drawn from a growing set of pools
/// whose combined block count is capped by `num_blocks`.
pub fn request_mem_size(block_size: usize, num_blocks: usize, page_aligned: bool) -> Result<(), MemError> {
    if block_size == 0 || num_blocks == 0 {
        return Err(MemError::InvalidParam(
            "block_size and num_blocks must be positive".to_string(),
        ));
    }
    let mut st = STATE.lock().unwrap();
    if st.ref_count > 0 {
        return Err(MemError::Busy(
            "RequestMemSize called while a MemPool instance is active".to_string(),
        ));
    }
    st.blk_size_req = block_size;
    st.num_blks_req = num_blocks;
    st.page_aligned_req = page_aligned;
    st.initialized = true;
    info!(
        "RequestMemSize: block_size={} num_blocks={} page_aligned={}",
        block_size, num_blocks, page_aligned
    );
    Ok(())
}

/// A handle into the process-wide pool. Allocations made through one
/// `MemPool` are visible to, and share the budget with, every other
/// `MemPool` instance alive at the same time.
pub struct MemPool {
    blk_size: usize,
}

impl MemPool {
    pub fn new() -> Result<Self, MemError> {
        let mut st = STATE.lock().unwrap();
        if st.regions.is_empty() {
            let first_gen = (st.num_blks_req / 4).max(1);
            st.regions.push(Some(Region::new(st.blk_size_req, first_gen)));
            st.total_blks = first_gen;
        }
        st.ref_count += 1;
        debug!("MemPool::new, ref_count={}", st.ref_count);
        Ok(MemPool {
            blk_size: st.blk_size_req,
        })
    }

    pub fn block_size(&self) -> usize {
        self.blk_size
    }

    /// Allocates `n` contiguous blocks. First-fit across existing pools;
    /// on exhaustion, attempts to grow by doubling before failing with
    /// `OutOfMemory`.
    pub fn alloc(&self, n: usize) -> Result<Block, MemError> {
        if n == 0 {
            return Err(MemError::InvalidParam("cannot allocate 0 blocks".to_string()));
        }
        let mut st = STATE.lock().unwrap();
        if let Some(found) = first_fit(&st.regions, n) {
            let (region_idx, offset) = found;
            st.regions[region_idx].as_mut().unwrap().mark_used(offset, n);
            let blk_size = self.blk_size;
            return Ok(Block {
                region_idx,
                offset,
                n,
                data: vec![0u8; n * blk_size].into_boxed_slice(),
            });
        }

        grow(&mut st, n)?;
        if let Some((region_idx, offset)) = first_fit(&st.regions, n) {
            st.regions[region_idx].as_mut().unwrap().mark_used(offset, n);
            let blk_size = self.blk_size;
            return Ok(Block {
                region_idx,
                offset,
                n,
                data: vec![0u8; n * blk_size].into_boxed_slice(),
            });
        }
        Err(MemError::OutOfMemory(format!(
            "could not satisfy allocation of {} blocks after growth",
            n
        )))
    }
}

impl Drop for MemPool {
    fn drop(&mut self) {
        let mut st = STATE.lock().unwrap();
        st.ref_count = st.ref_count.saturating_sub(1);
        debug!("MemPool dropped, ref_count={}", st.ref_count);
    }
}

fn first_fit(regions: &[Option<Region>], n: usize) -> Option<(usize, usize)> {
    for (i, r) in regions.iter().enumerate() {
        if let Some(r) = r {
            if let Some(off) = r.find_first_fit(n) {
                return Some((i, off));
            }
        }
    }
    None
}

fn grow(st: &mut GlobalState, min_needed: usize) -> Result<(), MemError> {
    let max_blks = st.num_blks_req;
    if st.total_blks >= max_blks {
        return Err(MemError::OutOfMemory(
            "pool already at configured maximum".to_string(),
        ));
    }
    let remaining = max_blks - st.total_blks;
    let doubled = st.total_blks.max(1);
    let new_gen = doubled.min(remaining).max(min_needed.min(remaining));
    if new_gen < min_needed {
        return Err(MemError::OutOfMemory(format!(
            "cannot grow pool enough for a {}-block allocation; {} blocks remain under the configured max",
            min_needed, remaining
        )));
    }
    let region = Region::new(st.blk_size_req, new_gen);
    if let Some(slot) = st.regions.iter_mut().find(|r| r.is_none()) {
        *slot = Some(region);
    } else {
        st.regions.push(Some(region));
    }
    st.total_blks += new_gen;
    info!("grew pool by {} blocks, total now {}", new_gen, st.total_blks);
    Ok(())
}

fn free_region_slot(region_idx: usize, offset: usize) {
    let mut st = STATE.lock().unwrap();
    let empty = {
        let region = st.regions[region_idx].as_mut().expect("freed block's region missing");
        let n = region.mark_free(offset);
        let _ = n;
        region.is_empty()
    };
    if empty {
        let freed_blks = st.regions[region_idx].as_ref().unwrap().num_blks;
        st.regions[region_idx] = None;
        st.total_blks = st.total_blks.saturating_sub(freed_blks);
        warn!("pool region {} fully empty, released", region_idx);
    }
}

/// A contiguous allocation of `n` blocks. Frees itself (and garbage
/// collects its pool if that pool becomes fully empty) on drop.
pub struct Block {
    region_idx: usize,
    offset: usize,
    n: usize,
    data: Box<[u8]>,
}

impl Block {
    pub fn len_blocks(&self) -> usize {
        self.n
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        free_region_slot(self.region_idx, self.offset);
    }
}
