/// Bit-for-bit cache key per §3/§4.8: a bbox miss at any axis is a
/// different entry even if the requested data overlaps a cached one —
/// no interval-tree coalescing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub var: String,
    pub t: usize,
    pub level: usize,
    pub lod: usize,
    pub bbox_min: [usize; 3],
    pub bbox_max: [usize; 3],
}

impl CacheKey {
    pub fn new(var: impl Into<String>, t: usize, level: usize, lod: usize, bbox_min: [usize; 3], bbox_max: [usize; 3]) -> Self {
        CacheKey { var: var.into(), t, level, lod, bbox_min, bbox_max }
    }
}
