use crate::error::CodecError;

/// An ordered, deduplicated set of linear coefficient indices within
/// `[0, capacity)`, appended in encoder-selection order and tested in O(1)
/// via an auxiliary bitset.
#[derive(Debug, Clone)]
pub struct SignificanceMap {
    capacity: usize,
    order: Vec<u32>,
    present: Vec<bool>,
}

impl SignificanceMap {
    pub fn new(capacity: usize) -> Self {
        SignificanceMap {
            capacity,
            order: Vec::new(),
            present: vec![false; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Appends `index`. Errors if out of range or already present.
    pub fn append(&mut self, index: u32) -> Result<(), CodecError> {
        if index as usize >= self.capacity {
            return Err(CodecError::InvalidParam(format!(
                "significance map index {} out of range [0, {})",
                index, self.capacity
            )));
        }
        if self.present[index as usize] {
            return Err(CodecError::InvalidParam(format!(
                "duplicate significance map index {}",
                index
            )));
        }
        self.present[index as usize] = true;
        self.order.push(index);
        Ok(())
    }

    pub fn test(&self, index: u32) -> bool {
        (index as usize) < self.capacity && self.present[index as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.order.iter().copied()
    }

    /// Serializes in insertion order as a flat little-endian `u32` list
    /// prefixed by the count. See DESIGN.md for why fixed framing was
    /// chosen over bit-packed delta coding.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + 4 * self.order.len());
        buf.extend_from_slice(&(self.order.len() as u32).to_le_bytes());
        for &idx in &self.order {
            buf.extend_from_slice(&idx.to_le_bytes());
        }
        buf
    }

    pub fn deserialize(bytes: &[u8], capacity: usize) -> Result<Self, CodecError> {
        if bytes.len() < 4 {
            return Err(CodecError::Corrupt("significance map: truncated count".to_string()));
        }
        let count = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let expected_len = 4 + 4 * count;
        if bytes.len() < expected_len {
            return Err(CodecError::Corrupt("significance map: truncated index list".to_string()));
        }
        let mut map = SignificanceMap::new(capacity);
        for i in 0..count {
            let off = 4 + 4 * i;
            let idx = u32::from_le_bytes(bytes[off..off + 4].try_into().unwrap());
            map.append(idx)?;
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_rejects_duplicates_and_out_of_range() {
        let mut m = SignificanceMap::new(8);
        m.append(3).unwrap();
        assert!(m.append(3).is_err());
        assert!(m.append(8).is_err());
    }

    #[test]
    fn preserves_insertion_order_round_trip() {
        let mut m = SignificanceMap::new(64);
        for idx in [5, 1, 63, 0, 17] {
            m.append(idx).unwrap();
        }
        let bytes = m.serialize();
        let back = SignificanceMap::deserialize(&bytes, 64).unwrap();
        assert_eq!(m.iter().collect::<Vec<_>>(), back.iter().collect::<Vec<_>>());
    }

    #[test]
    fn no_duplicates_invariant() {
        let mut m = SignificanceMap::new(16);
        for idx in 0..16 {
            m.append(idx).unwrap();
        }
        let mut seen = std::collections::HashSet::new();
        for idx in m.iter() {
            assert!(seen.insert(idx), "duplicate index {}", idx);
        }
    }
}
