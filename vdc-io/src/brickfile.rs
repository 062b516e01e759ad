use crate::error::IoLayerError;
use log::{debug, trace};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use vdc_codec::{LodSegment, SignificanceMap};

const ENTRY_BYTES: u64 = 16; // offset: u64, coeff_len: u32, sigmap_len: u32

#[derive(Debug, Clone, Copy, Default)]
struct BrickIndexEntry {
    offset: u64,
    coeff_len: u32,
    sigmap_len: u32,
}

impl BrickIndexEntry {
    fn to_bytes(self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..12].copy_from_slice(&self.coeff_len.to_le_bytes());
        buf[12..16].copy_from_slice(&self.sigmap_len.to_le_bytes());
        buf
    }

    fn from_bytes(bytes: &[u8]) -> BrickIndexEntry {
        BrickIndexEntry {
            offset: u64::from_le_bytes(bytes[0..8].try_into().unwrap()),
            coeff_len: u32::from_le_bytes(bytes[8..12].try_into().unwrap()),
            sigmap_len: u32::from_le_bytes(bytes[12..16].try_into().unwrap()),
        }
    }
}

/// Writes one `(variable, timestep, level, LOD)` brick file. Bricks must be
/// written in increasing linear index order (Z-then-Y-then-X, per §5's
/// ordering guarantee); the header table is reserved up front, sized from
/// the known `num_bricks`, and filled in as each brick is written.
pub struct BrickFileWriter {
    file: File,
    entries: Vec<BrickIndexEntry>,
    next_offset: u64,
    next_idx: usize,
}

impl BrickFileWriter {
    pub fn create(path: impl AsRef<Path>, num_bricks: usize) -> Result<Self, IoLayerError> {
        let mut file = OpenOptions::new().create(true).truncate(true).write(true).read(true).open(path)?;
        let header_len = 4 + ENTRY_BYTES * num_bricks as u64;
        file.write_all(&(num_bricks as u32).to_le_bytes())?;
        file.write_all(&vec![0u8; (header_len - 4) as usize])?;
        Ok(BrickFileWriter {
            file,
            entries: vec![BrickIndexEntry::default(); num_bricks],
            next_offset: header_len,
            next_idx: 0,
        })
    }

    pub fn write_brick(&mut self, seg: &LodSegment) -> Result<(), IoLayerError> {
        if self.next_idx >= self.entries.len() {
            return Err(IoLayerError::InvalidParam(
                "write_brick: exceeded the file's declared brick count".to_string(),
            ));
        }
        self.file.seek(SeekFrom::Start(self.next_offset))?;
        let mut coeff_bytes = Vec::with_capacity(4 * seg.coeffs.len());
        for v in &seg.coeffs {
            coeff_bytes.extend_from_slice(&v.to_le_bytes());
        }
        let sigmap_bytes = seg.sigmap.serialize();
        self.file.write_all(&coeff_bytes)?;
        self.file.write_all(&sigmap_bytes)?;

        self.entries[self.next_idx] = BrickIndexEntry {
            offset: self.next_offset,
            coeff_len: seg.coeffs.len() as u32,
            sigmap_len: sigmap_bytes.len() as u32,
        };
        trace!(
            "write_brick {}: coeff_len={} sigmap_len={}",
            self.next_idx,
            coeff_bytes.len(),
            sigmap_bytes.len()
        );
        self.next_offset += (coeff_bytes.len() + sigmap_bytes.len()) as u64;
        self.next_idx += 1;
        Ok(())
    }

    /// Flushes the header table. Must be called (directly, or via `Drop`)
    /// before the file is read back.
    pub fn finalize(mut self) -> Result<(), IoLayerError> {
        self.file.seek(SeekFrom::Start(4))?;
        for entry in &self.entries {
            self.file.write_all(&entry.to_bytes())?;
        }
        self.file.flush()?;
        debug!("finalized brick file with {} entries", self.entries.len());
        Ok(())
    }
}

/// Reads one `(variable, timestep, level, LOD)` brick file, seeking
/// directly to any brick's payload via the header table read at `open`
/// time.
pub struct BrickFileReader {
    file: File,
    entries: Vec<BrickIndexEntry>,
}

impl BrickFileReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoLayerError> {
        let mut file = File::open(path)?;
        let mut count_buf = [0u8; 4];
        file.read_exact(&mut count_buf)?;
        let count = u32::from_le_bytes(count_buf) as usize;
        let mut header = vec![0u8; count * ENTRY_BYTES as usize];
        file.read_exact(&mut header)?;
        let entries = (0..count).map(|i| BrickIndexEntry::from_bytes(&header[i * 16..i * 16 + 16])).collect();
        Ok(BrickFileReader { file, entries })
    }

    pub fn num_bricks(&self) -> usize {
        self.entries.len()
    }

    /// Seeks to and reads the brick at `idx`. `capacity` is the brick's
    /// coefficient-space size (`Bx*By*Bz`), needed to reconstruct the
    /// significance map's bitset.
    pub fn read_brick(&mut self, idx: usize, capacity: usize) -> Result<LodSegment, IoLayerError> {
        let entry = *self
            .entries
            .get(idx)
            .ok_or_else(|| IoLayerError::NotAvailable(format!("brick index {} out of range", idx)))?;
        self.file.seek(SeekFrom::Start(entry.offset))?;
        let mut coeff_bytes = vec![0u8; 4 * entry.coeff_len as usize];
        self.file.read_exact(&mut coeff_bytes)?;
        let mut sigmap_bytes = vec![0u8; entry.sigmap_len as usize];
        self.file.read_exact(&mut sigmap_bytes)?;

        let mut coeffs = Vec::with_capacity(entry.coeff_len as usize);
        for i in 0..entry.coeff_len as usize {
            let off = i * 4;
            coeffs.push(f32::from_le_bytes(coeff_bytes[off..off + 4].try_into().unwrap()));
        }
        let sigmap = SignificanceMap::deserialize(&sigmap_bytes, capacity)?;
        Ok(LodSegment { coeffs, sigmap })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("vdc-io-brickfile-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn seg(vals: &[f32], idxs: &[u32], capacity: usize) -> LodSegment {
        let mut sigmap = SignificanceMap::new(capacity);
        for &i in idxs {
            sigmap.append(i).unwrap();
        }
        LodSegment { coeffs: vals.to_vec(), sigmap }
    }

    #[test]
    fn write_then_read_back_bricks_in_order() {
        let path = scratch_path("bricks.bin");
        let mut w = BrickFileWriter::create(&path, 3).unwrap();
        w.write_brick(&seg(&[1.0, 2.0], &[0, 1], 64)).unwrap();
        w.write_brick(&seg(&[3.0], &[5], 64)).unwrap();
        w.write_brick(&seg(&[], &[], 64)).unwrap();
        w.finalize().unwrap();

        let mut r = BrickFileReader::open(&path).unwrap();
        assert_eq!(r.num_bricks(), 3);
        let b0 = r.read_brick(0, 64).unwrap();
        assert_eq!(b0.coeffs, vec![1.0, 2.0]);
        assert_eq!(b0.sigmap.iter().collect::<Vec<_>>(), vec![0, 1]);
        let b1 = r.read_brick(1, 64).unwrap();
        assert_eq!(b1.coeffs, vec![3.0]);
        let b2 = r.read_brick(2, 64).unwrap();
        assert!(b2.coeffs.is_empty());
    }

    #[test]
    fn random_access_reads_any_brick_directly() {
        let path = scratch_path("random.bin");
        let mut w = BrickFileWriter::create(&path, 4).unwrap();
        for i in 0..4u32 {
            w.write_brick(&seg(&[i as f32], &[i], 16)).unwrap();
        }
        w.finalize().unwrap();

        let mut r = BrickFileReader::open(&path).unwrap();
        let b2 = r.read_brick(2, 16).unwrap();
        assert_eq!(b2.coeffs, vec![2.0]);
        let b0 = r.read_brick(0, 16).unwrap();
        assert_eq!(b0.coeffs, vec![0.0]);
    }

    #[test]
    fn out_of_range_brick_index_is_not_available() {
        let path = scratch_path("oob.bin");
        let mut w = BrickFileWriter::create(&path, 1).unwrap();
        w.write_brick(&seg(&[1.0], &[0], 8)).unwrap();
        w.finalize().unwrap();

        let mut r = BrickFileReader::open(&path).unwrap();
        assert!(r.read_brick(5, 8).is_err());
    }
}
