//! Direct-mapped write-through cache in front of main memory.

use tracing::trace;

use super::Memory;
use crate::error::{MemoryError, MemoryResult};

/// Bytes per cache line (4 words)
pub const BLOCK_SIZE: usize = 16;

/// Number of lines
pub const LINE_COUNT: usize = 8;

/// One cache line: validity bit, tag and a copy of the block.
#[derive(Clone, Copy, Debug)]
struct Line {
    valid: bool,
    tag: u32,
    data: [u8; BLOCK_SIZE],
}

impl Default for Line {
    fn default() -> Self {
        Self {
            valid: false,
            tag: 0,
            data: [0; BLOCK_SIZE],
        }
    }
}

/// Hit/miss counters, accumulated over the whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of accesses that hit, or `None` before any access.
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            None
        } else {
            Some(self.hits as f64 / total as f64)
        }
    }
}

/// Direct-mapped cache. Reads that miss refill the whole line from
/// RAM; writes go through to RAM first and update the line only if the
/// block is already resident (no write-allocate).
///
/// The cache owns main memory; everything the pipeline reads or writes
/// goes through here.
#[derive(Clone, Debug)]
pub struct Cache {
    pub ram: Memory,
    lines: [Line; LINE_COUNT],
    pub stats: CacheStats,
}

impl Cache {
    pub fn new(ram: Memory) -> Self {
        Self {
            ram,
            lines: [Line::default(); LINE_COUNT],
            stats: CacheStats::default(),
        }
    }

    /// Splits an address into (tag, index, offset).
    ///
    /// offset selects the byte within the block, index selects the
    /// line, tag identifies which block of memory occupies it.
    pub fn split_address(address: u32) -> (u32, usize, usize) {
        let offset = address as usize % BLOCK_SIZE;
        let index = (address as usize / BLOCK_SIZE) % LINE_COUNT;
        let tag = address / (BLOCK_SIZE * LINE_COUNT) as u32;
        (tag, index, offset)
    }

    pub fn read_byte(&mut self, address: u32) -> MemoryResult<u8> {
        let (tag, index, offset) = Self::split_address(address);
        let line = &self.lines[index];

        if line.valid && line.tag == tag {
            self.stats.hits += 1;
            return Ok(line.data[offset]);
        }

        self.stats.misses += 1;
        trace!(address = format_args!("{address:#010x}"), index, "cache miss");

        // Refill the whole line before marking it valid, so a failed
        // read leaves the old contents intact.
        let base = address - offset as u32;
        let mut block = [0u8; BLOCK_SIZE];
        for (i, byte) in block.iter_mut().enumerate() {
            *byte = self.ram.read_byte(base + i as u32)?;
        }

        let line = &mut self.lines[index];
        line.data = block;
        line.tag = tag;
        line.valid = true;
        Ok(line.data[offset])
    }

    /// Write-through: RAM is written unconditionally, the cached copy
    /// only when the block is resident.
    pub fn write_byte(&mut self, address: u32, value: u8) -> MemoryResult<()> {
        let (tag, index, offset) = Self::split_address(address);

        self.ram.write_byte(address, value)?;

        let line = &mut self.lines[index];
        if line.valid && line.tag == tag {
            line.data[offset] = value;
        }
        Ok(())
    }

    /// Reads a 32-bit word, little-endian, through the cache. The
    /// address must be 4-byte aligned.
    pub fn read_word(&mut self, address: u32) -> MemoryResult<u32> {
        check_alignment(address)?;
        let mut word = 0u32;
        for i in 0..4 {
            word |= u32::from(self.read_byte(address + i)?) << (8 * i);
        }
        Ok(word)
    }

    /// Writes a 32-bit word, little-endian, through the cache. The
    /// address must be 4-byte aligned.
    pub fn write_word(&mut self, address: u32, value: u32) -> MemoryResult<()> {
        check_alignment(address)?;
        for i in 0..4 {
            self.write_byte(address + i, (value >> (8 * i)) as u8)?;
        }
        Ok(())
    }
}

fn check_alignment(address: u32) -> MemoryResult<()> {
    if address % 4 == 0 {
        Ok(())
    } else {
        Err(MemoryError::UnalignedAccess { address })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(words: &[(u32, u32)]) -> Cache {
        let mut ram = Memory::new(4096);
        for &(addr, value) in words {
            ram.write_word(addr, value).unwrap();
        }
        Cache::new(ram)
    }

    #[test]
    fn address_decomposition_reassembles() {
        for address in [0u32, 1, 15, 16, 127, 128, 129, 0x2_ffff, 0xdead_bee0] {
            let (tag, index, offset) = Cache::split_address(address);
            let rebuilt = tag * (BLOCK_SIZE * LINE_COUNT) as u32
                + (index * BLOCK_SIZE) as u32
                + offset as u32;
            assert_eq!(rebuilt, address);
            assert!(index < LINE_COUNT);
            assert!(offset < BLOCK_SIZE);
        }
    }

    #[test]
    fn first_access_misses_then_hits_within_the_block() {
        let mut cache = cache_with(&[(0, 0xaabb_ccdd), (4, 0x1122_3344)]);

        // Word read = 4 byte accesses; the first misses and refills
        // the 16-byte line, the rest hit.
        assert_eq!(cache.read_word(0).unwrap(), 0xaabb_ccdd);
        assert_eq!(cache.stats.misses, 1);
        assert_eq!(cache.stats.hits, 3);

        // Same block, all hits now.
        assert_eq!(cache.read_word(4).unwrap(), 0x1122_3344);
        assert_eq!(cache.stats.misses, 1);
        assert_eq!(cache.stats.hits, 7);
    }

    #[test]
    fn conflicting_blocks_evict_each_other() {
        // Addresses 0 and 128 share index 0 but differ in tag.
        let mut cache = cache_with(&[(0, 1), (128, 2)]);

        assert_eq!(cache.read_word(0).unwrap(), 1);
        assert_eq!(cache.read_word(128).unwrap(), 2);
        assert_eq!(cache.read_word(0).unwrap(), 1);
        assert_eq!(cache.stats.misses, 3);
    }

    #[test]
    fn writes_go_through_to_ram() {
        let mut cache = cache_with(&[]);
        cache.write_word(32, 0xdead_beef).unwrap();

        // RAM holds the value even though the block was never cached.
        assert_eq!(cache.ram.read_word(32).unwrap(), 0xdead_beef);

        // A resident block stays consistent after a write hit.
        assert_eq!(cache.read_word(32).unwrap(), 0xdead_beef);
        cache.write_word(32, 0x0000_00ff).unwrap();
        assert_eq!(cache.read_word(32).unwrap(), 0x0000_00ff);
        assert_eq!(cache.ram.read_word(32).unwrap(), 0x0000_00ff);
    }

    #[test]
    fn write_miss_does_not_allocate() {
        let mut cache = cache_with(&[]);
        cache.write_word(64, 7).unwrap();
        let before = cache.stats;
        // The block is not resident, so this read must miss.
        assert_eq!(cache.read_word(64).unwrap(), 7);
        assert_eq!(cache.stats.misses, before.misses + 1);
    }

    #[test]
    fn out_of_bounds_refill_reports_the_fault() {
        let mut cache = Cache::new(Memory::new(8));
        // Block refill would run past the 8-byte RAM.
        assert!(cache.read_byte(4).is_err());
        // The line must not have been marked valid.
        assert!(cache.read_byte(0).is_err());
    }

    #[test]
    fn hit_rate_is_none_before_any_access() {
        let cache = cache_with(&[]);
        assert_eq!(cache.stats.hit_rate(), None);
        let stats = CacheStats { hits: 3, misses: 1 };
        assert_eq!(stats.hit_rate(), Some(0.75));
    }
}
