//! Main memory: a flat byte-addressable store with named sections.

pub mod cache;

use crate::error::{MemoryError, MemoryResult};

/// Default capacity: 1 MiB
pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// Address ranges of the text, data and stack sections. The ranges are
/// non-overlapping; bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sections {
    pub text_base: u32,
    pub text_end: u32,
    pub data_base: u32,
    pub data_end: u32,
    pub stack_base: u32,
    pub stack_end: u32,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            text_base: 0x0000,
            text_end: 0xffff,
            data_base: 0x1_0000,
            data_end: 0x1_ffff,
            stack_base: 0x2_0000,
            stack_end: 0x2_ffff,
        }
    }
}

/// Flat byte-addressable memory.
///
/// Words are stored little-endian; the word accessors are built on the
/// byte accessors, one byte at a time.
#[derive(Clone, Debug)]
pub struct Memory {
    data: Vec<u8>,
    pub sections: Sections,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Memory {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            sections: Sections::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Whether the address falls inside physical memory.
    pub fn contains(&self, address: u32) -> bool {
        (address as usize) < self.data.len()
    }

    pub fn read_byte(&self, address: u32) -> MemoryResult<u8> {
        self.data
            .get(address as usize)
            .copied()
            .ok_or(MemoryError::OutOfBounds {
                address,
                capacity: self.data.len(),
            })
    }

    pub fn write_byte(&mut self, address: u32, value: u8) -> MemoryResult<()> {
        let capacity = self.data.len();
        match self.data.get_mut(address as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(MemoryError::OutOfBounds { address, capacity }),
        }
    }

    /// Reads a 32-bit word, little-endian. The address must be 4-byte
    /// aligned.
    pub fn read_word(&self, address: u32) -> MemoryResult<u32> {
        check_alignment(address)?;
        let mut word = 0u32;
        for i in 0..4 {
            word |= u32::from(self.read_byte(address + i)?) << (8 * i);
        }
        Ok(word)
    }

    /// Writes a 32-bit word, little-endian. The address must be 4-byte
    /// aligned.
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

    #[test]
    fn words_are_little_endian() {
        let mut mem = Memory::new(64);
        mem.write_word(0, 0x1234_5678).unwrap();
        assert_eq!(mem.read_byte(0).unwrap(), 0x78);
        assert_eq!(mem.read_byte(1).unwrap(), 0x56);
        assert_eq!(mem.read_byte(2).unwrap(), 0x34);
        assert_eq!(mem.read_byte(3).unwrap(), 0x12);
        assert_eq!(mem.read_word(0).unwrap(), 0x1234_5678);
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let mut mem = Memory::new(16);
        assert_eq!(
            mem.read_byte(16),
            Err(MemoryError::OutOfBounds {
                address: 16,
                capacity: 16
            })
        );
        assert!(mem.write_word(16, 0).is_err());
        // A word straddling the end fails too
        assert!(mem.read_word(12).is_ok());
        assert!(mem.write_byte(20, 1).is_err());
    }

    #[test]
    fn unaligned_word_access_is_an_error() {
        let mut mem = Memory::new(64);
        assert_eq!(
            mem.read_word(2),
            Err(MemoryError::UnalignedAccess { address: 2 })
        );
        assert_eq!(
            mem.write_word(6, 0),
            Err(MemoryError::UnalignedAccess { address: 6 })
        );
    }

    #[test]
    fn default_sections_do_not_overlap() {
        let sections = Sections::default();
        assert!(sections.text_end < sections.data_base);
        assert!(sections.data_end < sections.stack_base);
        assert!((sections.stack_end as usize) < DEFAULT_CAPACITY);
    }
}
