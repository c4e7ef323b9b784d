//! Architectural CPU state: PC, register file and execution counters.

use crate::memory::Sections;

/// Stack pointer
pub const REG_SP: u32 = 29;

/// Return address register, written by jal
pub const REG_RA: u32 = 31;

/// Architectural state shared by all pipeline stages. The latches live
/// separately; this is only what a programmer would consider the
/// machine's registers plus the run/halt flag and counters.
#[derive(Clone, Debug)]
pub struct Cpu {
    /// Program counter, word-aligned
    pub pc: u32,
    registers: [u32; 32],
    /// Cleared by the termination sentinel, an out-of-range PC or a
    /// memory-stage fault. Once false, the pipeline makes no further
    /// progress.
    pub running: bool,
    /// First address past the loaded program; fetching at or beyond it
    /// halts.
    pub program_end: u32,
    /// Clock cycles elapsed
    pub cycles: u64,
    /// Instructions that committed a register write
    pub retired: u64,
}

impl Cpu {
    /// PC starts at the text base, $sp at the top of the stack section.
    pub fn new(sections: &Sections) -> Self {
        let mut registers = [0u32; 32];
        registers[REG_SP as usize] = sections.stack_end;
        Self {
            pc: sections.text_base,
            registers,
            running: true,
            program_end: sections.text_end + 1,
            cycles: 0,
            retired: 0,
        }
    }

    pub fn register(&self, index: u32) -> u32 {
        self.registers[index as usize & 0x1f]
    }

    /// Register 0 is hardwired to zero; writes to it are discarded.
    pub fn write_register(&mut self, index: u32, value: u32) {
        let index = index as usize & 0x1f;
        if index != 0 {
            self.registers[index] = value;
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(&Sections::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_zero_is_hardwired() {
        let mut cpu = Cpu::default();
        cpu.write_register(0, 42);
        assert_eq!(cpu.register(0), 0);
        cpu.write_register(5, 42);
        assert_eq!(cpu.register(5), 42);
    }

    #[test]
    fn reset_state_follows_the_section_layout() {
        let sections = Sections::default();
        let cpu = Cpu::new(&sections);
        assert_eq!(cpu.pc, sections.text_base);
        assert_eq!(cpu.register(REG_SP), sections.stack_end);
        assert!(cpu.running);
    }
}
