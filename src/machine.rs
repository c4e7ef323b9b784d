//! Top-level driver tying memory, cache, CPU state and the pipeline
//! together.

use std::path::Path;

use tracing::info;

use crate::cpu::Cpu;
use crate::error::{LoaderError, SimulatorResult};
use crate::loader;
use crate::memory::cache::Cache;
use crate::memory::Memory;
use crate::pipeline;
use crate::pipeline::latches::PipelineState;
use crate::trace::CycleSnapshot;

/// One simulated machine. Memory is owned by the cache, the cache by
/// the machine; the pipeline reaches memory only through the cache.
pub struct Machine {
    pub cpu: Cpu,
    pub cache: Cache,
    pub state: PipelineState,
}

impl Machine {
    pub fn new() -> Self {
        Self::with_memory(Memory::default())
    }

    pub fn with_memory(memory: Memory) -> Self {
        let cpu = Cpu::new(&memory.sections);
        Self {
            cpu,
            cache: Cache::new(memory),
            state: PipelineState::default(),
        }
    }

    /// Copies a program into the text section, one word per
    /// instruction at consecutive aligned addresses, and sets the
    /// program-end bound.
    pub fn load_words(&mut self, words: &[u32]) -> SimulatorResult<()> {
        let sections = self.cache.ram.sections;
        let bytes = words.len() * 4;
        let text_capacity = (sections.text_end - sections.text_base) as usize + 1;
        if bytes > text_capacity {
            return Err(LoaderError::ImageTooLarge(bytes).into());
        }

        for (i, word) in words.iter().enumerate() {
            let address = sections.text_base + 4 * i as u32;
            self.cache.ram.write_word(address, *word)?;
        }
        self.cpu.program_end = sections.text_base + bytes as u32;
        info!(
            bytes,
            base = format_args!("{:#010x}", sections.text_base),
            "program loaded"
        );
        Ok(())
    }

    /// Reads a big-endian program image from disk and loads it.
    pub fn load_image(&mut self, path: &Path) -> SimulatorResult<()> {
        let words = loader::read_image(path)?;
        self.load_words(&words)
    }

    /// Advances one clock cycle. Does nothing once halted.
    pub fn step(&mut self) {
        if !self.cpu.running {
            return;
        }
        self.state = pipeline::step(&mut self.cpu, &mut self.cache, &self.state);
    }

    /// Runs until the pipeline halts or `max_cycles` cycles elapse;
    /// returns the number of cycles executed.
    pub fn run(&mut self, max_cycles: u64) -> u64 {
        let start = self.cpu.cycles;
        while self.cpu.running && self.cpu.cycles - start < max_cycles {
            self.step();
        }
        self.cpu.cycles - start
    }

    /// Read-only view of the machine after the last cycle, for the
    /// tracing harness.
    pub fn snapshot(&self) -> CycleSnapshot {
        CycleSnapshot {
            cycle: self.cpu.cycles,
            pc: self.cpu.pc,
            running: self.cpu.running,
            state: self.state,
            stats: self.cache.stats,
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulatorError;
    use crate::instruction::{HALT, NOP};

    #[test]
    fn load_words_sets_the_program_end_bound() {
        let mut machine = Machine::new();
        machine.load_words(&[NOP, NOP, HALT]).unwrap();
        assert_eq!(machine.cpu.program_end, 12);
        assert_eq!(machine.cache.ram.read_word(0).unwrap(), NOP);
        assert_eq!(machine.cache.ram.read_word(8).unwrap(), HALT);
    }

    #[test]
    fn oversized_image_is_rejected() {
        let mut machine = Machine::new();
        let text_words =
            (machine.cache.ram.sections.text_end as usize + 1) / 4;
        let image = vec![NOP; text_words + 1];
        match machine.load_words(&image) {
            Err(SimulatorError::LoadError(LoaderError::ImageTooLarge(_))) => {}
            other => panic!("expected ImageTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn run_respects_the_cycle_bound() {
        let mut machine = Machine::new();
        // An infinite loop: jump to self.
        machine.load_words(&[crate::encoder::j(0), NOP, NOP]).unwrap();
        let cycles = machine.run(50);
        assert_eq!(cycles, 50);
        assert!(machine.cpu.running);
    }
}
