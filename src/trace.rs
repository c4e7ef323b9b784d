//! Per-cycle textual narration of the pipeline for a human reader.

use std::fmt;

use crate::instruction::Function;
use crate::memory::cache::CacheStats;
use crate::pipeline::latches::PipelineState;

/// Conventional MIPS register names, indexed by register number.
pub const REGISTER_NAMES: [&str; 32] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1",
    "$t2", "$t3", "$t4", "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3",
    "$s4", "$s5", "$s6", "$s7", "$t8", "$t9", "$k0", "$k1", "$gp", "$sp",
    "$fp", "$ra",
];

pub fn register_name(index: u32) -> &'static str {
    REGISTER_NAMES[index as usize & 0x1f]
}

/// Read-only view of one cycle, taken after the stages ran. Rendering
/// it never mutates the machine.
#[derive(Clone, Copy, Debug)]
pub struct CycleSnapshot {
    pub cycle: u64,
    pub pc: u32,
    pub running: bool,
    pub state: PipelineState,
    pub stats: CacheStats,
}

impl fmt::Display for CycleSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- cycle {:03} ---", self.cycle)?;

        let wb = &self.state.mem_wb;
        if wb.valid {
            if wb.inst.controls.reg_write && wb.write_reg != 0 {
                writeln!(
                    f,
                    "  [WB]  write {} <- {:#010x} ({})",
                    register_name(wb.write_reg),
                    wb.value,
                    wb.value
                )?;
            } else {
                writeln!(f, "  [WB]  no register write")?;
            }
        }

        let mem = &self.state.ex_mem;
        if mem.valid {
            if mem.inst.controls.mem_read {
                writeln!(f, "  [MEM] load from {:#010x}", mem.alu_result)?;
            } else if mem.inst.controls.mem_write {
                writeln!(
                    f,
                    "  [MEM] store {} to {:#010x}",
                    mem.store_value, mem.alu_result
                )?;
            } else {
                writeln!(f, "  [MEM] pass-through")?;
            }

            let taken = if mem.branch_taken { " -> branch taken" } else { "" };
            writeln!(
                f,
                "  [EX]  {} alu={:#010x}{}",
                mem.inst.function.mnemonic(),
                mem.alu_result,
                taken
            )?;
        }

        let id = &self.state.id_ex;
        if id.valid {
            let operand = match id.inst.function {
                Function::Unknown => id.inst.describe(),
                _ => id.inst.function.mnemonic().to_string(),
            };
            writeln!(f, "  [ID]  decoded '{operand}'")?;
        }

        let fetch = &self.state.if_id;
        if fetch.valid {
            writeln!(
                f,
                "  [IF]  pc {:#010x} -> {:#010x}",
                fetch.pc, fetch.raw
            )?;
        } else {
            writeln!(f, "  [IF]  (stall or halt)")?;
        }

        Ok(())
    }
}

/// End-of-run summary: counters plus the cache hit rate.
pub struct RunSummary {
    pub cycles: u64,
    pub retired: u64,
    pub stats: CacheStats,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cycles:       {}", self.cycles)?;
        writeln!(f, "retired:      {}", self.retired)?;
        writeln!(
            f,
            "cache:        {} hits, {} misses",
            self.stats.hits, self.stats.misses
        )?;
        match self.stats.hit_rate() {
            Some(rate) => writeln!(f, "hit rate:     {:.1}%", rate * 100.0),
            None => writeln!(f, "hit rate:     n/a"),
        }
    }
}
