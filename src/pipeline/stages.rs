//! The five stage transition functions.
//!
//! Every stage reads the previous cycle's latch contents (`cur`) and
//! writes next cycle's (`next`). The driver runs them in the order
//! WB, MEM, EX, ID, IF within a cycle.

use tracing::{debug, warn};

use super::latches::PipelineState;
use crate::alu;
use crate::alu::AluSrc;
use crate::cpu::{Cpu, REG_RA};
use crate::error::MemoryResult;
use crate::instruction::{Instruction, HALT};
use crate::memory::cache::Cache;

/// IF: reads one word at PC through the cache and advances PC by 4.
///
/// Fetching the all-ones sentinel, or a PC past the program end or
/// outside physical memory, halts the pipeline instead of filling
/// IF/ID. A cache fault falls back once to a direct RAM read.
pub fn instruction_fetch(cpu: &mut Cpu, cache: &mut Cache, next: &mut PipelineState) {
    let pc = cpu.pc;

    if pc >= cpu.program_end {
        debug!(pc = format_args!("{pc:#010x}"), "PC past program end, halting");
        cpu.running = false;
        next.if_id.valid = false;
        return;
    }

    if !cache.ram.contains(pc) {
        warn!(pc = format_args!("{pc:#010x}"), "PC outside physical memory, halting");
        cpu.running = false;
        next.if_id.valid = false;
        return;
    }

    let raw = match cache.read_word(pc) {
        Ok(word) => word,
        Err(cache_fault) => match cache.ram.read_word(pc) {
            Ok(word) => word,
            Err(ram_fault) => {
                warn!(%cache_fault, %ram_fault, "instruction fetch failed, halting");
                cpu.running = false;
                next.if_id.valid = false;
                return;
            }
        },
    };

    if raw == HALT {
        debug!(pc = format_args!("{pc:#010x}"), "termination sentinel fetched");
        cpu.running = false;
        next.if_id.valid = false;
        return;
    }

    next.if_id.valid = true;
    next.if_id.pc = pc;
    next.if_id.pc_plus_4 = pc + 4;
    next.if_id.raw = raw;

    // Assume not taken; a resolved branch already replaced PC before
    // this stage ran.
    cpu.pc = pc + 4;
}

/// ID: decodes the fetched word, reads the register file and fills
/// ID/EX. Hazard detection happens in the driver before this runs.
pub fn instruction_decode(cpu: &Cpu, cur: &PipelineState, next: &mut PipelineState) {
    if !cur.if_id.valid {
        next.id_ex.valid = false;
        return;
    }

    let inst = Instruction::decode(cur.if_id.raw);

    next.id_ex.valid = true;
    next.id_ex.pc_plus_4 = cur.if_id.pc_plus_4;
    next.id_ex.rs_value = cpu.register(inst.fields.rs);
    next.id_ex.rt_value = cpu.register(inst.fields.rt);
    next.id_ex.inst = inst;
}

/// EX: resolves forwarding, runs the ALU and resolves control flow.
///
/// Returns the redirect target when a branch is taken or a jump
/// executes; the driver applies it to PC and squashes the younger
/// instructions.
pub fn execute(cur: &PipelineState, next: &mut PipelineState) -> Option<u32> {
    if !cur.id_ex.valid {
        next.ex_mem.valid = false;
        return None;
    }

    let inst = cur.id_ex.inst;
    let controls = inst.controls;

    // Freshest value wins: EX/MEM result, then MEM/WB value, then the
    // register file read from decode.
    let op1 = if cur.ex_forward_rs() {
        cur.ex_mem.alu_result
    } else if cur.mem_forward_rs() {
        cur.mem_wb.value
    } else {
        cur.id_ex.rs_value
    };

    let rt_value = if cur.ex_forward_rt() {
        cur.ex_mem.alu_result
    } else if cur.mem_forward_rt() {
        cur.mem_wb.value
    } else {
        cur.id_ex.rt_value
    };

    let op2 = match controls.alu_src {
        AluSrc::Reg => rt_value,
        AluSrc::Imm => inst.fields.immediate_signed as u32,
    };

    let alu_result = alu::evaluate(controls.alu_op, op1, op2, inst.fields.shamt);

    let mut write_reg = inst.destination();
    let mut result = alu_result;

    let mut redirect = None;
    let mut branch_taken = false;
    if controls.branch {
        // beq takes on a zero result, bne on a nonzero one.
        branch_taken = (alu_result == 0) != controls.branch_on_not_equal;
        if branch_taken {
            let offset = (inst.fields.immediate_signed << 2) as u32;
            redirect = Some(cur.id_ex.pc_plus_4.wrapping_add(offset));
        }
    } else if controls.jump {
        let target =
            (cur.id_ex.pc_plus_4 & 0xf000_0000) | (inst.fields.jump_target << 2);
        redirect = Some(target);
        if controls.link {
            write_reg = REG_RA;
            result = cur.id_ex.pc_plus_4;
        }
    }

    next.ex_mem.valid = true;
    next.ex_mem.inst = inst;
    next.ex_mem.alu_result = result;
    next.ex_mem.store_value = rt_value;
    next.ex_mem.write_reg = write_reg;
    next.ex_mem.branch_taken = branch_taken;

    redirect
}

/// MEM: performs the load or store through the cache and fills MEM/WB.
/// A memory fault is returned to the driver, which halts the pipeline.
pub fn memory_access(
    cache: &mut Cache,
    cur: &PipelineState,
    next: &mut PipelineState,
) -> MemoryResult<()> {
    if !cur.ex_mem.valid {
        next.mem_wb.valid = false;
        return Ok(());
    }

    let inst = cur.ex_mem.inst;
    let address = cur.ex_mem.alu_result;

    let value = if inst.controls.mem_read {
        cache.read_word(address)?
    } else {
        if inst.controls.mem_write {
            cache.write_word(address, cur.ex_mem.store_value)?;
        }
        cur.ex_mem.alu_result
    };

    next.mem_wb.valid = true;
    next.mem_wb.inst = inst;
    next.mem_wb.write_reg = cur.ex_mem.write_reg;
    next.mem_wb.value = value;
    Ok(())
}

/// WB: commits to the register file and counts the instruction as
/// retired. Writes aimed at register 0 are discarded and not counted.
pub fn write_back(cpu: &mut Cpu, cur: &PipelineState) {
    if !cur.mem_wb.valid {
        return;
    }
    if cur.mem_wb.inst.controls.reg_write && cur.mem_wb.write_reg != 0 {
        cpu.write_register(cur.mem_wb.write_reg, cur.mem_wb.value);
        cpu.retired += 1;
    }
}
