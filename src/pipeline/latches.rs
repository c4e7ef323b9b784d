//! Inter-stage latches and the hazard/forwarding predicates over them.

use crate::instruction::{Fields, Instruction};

/// Pipeline state = 4 inter-stage latches.
///
/// Two copies exist per cycle: the stages read the state produced by
/// the previous cycle and write a fresh one, which replaces it at the
/// cycle boundary. That reproduces synchronous-clock semantics; no
/// stage ever observes a value written earlier in the same cycle.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineState {
    pub if_id: IfId,
    pub id_ex: IdEx,
    pub ex_mem: ExMem,
    pub mem_wb: MemWb,
}

impl PipelineState {
    /// Load-use hazard: the instruction decoded last cycle is a load
    /// whose destination feeds a source of the instruction now awaiting
    /// decode. The front end must stall one cycle; the loaded value is
    /// then forwarded from MEM/WB.
    pub fn load_use_hazard(&self) -> bool {
        if !(self.id_ex.valid && self.id_ex.inst.controls.mem_read) {
            return false;
        }
        let dest = self.id_ex.inst.destination();
        if dest == 0 || !self.if_id.valid {
            return false;
        }
        let fields = Fields::extract(self.if_id.raw);
        dest == fields.rs || dest == fields.rt
    }

    /// rs can take the ALU result of the instruction one ahead.
    /// See P&H p. 300.
    pub fn ex_forward_rs(&self) -> bool {
        self.ex_forward(self.id_ex.inst.fields.rs)
    }

    /// rt can take the ALU result of the instruction one ahead.
    pub fn ex_forward_rt(&self) -> bool {
        self.ex_forward(self.id_ex.inst.fields.rt)
    }

    /// rs can take the writeback value of the instruction two ahead.
    /// Checked only when the EX/MEM path does not apply.
    /// See P&H p. 301.
    pub fn mem_forward_rs(&self) -> bool {
        self.mem_forward(self.id_ex.inst.fields.rs)
    }

    /// rt can take the writeback value of the instruction two ahead.
    pub fn mem_forward_rt(&self) -> bool {
        self.mem_forward(self.id_ex.inst.fields.rt)
    }

    fn ex_forward(&self, source: u32) -> bool {
        source != 0
            && self.ex_mem.valid
            && self.ex_mem.inst.controls.reg_write
            && self.ex_mem.write_reg == source
    }

    fn mem_forward(&self, source: u32) -> bool {
        source != 0
            && self.mem_wb.valid
            && self.mem_wb.inst.controls.reg_write
            && self.mem_wb.write_reg == source
    }
}

/// IF/ID latch
#[derive(Clone, Copy, Debug, Default)]
pub struct IfId {
    pub valid: bool,
    /// Address this instruction was fetched from
    pub pc: u32,
    /// PC + 4, used downstream for branch targets
    pub pc_plus_4: u32,
    /// Raw instruction word, not yet decoded
    pub raw: u32,
}

/// ID/EX latch
#[derive(Clone, Copy, Debug, Default)]
pub struct IdEx {
    pub valid: bool,
    pub pc_plus_4: u32,
    pub inst: Instruction,
    /// Register file value for rs
    pub rs_value: u32,
    /// Register file value for rt
    pub rt_value: u32,
}

/// EX/MEM latch
#[derive(Clone, Copy, Debug, Default)]
pub struct ExMem {
    pub valid: bool,
    pub inst: Instruction,
    pub alu_result: u32,
    /// Forwarded rt value, written by stores
    pub store_value: u32,
    /// Destination register, already resolved via RegDst
    pub write_reg: u32,
    /// Branch resolution of this instruction, for observability
    pub branch_taken: bool,
}

/// MEM/WB latch
#[derive(Clone, Copy, Debug, Default)]
pub struct MemWb {
    pub valid: bool,
    pub inst: Instruction,
    pub write_reg: u32,
    /// Value to commit: ALU result, loaded word, or link address
    pub value: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder;

    fn state_with_load_then(raw: u32) -> PipelineState {
        let mut state = PipelineState::default();
        state.id_ex.valid = true;
        state.id_ex.inst = Instruction::decode(encoder::lw(8, 0, 16));
        state.if_id.valid = true;
        state.if_id.raw = raw;
        state
    }

    #[test]
    fn load_use_hazard_fires_on_either_source() {
        // lw $t0, ... followed by add $t2, $t0, $t1
        let state = state_with_load_then(encoder::add(10, 8, 9));
        assert!(state.load_use_hazard());
        // and by add $t2, $t1, $t0
        let state = state_with_load_then(encoder::add(10, 9, 8));
        assert!(state.load_use_hazard());
    }

    #[test]
    fn no_hazard_without_a_dependency() {
        let state = state_with_load_then(encoder::add(10, 9, 11));
        assert!(!state.load_use_hazard());
    }

    #[test]
    fn no_hazard_when_the_producer_is_not_a_load() {
        let mut state = state_with_load_then(encoder::add(10, 8, 9));
        state.id_ex.inst = Instruction::decode(encoder::add(8, 1, 2));
        assert!(!state.load_use_hazard());
    }

    #[test]
    fn no_hazard_on_a_bubble_or_register_zero() {
        let mut state = state_with_load_then(encoder::add(10, 8, 9));
        state.id_ex.valid = false;
        assert!(!state.load_use_hazard());

        // lw $zero never hazards
        let mut state = state_with_load_then(encoder::add(10, 8, 9));
        state.id_ex.inst = Instruction::decode(encoder::lw(0, 0, 16));
        assert!(!state.load_use_hazard());
    }

    #[test]
    fn ex_forwarding_requires_a_pending_register_write() {
        let mut state = PipelineState::default();
        state.id_ex.inst = Instruction::decode(encoder::add(10, 8, 9));
        state.ex_mem.valid = true;
        state.ex_mem.inst = Instruction::decode(encoder::addi(8, 0, 1));
        state.ex_mem.write_reg = 8;
        assert!(state.ex_forward_rs());
        assert!(!state.ex_forward_rt());

        // A store one ahead writes no register, so nothing forwards.
        state.ex_mem.inst = Instruction::decode(encoder::sw(8, 0, 16));
        assert!(!state.ex_forward_rs());
    }

    #[test]
    fn register_zero_is_never_forwarded() {
        let mut state = PipelineState::default();
        state.id_ex.inst = Instruction::decode(encoder::add(10, 0, 9));
        state.ex_mem.valid = true;
        state.ex_mem.inst = Instruction::decode(encoder::addi(8, 0, 1));
        state.ex_mem.write_reg = 0;
        assert!(!state.ex_forward_rs());
        assert!(!state.mem_forward_rs());
    }
}
