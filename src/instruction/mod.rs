//! Instruction representation

use crate::alu::{AluOp, AluSrc};

pub mod control;

/// NOP: add $zero, $zero, $zero
pub const NOP: u32 = 0x0000_0020;

/// Termination sentinel: all 32 bits set, never a valid instruction.
/// Fetching it halts the pipeline.
pub const HALT: u32 = 0xffff_ffff;

/// One decoded instruction: the raw word, its structural fields, its
/// type/subtype classification and the control signals it drives
/// through the pipeline.
#[derive(Clone, Copy, Debug)]
pub struct Instruction {
    /// Raw 32-bit representation
    pub raw: u32,
    /// Structural fields
    pub fields: Fields,
    /// Coarse type
    pub kind: InstrKind,
    /// Specific subtype
    pub function: Function,
    /// Control signals
    pub controls: Controls,
}

impl Instruction {
    /// Decodes a raw word. Unknown encodings are not an error: they
    /// classify as [`InstrKind::Unknown`] with all-disabled control
    /// signals and execute as a harmless no-op.
    pub fn decode(raw: u32) -> Self {
        let fields = Fields::extract(raw);
        let (kind, function) = control::classify(fields.opcode, fields.funct);
        let controls = control::signals(kind, function);
        Self {
            raw,
            fields,
            kind,
            function,
            controls,
        }
    }

    /// Destination register selected by RegDst (rd for R-type, rt
    /// otherwise).
    pub fn destination(&self) -> u32 {
        match self.controls.reg_dst {
            RegDst::Rd => self.fields.rd,
            RegDst::Rt => self.fields.rt,
        }
    }

    /// Human-readable description, e.g. "R-type: add" or
    /// "unknown instruction (opcode 0x3f)".
    pub fn describe(&self) -> String {
        match self.kind {
            InstrKind::R => format!("R-type: {}", self.function.mnemonic()),
            InstrKind::I => format!("I-type: {}", self.function.mnemonic()),
            InstrKind::Branch => format!("branch: {}", self.function.mnemonic()),
            InstrKind::Jump => match self.function {
                Function::Jal => "jump and link".to_string(),
                _ => "jump".to_string(),
            },
            InstrKind::Unknown => {
                format!("unknown instruction (opcode {:#04x})", self.fields.opcode)
            }
        }
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self::decode(NOP)
    }
}

/// Raw bit fields of a 32-bit word, extracted once during decode and
/// read-only from then on.
///
/// Formats:
///   R: `[opcode:6][rs:5][rt:5][rd:5][shamt:5][funct:6]`
///   I: `[opcode:6][rs:5][rt:5][immediate:16]`
///   J: `[opcode:6][address:26]`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fields {
    pub opcode: u32,
    pub rs: u32,
    pub rt: u32,
    pub rd: u32,
    pub shamt: u32,
    pub funct: u32,
    /// 16-bit immediate, zero-extended
    pub immediate: u32,
    /// 16-bit immediate, sign-extended
    pub immediate_signed: i32,
    /// 26-bit jump address
    pub jump_target: u32,
}

impl Fields {
    pub fn extract(raw: u32) -> Self {
        Self {
            opcode: (raw >> 26) & 0x3f,
            rs: (raw >> 21) & 0x1f,
            rt: (raw >> 16) & 0x1f,
            rd: (raw >> 11) & 0x1f,
            shamt: (raw >> 6) & 0x1f,
            funct: raw & 0x3f,
            immediate: raw & 0xffff,
            immediate_signed: i32::from((raw & 0xffff) as u16 as i16),
            jump_target: raw & 0x03ff_ffff,
        }
    }
}

/// Coarse instruction type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InstrKind {
    R,
    I,
    Branch,
    Jump,
    #[default]
    Unknown,
}

/// Specific instruction subtype
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Function {
    Add,
    Sub,
    And,
    Or,
    Slt,
    Sll,
    Srl,
    Sra,
    Lw,
    Sw,
    Addi,
    Beq,
    Bne,
    J,
    Jal,
    #[default]
    Unknown,
}

impl Function {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Function::Add => "add",
            Function::Sub => "sub",
            Function::And => "and",
            Function::Or => "or",
            Function::Slt => "slt",
            Function::Sll => "sll",
            Function::Srl => "srl",
            Function::Sra => "sra",
            Function::Lw => "lw",
            Function::Sw => "sw",
            Function::Addi => "addi",
            Function::Beq => "beq",
            Function::Bne => "bne",
            Function::J => "j",
            Function::Jal => "jal",
            Function::Unknown => "unknown",
        }
    }
}

/// Destination-register selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RegDst {
    /// Destination is rt (I-type)
    #[default]
    Rt,
    /// Destination is rd (R-type)
    Rd,
}

/// Writeback-data selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MemToReg {
    /// Data comes from the ALU
    #[default]
    Alu,
    /// Data comes from memory (loads)
    Mem,
}

/// Control signal set, produced once in decode and carried read-only
/// through EX/MEM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub reg_write: bool,
    pub reg_dst: RegDst,
    pub alu_src: AluSrc,
    pub mem_to_reg: MemToReg,
    pub mem_read: bool,
    pub mem_write: bool,
    pub branch: bool,
    /// Distinguishes bne from beq: take the branch on a nonzero ALU
    /// result instead of a zero one.
    pub branch_on_not_equal: bool,
    pub jump: bool,
    /// Jump-and-link: write the return address to $ra.
    pub link: bool,
    pub alu_op: AluOp,
}
