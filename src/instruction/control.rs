//! Instruction classification and control-signal generation.
//!
//! Both are pure, stateless mappings from (opcode, funct). Control
//! lookup checks the specific subtype table first, then falls back to
//! the coarser type table, then to an all-disabled default; this
//! precedence lets lw/sw override the generic I-type entry.

use super::{Controls, Function, InstrKind, MemToReg, RegDst};
use crate::alu::{AluOp, AluSrc};

pub const OP_R_TYPE: u32 = 0x00;
pub const OP_J: u32 = 0x02;
pub const OP_JAL: u32 = 0x03;
pub const OP_BEQ: u32 = 0x04;
pub const OP_BNE: u32 = 0x05;
pub const OP_ADDI: u32 = 0x08;
pub const OP_LW: u32 = 0x23;
pub const OP_SW: u32 = 0x2b;

pub const FUNCT_SLL: u32 = 0x00;
pub const FUNCT_SRL: u32 = 0x02;
pub const FUNCT_SRA: u32 = 0x03;
pub const FUNCT_ADD: u32 = 0x20;
pub const FUNCT_SUB: u32 = 0x22;
pub const FUNCT_AND: u32 = 0x24;
pub const FUNCT_OR: u32 = 0x25;
pub const FUNCT_SLT: u32 = 0x2a;

/// Classifies a raw (opcode, funct) pair into a type and subtype.
/// Unknown combinations map to the explicit inert variants, never to an
/// error.
pub fn classify(opcode: u32, funct: u32) -> (InstrKind, Function) {
    match opcode {
        OP_R_TYPE => {
            let function = match funct {
                FUNCT_ADD => Function::Add,
                FUNCT_SUB => Function::Sub,
                FUNCT_AND => Function::And,
                FUNCT_OR => Function::Or,
                FUNCT_SLT => Function::Slt,
                FUNCT_SLL => Function::Sll,
                FUNCT_SRL => Function::Srl,
                FUNCT_SRA => Function::Sra,
                _ => Function::Unknown,
            };
            (InstrKind::R, function)
        }
        OP_LW => (InstrKind::I, Function::Lw),
        OP_SW => (InstrKind::I, Function::Sw),
        OP_ADDI => (InstrKind::I, Function::Addi),
        OP_BEQ => (InstrKind::Branch, Function::Beq),
        OP_BNE => (InstrKind::Branch, Function::Bne),
        OP_J => (InstrKind::Jump, Function::J),
        OP_JAL => (InstrKind::Jump, Function::Jal),
        _ => (InstrKind::Unknown, Function::Unknown),
    }
}

/// Control-signal lookup: subtype table, then type table, then the
/// all-disabled default.
pub fn signals(kind: InstrKind, function: Function) -> Controls {
    subtype_signals(function)
        .or_else(|| kind_signals(kind, function))
        .unwrap_or_default()
}

/// Subtype-specific entries that override their type's defaults.
fn subtype_signals(function: Function) -> Option<Controls> {
    let controls = match function {
        Function::Lw => Controls {
            reg_write: true,
            alu_src: AluSrc::Imm,
            mem_read: true,
            mem_to_reg: MemToReg::Mem,
            alu_op: AluOp::Add,
            ..Controls::default()
        },
        Function::Sw => Controls {
            alu_src: AluSrc::Imm,
            mem_write: true,
            alu_op: AluOp::Add,
            ..Controls::default()
        },
        Function::Bne => Controls {
            branch: true,
            branch_on_not_equal: true,
            alu_op: AluOp::Sub,
            ..Controls::default()
        },
        Function::Jal => Controls {
            reg_write: true,
            jump: true,
            link: true,
            ..Controls::default()
        },
        _ => return None,
    };
    Some(controls)
}

/// Per-type defaults.
fn kind_signals(kind: InstrKind, function: Function) -> Option<Controls> {
    let controls = match kind {
        InstrKind::R => Controls {
            reg_write: true,
            reg_dst: RegDst::Rd,
            alu_op: r_type_alu_op(function),
            ..Controls::default()
        },
        InstrKind::I => Controls {
            reg_write: true,
            alu_src: AluSrc::Imm,
            alu_op: AluOp::Add,
            ..Controls::default()
        },
        InstrKind::Branch => Controls {
            branch: true,
            alu_op: AluOp::Sub,
            ..Controls::default()
        },
        InstrKind::Jump => Controls {
            jump: true,
            ..Controls::default()
        },
        InstrKind::Unknown => return None,
    };
    Some(controls)
}

/// Maps an R-type subtype to its ALU operation; unrecognized subtypes
/// default to ADD.
fn r_type_alu_op(function: Function) -> AluOp {
    match function {
        Function::Sub => AluOp::Sub,
        Function::And => AluOp::And,
        Function::Or => AluOp::Or,
        Function::Slt => AluOp::Slt,
        Function::Sll => AluOp::Sll,
        Function::Srl => AluOp::Srl,
        Function::Sra => AluOp::Sra,
        _ => AluOp::Add,
    }
}
