//! ALU implementation

/// Performs an atomic ALU operation on 32-bit operands.
///
/// ADD and SUB wrap silently modulo 2^32; there is no overflow trap.
/// Shift amounts are masked to 5 bits.
pub fn evaluate(op: AluOp, op1: u32, op2: u32, shamt: u32) -> u32 {
    let shamt = shamt & 0x1f;
    match op {
        AluOp::Add => op1.wrapping_add(op2),
        AluOp::Sub => op1.wrapping_sub(op2),
        AluOp::And => op1 & op2,
        AluOp::Or => op1 | op2,
        AluOp::Slt => u32::from(op1 < op2),
        AluOp::Sll => op1 << shamt,
        AluOp::Srl => op1 >> shamt,
        AluOp::Sra => shift_right_arithmetic(op1, shamt),
    }
}

/// SRA: a negative operand has the vacated high bits filled with ones,
/// using a mask built from the shift amount.
fn shift_right_arithmetic(value: u32, shamt: u32) -> u32 {
    if value & 0x8000_0000 != 0 {
        let mask = if shamt == 0 {
            0
        } else {
            0xffff_ffff_u32 << (32 - shamt)
        };
        (value >> shamt) | mask
    } else {
        value >> shamt
    }
}

/// Selector for ALU src2 input
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AluSrc {
    /// From register
    #[default]
    Reg,
    /// From sign-extended immediate
    Imm,
}

/// Set of ALU operations needed for the MIPS subset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AluOp {
    // Arithmetic
    #[default]
    Add,
    Sub,
    // Logical
    And,
    Or,
    // Set
    Slt,
    // Shift
    Sll,
    Srl,
    Sra,
}
