//! Instruction encoding helpers and the built-in demo program.
//!
//! These build the same 32-bit formats the decoder takes apart. Shift
//! helpers put the value to shift in rs, matching the execute stage,
//! which always feeds the rs operand to the ALU's first input.

use std::fs;
use std::path::Path;

use crate::instruction::control::{
    FUNCT_ADD, FUNCT_AND, FUNCT_OR, FUNCT_SLL, FUNCT_SLT, FUNCT_SRA, FUNCT_SRL,
    FUNCT_SUB, OP_ADDI, OP_BEQ, OP_BNE, OP_J, OP_JAL, OP_LW, OP_SW,
};
use crate::instruction::{HALT, NOP};

fn r_type(funct: u32, rd: u32, rs: u32, rt: u32, shamt: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | (shamt << 6) | funct
}

fn i_type(opcode: u32, rt: u32, rs: u32, imm: i16) -> u32 {
    (opcode << 26) | (rs << 21) | (rt << 16) | (imm as u16 as u32)
}

fn j_type(opcode: u32, target: u32) -> u32 {
    (opcode << 26) | (target & 0x03ff_ffff)
}

pub fn add(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_ADD, rd, rs, rt, 0)
}

pub fn sub(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_SUB, rd, rs, rt, 0)
}

pub fn and(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_AND, rd, rs, rt, 0)
}

pub fn or(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_OR, rd, rs, rt, 0)
}

pub fn slt(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(FUNCT_SLT, rd, rs, rt, 0)
}

/// rd = rs << shamt
pub fn sll(rd: u32, rs: u32, shamt: u32) -> u32 {
    r_type(FUNCT_SLL, rd, rs, 0, shamt)
}

/// rd = rs >> shamt, logical
pub fn srl(rd: u32, rs: u32, shamt: u32) -> u32 {
    r_type(FUNCT_SRL, rd, rs, 0, shamt)
}

/// rd = rs >> shamt, arithmetic
pub fn sra(rd: u32, rs: u32, shamt: u32) -> u32 {
    r_type(FUNCT_SRA, rd, rs, 0, shamt)
}

pub fn addi(rt: u32, rs: u32, imm: i16) -> u32 {
    i_type(OP_ADDI, rt, rs, imm)
}

pub fn lw(rt: u32, offset: i16, base: u32) -> u32 {
    i_type(OP_LW, rt, base, offset)
}

pub fn sw(rt: u32, offset: i16, base: u32) -> u32 {
    i_type(OP_SW, rt, base, offset)
}

/// Offset is in words, relative to the instruction after the branch.
pub fn beq(rs: u32, rt: u32, offset: i16) -> u32 {
    i_type(OP_BEQ, rt, rs, offset)
}

/// Offset is in words, relative to the instruction after the branch.
pub fn bne(rs: u32, rt: u32, offset: i16) -> u32 {
    i_type(OP_BNE, rt, rs, offset)
}

/// Target is a word index into the text section.
pub fn j(target: u32) -> u32 {
    j_type(OP_J, target)
}

/// Target is a word index into the text section.
pub fn jal(target: u32) -> u32 {
    j_type(OP_JAL, target)
}

pub fn nop() -> u32 {
    NOP
}

/// Element-wise sum of two six-element vectors.
///
/// v1 = [0,2,4,6,8,10] at 0x10000, v2 = [1,3,5,7,9,11] at 0x10100; the
/// sums land at 0x10200. The loop leans on forwarding and the load-use
/// stall instead of NOP padding; the only NOP is the landing slot
/// between the backward jump and the halt sentinel, so the jump
/// resolves before the sentinel is fetched.
pub fn vector_sum_demo() -> Vec<u32> {
    const AT: u32 = 1;
    const T0: u32 = 8;
    const T1: u32 = 9;
    const T2: u32 = 10;
    const T3: u32 = 11;
    const T4: u32 = 12;
    const T5: u32 = 13;
    const T6: u32 = 14;
    const S0: u32 = 16;
    const S1: u32 = 17;
    const S2: u32 = 18;

    let mut program = vec![
        // Section bases do not fit a 16-bit immediate; build them with
        // a shift.
        addi(AT, 0, 0x0100),
        sll(S0, AT, 8), // 0x10000, v1
        addi(AT, 0, 0x0101),
        sll(S1, AT, 8), // 0x10100, v2
        addi(AT, 0, 0x0102),
        sll(S2, AT, 8), // 0x10200, v3
    ];

    for i in 0..6u32 {
        program.push(addi(T0, 0, 2 * i as i16));
        program.push(sw(T0, 4 * i as i16, S0));
    }
    for i in 0..6u32 {
        program.push(addi(T0, 0, 2 * i as i16 + 1));
        program.push(sw(T0, 4 * i as i16, S1));
    }

    program.push(addi(T1, 0, 0)); // i = 0
    program.push(addi(T2, 0, 24)); // byte limit

    let loop_top = program.len() as u32;
    program.extend([
        add(T6, S0, T1),
        lw(T3, 0, T6),
        add(T6, S1, T1),
        lw(T4, 0, T6),
        add(T5, T3, T4),
        add(T6, S2, T1),
        sw(T5, 0, T6),
        addi(T1, T1, 4),
        beq(T1, T2, 1), // done: skip the jump
        j(loop_top),
        nop(), // branch landing slot
        HALT,
    ]);

    program
}

/// Writes words to disk big-endian, the image format the loader reads.
pub fn write_image(path: &Path, words: &[u32]) -> std::io::Result<()> {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for word in words {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{Function, InstrKind, Instruction};
    use crate::loader;

    #[test]
    fn encoded_r_type_decodes_back() {
        let inst = Instruction::decode(add(10, 8, 9));
        assert_eq!(inst.kind, InstrKind::R);
        assert_eq!(inst.function, Function::Add);
        assert_eq!(inst.fields.rd, 10);
        assert_eq!(inst.fields.rs, 8);
        assert_eq!(inst.fields.rt, 9);

        let inst = Instruction::decode(sll(16, 1, 8));
        assert_eq!(inst.function, Function::Sll);
        assert_eq!(inst.fields.rs, 1);
        assert_eq!(inst.fields.shamt, 8);
    }

    #[test]
    fn encoded_i_type_decodes_back() {
        let inst = Instruction::decode(lw(8, -4, 29));
        assert_eq!(inst.function, Function::Lw);
        assert_eq!(inst.fields.rt, 8);
        assert_eq!(inst.fields.rs, 29);
        assert_eq!(inst.fields.immediate_signed, -4);
    }

    #[test]
    fn encoded_jump_keeps_the_word_index() {
        let inst = Instruction::decode(j(32));
        assert_eq!(inst.function, Function::J);
        assert_eq!(inst.fields.jump_target, 32);
    }

    #[test]
    fn the_demo_ends_with_the_sentinel() {
        let program = vector_sum_demo();
        assert_eq!(*program.last().unwrap(), HALT);
        assert_eq!(program[program.len() - 2], NOP);
    }

    #[test]
    fn written_images_load_back() {
        let dir = std::env::temp_dir().join("mips32-pipeline-sim-encoder-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("demo.bin");

        let program = vector_sum_demo();
        write_image(&path, &program).unwrap();
        assert_eq!(loader::read_image(&path).unwrap(), program);
    }
}
