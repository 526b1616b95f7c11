//! Fixed-width instruction words shared between the compiler and the interpreter.
//!
//! Every instruction is a single 64-bit word. The lowest byte holds the
//! opcode, the remaining bits are interpreted according to the opcode family:
//!
//! ```text
//! ABC        | op:8 | a:16 | b:16 | c:16 | unused:8 |
//! Jump       | op:8 | a:16 | unused:8   | offset:32  |
//! Immediate  | op:8 | a:16 | kind:8     | imm:32     |
//! ```
//!
//! Values that don't fit in the 32-bit immediate are loaded with
//! [`OpCode::LoadImmediateWide`], whose header word is followed by one raw
//! payload word holding the full 64 bits.
//!
//! Jump offsets are deltas in instruction words, relative to the index of
//! the jump itself.
use std::fmt;

use thiserror::Error;

/// Index of a stack variable inside a function frame.
pub type Slot = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[rustfmt::skip]
pub enum OpCode {
    Nop               = 0x00,
    LoadImmediate     = 0x01,
    LoadImmediateWide = 0x02,
    LoadConstant      = 0x03,
    Move              = 0x04,

    // ------------------------------------------------------------------------
    // Control flow
    Jump        = 0x10,
    JumpIfFalse = 0x11,
    Return      = 0x12,
    ReturnValue = 0x13,

    // ------------------------------------------------------------------------
    // Arithmetic
    Add      = 0x20,
    Subtract = 0x21,
    Multiply = 0x22,
    Divide   = 0x23,
    Modulo   = 0x24,

    // ------------------------------------------------------------------------
    // Bitwise
    BitAnd     = 0x28,
    BitOr      = 0x29,
    BitXor     = 0x2A,
    ShiftLeft  = 0x2B,
    ShiftRight = 0x2C,

    // ------------------------------------------------------------------------
    // Comparison and logic
    Equal          = 0x30,
    NotEqual       = 0x31,
    Less           = 0x32,
    LessOrEqual    = 0x33,
    Greater        = 0x34,
    GreaterOrEqual = 0x35,
    And            = 0x38,
    Or             = 0x39,

    // ------------------------------------------------------------------------
    // Structs
    MemberLoad  = 0x40,
    MemberStore = 0x41,

    // ------------------------------------------------------------------------
    // Shared variable locking
    SyncAcquire = 0x50,
    SyncRelease = 0x51,
}

impl OpCode {
    #[rustfmt::skip]
    pub fn from_u8(byte: u8) -> Option<Self> {
        use OpCode as O;
        match byte {
            0x00 => Some(O::Nop),
            0x01 => Some(O::LoadImmediate),
            0x02 => Some(O::LoadImmediateWide),
            0x03 => Some(O::LoadConstant),
            0x04 => Some(O::Move),
            0x10 => Some(O::Jump),
            0x11 => Some(O::JumpIfFalse),
            0x12 => Some(O::Return),
            0x13 => Some(O::ReturnValue),
            0x20 => Some(O::Add),
            0x21 => Some(O::Subtract),
            0x22 => Some(O::Multiply),
            0x23 => Some(O::Divide),
            0x24 => Some(O::Modulo),
            0x28 => Some(O::BitAnd),
            0x29 => Some(O::BitOr),
            0x2A => Some(O::BitXor),
            0x2B => Some(O::ShiftLeft),
            0x2C => Some(O::ShiftRight),
            0x30 => Some(O::Equal),
            0x31 => Some(O::NotEqual),
            0x32 => Some(O::Less),
            0x33 => Some(O::LessOrEqual),
            0x34 => Some(O::Greater),
            0x35 => Some(O::GreaterOrEqual),
            0x38 => Some(O::And),
            0x39 => Some(O::Or),
            0x40 => Some(O::MemberLoad),
            0x41 => Some(O::MemberStore),
            0x50 => Some(O::SyncAcquire),
            0x51 => Some(O::SyncRelease),
            _ => None,
        }
    }

    /// Indicates whether the opcode uses the three slot `dst, lhs, rhs` layout
    /// of binary operators.
    #[inline]
    pub fn is_binary(&self) -> bool {
        matches!(*self as u8, 0x20..=0x2C | 0x30..=0x39)
    }

    #[rustfmt::skip]
    pub fn mnemonic(&self) -> &'static str {
        use OpCode as O;
        match self {
            O::Nop               => "NOP",
            O::LoadImmediate     => "LOADI",
            O::LoadImmediateWide => "LOADW",
            O::LoadConstant      => "LOADK",
            O::Move              => "MOVE",
            O::Jump              => "JUMP",
            O::JumpIfFalse       => "JMPF",
            O::Return            => "RET",
            O::ReturnValue       => "RETV",
            O::Add               => "ADD",
            O::Subtract          => "SUB",
            O::Multiply          => "MUL",
            O::Divide            => "DIV",
            O::Modulo            => "MOD",
            O::BitAnd            => "BAND",
            O::BitOr             => "BOR",
            O::BitXor            => "BXOR",
            O::ShiftLeft         => "SHL",
            O::ShiftRight        => "SHR",
            O::Equal             => "EQ",
            O::NotEqual          => "NE",
            O::Less              => "LT",
            O::LessOrEqual       => "LE",
            O::Greater           => "GT",
            O::GreaterOrEqual    => "GE",
            O::And               => "AND",
            O::Or                => "OR",
            O::MemberLoad        => "MLOAD",
            O::MemberStore       => "MSTORE",
            O::SyncAcquire       => "SYNC",
            O::SyncRelease       => "UNSYNC",
        }
    }
}

/// Type tag of a load-immediate instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ImmediateKind {
    Int = 0,
    Float = 1,
    Bool = 2,
}

impl ImmediateKind {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Int),
            1 => Some(Self::Float),
            2 => Some(Self::Bool),
            _ => None,
        }
    }
}

/// Literal value carried by a load-immediate instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Immediate {
    pub fn kind(&self) -> ImmediateKind {
        match self {
            Self::Int(_) => ImmediateKind::Int,
            Self::Float(_) => ImmediateKind::Float,
            Self::Bool(_) => ImmediateKind::Bool,
        }
    }

    /// Returns the value as a 32-bit immediate when it fits in a single word.
    ///
    /// Floats are always loaded wide so their bits survive unchanged.
    pub fn narrow(&self) -> Option<i32> {
        match *self {
            Self::Int(value) => i32::try_from(value).ok(),
            Self::Float(_) => None,
            Self::Bool(value) => Some(value as i32),
        }
    }

    /// Raw 64-bit payload for the wide encoding.
    pub fn bits(&self) -> u64 {
        match *self {
            Self::Int(value) => value as u64,
            Self::Float(value) => value.to_bits(),
            Self::Bool(value) => value as u64,
        }
    }

    fn from_bits(kind: ImmediateKind, bits: u64) -> Self {
        match kind {
            ImmediateKind::Int => Self::Int(bits as i64),
            ImmediateKind::Float => Self::Float(f64::from_bits(bits)),
            ImmediateKind::Bool => Self::Bool(bits != 0),
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// Single encoded instruction word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bytecode(u64);

impl Bytecode {
    #[inline(always)]
    pub const fn from_raw(word: u64) -> Self {
        Self(word)
    }

    #[inline(always)]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline(always)]
    const fn abc(op: OpCode, a: u16, b: u16, c: u16) -> Self {
        Self(op as u64 | (a as u64) << 8 | (b as u64) << 24 | (c as u64) << 40)
    }

    #[inline(always)]
    const fn jump_layout(op: OpCode, a: u16, offset: i32) -> Self {
        Self(op as u64 | (a as u64) << 8 | (offset as u32 as u64) << 32)
    }

    pub const fn nop() -> Self {
        Self::abc(OpCode::Nop, 0, 0, 0)
    }

    /// Load a 32-bit immediate into the destination slot.
    pub const fn load_immediate(dst: Slot, kind: ImmediateKind, imm: i32) -> Self {
        Self(
            OpCode::LoadImmediate as u64
                | (dst as u64) << 8
                | (kind as u64) << 24
                | (imm as u32 as u64) << 32,
        )
    }

    /// Header of a wide load. Must be followed by a [`Bytecode::payload`] word.
    pub const fn load_immediate_wide(dst: Slot, kind: ImmediateKind) -> Self {
        Self(OpCode::LoadImmediateWide as u64 | (dst as u64) << 8 | (kind as u64) << 24)
    }

    /// Raw data word following a wide load header.
    pub const fn payload(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn load_constant(dst: Slot, index: u16) -> Self {
        Self::abc(OpCode::LoadConstant, dst, index, 0)
    }

    pub const fn mov(dst: Slot, src: Slot) -> Self {
        Self::abc(OpCode::Move, dst, src, 0)
    }

    pub const fn jump(offset: i32) -> Self {
        Self::jump_layout(OpCode::Jump, 0, offset)
    }

    pub const fn jump_if_false(condition: Slot, offset: i32) -> Self {
        Self::jump_layout(OpCode::JumpIfFalse, condition, offset)
    }

    pub const fn ret() -> Self {
        Self::abc(OpCode::Return, 0, 0, 0)
    }

    pub const fn ret_value(src: Slot) -> Self {
        Self::abc(OpCode::ReturnValue, src, 0, 0)
    }

    /// Binary operator writing `lhs <op> rhs` into `dst`.
    pub fn binary(op: OpCode, dst: Slot, lhs: Slot, rhs: Slot) -> Self {
        debug_assert!(op.is_binary(), "{:?} is not a binary operator", op);
        Self::abc(op, dst, lhs, rhs)
    }

    /// Load the field at index `field` of the struct in `object` into `dst`.
    pub const fn member_load(dst: Slot, object: Slot, field: u16) -> Self {
        Self::abc(OpCode::MemberLoad, dst, object, field)
    }

    /// Store `src` into the field at index `field` of the struct in `object`.
    pub const fn member_store(object: Slot, field: u16, src: Slot) -> Self {
        Self::abc(OpCode::MemberStore, object, src, field)
    }

    pub const fn sync_acquire(slot: Slot, exclusive: bool) -> Self {
        Self::abc(OpCode::SyncAcquire, slot, exclusive as u16, 0)
    }

    /// Release the `count` most recently acquired locks.
    pub const fn sync_release(count: u16) -> Self {
        Self::abc(OpCode::SyncRelease, count, 0, 0)
    }

    // ------------------------------------------------------------------------
    // Operand extraction

    /// Opcode stored in the lowest byte, if it's a known one.
    #[inline(always)]
    pub fn opcode(self) -> Option<OpCode> {
        OpCode::from_u8(self.op_byte())
    }

    #[inline(always)]
    pub fn op_byte(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Extract operand A, the destination or primary slot.
    #[inline(always)]
    pub fn op_a(self) -> u16 {
        ((self.0 >> 8) & 0xFFFF) as u16
    }

    /// Extract operand B.
    #[inline(always)]
    pub fn op_b(self) -> u16 {
        ((self.0 >> 24) & 0xFFFF) as u16
    }

    /// Extract operand C.
    #[inline(always)]
    pub fn op_c(self) -> u16 {
        ((self.0 >> 40) & 0xFFFF) as u16
    }

    /// Extract the immediate type tag.
    #[inline(always)]
    pub fn op_kind(self) -> u8 {
        ((self.0 >> 24) & 0xFF) as u8
    }

    /// Extract the signed 32-bit field shared by immediates and jump offsets.
    #[inline(always)]
    pub fn op_imm(self) -> i32 {
        (self.0 >> 32) as u32 as i32
    }

    /// Replace the jump offset, keeping opcode and condition slot.
    ///
    /// Used to backpatch forward jumps once the target is known.
    #[inline]
    pub fn with_offset(self, offset: i32) -> Self {
        Self((self.0 & 0xFFFF_FFFF) | (offset as u32 as u64) << 32)
    }
}

impl fmt::Debug for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytecode({:016X})", self.0)
    }
}

/// Structured view of an instruction, as the interpreter decodes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    Nop,
    LoadImmediate { dst: Slot, value: Immediate },
    LoadConstant { dst: Slot, index: u16 },
    Move { dst: Slot, src: Slot },
    Jump { offset: i32 },
    JumpIfFalse { condition: Slot, offset: i32 },
    Return,
    ReturnValue { src: Slot },
    Binary { op: OpCode, dst: Slot, lhs: Slot, rhs: Slot },
    MemberLoad { dst: Slot, object: Slot, field: u16 },
    MemberStore { object: Slot, field: u16, src: Slot },
    SyncAcquire { slot: Slot, exclusive: bool },
    SyncRelease { count: u16 },
}

impl Instruction {
    /// Absolute target of a jump located at `index`.
    pub fn jump_target(&self, index: usize) -> Option<usize> {
        match *self {
            Self::Jump { offset } | Self::JumpIfFalse { offset, .. } => {
                usize::try_from(index as i64 + offset as i64).ok()
            }
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction as I;
        match *self {
            I::Nop                              => write!(f, "NOP"),
            I::LoadImmediate { dst, value }     => write!(f, "LOADI ${dst}, {value}"),
            I::LoadConstant { dst, index }      => write!(f, "LOADK ${dst}, #{index}"),
            I::Move { dst, src }                => write!(f, "MOVE ${dst}, ${src}"),
            I::Jump { offset }                  => write!(f, "JUMP {offset:+}"),
            I::JumpIfFalse { condition, offset } => write!(f, "JMPF ${condition}, {offset:+}"),
            I::Return                           => write!(f, "RET"),
            I::ReturnValue { src }              => write!(f, "RETV ${src}"),
            I::Binary { op, dst, lhs, rhs }     => write!(f, "{} ${dst}, ${lhs}, ${rhs}", op.mnemonic()),
            I::MemberLoad { dst, object, field } => write!(f, "MLOAD ${dst}, ${object}.{field}"),
            I::MemberStore { object, field, src } => write!(f, "MSTORE ${object}.{field}, ${src}"),
            I::SyncAcquire { slot, exclusive }  => write!(f, "SYNC ${slot}, {}", if exclusive { "exclusive" } else { "shared" }),
            I::SyncRelease { count }            => write!(f, "UNSYNC {count}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode 0x{byte:02X} at instruction {index}")]
    UnknownOpcode { index: usize, byte: u8 },
    #[error("unknown immediate kind {kind} at instruction {index}")]
    UnknownImmediateKind { index: usize, kind: u8 },
    #[error("wide load at instruction {index} is missing its payload word")]
    MissingPayload { index: usize },
}

/// Decode the instruction at `index`.
///
/// Returns the instruction and the number of words it occupies.
pub fn decode(code: &[Bytecode], index: usize) -> Result<(Instruction, usize), DecodeError> {
    use Instruction as I;

    let word = code[index];
    let op = word
        .opcode()
        .ok_or(DecodeError::UnknownOpcode { index, byte: word.op_byte() })?;

    let instr = match op {
        OpCode::Nop => I::Nop,
        OpCode::LoadImmediate => {
            let kind = ImmediateKind::from_u8(word.op_kind())
                .ok_or(DecodeError::UnknownImmediateKind { index, kind: word.op_kind() })?;
            let imm = word.op_imm();
            let value = match kind {
                ImmediateKind::Int => Immediate::Int(imm as i64),
                ImmediateKind::Float => Immediate::Float(imm as f64),
                ImmediateKind::Bool => Immediate::Bool(imm != 0),
            };
            I::LoadImmediate { dst: word.op_a(), value }
        }
        OpCode::LoadImmediateWide => {
            let kind = ImmediateKind::from_u8(word.op_kind())
                .ok_or(DecodeError::UnknownImmediateKind { index, kind: word.op_kind() })?;
            let payload = code.get(index + 1).ok_or(DecodeError::MissingPayload { index })?;
            let value = Immediate::from_bits(kind, payload.raw());
            return Ok((I::LoadImmediate { dst: word.op_a(), value }, 2));
        }
        OpCode::LoadConstant => I::LoadConstant { dst: word.op_a(), index: word.op_b() },
        OpCode::Move => I::Move { dst: word.op_a(), src: word.op_b() },
        OpCode::Jump => I::Jump { offset: word.op_imm() },
        OpCode::JumpIfFalse => I::JumpIfFalse { condition: word.op_a(), offset: word.op_imm() },
        OpCode::Return => I::Return,
        OpCode::ReturnValue => I::ReturnValue { src: word.op_a() },
        OpCode::MemberLoad => I::MemberLoad { dst: word.op_a(), object: word.op_b(), field: word.op_c() },
        OpCode::MemberStore => I::MemberStore { object: word.op_a(), src: word.op_b(), field: word.op_c() },
        OpCode::SyncAcquire => I::SyncAcquire { slot: word.op_a(), exclusive: word.op_b() != 0 },
        OpCode::SyncRelease => I::SyncRelease { count: word.op_a() },
        op => I::Binary { op, dst: word.op_a(), lhs: word.op_b(), rhs: word.op_c() },
    };

    Ok((instr, 1))
}

/// Iterator over the decoded instructions of a function body.
///
/// Yields each instruction together with the index of its first word.
pub struct Decoder<'a> {
    code: &'a [Bytecode],
    cursor: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(code: &'a [Bytecode]) -> Self {
        Self { code, cursor: 0 }
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<(usize, Instruction), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.code.len() {
            return None;
        }

        let index = self.cursor;
        match decode(self.code, index) {
            Ok((instr, width)) => {
                self.cursor += width;
                Some(Ok((index, instr)))
            }
            Err(err) => {
                // Stop after the first malformed word.
                self.cursor = self.code.len();
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operand_layout() {
        let word = Bytecode::binary(OpCode::Add, 1, 0x0203, 0xFFFF);
        assert_eq!(word.opcode(), Some(OpCode::Add));
        assert_eq!(word.op_a(), 1);
        assert_eq!(word.op_b(), 0x0203);
        assert_eq!(word.op_c(), 0xFFFF);
    }

    #[test]
    fn test_backpatch_keeps_condition() {
        let word = Bytecode::jump_if_false(7, 0).with_offset(-12);
        assert_eq!(word.opcode(), Some(OpCode::JumpIfFalse));
        assert_eq!(word.op_a(), 7);
        assert_eq!(word.op_imm(), -12);

        let (instr, _) = decode(&[word], 0).unwrap();
        assert_eq!(instr, Instruction::JumpIfFalse { condition: 7, offset: -12 });
        assert_eq!(instr.jump_target(20), Some(8));
    }

    #[test]
    fn test_wide_immediate() {
        let code = [
            Bytecode::load_immediate_wide(3, ImmediateKind::Float),
            Bytecode::payload(2.5f64.to_bits()),
            Bytecode::load_immediate(4, ImmediateKind::Int, -9),
        ];

        let decoded = Decoder::new(&code).collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(
            decoded,
            vec![
                (0, Instruction::LoadImmediate { dst: 3, value: Immediate::Float(2.5) }),
                (2, Instruction::LoadImmediate { dst: 4, value: Immediate::Int(-9) }),
            ]
        );
    }

    #[test]
    fn test_missing_payload() {
        let code = [Bytecode::load_immediate_wide(0, ImmediateKind::Int)];
        assert_eq!(decode(&code, 0), Err(DecodeError::MissingPayload { index: 0 }));
    }

    #[test]
    fn test_unknown_opcode() {
        let code = [Bytecode::from_raw(0xEE)];
        let mut decoder = Decoder::new(&code);
        assert_eq!(
            decoder.next(),
            Some(Err(DecodeError::UnknownOpcode { index: 0, byte: 0xEE }))
        );
        assert_eq!(decoder.next(), None);
    }
}
