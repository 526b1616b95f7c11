//! Shared definitions between the Sable compiler and its virtual machine.
pub mod bytecode;
pub mod disasm;
pub mod types;

pub mod prelude {
    pub use super::bytecode::{Bytecode, Immediate, ImmediateKind, Instruction, OpCode, Slot};
    pub use super::disasm::Disassembler;
    pub use super::types::{TypeHandle, TypeRegistry};
}
