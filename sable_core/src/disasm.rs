//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::bytecode::*;

pub struct Disassembler<'a> {
    bytecode: &'a [Bytecode],
    constants: &'a [smol_str::SmolStr],
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [Bytecode]) -> Self {
        Self {
            bytecode,
            constants: &[],
        }
    }

    /// Show string constants inline next to `LOADK` instructions.
    pub fn with_constants(mut self, constants: &'a [smol_str::SmolStr]) -> Self {
        self.constants = constants;
        self
    }

    /// Render the whole function body, one instruction per line.
    pub fn to_text(&self) -> Result<String, fmt::Error> {
        let mut s = String::new();
        self.disassemble(&mut s)?;
        Ok(s)
    }

    /// Write every instruction to the given writer.
    ///
    /// Malformed words are written as a raw hex dump and stop the listing.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        for item in Decoder::new(self.bytecode) {
            match item {
                Ok((index, instr)) => self.dis_instruction(w, index, &instr)?,
                Err(err) => {
                    writeln!(w, "; {}", err)?;
                    break;
                }
            }
        }

        Ok(())
    }

    fn dis_instruction<W: FmtWrite>(&self, w: &mut W, index: usize, instr: &Instruction) -> fmt::Result {
        write!(w, "{:04}: {}", index, instr)?;

        if let Some(target) = instr.jump_target(index) {
            write!(w, " -> {:04}", target)?;
        }

        if let Instruction::LoadConstant { index: constant, .. } = instr {
            if let Some(value) = self.constants.get(*constant as usize) {
                write!(w, " ; {:?}", value.as_str())?;
            }
        }

        writeln!(w)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_jump_targets() {
        let code = [
            Bytecode::load_immediate(0, ImmediateKind::Bool, 1),
            Bytecode::jump_if_false(0, 2),
            Bytecode::binary(OpCode::Add, 1, 1, 1),
            Bytecode::jump(-3),
            Bytecode::ret(),
        ];

        let text = Disassembler::new(&code).to_text().unwrap();
        assert_eq!(
            text,
            "0000: LOADI $0, true\n\
             0001: JMPF $0, +2 -> 0003\n\
             0002: ADD $1, $1, $1\n\
             0003: JUMP -3 -> 0000\n\
             0004: RET\n"
        );
    }

    #[test]
    fn test_constants_inline() {
        let constants = [smol_str::SmolStr::new("hi")];
        let code = [Bytecode::load_constant(2, 0)];
        let text = Disassembler::new(&code)
            .with_constants(&constants)
            .to_text()
            .unwrap();
        assert_eq!(text, "0000: LOADK $2, #0 ; \"hi\"\n");
    }
}
