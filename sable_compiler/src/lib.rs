pub mod ast;
pub mod compile;
pub mod error;
pub mod lex;
pub mod parsing;
pub mod position;
pub mod tokens;

pub use compile::{CompiledFunction, CompiledProgram, Compiler, CompilerConf};
pub use error::{CompileError, CompileErrorKind};

/// Compile a source file with the default configuration.
pub fn compile_str(source_name: &str, source: &str) -> Result<CompiledProgram, Vec<CompileError>> {
    Compiler::new(CompilerConf::default()).compile(source_name, source)
}
