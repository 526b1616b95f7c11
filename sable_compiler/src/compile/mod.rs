//! Semantic passes and bytecode generation.
pub mod builder;
pub mod deps;
mod program;
pub mod resolve;
pub mod scope;
pub mod symbol;

use std::collections::HashMap;

use log::debug;
use sable_core::{
    bytecode::Bytecode,
    types::{StructField, TypeHandle, TypeRegistry},
};
use smol_str::SmolStr;

pub use self::program::{CompiledFunction, CompiledProgram};
use self::{
    builder::{BytecodeBuilder, EmitContext},
    deps::{DependencyError, FunctionDependencyGraph},
    resolve::ResolveContext,
};
use crate::{
    ast::{FileNode, FunctionNode},
    error::{CompileError, CompileErrorKind, CompileResult},
    lex::{log_syntax_error, TokenIter},
    parsing::{parse_file, Parser},
    position::{SourceLocation, SourcePosition},
};

#[derive(Debug, Clone, Default)]
pub struct CompilerConf {
    /// Stop collecting errors once this many were found.
    pub max_errors: Option<usize>,
    /// Log the disassembly of every compiled function.
    pub trace_bytecode: bool,
}

pub struct Compiler {
    conf: CompilerConf,
}

impl Compiler {
    pub fn new(conf: CompilerConf) -> Self {
        Self { conf }
    }

    /// Compile one source file.
    ///
    /// Every error found is returned, not only the first.
    pub fn compile(&self, source_name: &str, source: &str) -> Result<CompiledProgram, Vec<CompileError>> {
        let mut reporter = log_syntax_error;
        let mut parser = Parser::new(TokenIter::new(source_name, source, &mut reporter));
        let (mut file, mut errors) = parse_file(&mut parser);

        let mut types = TypeRegistry::new();
        self.register_structs(&file, &mut types, source_name, &mut errors);

        let pass = FunctionPass {
            types: &types,
            source_name,
            conf: &self.conf,
        };
        let functions = pass.run(&mut file, &mut errors);

        if errors.is_empty() {
            Ok(CompiledProgram { types, functions })
        } else {
            if let Some(max) = self.conf.max_errors {
                errors.truncate(max);
            }
            Err(errors)
        }
    }

    /// Declare every struct first so fields can refer to any of them.
    fn register_structs(
        &self,
        file: &FileNode,
        types: &mut TypeRegistry,
        source_name: &str,
        errors: &mut Vec<CompileError>,
    ) {
        let error = |kind, position| CompileError::new(kind, SourceLocation::new(source_name, position));

        let mut declared = Vec::with_capacity(file.structs.len());
        for item in &file.structs {
            match types.declare_struct(&item.name) {
                Some(handle) => declared.push((item, handle)),
                None => errors.push(error(
                    CompileErrorKind::DuplicateSymbol {
                        name: item.name.clone(),
                    },
                    item.position,
                )),
            }
        }

        for (item, handle) in declared {
            // Field indices are encoded in 16 bits.
            if item.fields.len() > usize::from(u16::MAX) + 1 {
                errors.push(error(
                    CompileErrorKind::TooManyFields {
                        name: item.name.clone(),
                    },
                    item.position,
                ));
                continue;
            }

            let mut fields = Vec::with_capacity(item.fields.len());
            for field in &item.fields {
                match types.lookup(&field.ty.name) {
                    Some(ty) => fields.push(StructField {
                        name: field.name.clone(),
                        ty,
                    }),
                    None => errors.push(error(
                        CompileErrorKind::UnknownType {
                            name: field.ty.name.clone(),
                        },
                        field.ty.position,
                    )),
                }
            }
            debug!("struct '{}' has {} fields", item.name, fields.len());
            types.set_fields(handle, fields);
        }
    }
}

/// Signature registration, layering and per-function codegen.
struct FunctionPass<'c> {
    types: &'c TypeRegistry,
    source_name: &'c str,
    conf: &'c CompilerConf,
}

impl<'c> FunctionPass<'c> {
    #[cold]
    fn error(&self, kind: CompileErrorKind, position: SourcePosition) -> CompileError {
        CompileError::new(kind, SourceLocation::new(self.source_name, position))
    }

    fn limit_reached(&self, errors: &[CompileError]) -> bool {
        matches!(self.conf.max_errors, Some(max) if errors.len() >= max)
    }

    fn run<'a>(&self, file: &mut FileNode<'a>, errors: &mut Vec<CompileError>) -> Vec<CompiledFunction> {
        // Function name to index into the file's functions.
        let mut declared: HashMap<&'a str, usize> = HashMap::new();
        let mut graph = FunctionDependencyGraph::new();

        for (index, function) in file.functions.iter().enumerate() {
            if declared.contains_key(function.name) {
                errors.push(self.error(
                    CompileErrorKind::DuplicateSymbol {
                        name: SmolStr::new(function.name),
                    },
                    function.position,
                ));
                continue;
            }
            declared.insert(function.name, index);

            if let Err(err) = graph.push(function.dependencies.clone()) {
                let name = SmolStr::new(function.name);
                let kind = match err {
                    DependencyError::SelfDependency(_) => CompileErrorKind::SelfDependency { function: name },
                    DependencyError::Cyclic(_) => CompileErrorKind::CyclicDependency { function: name },
                    DependencyError::AlreadyPlaced(_) => CompileErrorKind::DuplicateSymbol { name },
                };
                errors.push(self.error(kind, function.position));
            }
        }
        debug!(
            "{} functions placed in {} layers",
            graph.len(),
            graph.layer_count()
        );

        let order: Vec<(&'a str, usize)> = graph
            .iter()
            .map(|entry| (entry.name(), graph.layer_of(entry.name()).unwrap_or(0)))
            .collect();

        let mut compiled = Vec::with_capacity(order.len());
        for (name, layer) in order {
            if self.limit_reached(errors) {
                break;
            }

            let function = match declared.get(name) {
                Some(&index) => &mut file.functions[index],
                None => continue,
            };
            if function.parse_failed {
                continue;
            }

            if let Some(missing) = function
                .dependencies
                .dependencies()
                .iter()
                .find(|callee| !declared.contains_key(*callee))
            {
                errors.push(self.error(
                    CompileErrorKind::CannotFindSymbol {
                        name: SmolStr::new(missing),
                    },
                    function.position,
                ));
                continue;
            }

            match self.compile_function(function, layer) {
                Ok(output) => compiled.push(output),
                Err(err) => errors.push(err),
            }
        }

        compiled
    }

    fn compile_function(&self, function: &mut FunctionNode, layer: usize) -> CompileResult<CompiledFunction> {
        let mut parameters = Vec::with_capacity(function.parameters.len());
        for param in &function.parameters {
            let ty = self.lookup_type(&param.ty.name, param.ty.position)?;
            function.variables.set_type(param.slot, ty);
            parameters.push(ty);
        }
        let return_type = match &function.return_type {
            Some(name) => Some(self.lookup_type(&name.name, name.position)?),
            None => None,
        };

        let mut resolve = ResolveContext {
            types: self.types,
            variables: &mut function.variables,
            source_name: self.source_name,
            function: function.name,
            return_type,
        };
        function.body.resolve_types(&mut resolve)?;

        if return_type.is_some() && !function.body.ends_with_return() {
            return Err(self.error(
                CompileErrorKind::MissingReturn {
                    function: SmolStr::new(function.name),
                },
                function.position,
            ));
        }

        let mut builder = BytecodeBuilder::new();
        let mut emit = EmitContext {
            builder: &mut builder,
            variables: &mut function.variables,
            source_name: self.source_name,
            function: function.name,
        };
        function.body.emit_bytecode(&mut emit)?;
        if return_type.is_none() {
            builder.push(Bytecode::ret());
        }

        let (code, constants) = builder.finish();
        let output = CompiledFunction {
            name: SmolStr::new(function.name),
            parameters,
            return_type,
            code,
            constants,
            slot_count: function.variables.len(),
            layer,
        };

        debug!(
            "function '{}' compiled to {} instructions",
            output.name,
            output.code.len()
        );
        if self.conf.trace_bytecode {
            if let Ok(text) = output.disassemble() {
                debug!("{}:\n{}", output.name, text);
            }
        }

        Ok(output)
    }

    fn lookup_type(&self, name: &str, position: SourcePosition) -> CompileResult<TypeHandle> {
        self.types.lookup(name).ok_or_else(|| {
            self.error(
                CompileErrorKind::UnknownType {
                    name: SmolStr::new(name),
                },
                position,
            )
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_too_many_fields() {
        let fields = (0..=usize::from(u16::MAX) + 1)
            .map(|i| format!("f{i}: int"))
            .collect::<Vec<_>>()
            .join(", ");
        let source = format!("struct Wide {{ {fields} }} struct Narrow {{ x: int }}");

        let errors = match Compiler::new(CompilerConf::default()).compile("wide.sable", &source) {
            Ok(_) => panic!("expected compile errors"),
            Err(errors) => errors,
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind(),
            &CompileErrorKind::TooManyFields { name: "Wide".into() }
        );
    }

    #[test]
    fn test_widest_struct_compiles() {
        let fields = (0..=usize::from(u16::MAX))
            .map(|i| format!("f{i}: int"))
            .collect::<Vec<_>>()
            .join(", ");
        let source = format!("struct Wide {{ {fields} }} fn last(w: Wide) -> int {{ return w.f65535; }}");

        let program = Compiler::new(CompilerConf::default())
            .compile("wide.sable", &source)
            .unwrap();
        let wide = program.types.lookup("Wide").unwrap();
        assert_eq!(program.types.field(wide, "f65535"), Some((u16::MAX, TypeHandle::INT)));
    }
}
