// petit-compiler/src/driver.rs
// JSON AST in, assembly text out

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::ast::Program;
use crate::codegen::Target;
use crate::error::CompileError;
use crate::fingerprint;
use crate::verify;

/// Settings for one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub target: Target,
    /// Append the runtime print routines.
    pub emit_runtime: bool,
    /// Run the label check over the full output before returning it.
    pub verify: bool,
}

impl CompileOptions {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            emit_runtime: true,
            verify: false,
        }
    }

    pub fn with_runtime(mut self, emit_runtime: bool) -> Self {
        self.emit_runtime = emit_runtime;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::new(Target::host())
    }
}

/// Lower an already decoded program.
pub fn compile(program: &Program, options: &CompileOptions) -> Result<String, CompileError> {
    let mut backend = options.target.backend();
    let code = backend.generate(program);
    let runtime = backend.generate_runtime();

    // Calls into the runtime are only resolvable with the runtime text present,
    // so the check always sees both.
    if options.verify {
        let full = format!("{}{}", code, runtime);
        let report = verify::check_labels(&full)?;
        debug!(
            labels = report.definitions.len(),
            branches = report.references.len(),
            "label check passed"
        );
    }

    let asm = if options.emit_runtime {
        code + &runtime
    } else {
        code
    };

    info!(
        target = %options.target,
        functions = program.functions().count(),
        bytes = asm.len(),
        digest = %fingerprint::digest(&asm),
        "compiled program"
    );
    Ok(asm)
}

/// Decode a JSON AST and lower it.
pub fn compile_source(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let program = Program::from_json(source)?;
    compile(&program, options)
}

/// Read a JSON AST from `input` and write assembly to `output`.
pub fn compile_file(
    input: &Path,
    output: &Path,
    options: &CompileOptions,
) -> Result<(), CompileError> {
    let source = fs::read_to_string(input)?;
    debug!(path = %input.display(), bytes = source.len(), "read AST");

    let asm = compile_source(&source, options)?;
    fs::write(output, &asm)?;
    info!(path = %output.display(), bytes = asm.len(), "wrote assembly");
    Ok(())
}
