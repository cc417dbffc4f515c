//! Native assembly backend for petit programs.
//!
//! Lowers a petit abstract syntax tree into assembly text for AArch64 on
//! macOS or x86_64 on Linux, together with the small runtime the emitted
//! programs call for printing.
//!
//! ```
//! use petit_compiler::ast::{Expr, Function, Program, Stmt};
//! use petit_compiler::codegen::{compile_program, Target};
//!
//! let program = Program::new(vec![Stmt::func(Function::new(
//!     "main",
//!     vec![],
//!     vec![Stmt::println(Expr::num(42))],
//! ))]);
//!
//! let asm = compile_program(&program, Target::X86_64Linux);
//! assert!(asm.contains("movq $42, %rax"));
//! assert!(asm.contains("call _print_number"));
//! ```

pub mod ast;
pub mod codegen;
pub mod driver;
pub mod error;
pub mod fingerprint;
pub mod verify;

pub use codegen::{compile_program, AssemblyBackend, Platform, Target};
pub use driver::{compile_file, compile_source, CompileOptions};
pub use error::CompileError;
