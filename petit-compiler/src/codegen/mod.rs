// petit-compiler/src/codegen/mod.rs
// Native code generation: target selection and backend dispatch

pub mod aarch64;
pub mod control;
pub mod expr;
pub mod frame;
pub mod generator;
pub mod isa;
pub mod pool;
pub mod x86_64;

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::ast::Program;
use crate::error::CompileError;

pub use aarch64::Aarch64;
pub use generator::Generator;
pub use isa::Isa;
pub use x86_64::X86_64;

/// Operating system and architecture pair, as reported by `std::env::consts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this compiler is running on.
    pub fn host() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }
}

/// The two supported emitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Aarch64MacOs,
    X86_64Linux,
}

impl Target {
    /// Select an emitter for `platform`. Unrecognized platforms get the
    /// default emitter rather than an error.
    pub fn for_platform(platform: &Platform) -> Self {
        match (platform.os.as_str(), platform.arch.as_str()) {
            ("macos", "aarch64") => Target::Aarch64MacOs,
            ("linux", "x86_64") => Target::X86_64Linux,
            (os, arch) => {
                let fallback = Target::default();
                warn!(os, arch, target = %fallback, "unsupported platform, using default target");
                fallback
            }
        }
    }

    pub fn host() -> Self {
        Self::for_platform(&Platform::host())
    }

    /// Fresh generator for this target.
    pub fn backend(self) -> Box<dyn AssemblyBackend> {
        match self {
            Target::Aarch64MacOs => Box::new(Generator::new(Aarch64)),
            Target::X86_64Linux => Box::new(Generator::new(X86_64)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Target::Aarch64MacOs => "aarch64-macos",
            Target::X86_64Linux => "x86_64-linux",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aarch64-macos" | "arm64" | "aarch64" => Ok(Target::Aarch64MacOs),
            "x86_64-linux" | "x86_64" | "amd64" => Ok(Target::X86_64Linux),
            "host" => Ok(Target::host()),
            _ => Err(CompileError::UnknownTarget(s.to_string())),
        }
    }
}

/// Uniform contract over both emitters.
pub trait AssemblyBackend {
    /// Lower `program` into assembly text. Resets all generator state first.
    fn generate(&mut self, program: &Program) -> String;

    /// Fixed runtime routines, appended once per program.
    fn generate_runtime(&self) -> String;

    fn target(&self) -> Target;
}

impl AssemblyBackend for Generator<Aarch64> {
    fn generate(&mut self, program: &Program) -> String {
        Generator::generate(self, program)
    }

    fn generate_runtime(&self) -> String {
        Generator::generate_runtime(self)
    }

    fn target(&self) -> Target {
        Target::Aarch64MacOs
    }
}

impl AssemblyBackend for Generator<X86_64> {
    fn generate(&mut self, program: &Program) -> String {
        Generator::generate(self, program)
    }

    fn generate_runtime(&self) -> String {
        Generator::generate_runtime(self)
    }

    fn target(&self) -> Target {
        Target::X86_64Linux
    }
}

/// Full assembly for `program`: generated code followed by the runtime.
pub fn compile_program(program: &Program, target: Target) -> String {
    let mut backend = target.backend();
    let mut asm = backend.generate(program);
    asm.push_str(&backend.generate_runtime());
    asm
}
