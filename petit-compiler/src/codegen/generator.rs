// petit-compiler/src/codegen/generator.rs
// Lowering context and function / call-convention lowering

use tracing::{debug, warn};

use super::frame::{StackFrame, FRAME_SIZE};
use super::isa::{AsmBuffer, Isa, PRINT_NUMBER, PRINT_STRING};
use super::pool::{escape_asciz, LabelPool, StringPool};
use crate::ast::{Function, Program, ENTRY_FUNCTION};

/// One generation run over a program for a single architecture.
///
/// All mutable state (text, labels, string pool, frame) is owned here and
/// passed by `&mut self` through the lowering passes. `generate` resets it.
#[derive(Debug)]
pub struct Generator<I: Isa> {
    pub(super) isa: I,
    pub(super) out: AsmBuffer,
    pub(super) labels: LabelPool,
    pub(super) strings: StringPool,
    pub(super) frame: StackFrame,
}

impl<I: Isa> Generator<I> {
    pub fn new(isa: I) -> Self {
        Self {
            isa,
            out: AsmBuffer::new(),
            labels: LabelPool::new(),
            strings: StringPool::new(),
            frame: StackFrame::new(),
        }
    }

    pub fn isa(&self) -> &I {
        &self.isa
    }

    /// Lower every function of `program` into assembly text.
    pub fn generate(&mut self, program: &Program) -> String {
        self.reset();

        self.isa.text_header(&mut self.out);
        for func in program.functions() {
            self.lower_function(func);
        }
        self.emit_string_literals();

        debug!(
            arch = self.isa.name(),
            labels = self.labels.issued(),
            strings = self.strings.len(),
            "generated program"
        );
        self.out.render()
    }

    /// Runtime print routines for this architecture.
    pub fn generate_runtime(&self) -> String {
        self.isa.runtime().to_string()
    }

    fn reset(&mut self) {
        self.out.reset();
        self.labels.reset();
        self.strings.reset();
        self.frame.reset();
    }

    pub(super) fn comment(&mut self, text: &str) {
        self.out.comment(self.isa.comment_marker(), text);
    }

    fn lower_function(&mut self, func: &Function) {
        self.frame.reset();

        let symbol = self.isa.function_symbol(&func.name, func.is_entry());
        if self.is_reserved_symbol(&symbol, func.is_entry()) {
            warn!(
                function = %func.name,
                symbol = %symbol,
                "function symbol is already defined by the runtime or the entry point"
            );
        }
        self.out.label(&symbol);
        self.comment("Function prologue");
        self.isa.prologue(&mut self.out, FRAME_SIZE);

        // Only the first parameter is bound; it arrives in the first argument register.
        if let Some(param) = func.parameters.first() {
            let offset = self.frame.allocate(&param.name);
            self.comment(&format!("Parameter: {}", param.name));
            self.isa.store_first_param(&mut self.out, offset);
        }

        self.lower_block(&func.body);

        // Non-entry functions end through their own `return`.
        if func.is_entry() {
            self.comment("Exit");
            self.isa.exit_process(&mut self.out, FRAME_SIZE);
        }
        self.out.blank();

        if self.frame.overflows() {
            warn!(
                function = %func.name,
                used = self.frame.used_bytes(),
                reserved = FRAME_SIZE,
                "locals exceed the fixed frame reservation"
            );
        }
        debug!(
            function = %func.name,
            symbol = %symbol,
            locals = self.frame.len(),
            "lowered function"
        );
    }

    /// True when a non-entry function would be emitted under a symbol the
    /// runtime or the entry function also defines.
    pub(super) fn is_reserved_symbol(&self, symbol: &str, is_entry: bool) -> bool {
        if is_entry {
            return false;
        }
        symbol == PRINT_NUMBER
            || symbol == PRINT_STRING
            || symbol == self.isa.function_symbol(ENTRY_FUNCTION, true)
    }

    fn emit_string_literals(&mut self) {
        if self.strings.is_empty() {
            return;
        }

        self.isa.data_header(&mut self.out);
        for (label, value) in self.strings.entries() {
            self.out.label(label);
            self.out.instr(format!(".asciz \"{}\"", escape_asciz(value)));
        }
    }
}
