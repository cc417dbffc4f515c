//! Per-architecture capability table.
//!
//! The lowering passes in [`super::generator`], [`super::expr`] and
//! [`super::control`] are written once against [`Isa`]. Each architecture
//! supplies the concrete mnemonics, register roles, calling-convention
//! registers and system-call numbers.

/// Symbol of the runtime routine printing the accumulator as a number.
pub const PRINT_NUMBER: &str = "_print_number";

/// Symbol of the runtime routine printing the NUL-terminated string whose
/// address is in the accumulator.
pub const PRINT_STRING: &str = "_print_string";

/// Append-only instruction text owned by one generator.
#[derive(Debug, Default)]
pub struct AsmBuffer {
    lines: Vec<String>,
}

impl AsmBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented instruction line.
    pub fn instr(&mut self, text: impl AsRef<str>) {
        self.lines.push(format!("    {}", text.as_ref()));
    }

    /// Unindented directive line.
    pub fn directive(&mut self, text: impl AsRef<str>) {
        self.lines.push(text.as_ref().to_string());
    }

    pub fn label(&mut self, name: &str) {
        self.lines.push(format!("{}:", name));
    }

    pub fn comment(&mut self, marker: &str, text: &str) {
        self.lines.push(format!("    {} {}", marker, text));
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn reset(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Render every line newline-terminated.
    pub fn render(&self) -> String {
        let mut text = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

/// Relation produced as 0/1 by a compare-and-set sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Instruction shapes needed by the lowering passes.
///
/// Register roles: the accumulator holds the value of the expression being
/// lowered, the secondary register holds the other operand of a binary
/// operation, and locals live at positive offsets below the frame base.
pub trait Isa {
    /// Architecture name used in logs.
    fn name(&self) -> &'static str;

    /// Line comment marker.
    fn comment_marker(&self) -> &'static str;

    /// Accumulator register as written in the assembly.
    fn accumulator(&self) -> &'static str;

    fn text_header(&self, out: &mut AsmBuffer);

    /// Directives opening the read-only string section.
    fn data_header(&self, out: &mut AsmBuffer);

    /// Label under which a function is emitted.
    fn function_symbol(&self, name: &str, is_entry: bool) -> String;

    /// Symbol used at call sites for a function.
    fn call_symbol(&self, name: &str) -> String {
        format!("_{}", name)
    }

    /// Save the caller's frame and reserve `frame_size` bytes of locals.
    fn prologue(&self, out: &mut AsmBuffer, frame_size: usize);

    /// Spill the first argument register into the slot at `offset`.
    fn store_first_param(&self, out: &mut AsmBuffer, offset: usize);

    /// Undo the prologue and return to the caller.
    fn return_to_caller(&self, out: &mut AsmBuffer, frame_size: usize);

    /// Undo the prologue and terminate the process with status 0.
    fn exit_process(&self, out: &mut AsmBuffer, frame_size: usize);

    fn load_immediate(&self, out: &mut AsmBuffer, value: i64);

    fn load_local(&self, out: &mut AsmBuffer, offset: usize);

    fn store_local(&self, out: &mut AsmBuffer, offset: usize);

    /// Position-independent address of a data label into the accumulator.
    fn load_string_address(&self, out: &mut AsmBuffer, label: &str);

    fn push_accumulator(&self, out: &mut AsmBuffer);

    /// With the right operand in the accumulator and the left on top of the
    /// stack: right into the secondary register, left popped into the
    /// accumulator.
    fn pop_left_operand(&self, out: &mut AsmBuffer);

    /// Pop the top of the stack into the secondary register.
    fn pop_secondary(&self, out: &mut AsmBuffer);

    /// `acc = acc <op> secondary`
    fn arith(&self, out: &mut AsmBuffer, op: Arith);

    /// `acc = (acc <cond> secondary) ? 1 : 0`
    fn compare_set(&self, out: &mut AsmBuffer, cond: Cond);

    fn branch_if_zero(&self, out: &mut AsmBuffer, label: &str);

    fn jump(&self, out: &mut AsmBuffer, label: &str);

    /// Move the accumulator into the first argument register.
    fn move_to_first_arg(&self, out: &mut AsmBuffer);

    fn call(&self, out: &mut AsmBuffer, symbol: &str);

    /// `acc = *(acc + offset)`
    fn load_field(&self, out: &mut AsmBuffer, offset: usize);

    /// `acc = *(secondary + acc * 8)`
    fn load_indexed(&self, out: &mut AsmBuffer);

    /// Compare the case value in the accumulator with the switch value kept
    /// on top of the stack; branch to `label` when equal.
    fn switch_compare(&self, out: &mut AsmBuffer, label: &str);

    /// Discard the switch value pushed by [`Isa::push_accumulator`].
    fn drop_switch_value(&self, out: &mut AsmBuffer);

    /// Fixed runtime text appended once per program.
    fn runtime(&self) -> &'static str;
}
