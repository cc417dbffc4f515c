// petit-compiler/src/codegen/aarch64.rs
// AArch64 (Apple Mach-O) instruction table and runtime

use super::isa::{Arith, AsmBuffer, Cond, Isa};

/// macOS BSD syscall numbers, passed in x16.
const SYS_EXIT: u32 = 1;
#[cfg(test)]
const SYS_WRITE: u32 = 4;

/// AArch64 on macOS: accumulator x0, secondary x1, frame base x29.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aarch64;

impl Isa for Aarch64 {
    fn name(&self) -> &'static str {
        "aarch64"
    }

    fn comment_marker(&self) -> &'static str {
        "//"
    }

    fn accumulator(&self) -> &'static str {
        "x0"
    }

    fn text_header(&self, out: &mut AsmBuffer) {
        out.directive(".section __TEXT,__text,regular,pure_instructions");
        out.directive(".globl _main");
        out.directive(".p2align 2");
        out.blank();
    }

    fn data_header(&self, out: &mut AsmBuffer) {
        out.blank();
        out.directive(".section __TEXT,__cstring,cstring_literals");
    }

    fn function_symbol(&self, name: &str, _is_entry: bool) -> String {
        format!("_{}", name)
    }

    fn prologue(&self, out: &mut AsmBuffer, frame_size: usize) {
        out.instr("stp x29, x30, [sp, #-16]!");
        out.instr("mov x29, sp");
        out.instr(format!("sub sp, sp, #{}", frame_size));
    }

    fn store_first_param(&self, out: &mut AsmBuffer, offset: usize) {
        out.instr(format!("str x0, [x29, #-{}]", offset));
    }

    fn return_to_caller(&self, out: &mut AsmBuffer, frame_size: usize) {
        out.instr(format!("add sp, sp, #{}", frame_size));
        out.instr("ldp x29, x30, [sp], #16");
        out.instr("ret");
    }

    fn exit_process(&self, out: &mut AsmBuffer, frame_size: usize) {
        out.instr(format!("add sp, sp, #{}", frame_size));
        out.instr("ldp x29, x30, [sp], #16");
        out.instr("mov x0, #0");
        out.instr(format!("mov x16, #{}", SYS_EXIT));
        out.instr("svc #0x80");
    }

    fn load_immediate(&self, out: &mut AsmBuffer, value: i64) {
        // `mov` takes anything a single movz/movn encodes; wider values are built
        // 16 bits at a time.
        if (-0xffff..=0xffff).contains(&value) {
            out.instr(format!("mov x0, #{}", value));
            return;
        }
        let bits = value as u64;
        out.instr(format!("movz x0, #{}", bits & 0xffff));
        for shift in [16u32, 32, 48] {
            let chunk = (bits >> shift) & 0xffff;
            if chunk != 0 {
                out.instr(format!("movk x0, #{}, lsl #{}", chunk, shift));
            }
        }
    }

    fn load_local(&self, out: &mut AsmBuffer, offset: usize) {
        out.instr(format!("ldr x0, [x29, #-{}]", offset));
    }

    fn store_local(&self, out: &mut AsmBuffer, offset: usize) {
        out.instr(format!("str x0, [x29, #-{}]", offset));
    }

    fn load_string_address(&self, out: &mut AsmBuffer, label: &str) {
        out.instr(format!("adrp x0, {}@PAGE", label));
        out.instr(format!("add x0, x0, {}@PAGEOFF", label));
    }

    fn push_accumulator(&self, out: &mut AsmBuffer) {
        // sp must stay 16-byte aligned, so each 8-byte value takes a full slot.
        out.instr("str x0, [sp, #-16]!");
    }

    fn pop_left_operand(&self, out: &mut AsmBuffer) {
        out.instr("mov x1, x0");
        out.instr("ldr x0, [sp], #16");
    }

    fn pop_secondary(&self, out: &mut AsmBuffer) {
        out.instr("ldr x1, [sp], #16");
    }

    fn arith(&self, out: &mut AsmBuffer, op: Arith) {
        let mnemonic = match op {
            Arith::Add => "add",
            Arith::Sub => "sub",
            Arith::Mul => "mul",
            Arith::Div => "udiv",
        };
        out.instr(format!("{} x0, x0, x1", mnemonic));
    }

    fn compare_set(&self, out: &mut AsmBuffer, cond: Cond) {
        let cc = match cond {
            Cond::Eq => "eq",
            Cond::Ne => "ne",
            Cond::Lt => "lt",
            Cond::Le => "le",
            Cond::Gt => "gt",
            Cond::Ge => "ge",
        };
        out.instr("cmp x0, x1");
        out.instr(format!("cset x0, {}", cc));
    }

    fn branch_if_zero(&self, out: &mut AsmBuffer, label: &str) {
        out.instr(format!("cbz x0, {}", label));
    }

    fn jump(&self, out: &mut AsmBuffer, label: &str) {
        out.instr(format!("b {}", label));
    }

    fn move_to_first_arg(&self, _out: &mut AsmBuffer) {
        // x0 is both the accumulator and the first argument register.
    }

    fn call(&self, out: &mut AsmBuffer, symbol: &str) {
        out.instr(format!("bl {}", symbol));
    }

    fn load_field(&self, out: &mut AsmBuffer, offset: usize) {
        out.instr(format!("ldr x0, [x0, #{}]", offset));
    }

    fn load_indexed(&self, out: &mut AsmBuffer) {
        out.instr("lsl x0, x0, #3");
        out.instr("add x0, x1, x0");
        out.instr("ldr x0, [x0]");
    }

    fn switch_compare(&self, out: &mut AsmBuffer, label: &str) {
        out.instr("ldr x1, [sp]");
        out.instr("cmp x1, x0");
        out.instr(format!("beq {}", label));
    }

    fn drop_switch_value(&self, out: &mut AsmBuffer) {
        out.instr("add sp, sp, #16");
    }

    fn runtime(&self) -> &'static str {
        RUNTIME
    }
}

// Opens with its own section directive: it is appended after the string data.
const RUNTIME: &str = r#"
.section __TEXT,__text,regular,pure_instructions
.p2align 2

// Runtime: print the value in x0 as an unsigned decimal and a newline
.p2align 2
_print_number:
    stp x29, x30, [sp, #-16]!
    mov x29, sp
    sub sp, sp, #32

    str x0, [x29, #-8]

    // Digits are collected least significant first at x29-24; x2 counts them
    sub x1, x29, #24
    mov x2, #0

    cmp x0, #0
    bne convert_loop
    mov w3, #48
    strb w3, [x1]
    mov x2, #1
    b print_digits

.p2align 2
convert_loop:
    cbz x0, print_digits
    mov x3, #10
    udiv x4, x0, x3
    msub x5, x4, x3, x0
    add w5, w5, #48
    strb w5, [x1, x2]
    add x2, x2, #1
    mov x0, x4
    b convert_loop

.p2align 2
print_digits:
    cbz x2, print_newline

.p2align 2
print_loop:
    sub x2, x2, #1
    ldrb w3, [x1, x2]

    // x1/x2 do not survive the syscall
    stp x1, x2, [sp, #-16]!
    sub sp, sp, #16
    strb w3, [sp]
    mov x0, #1
    mov x1, sp
    mov x2, #1
    mov x16, #4
    svc #0x80
    add sp, sp, #16
    ldp x1, x2, [sp], #16

    cbnz x2, print_loop

.p2align 2
print_newline:
    mov x16, #4
    mov x0, #1
    mov x1, sp
    mov w2, #10
    strb w2, [x1]
    mov x2, #1
    svc #0x80

    add sp, sp, #32
    ldp x29, x30, [sp], #16
    ret

// Runtime: print the NUL-terminated string at x0 and a newline
.p2align 2
_print_string:
    stp x29, x30, [sp, #-16]!
    mov x29, sp
    sub sp, sp, #16

    mov x1, x0
    mov x2, #0

.p2align 2
strlen_loop:
    ldrb w3, [x1, x2]
    cbz w3, print_str
    add x2, x2, #1
    b strlen_loop

.p2align 2
print_str:
    // x1 = string, x2 = length
    mov x16, #4
    mov x0, #1
    svc #0x80

    mov x16, #4
    mov x0, #1
    mov x1, sp
    mov w2, #10
    strb w2, [x1]
    mov x2, #1
    svc #0x80

    add sp, sp, #16
    ldp x29, x30, [sp], #16
    ret
"#;
