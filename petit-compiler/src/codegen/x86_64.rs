// petit-compiler/src/codegen/x86_64.rs
// x86_64 (Linux ELF, AT&T syntax) instruction table and runtime

use super::isa::{Arith, AsmBuffer, Cond, Isa};

/// Linux syscall numbers, passed in %rax.
const SYS_EXIT: u32 = 60;
#[cfg(test)]
const SYS_WRITE: u32 = 1;

/// x86_64 on Linux: accumulator %rax, secondary %rbx, frame base %rbp,
/// first argument %rdi.
#[derive(Debug, Clone, Copy, Default)]
pub struct X86_64;

impl Isa for X86_64 {
    fn name(&self) -> &'static str {
        "x86_64"
    }

    fn comment_marker(&self) -> &'static str {
        "#"
    }

    fn accumulator(&self) -> &'static str {
        "%rax"
    }

    fn text_header(&self, out: &mut AsmBuffer) {
        out.directive(".section .text");
        out.directive(".globl _start");
        out.blank();
    }

    fn data_header(&self, out: &mut AsmBuffer) {
        out.blank();
        out.directive(".section .rodata");
    }

    /// Without libc the linker enters at `_start`.
    fn function_symbol(&self, name: &str, is_entry: bool) -> String {
        if is_entry {
            "_start".to_string()
        } else {
            format!("_{}", name)
        }
    }

    fn prologue(&self, out: &mut AsmBuffer, frame_size: usize) {
        out.instr("pushq %rbp");
        out.instr("movq %rsp, %rbp");
        out.instr(format!("subq ${}, %rsp", frame_size));
    }

    fn store_first_param(&self, out: &mut AsmBuffer, offset: usize) {
        out.instr(format!("movq %rdi, -{}(%rbp)", offset));
    }

    fn return_to_caller(&self, out: &mut AsmBuffer, frame_size: usize) {
        out.instr(format!("addq ${}, %rsp", frame_size));
        out.instr("popq %rbp");
        out.instr("ret");
    }

    fn exit_process(&self, out: &mut AsmBuffer, frame_size: usize) {
        out.instr(format!("addq ${}, %rsp", frame_size));
        out.instr("popq %rbp");
        out.instr(format!("movq ${}, %rax", SYS_EXIT));
        out.instr("movq $0, %rdi");
        out.instr("syscall");
    }

    fn load_immediate(&self, out: &mut AsmBuffer, value: i64) {
        // movq only takes a sign-extended 32-bit immediate.
        if i32::try_from(value).is_ok() {
            out.instr(format!("movq ${}, %rax", value));
        } else {
            out.instr(format!("movabsq ${}, %rax", value));
        }
    }

    fn load_local(&self, out: &mut AsmBuffer, offset: usize) {
        out.instr(format!("movq -{}(%rbp), %rax", offset));
    }

    fn store_local(&self, out: &mut AsmBuffer, offset: usize) {
        out.instr(format!("movq %rax, -{}(%rbp)", offset));
    }

    fn load_string_address(&self, out: &mut AsmBuffer, label: &str) {
        out.instr(format!("leaq {}(%rip), %rax", label));
    }

    fn push_accumulator(&self, out: &mut AsmBuffer) {
        out.instr("pushq %rax");
    }

    fn pop_left_operand(&self, out: &mut AsmBuffer) {
        out.instr("movq %rax, %rbx");
        out.instr("popq %rax");
    }

    fn pop_secondary(&self, out: &mut AsmBuffer) {
        out.instr("popq %rbx");
    }

    fn arith(&self, out: &mut AsmBuffer, op: Arith) {
        match op {
            Arith::Add => out.instr("addq %rbx, %rax"),
            Arith::Sub => out.instr("subq %rbx, %rax"),
            Arith::Mul => out.instr("imulq %rbx, %rax"),
            Arith::Div => {
                out.instr("cqo");
                out.instr("idivq %rbx");
            }
        }
    }

    fn compare_set(&self, out: &mut AsmBuffer, cond: Cond) {
        let cc = match cond {
            Cond::Eq => "e",
            Cond::Ne => "ne",
            Cond::Lt => "l",
            Cond::Le => "le",
            Cond::Gt => "g",
            Cond::Ge => "ge",
        };
        out.instr("cmpq %rbx, %rax");
        out.instr(format!("set{} %al", cc));
        out.instr("movzbq %al, %rax");
    }

    fn branch_if_zero(&self, out: &mut AsmBuffer, label: &str) {
        out.instr("testq %rax, %rax");
        out.instr(format!("jz {}", label));
    }

    fn jump(&self, out: &mut AsmBuffer, label: &str) {
        out.instr(format!("jmp {}", label));
    }

    fn move_to_first_arg(&self, out: &mut AsmBuffer) {
        out.instr("movq %rax, %rdi");
    }

    fn call(&self, out: &mut AsmBuffer, symbol: &str) {
        out.instr(format!("call {}", symbol));
    }

    fn load_field(&self, out: &mut AsmBuffer, offset: usize) {
        out.instr(format!("movq {}(%rax), %rax", offset));
    }

    fn load_indexed(&self, out: &mut AsmBuffer) {
        out.instr("salq $3, %rax");
        out.instr("addq %rbx, %rax");
        out.instr("movq (%rax), %rax");
    }

    fn switch_compare(&self, out: &mut AsmBuffer, label: &str) {
        out.instr("movq (%rsp), %rbx");
        out.instr("cmpq %rax, %rbx");
        out.instr(format!("je {}", label));
    }

    fn drop_switch_value(&self, out: &mut AsmBuffer) {
        out.instr("addq $8, %rsp");
    }

    fn runtime(&self) -> &'static str {
        RUNTIME
    }
}

// The kernel clobbers %rcx and %r11 on `syscall`, so loop state lives in %r8/%r9.
// Opens with its own section directive: it is appended after the string data.
const RUNTIME: &str = r#"
.section .text

# Runtime: print the value in %rax as an unsigned decimal and a newline
_print_number:
    pushq %rbp
    movq %rsp, %rbp
    subq $32, %rsp

    # Digits are collected least significant first at -24(%rbp); %r8 counts them
    leaq -24(%rbp), %r9
    movq $0, %r8

    cmpq $0, %rax
    jne convert_loop
    movb $48, (%r9)
    movq $1, %r8
    jmp print_digits

convert_loop:
    testq %rax, %rax
    jz print_digits
    movq $10, %rbx
    xorq %rdx, %rdx
    divq %rbx
    addq $48, %rdx
    movb %dl, (%r9,%r8,1)
    incq %r8
    jmp convert_loop

print_digits:
    testq %r8, %r8
    jz print_newline

print_loop:
    decq %r8
    movb (%r9,%r8,1), %dl
    movb %dl, -25(%rbp)
    movq $1, %rax
    movq $1, %rdi
    leaq -25(%rbp), %rsi
    movq $1, %rdx
    syscall

    testq %r8, %r8
    jnz print_loop

print_newline:
    movb $10, -25(%rbp)
    movq $1, %rax
    movq $1, %rdi
    leaq -25(%rbp), %rsi
    movq $1, %rdx
    syscall

    addq $32, %rsp
    popq %rbp
    ret

# Runtime: print the NUL-terminated string at %rax and a newline
_print_string:
    pushq %rbp
    movq %rsp, %rbp
    subq $16, %rsp

    movq %rax, %rsi
    movq $0, %rdx

strlen_loop:
    cmpb $0, (%rsi,%rdx,1)
    je print_str
    incq %rdx
    jmp strlen_loop

print_str:
    # %rsi = string, %rdx = length
    movq $1, %rax
    movq $1, %rdi
    syscall

    movb $10, -1(%rbp)
    movq $1, %rax
    movq $1, %rdi
    leaq -1(%rbp), %rsi
    movq $1, %rdx
    syscall

    addq $16, %rsp
    popq %rbp
    ret
"#;
