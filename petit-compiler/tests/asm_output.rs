// End-to-end checks over the emitted assembly text for both targets.

use petit_compiler::ast::{BinaryOp, Case, Expr, Function, Parameter, Program, Stmt};
use petit_compiler::codegen::{compile_program, Target};
use petit_compiler::{fingerprint, verify};

const TARGETS: [Target; 2] = [Target::Aarch64MacOs, Target::X86_64Linux];

fn main_with(body: Vec<Stmt>) -> Program {
    Program::new(vec![Stmt::func(Function::new("main", vec![], body))])
}

fn generate(program: &Program, target: Target) -> String {
    target.backend().generate(program)
}

/// Instruction and label lines, comments and blanks dropped.
fn code_lines(asm: &str) -> Vec<String> {
    asm.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("//") && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn position(lines: &[String], needle: &str) -> usize {
    lines
        .iter()
        .position(|l| l == needle)
        .unwrap_or_else(|| panic!("`{}` not found in:\n{}", needle, lines.join("\n")))
}

fn count(lines: &[String], needle: &str) -> usize {
    lines.iter().filter(|l| l.as_str() == needle).count()
}

/// Expression-stack pushes minus pops. Frame save/restore is not counted.
fn stack_depth(lines: &[String], target: Target) -> i64 {
    let (pushes, pops): (&[&str], &[&str]) = match target {
        Target::Aarch64MacOs => (
            &["str x0, [sp, #-16]!"],
            &["ldr x0, [sp], #16", "ldr x1, [sp], #16", "add sp, sp, #16"],
        ),
        Target::X86_64Linux => (
            &["pushq %rax"],
            &["popq %rax", "popq %rbx", "addq $8, %rsp"],
        ),
    };
    let pushed: usize = pushes.iter().map(|p| count(lines, p)).sum();
    let popped: usize = pops.iter().map(|p| count(lines, p)).sum();
    pushed as i64 - popped as i64
}

fn kitchen_sink() -> Program {
    Program::new(vec![
        Stmt::func(
            Function::new(
                "square",
                vec![Parameter::new("n", "int")],
                vec![Stmt::ret(Some(Expr::binary(
                    BinaryOp::Mul,
                    Expr::var("n"),
                    Expr::var("n"),
                )))],
            )
            .returning("int"),
        ),
        Stmt::func(Function::new(
            "main",
            vec![],
            vec![
                Stmt::assign("i", Expr::num(0)),
                Stmt::for_while(
                    Expr::binary(BinaryOp::Lt, Expr::var("i"), Expr::num(3)),
                    vec![
                        Stmt::if_then(
                            Expr::binary(BinaryOp::Eq, Expr::var("i"), Expr::num(1)),
                            vec![Stmt::println(Expr::str("one"))],
                            Some(vec![Stmt::println(Expr::call(
                                "square",
                                vec![Expr::var("i")],
                            ))]),
                        ),
                        Stmt::reassign(
                            "i",
                            Expr::binary(BinaryOp::Add, Expr::var("i"), Expr::num(1)),
                        ),
                    ],
                ),
                Stmt::switch(
                    Expr::var("i"),
                    vec![
                        Case::new(Expr::num(3), vec![Stmt::println(Expr::str("three"))]),
                        Case::new(Expr::num(4), vec![Stmt::println(Expr::str("one"))]),
                    ],
                    Some(vec![Stmt::println(Expr::num(0))]),
                ),
            ],
        )),
    ])
}

#[test]
fn println_number_loads_then_calls() {
    let program = main_with(vec![Stmt::println(Expr::num(42))]);

    let arm = code_lines(&generate(&program, Target::Aarch64MacOs));
    let load = position(&arm, "mov x0, #42");
    assert_eq!(arm[load + 1], "bl _print_number");

    let x86 = code_lines(&generate(&program, Target::X86_64Linux));
    let load = position(&x86, "movq $42, %rax");
    assert_eq!(x86[load + 1], "call _print_number");
}

#[test]
fn addition_uses_two_slot_stack_protocol() {
    let program = main_with(vec![Stmt::assign(
        "result",
        Expr::binary(BinaryOp::Add, Expr::num(10), Expr::num(5)),
    )]);

    let arm = code_lines(&generate(&program, Target::Aarch64MacOs));
    let start = position(&arm, "mov x0, #10");
    assert_eq!(
        &arm[start..start + 7],
        &[
            "mov x0, #10",
            "str x0, [sp, #-16]!",
            "mov x0, #5",
            "mov x1, x0",
            "ldr x0, [sp], #16",
            "add x0, x0, x1",
            "str x0, [x29, #-8]",
        ]
    );

    let x86 = code_lines(&generate(&program, Target::X86_64Linux));
    let start = position(&x86, "movq $10, %rax");
    assert_eq!(
        &x86[start..start + 7],
        &[
            "movq $10, %rax",
            "pushq %rax",
            "movq $5, %rax",
            "movq %rax, %rbx",
            "popq %rax",
            "addq %rbx, %rax",
            "movq %rax, -8(%rbp)",
        ]
    );
}

#[test]
fn if_without_else_branches_to_label_after_then_block() {
    let program = main_with(vec![
        Stmt::assign("x", Expr::num(7)),
        Stmt::if_then(
            Expr::binary(BinaryOp::Gt, Expr::var("x"), Expr::num(5)),
            vec![Stmt::println(Expr::var("x"))],
            None,
        ),
    ]);

    let arm = code_lines(&generate(&program, Target::Aarch64MacOs));
    let set = position(&arm, "cset x0, gt");
    assert_eq!(arm[set - 1], "cmp x0, x1");
    assert_eq!(arm[set + 1], "cbz x0, L1");
    let call = position(&arm, "bl _print_number");
    assert_eq!(arm[call + 1], "L1:");
    assert_eq!(count(&arm, "L1:"), 1);

    let x86 = code_lines(&generate(&program, Target::X86_64Linux));
    let set = position(&x86, "setg %al");
    assert_eq!(x86[set - 1], "cmpq %rbx, %rax");
    assert_eq!(x86[set + 2], "testq %rax, %rax");
    assert_eq!(x86[set + 3], "jz L1");
    let call = position(&x86, "call _print_number");
    assert_eq!(x86[call + 1], "L1:");
    assert_eq!(count(&x86, "L1:"), 1);
}

#[test]
fn switch_with_default_layout() {
    let program = main_with(vec![Stmt::switch(
        Expr::num(2),
        vec![
            Case::new(Expr::num(1), vec![Stmt::println(Expr::num(10))]),
            Case::new(Expr::num(2), vec![Stmt::println(Expr::num(20))]),
        ],
        Some(vec![Stmt::println(Expr::num(99))]),
    )]);

    // end = L1, cases = L2 and L3, default = L4
    let arm = code_lines(&generate(&program, Target::Aarch64MacOs));
    let first = position(&arm, "beq L2");
    let second = position(&arm, "beq L3");
    assert!(first < second);
    assert_eq!(arm[second + 1], "b L4");

    let case1 = position(&arm, "L2:");
    let case2 = position(&arm, "L3:");
    let default = position(&arm, "L4:");
    let end = position(&arm, "L1:");
    assert!(second < case1 && case1 < case2 && case2 < default && default < end);
    assert_eq!(arm[case2 - 1], "b L1");
    assert_eq!(arm[default - 1], "b L1");
    assert_eq!(&arm[default + 1..default + 3], &["mov x0, #99", "bl _print_number"]);
    assert_eq!(arm[end + 1], "add sp, sp, #16");

    let x86 = code_lines(&generate(&program, Target::X86_64Linux));
    let second = position(&x86, "je L3");
    assert!(position(&x86, "je L2") < second);
    assert_eq!(x86[second + 1], "jmp L4");
    assert_eq!(count(&x86, "jmp L1"), 2);
    let end = position(&x86, "L1:");
    assert!(position(&x86, "L4:") < end);
    assert_eq!(x86[end + 1], "addq $8, %rsp");
}

#[test]
fn switch_without_default_falls_to_end() {
    let program = main_with(vec![Stmt::switch(
        Expr::num(3),
        vec![
            Case::new(Expr::num(1), vec![Stmt::println(Expr::num(1))]),
            Case::new(Expr::num(2), vec![Stmt::println(Expr::num(2))]),
        ],
        None,
    )]);

    for target in TARGETS {
        let lines = code_lines(&generate(&program, target));
        let (last_test, fallback) = match target {
            Target::Aarch64MacOs => ("beq L3", "b L1"),
            Target::X86_64Linux => ("je L3", "jmp L1"),
        };
        let at = position(&lines, last_test);
        assert_eq!(lines[at + 1], fallback, "{}", target);
        // The fallback jump skips every case body.
        assert_eq!(lines[at + 2], "L2:", "{}", target);
    }
}

#[test]
fn repeated_string_literal_is_pooled_once() {
    let program = main_with(vec![
        Stmt::println(Expr::str("hello")),
        Stmt::println(Expr::str("hello")),
        Stmt::println(Expr::str("bye")),
    ]);

    let arm = code_lines(&generate(&program, Target::Aarch64MacOs));
    assert_eq!(count(&arm, ".asciz \"hello\""), 1);
    assert_eq!(count(&arm, "adrp x0, str_0@PAGE"), 2);
    assert_eq!(count(&arm, "add x0, x0, str_0@PAGEOFF"), 2);
    assert_eq!(count(&arm, "adrp x0, str_1@PAGE"), 1);
    assert_eq!(count(&arm, "bl _print_string"), 3);

    let x86 = code_lines(&generate(&program, Target::X86_64Linux));
    assert_eq!(count(&x86, ".asciz \"hello\""), 1);
    assert_eq!(count(&x86, "leaq str_0(%rip), %rax"), 2);
    assert_eq!(count(&x86, "call _print_string"), 3);

    // Data section in first-use order, after the code.
    let section = position(&x86, ".section .rodata");
    assert_eq!(
        &x86[section + 1..],
        &["str_0:", ".asciz \"hello\"", "str_1:", ".asciz \"bye\""]
    );
}

#[test]
fn output_is_deterministic() {
    for target in TARGETS {
        let first = generate(&kitchen_sink(), target);
        let second = generate(&kitchen_sink(), target);
        assert_eq!(fingerprint::digest(&first), fingerprint::digest(&second));
    }
}

#[test]
fn labels_are_unique_and_resolved() {
    for target in TARGETS {
        let mut backend = target.backend();
        let asm = backend.generate(&kitchen_sink()) + &backend.generate_runtime();
        let report = verify::check_labels(&asm).unwrap_or_else(|e| panic!("{}: {}", target, e));

        // for: 2, if/else: 2, switch with two cases and a default: 4
        let numbered: Vec<&String> = report
            .definitions
            .iter()
            .filter(|l| l.starts_with('L') && l[1..].chars().all(|c| c.is_ascii_digit()))
            .collect();
        assert_eq!(numbered.len(), 8, "{}", target);
        assert!(report.is_defined("_square"));
        assert!(report.reference_count("_square") >= 1);
    }
}

#[test]
fn expression_stack_is_balanced() {
    // ((1 + 2) * (3 - (4 / 5))) == a[6 + 7]
    let deep = Expr::binary(
        BinaryOp::Eq,
        Expr::binary(
            BinaryOp::Mul,
            Expr::binary(BinaryOp::Add, Expr::num(1), Expr::num(2)),
            Expr::binary(
                BinaryOp::Sub,
                Expr::num(3),
                Expr::binary(BinaryOp::Div, Expr::num(4), Expr::num(5)),
            ),
        ),
        Expr::index(
            Expr::var("a"),
            Expr::binary(BinaryOp::Add, Expr::num(6), Expr::num(7)),
        ),
    );
    let program = main_with(vec![
        Stmt::assign("a", Expr::slice("int", vec![Expr::num(1)])),
        Stmt::assign("r", deep),
        Stmt::assign(
            "m",
            Expr::binary(BinaryOp::Rem, Expr::var("r"), Expr::num(2)),
        ),
    ]);

    for target in TARGETS {
        let lines = code_lines(&generate(&program, target));
        assert_eq!(stack_depth(&lines, target), 0, "{}", target);
    }
    for target in TARGETS {
        let lines = code_lines(&generate(&kitchen_sink(), target));
        assert_eq!(stack_depth(&lines, target), 0, "{}", target);
    }
}

#[test]
fn entry_function_exits_and_others_return() {
    for target in TARGETS {
        let asm = generate(&kitchen_sink(), target);
        let lines = code_lines(&asm);
        let (exit, ret) = match target {
            Target::Aarch64MacOs => ("svc #0x80", "ret"),
            Target::X86_64Linux => ("syscall", "ret"),
        };
        assert_eq!(count(&lines, exit), 1, "{}", target);
        assert_eq!(count(&lines, ret), 1, "{}", target);
    }

    let arm = code_lines(&generate(&kitchen_sink(), Target::Aarch64MacOs));
    let square = position(&arm, "_square:");
    assert_eq!(arm[square + 4], "str x0, [x29, #-8]");

    let x86 = code_lines(&generate(&kitchen_sink(), Target::X86_64Linux));
    assert!(x86.contains(&"_start:".to_string()));
    assert!(!x86.contains(&"_main:".to_string()));
    let square = position(&x86, "_square:");
    assert_eq!(x86[square + 4], "movq %rdi, -8(%rbp)");
}

#[test]
fn frame_overflow_is_preserved() {
    let body = (0..9)
        .map(|i| Stmt::assign(&format!("v{}", i), Expr::num(i)))
        .collect();
    let program = main_with(body);

    let arm = code_lines(&generate(&program, Target::Aarch64MacOs));
    assert_eq!(count(&arm, "sub sp, sp, #64"), 1);
    assert!(arm.contains(&"str x0, [x29, #-72]".to_string()));

    let x86 = code_lines(&generate(&program, Target::X86_64Linux));
    assert_eq!(count(&x86, "subq $64, %rsp"), 1);
    assert!(x86.contains(&"movq %rax, -72(%rbp)".to_string()));
}

#[test]
fn labels_are_numbered_across_functions() {
    let branchy = |name: &str| {
        Stmt::func(Function::new(
            name,
            vec![],
            vec![Stmt::if_then(
                Expr::num(1),
                vec![Stmt::println(Expr::num(1))],
                Some(vec![Stmt::println(Expr::num(2))]),
            )],
        ))
    };
    let program = Program::new(vec![branchy("helper"), branchy("main")]);

    for target in TARGETS {
        let asm = generate(&program, target);
        let report = verify::check_labels(&asm).unwrap_or_else(|e| panic!("{}: {}", target, e));
        for label in ["L1", "L2", "L3", "L4"] {
            assert_eq!(
                report.definitions.iter().filter(|l| *l == label).count(),
                1,
                "{} {}",
                target,
                label
            );
        }
        assert!(!report.is_defined("L5"));

        // The second function continues the numbering.
        let lines = code_lines(&asm);
        assert!(position(&lines, "L3:") > position(&lines, "_helper:"));
        assert!(position(&lines, "L2:") < position(&lines, "L3:"));
    }
}

#[test]
fn runtime_is_emitted_in_a_code_section() {
    let program = main_with(vec![
        Stmt::println(Expr::str("hi")),
        Stmt::println(Expr::num(7)),
    ]);

    for (target, data, code) in [
        (
            Target::Aarch64MacOs,
            ".section __TEXT,__cstring,cstring_literals",
            ".section __TEXT,__text,regular,pure_instructions",
        ),
        (Target::X86_64Linux, ".section .rodata", ".section .text"),
    ] {
        let lines = code_lines(&compile_program(&program, target));
        let data_at = position(&lines, data);
        let runtime_at = position(&lines, "_print_number:");
        let code_at = lines
            .iter()
            .rposition(|l| l.starts_with(".section"))
            .expect("section directive");

        assert_eq!(lines[code_at], code, "{}", target);
        assert!(data_at < code_at && code_at < runtime_at, "{}", target);
        assert!(lines[runtime_at..].iter().all(|l| !l.starts_with(".asciz")));
    }
}
