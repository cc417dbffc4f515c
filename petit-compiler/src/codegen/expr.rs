//! Expression lowering.
//!
//! Every expression leaves its value in the accumulator. Binary operations
//! use the stack as a second slot: the left operand is evaluated first and
//! pushed, the right operand is evaluated, then the left is popped back.

use super::generator::Generator;
use super::isa::{Arith, Cond, Isa};
use crate::ast::{BinaryOp, Expr};

/// Byte offset of a named field. Fields outside the known set read offset 0.
pub fn field_offset(field: &str) -> usize {
    match field {
        "x" | "name" | "first" => 0,
        "y" | "age" | "second" => 8,
        "z" | "third" => 16,
        _ => 0,
    }
}

impl<I: Isa> Generator<I> {
    pub(super) fn lower_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(value) => self.isa.load_immediate(&mut self.out, *value),
            Expr::Str(value) => {
                let label = self.strings.intern(value);
                self.isa.load_string_address(&mut self.out, &label);
            }
            Expr::Variable(name) => {
                // Unbound names emit nothing; the accumulator keeps whatever it held.
                if let Some(offset) = self.frame.lookup(name) {
                    self.isa.load_local(&mut self.out, offset);
                }
            }
            Expr::Binary { op, left, right } => self.lower_binary(*op, left, right),
            Expr::Call {
                function,
                arguments,
            } => self.lower_call(function, arguments),
            Expr::FieldAccess { object, field } => {
                self.comment("Field access: obj.field");
                self.lower_expr(object);
                let offset = field_offset(field);
                self.comment(&format!("Access field '{}' at offset {}", field, offset));
                self.isa.load_field(&mut self.out, offset);
            }
            Expr::SliceLiteral { elements, .. } => {
                // Only the element count is materialised.
                self.comment("Slice literal creation");
                self.isa.load_immediate(&mut self.out, elements.len() as i64);
            }
            Expr::IndexAccess { object, index } => {
                self.comment("Index access: arr[index]");
                self.lower_expr(object);
                self.isa.push_accumulator(&mut self.out);
                self.lower_expr(index);
                self.isa.pop_secondary(&mut self.out);
                self.isa.load_indexed(&mut self.out);
            }
            Expr::Bool(_) => {}
            Expr::StructLiteral { .. } => {}
        }
    }

    fn lower_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) {
        self.lower_expr(left);
        self.isa.push_accumulator(&mut self.out);
        self.lower_expr(right);
        self.isa.pop_left_operand(&mut self.out);

        let out = &mut self.out;
        match op {
            BinaryOp::Add => self.isa.arith(out, Arith::Add),
            BinaryOp::Sub => self.isa.arith(out, Arith::Sub),
            BinaryOp::Mul => self.isa.arith(out, Arith::Mul),
            BinaryOp::Div => self.isa.arith(out, Arith::Div),
            BinaryOp::Eq => self.isa.compare_set(out, Cond::Eq),
            BinaryOp::Ne => self.isa.compare_set(out, Cond::Ne),
            BinaryOp::Lt => self.isa.compare_set(out, Cond::Lt),
            BinaryOp::Le => self.isa.compare_set(out, Cond::Le),
            BinaryOp::Gt => self.isa.compare_set(out, Cond::Gt),
            BinaryOp::Ge => self.isa.compare_set(out, Cond::Ge),
            // No native lowering: the left operand is left in the accumulator.
            BinaryOp::Rem => {}
            BinaryOp::And => {}
            BinaryOp::Or => {}
        }
    }

    /// Only the first argument is passed; the rest are not evaluated.
    fn lower_call(&mut self, function: &str, arguments: &[Expr]) {
        if let Some(first) = arguments.first() {
            self.lower_expr(first);
            self.isa.move_to_first_arg(&mut self.out);
        }
        let symbol = self.isa.call_symbol(function);
        self.isa.call(&mut self.out, &symbol);
    }
}
