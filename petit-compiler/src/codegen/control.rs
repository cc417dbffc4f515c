//! Statement and control-flow lowering.
//!
//! Each statement is lowered on its own against the current frame and the
//! run-wide label pool; nothing carries over between statements.

use super::frame::FRAME_SIZE;
use super::generator::Generator;
use super::isa::{Isa, PRINT_NUMBER, PRINT_STRING};
use crate::ast::{Block, Case, Expr, Stmt};

impl<I: Isa> Generator<I> {
    pub(super) fn lower_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.lower_stmt(stmt);
        }
    }

    pub(super) fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.lower_expr_stmt(expr),
            Stmt::Var { name, value, .. } => {
                let offset = self.frame.allocate(name);
                self.comment(&format!("var {}", name));
                match value {
                    Some(value) => self.lower_expr(value),
                    None => self.isa.load_immediate(&mut self.out, 0),
                }
                self.isa.store_local(&mut self.out, offset);
            }
            Stmt::Assign { name, value } => match self.frame.lookup(name) {
                Some(offset) => {
                    self.comment(&format!("{} = value (reassignment)", name));
                    self.lower_expr(value);
                    self.isa.store_local(&mut self.out, offset);
                }
                None => {
                    let offset = self.frame.allocate(name);
                    self.comment(&format!("{} := value", name));
                    self.lower_expr(value);
                    self.isa.store_local(&mut self.out, offset);
                }
            },
            Stmt::Reassign { name, value } => {
                // Assigning to an unbound name is skipped entirely.
                if let Some(offset) = self.frame.lookup(name) {
                    self.comment(&format!("{} = value", name));
                    self.lower_expr(value);
                    self.isa.store_local(&mut self.out, offset);
                }
            }
            Stmt::Block(block) => self.lower_block(block),
            Stmt::If {
                condition,
                then_block,
                else_block,
            } => self.lower_if(condition, then_block, else_block.as_ref()),
            Stmt::For { condition, body, .. } => self.lower_for(condition.as_ref(), body),
            Stmt::Return(value) => {
                if let Some(value) = value {
                    self.lower_expr(value);
                }
                self.isa.return_to_caller(&mut self.out, FRAME_SIZE);
            }
            Stmt::Switch {
                value,
                cases,
                default,
            } => self.lower_switch(value, cases, default.as_ref()),
            Stmt::Func(_) => {}
            Stmt::Break => {}
            Stmt::Continue => {}
            Stmt::StructDef { .. } => {}
        }
    }

    fn lower_expr_stmt(&mut self, expr: &Expr) {
        if let Expr::Call {
            function,
            arguments,
        } = expr
        {
            if function == "println" {
                if let Some(arg) = arguments.first() {
                    self.lower_println(arg);
                }
                return;
            }
        }
        self.lower_expr(expr);
    }

    fn lower_println(&mut self, arg: &Expr) {
        self.lower_expr(arg);

        let acc = self.isa.accumulator();
        if let Expr::Str(_) = arg {
            self.comment(&format!("Print string in {}", acc));
            self.isa.call(&mut self.out, PRINT_STRING);
        } else {
            self.comment(&format!("Print number in {}", acc));
            self.isa.call(&mut self.out, PRINT_NUMBER);
        }
    }

    /// With an else block the labels swap roles: the "end" label opens the
    /// else block and the "else" label closes the whole statement.
    fn lower_if(&mut self, condition: &Expr, then_block: &Block, else_block: Option<&Block>) {
        let end_label = self.labels.fresh();

        self.lower_expr(condition);
        self.isa.branch_if_zero(&mut self.out, &end_label);

        self.lower_block(then_block);

        match else_block {
            Some(else_block) => {
                let else_label = self.labels.fresh();
                self.isa.jump(&mut self.out, &else_label);
                self.out.label(&end_label);
                self.lower_block(else_block);
                self.out.label(&else_label);
            }
            None => self.out.label(&end_label),
        }
    }

    fn lower_for(&mut self, condition: Option<&Expr>, body: &Block) {
        let start_label = self.labels.fresh();
        let end_label = self.labels.fresh();

        self.out.label(&start_label);
        if let Some(condition) = condition {
            self.lower_expr(condition);
            self.isa.branch_if_zero(&mut self.out, &end_label);
        }

        self.lower_block(body);

        self.isa.jump(&mut self.out, &start_label);
        self.out.label(&end_label);
    }

    /// Cases are tested in declaration order and never fall through.
    fn lower_switch(&mut self, value: &Expr, cases: &[Case], default: Option<&Block>) {
        let end_label = self.labels.fresh();

        self.comment("switch expression");
        self.lower_expr(value);
        self.isa.push_accumulator(&mut self.out);

        let case_labels: Vec<String> = cases.iter().map(|_| self.labels.fresh()).collect();
        let default_label = default.map(|_| self.labels.fresh());

        for (i, case) in cases.iter().enumerate() {
            self.comment(&format!("case {} comparison", i));
            self.lower_expr(&case.value);
            self.isa.switch_compare(&mut self.out, &case_labels[i]);
        }

        match &default_label {
            Some(label) => self.isa.jump(&mut self.out, label),
            None => self.isa.jump(&mut self.out, &end_label),
        }

        for (i, case) in cases.iter().enumerate() {
            self.out.label(&case_labels[i]);
            self.comment(&format!("case {} body", i));
            self.lower_block(&case.body);
            self.isa.jump(&mut self.out, &end_label);
        }

        if let (Some(label), Some(body)) = (&default_label, default) {
            self.out.label(label);
            self.comment("default case");
            self.lower_block(body);
        }

        self.out.label(&end_label);
        self.isa.drop_switch_value(&mut self.out);
    }
}
