//! Node types for petit programs.
//!
//! The tree is produced by the front end and handed to the backend read-only.
//! Every enum here is closed: lowering matches all variants explicitly.

use serde::{Deserialize, Serialize};

/// Name of the function that becomes the process entry point.
pub const ENTRY_FUNCTION: &str = "main";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<String>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInit {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Number(i64),
    Str(String),
    Bool(bool),
    Variable(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: String,
        #[serde(default)]
        arguments: Vec<Expr>,
    },
    FieldAccess {
        object: Box<Expr>,
        field: String,
    },
    SliceLiteral {
        element_type: String,
        #[serde(default)]
        elements: Vec<Expr>,
    },
    IndexAccess {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    StructLiteral {
        type_name: String,
        #[serde(default)]
        fields: Vec<FieldInit>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub value: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Func(Function),
    Expr(Expr),
    /// `var name type = value`
    Var {
        name: String,
        type_name: String,
        #[serde(default)]
        value: Option<Expr>,
    },
    /// `name := value`
    Assign {
        name: String,
        value: Expr,
    },
    /// `name = value`
    Reassign {
        name: String,
        value: Expr,
    },
    Block(Block),
    If {
        condition: Expr,
        then_block: Block,
        #[serde(default)]
        else_block: Option<Block>,
    },
    For {
        #[serde(default)]
        init: Option<Box<Stmt>>,
        #[serde(default)]
        condition: Option<Expr>,
        #[serde(default)]
        update: Option<Box<Stmt>>,
        body: Block,
    },
    Return(Option<Expr>),
    Switch {
        value: Expr,
        #[serde(default)]
        cases: Vec<Case>,
        #[serde(default)]
        default: Option<Block>,
    },
    Break,
    Continue,
    StructDef {
        name: String,
        #[serde(default)]
        fields: Vec<FieldDecl>,
    },
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    /// Function definitions in source order. Other top-level statements are
    /// not part of the native image.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Stmt::Func(func) => Some(func),
            _ => None,
        })
    }
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl Function {
    pub fn new(name: &str, parameters: Vec<Parameter>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.to_string(),
            parameters,
            return_type: None,
            body: Block::new(body),
        }
    }

    pub fn returning(mut self, type_name: &str) -> Self {
        self.return_type = Some(type_name.to_string());
        self
    }

    pub fn is_entry(&self) -> bool {
        self.name == ENTRY_FUNCTION
    }
}

impl Parameter {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

impl Expr {
    pub fn num(value: i64) -> Self {
        Expr::Number(value)
    }

    pub fn str(value: &str) -> Self {
        Expr::Str(value.to_string())
    }

    pub fn var(name: &str) -> Self {
        Expr::Variable(name.to_string())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(function: &str, arguments: Vec<Expr>) -> Self {
        Expr::Call {
            function: function.to_string(),
            arguments,
        }
    }

    pub fn field(object: Expr, field: &str) -> Self {
        Expr::FieldAccess {
            object: Box::new(object),
            field: field.to_string(),
        }
    }

    pub fn index(object: Expr, index: Expr) -> Self {
        Expr::IndexAccess {
            object: Box::new(object),
            index: Box::new(index),
        }
    }

    pub fn slice(element_type: &str, elements: Vec<Expr>) -> Self {
        Expr::SliceLiteral {
            element_type: element_type.to_string(),
            elements,
        }
    }
}

impl Stmt {
    pub fn func(function: Function) -> Self {
        Stmt::Func(function)
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    pub fn println(arg: Expr) -> Self {
        Stmt::Expr(Expr::call("println", vec![arg]))
    }

    pub fn var(name: &str, type_name: &str, value: Option<Expr>) -> Self {
        Stmt::Var {
            name: name.to_string(),
            type_name: type_name.to_string(),
            value,
        }
    }

    pub fn assign(name: &str, value: Expr) -> Self {
        Stmt::Assign {
            name: name.to_string(),
            value,
        }
    }

    pub fn reassign(name: &str, value: Expr) -> Self {
        Stmt::Reassign {
            name: name.to_string(),
            value,
        }
    }

    pub fn if_then(condition: Expr, then_block: Vec<Stmt>, else_block: Option<Vec<Stmt>>) -> Self {
        Stmt::If {
            condition,
            then_block: Block::new(then_block),
            else_block: else_block.map(Block::new),
        }
    }

    /// Condition-only `for cond { ... }` loop.
    pub fn for_while(condition: Expr, body: Vec<Stmt>) -> Self {
        Stmt::For {
            init: None,
            condition: Some(condition),
            update: None,
            body: Block::new(body),
        }
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::Return(value)
    }

    pub fn switch(value: Expr, cases: Vec<Case>, default: Option<Vec<Stmt>>) -> Self {
        Stmt::Switch {
            value,
            cases,
            default: default.map(Block::new),
        }
    }
}

impl Case {
    pub fn new(value: Expr, body: Vec<Stmt>) -> Self {
        Self {
            value,
            body: Block::new(body),
        }
    }
}
