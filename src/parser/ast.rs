// AST (Abstract Syntax Tree) definitions for the pseudocode translator

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Binary operators
///
/// The source language gives every operator the same precedence, so arithmetic
/// and relational operators share one enum and one left-associative chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinOp {
    /// Operator spelling in the generated C++.
    pub fn target_symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
        }
    }
}

/// Where a declared binding lives once translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Declared in the global scope: hoisted to a file-scope variable,
    /// initialised in place by a store.
    Global,
    /// First declaration of the name in a nested scope: a fresh binding.
    Local,
    /// Re-declaration of a name already bound in the same scope: a store.
    Rebind,
}

/// Procedure parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub location: SourceLocation,
}

/// A scoped statement list (if/elseif/else/while/procedure bodies, `{ ... }`)
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<AstNode>,
    pub location: SourceLocation,
}

/// `elseif <cond> then <block>`
#[derive(Debug, Clone, PartialEq)]
pub struct ElseIfClause {
    pub condition: Box<AstNode>,
    pub body: Block,
    pub location: SourceLocation,
}

/// `else <block>`
#[derive(Debug, Clone, PartialEq)]
pub struct ElseClause {
    pub body: Block,
    pub location: SourceLocation,
}

/// AST nodes representing statements and expressions
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    // Statements
    Declaration {
        name: String,
        init: Option<Box<AstNode>>,
        storage: Storage,
        location: SourceLocation,
    },
    Assignment {
        name: String,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    If {
        condition: Box<AstNode>,
        then_branch: Block,
        elseif_clauses: Vec<ElseIfClause>,
        else_clause: Option<ElseClause>,
        location: SourceLocation,
    },
    While {
        condition: Box<AstNode>,
        body: Block,
        location: SourceLocation,
    },
    Block(Block),
    Put {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
    Procedure {
        name: String,
        params: Vec<Param>,
        body: Block,
        location: SourceLocation,
    },
    /// Procedure call used as a statement (`f(x);`)
    CallStatement {
        call: Box<AstNode>,
        location: SourceLocation,
    },
    Return {
        expr: Box<AstNode>,
        location: SourceLocation,
    },

    // Expressions
    Number(String, SourceLocation),
    StringLiteral(String, SourceLocation),
    Identifier(String, SourceLocation),
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    ProcedureCall {
        name: String,
        args: Vec<AstNode>,
        location: SourceLocation,
    },
    /// Placeholder for a lexically invalid token met in expression position
    Unknown(String, SourceLocation),
}

impl AstNode {
    /// Get the source location of this node
    pub fn location(&self) -> &SourceLocation {
        match self {
            AstNode::Declaration { location, .. } => location,
            AstNode::Assignment { location, .. } => location,
            AstNode::If { location, .. } => location,
            AstNode::While { location, .. } => location,
            AstNode::Block(block) => &block.location,
            AstNode::Put { location, .. } => location,
            AstNode::Procedure { location, .. } => location,
            AstNode::CallStatement { location, .. } => location,
            AstNode::Return { location, .. } => location,
            AstNode::Number(_, loc) => loc,
            AstNode::StringLiteral(_, loc) => loc,
            AstNode::Identifier(_, loc) => loc,
            AstNode::BinaryOp { location, .. } => location,
            AstNode::ProcedureCall { location, .. } => location,
            AstNode::Unknown(_, loc) => loc,
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub nodes: Vec<AstNode>, // Top-level statements and procedures, in source order
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
