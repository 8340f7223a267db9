//! Pseudocode front end
//!
//! This module transforms pseudocode source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - `parse`, `statements`, `expressions`: Parsing (tokens → AST)
//! - [`symbols`]: Lexical scopes used to resolve names while parsing
//! - [`ast`]: AST node definitions
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with one token of lookahead. Binary
//! operators have no precedence and chain strictly left to right. Name
//! resolution happens inline during the parse; there is no separate pass.

pub mod ast;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;
pub mod symbols;

use crate::diagnostics::Diagnostics;
use ast::Program;
use lexer::Token;
use parse::Parser;

/// Parse a token stream into a [`Program`], returning the diagnostics
/// collected along the way.
pub fn parse(tokens: Vec<Token>) -> (Program, Diagnostics) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    (program, parser.into_diagnostics())
}
