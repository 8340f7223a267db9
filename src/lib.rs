//! # Introduction
//!
//! pseudoc translates a small imperative pseudocode language into C++.
//! The generated translation unit can be handed to any C++ compiler.
//!
//! ## Translation pipeline
//!
//! ```text
//! Source → Lexer → Parser (+ scope stack) → AST → Code generator → C++
//! ```
//!
//! 1. [`parser`] tokenises the source, fuses two-word keywords such as
//!    `end if`, and builds an AST while resolving names against a stack of
//!    lexical scopes.
//! 2. [`codegen`] walks the AST and emits C++, parenthesizing every binary
//!    operation so the language's flat left-to-right grouping is preserved.
//! 3. [`diagnostics`] collects every positioned warning and error raised on
//!    the way. Only lexical failures abort a translation.
//!
//! ## The language
//!
//! ```text
//! declare total <- 0;
//! procedure add(a, b) begin return a + b; end procedure;
//! while total < 10 loop total <- add(total, 3); end loop;
//! if total = 12 then put("twelve"); else put(total); end if;
//! ```
//!
//! Every value is an integer. Operators have no precedence.

pub mod codegen;
pub mod diagnostics;
pub mod parser;

use diagnostics::Diagnostics;
use log::info;
use parser::ast::Program;
use parser::lexer::{LexError, Lexer};
use thiserror::Error;

/// Fatal translation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Lex(#[from] LexError),
}

/// Result of a completed translation
#[derive(Debug, Clone)]
pub struct Translation {
    /// The parsed program; statements that failed to parse are absent
    pub program: Program,
    /// Generated C++ source
    pub output: String,
    /// Warnings and errors in the order they were raised
    pub diagnostics: Diagnostics,
}

/// Run the whole pipeline over `source`.
///
/// Parse problems do not fail the call; they are returned as diagnostics next
/// to whatever could be translated. Only an unterminated comment or string
/// is fatal.
pub fn translate(source: &str) -> Result<Translation, TranslateError> {
    let tokens = Lexer::new(source).tokenize()?;
    let (program, diagnostics) = parser::parse(tokens);
    let output = codegen::generate(&program);

    info!(
        "translated {} top-level statements with {} diagnostics",
        program.nodes.len(),
        diagnostics.len()
    );

    Ok(Translation {
        program,
        output,
        diagnostics,
    })
}
