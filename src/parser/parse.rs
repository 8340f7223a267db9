//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, cursor helpers, and construction.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `statements`: the statement driver (program and block loops, every statement form)
//! - `expressions`: the flat, left-associative expression chain and primaries
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state: the token cursor, the
//! [`SymbolTable`] and the [`Diagnostics`] accumulator. All three live only for
//! the duration of one parse, so independent parses never share state.

use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use crate::parser::symbols::SymbolTable;
use thiserror::Error;

/// Failure of a single construct.
///
/// A sub-parser that returns this leaves no node behind; the statement driver
/// records it as a diagnostic and resumes at the current token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    Expected {
        expected: String,
        found: String,
        location: SourceLocation,
    },

    #[error("unexpected {found} {context}")]
    UnexpectedToken {
        found: String,
        context: &'static str,
        location: SourceLocation,
    },

    #[error("expected right operand after '{operator}', found {found}")]
    MissingOperand {
        operator: String,
        found: String,
        location: SourceLocation,
    },

    #[error("assignment to undeclared variable '{name}'")]
    UndeclaredAssignment {
        name: String,
        location: SourceLocation,
    },

    #[error("duplicate parameter '{name}' in procedure '{procedure}'")]
    DuplicateParameter {
        name: String,
        procedure: String,
        location: SourceLocation,
    },

    #[error("{what} nested deeper than {limit} levels")]
    TooDeep {
        what: &'static str,
        limit: usize,
        location: SourceLocation,
    },
}

impl ParseError {
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Expected { location, .. }
            | ParseError::UnexpectedToken { location, .. }
            | ParseError::MissingOperand { location, .. }
            | ParseError::UndeclaredAssignment { location, .. }
            | ParseError::DuplicateParameter { location, .. }
            | ParseError::TooDeep { location, .. } => *location,
        }
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: err.to_string(),
            location: err.location(),
        }
    }
}

/// Limit on blocks and parenthesized sub-expressions open at once
pub(crate) const MAX_NESTING_DEPTH: usize = 128;

/// Limit on the height of a single expression tree
pub(crate) const MAX_EXPRESSION_HEIGHT: usize = 1024;

/// Saved cursor position for bounded one-token lookahead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Checkpoint(usize);

/// Recursive descent parser for the pseudocode language
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) symbols: SymbolTable,
    pub(crate) diagnostics: Diagnostics,
    nesting: usize,
}

impl Parser {
    /// Create a parser over an already tokenized stream.
    ///
    /// An end-of-file token is appended if the stream lacks one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let location = tokens.last().map(|t| t.location).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "", location));
        }

        Self {
            tokens,
            position: 0,
            symbols: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
            nesting: 0,
        }
    }

    /// Tokenize `source` and create a parser over the result.
    pub fn from_source(source: &str) -> Result<Self, LexError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self::new(tokens))
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    // ===== Helper methods =====

    /// Record a failed construct as an error diagnostic.
    pub(crate) fn report(&mut self, err: ParseError) {
        self.diagnostics.push(err.into());
    }

    /// Open one nesting level for a block or sub-expression.
    ///
    /// Every successful call must be paired with [`Parser::exit_nesting`].
    pub(crate) fn enter_nesting(&mut self, what: &'static str) -> Result<(), ParseError> {
        if self.nesting >= MAX_NESTING_DEPTH {
            return Err(ParseError::TooDeep {
                what,
                limit: MAX_NESTING_DEPTH,
                location: self.current_location(),
            });
        }
        self.nesting += 1;
        Ok(())
    }

    pub(crate) fn exit_nesting(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.position)
    }

    pub(crate) fn rewind(&mut self, checkpoint: Checkpoint) {
        self.position = checkpoint.0;
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub(crate) fn peek(&self) -> &Token {
        // The stream always ends with Eof and the cursor never moves past it
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn expect_token(
        &mut self,
        kind: TokenKind,
        expected: &str,
    ) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance().clone())
        } else {
            Err(ParseError::Expected {
                expected: expected.to_string(),
                found: self.peek().to_string(),
                location: self.current_location(),
            })
        }
    }

    pub(crate) fn expect_identifier(&mut self, expected: &str) -> Result<Token, ParseError> {
        self.expect_token(TokenKind::Identifier, expected)
    }
}
