//! Statement parsing implementation
//!
//! This module is the statement-level driver. It owns the two loops that
//! consume statements (the program loop and the block loop) and parses every
//! statement form:
//!
//! - Declarations: `declare x <- 5;`
//! - Assignments: `x <- x + 1;`
//! - Control flow: `if ... then ... elseif ... else ... end if;`, `while ... loop ... end loop;`
//! - Output: `put(x);`
//! - Procedures: `procedure f(a, b) begin ... end procedure;` (top level only)
//! - Procedure call statements: `f(1, 2);`
//! - Returns: `return x;` (inside blocks only)
//! - Free-standing blocks: `{ ... }`
//!
//! # Grammar
//!
//! ```text
//! program    ::= { declaration | procedure | assignment | call_stmt | if | while | put | block }*
//! block      ::= { return | declaration | assignment | call_stmt | if | while | put | '{' block '}' }*
//! declaration::= 'declare' IDENT [ '<-' expr ] ';'
//! assignment ::= IDENT '<-' expr ';'
//! if         ::= 'if' expr 'then' block { 'elseif' expr 'then' block } [ 'else' block ] 'end if' ';'
//! while      ::= 'while' expr 'loop' block 'end loop' ';'
//! put        ::= 'put' '(' expr ')' ';'
//! procedure  ::= 'procedure' IDENT '(' [ IDENT { ',' IDENT } ] ')' 'begin' block 'end procedure' ';'
//! call_stmt  ::= IDENT '(' [ expr { ',' expr } ] ')' ';'
//! return     ::= 'return' expr ';'
//! ```
//!
//! # Failure policy
//!
//! A construct that is missing a required token returns a [`ParseError`]; the
//! driver records it and carries on from the token where the construct
//! stopped. Tokens that cannot start a statement are reported and skipped.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::symbols::VarType;
use log::debug;

/// Where a statement appears; decides which forms are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatementContext {
    TopLevel,
    Block,
}

impl Parser {
    /// Parse the entire program.
    ///
    /// Never fails as a whole: every problem ends up in the diagnostics and the
    /// offending statement is left out of the returned [`Program`].
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::new();

        while !self.is_at_end() {
            if let Some(node) = self.parse_statement(StatementContext::TopLevel) {
                program.nodes.push(node);
            }
        }

        debug!(
            "parsed {} top-level statements with {} diagnostics",
            program.nodes.len(),
            self.diagnostics.len()
        );
        program
    }

    /// Parse one statement, recording any failure as a diagnostic.
    ///
    /// Always consumes at least one token unless already at end of file.
    pub(crate) fn parse_statement(&mut self, context: StatementContext) -> Option<AstNode> {
        let token = self.peek().clone();

        let result = match token.kind {
            TokenKind::Semicolon => {
                self.advance();
                self.diagnostics.warning("extra semicolon", token.location);
                return None;
            }
            TokenKind::Declare => {
                self.advance();
                self.parse_declaration()
            }
            TokenKind::Identifier => self.parse_identifier_statement(),
            TokenKind::If => {
                self.advance();
                self.parse_if_statement()
            }
            TokenKind::While => {
                self.advance();
                self.parse_while_statement()
            }
            TokenKind::Put => {
                self.advance();
                self.parse_put_statement()
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_braced_block()
            }
            TokenKind::Procedure if context == StatementContext::TopLevel => {
                self.advance();
                self.parse_procedure()
            }
            TokenKind::Return if context == StatementContext::Block => {
                self.advance();
                self.parse_return_statement()
            }
            _ => {
                self.advance();
                Err(ParseError::UnexpectedToken {
                    found: token.to_string(),
                    context: match context {
                        StatementContext::TopLevel => "at top level",
                        StatementContext::Block => "in block",
                    },
                    location: token.location,
                })
            }
        };

        match result {
            Ok(node) => Some(node),
            Err(err) => {
                self.report(err);
                None
            }
        }
    }

    /// Identifier at statement position: look one token further.
    /// `(` makes it a call statement, `<-` an assignment.
    fn parse_identifier_statement(&mut self) -> Result<AstNode, ParseError> {
        let checkpoint = self.checkpoint();
        let ident = self.advance().clone();

        match self.peek_kind() {
            TokenKind::LParen => {
                self.rewind(checkpoint);
                self.parse_call_statement()
            }
            TokenKind::Assign => {
                self.rewind(checkpoint);
                self.parse_assignment()
            }
            _ => Err(ParseError::Expected {
                expected: "'<-' or '(' after identifier".to_string(),
                found: self.peek().to_string(),
                location: ident.location,
            }),
        }
    }

    fn is_block_terminator(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::EndIf
                | TokenKind::EndLoop
                | TokenKind::EndProcedure
                | TokenKind::Else
                | TokenKind::Elseif
                | TokenKind::RBrace
                | TokenKind::Eof
        )
    }

    /// Parse a scoped block up to (not including) its terminator.
    ///
    /// The scope is opened before `params` are declared into it and closed
    /// when the block ends, whether or not its statements parsed cleanly.
    /// Fails only when blocks are nested too deeply.
    pub(crate) fn parse_block(&mut self, params: &[Param]) -> Result<Block, ParseError> {
        let location = self.current_location();
        self.enter_nesting("block")?;
        self.symbols.enter_scope();

        for param in params {
            self.symbols.declare(&param.name, VarType::Integer);
        }

        let mut statements = Vec::new();
        while !self.is_block_terminator() {
            if let Some(node) = self.parse_statement(StatementContext::Block) {
                statements.push(node);
            }
        }

        self.symbols.exit_scope();
        self.exit_nesting();
        Ok(Block {
            statements,
            location,
        })
    }

    /// Parse `{ block }` after the opening brace
    fn parse_braced_block(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();
        let mut block = self.parse_block(&[])?;
        self.expect_token(TokenKind::RBrace, "'}' after block")?;

        block.location = loc;
        Ok(AstNode::Block(block))
    }

    /// Parse declaration after `declare`
    fn parse_declaration(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();
        let name = self
            .expect_identifier("variable name after 'declare'")?
            .lexeme;

        let init = if self.match_token(TokenKind::Assign) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect_token(TokenKind::Semicolon, "';' after declaration")?;

        // Decided before declaring so a same-scope redeclaration is detected
        let storage = if self.symbols.is_global_scope() {
            Storage::Global
        } else if self.symbols.is_declared_in_current_scope(&name) {
            Storage::Rebind
        } else {
            Storage::Local
        };
        self.symbols.declare(&name, VarType::Integer);

        Ok(AstNode::Declaration {
            name,
            init,
            storage,
            location: loc,
        })
    }

    /// Parse assignment: IDENT '<-' expr ';'
    ///
    /// The target must resolve; otherwise the whole statement is dropped.
    fn parse_assignment(&mut self) -> Result<AstNode, ParseError> {
        let target = self.expect_identifier("assignment target")?;
        self.expect_token(TokenKind::Assign, "'<-' after identifier")?;
        let value = self.parse_expression()?;
        self.expect_token(TokenKind::Semicolon, "';' after assignment")?;

        if !self.symbols.is_declared(&target.lexeme) {
            return Err(ParseError::UndeclaredAssignment {
                name: target.lexeme,
                location: target.location,
            });
        }

        Ok(AstNode::Assignment {
            name: target.lexeme,
            value: Box::new(value),
            location: target.location,
        })
    }

    /// Parse if statement after `if`
    fn parse_if_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        let condition = Box::new(self.parse_expression()?);
        self.expect_token(TokenKind::Then, "'then' after if condition")?;
        let then_branch = self.parse_block(&[])?;

        let mut elseif_clauses = Vec::new();
        while self.match_token(TokenKind::Elseif) {
            let clause_loc = self.previous_location();
            let condition = Box::new(self.parse_expression()?);
            self.expect_token(TokenKind::Then, "'then' after elseif condition")?;
            let body = self.parse_block(&[])?;

            elseif_clauses.push(ElseIfClause {
                condition,
                body,
                location: clause_loc,
            });
        }

        let else_clause = if self.match_token(TokenKind::Else) {
            let clause_loc = self.previous_location();
            Some(ElseClause {
                body: self.parse_block(&[])?,
                location: clause_loc,
            })
        } else {
            None
        };

        self.expect_token(TokenKind::EndIf, "'end if'")?;
        self.expect_token(TokenKind::Semicolon, "';' after 'end if'")?;

        Ok(AstNode::If {
            condition,
            then_branch,
            elseif_clauses,
            else_clause,
            location: loc,
        })
    }

    /// Parse while statement after `while`
    fn parse_while_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        let condition = Box::new(self.parse_expression()?);
        self.expect_token(TokenKind::Loop, "'loop' after while condition")?;
        let body = self.parse_block(&[])?;
        self.expect_token(TokenKind::EndLoop, "'end loop'")?;
        self.expect_token(TokenKind::Semicolon, "';' after 'end loop'")?;

        Ok(AstNode::While {
            condition,
            body,
            location: loc,
        })
    }

    /// Parse put statement after `put`
    fn parse_put_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        self.expect_token(TokenKind::LParen, "'(' after 'put'")?;
        let expr = Box::new(self.parse_expression()?);
        self.expect_token(TokenKind::RParen, "')' after put expression")?;
        self.expect_token(TokenKind::Semicolon, "';' after put statement")?;

        Ok(AstNode::Put {
            expr,
            location: loc,
        })
    }

    /// Parse procedure definition after `procedure`
    fn parse_procedure(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();
        let name = self.expect_identifier("procedure name")?.lexeme;

        self.expect_token(TokenKind::LParen, "'(' after procedure name")?;
        let params = self.parse_parameter_list(&name)?;
        self.expect_token(TokenKind::RParen, "')' after parameters")?;
        self.expect_token(TokenKind::Begin, "'begin' after procedure header")?;

        let body = self.parse_block(&params)?;

        self.expect_token(TokenKind::EndProcedure, "'end procedure'")?;
        self.expect_token(TokenKind::Semicolon, "';' after 'end procedure'")?;

        Ok(AstNode::Procedure {
            name,
            params,
            body,
            location: loc,
        })
    }

    /// Parse parameter list: IDENT { ',' IDENT }
    fn parse_parameter_list(&mut self, procedure: &str) -> Result<Vec<Param>, ParseError> {
        let mut params: Vec<Param> = Vec::new();

        if self.check(TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            let token = self.expect_identifier("parameter name")?;
            if params.iter().any(|p| p.name == token.lexeme) {
                return Err(ParseError::DuplicateParameter {
                    name: token.lexeme,
                    procedure: procedure.to_string(),
                    location: token.location,
                });
            }
            params.push(Param {
                name: token.lexeme,
                location: token.location,
            });

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse procedure call statement: call ';'
    fn parse_call_statement(&mut self) -> Result<AstNode, ParseError> {
        let call = self.parse_call()?;
        let loc = *call.location();
        self.expect_token(TokenKind::Semicolon, "';' after procedure call")?;

        Ok(AstNode::CallStatement {
            call: Box::new(call),
            location: loc,
        })
    }

    /// Parse return statement after `return`
    fn parse_return_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        let expr = Box::new(self.parse_expression()?);
        self.expect_token(TokenKind::Semicolon, "';' after return statement")?;

        Ok(AstNode::Return {
            expr,
            location: loc,
        })
    }
}
