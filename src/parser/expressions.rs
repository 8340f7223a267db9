//! Expression parsing implementation
//!
//! The language has no operator precedence: arithmetic and relational
//! operators all bind equally and associate left to right over a flat chain
//! of primaries, so `a - b + c < d` groups as `(((a - b) + c) < d)`.
//! Parentheses are the only way to regroup.
//!
//! ```text
//! expr    ::= primary { op primary }*
//! op      ::= '+' | '-' | '*' | '/' | '=' | '!=' | '<' | '>' | '<=' | '>='
//! primary ::= NUMBER | STRING | IDENT | call | '(' expr ')'
//! call    ::= IDENT '(' [ expr { ',' expr } ] ')'
//! ```
//!
//! Identifier references are resolved against the symbol table as they are
//! parsed. An unresolved name is reported but still produces a node.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser, MAX_EXPRESSION_HEIGHT};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.parse_measured_expression().map(|(node, _)| node)
    }

    /// Parse an expression and report the height of its tree.
    ///
    /// Parser recursion is bounded by the nesting counter; the height bound
    /// keeps long operator chains shallow enough for the code generator.
    fn parse_measured_expression(&mut self) -> Result<(AstNode, usize), ParseError> {
        self.enter_nesting("expression")?;
        let result = self.parse_operator_chain();
        self.exit_nesting();
        result
    }

    fn parse_operator_chain(&mut self) -> Result<(AstNode, usize), ParseError> {
        let (mut left, mut height) = self.parse_primary()?;

        while let Some(op) = self.match_binary_operator() {
            let operator = self.previous().clone();

            if !self.starts_primary() {
                return Err(ParseError::MissingOperand {
                    operator: operator.lexeme,
                    found: self.peek().to_string(),
                    location: operator.location,
                });
            }

            let (right, right_height) = self.parse_primary()?;
            height = height.max(right_height) + 1;
            if height > MAX_EXPRESSION_HEIGHT {
                return Err(ParseError::TooDeep {
                    what: "expression",
                    limit: MAX_EXPRESSION_HEIGHT,
                    location: operator.location,
                });
            }

            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location: operator.location,
            };
        }

        Ok((left, height))
    }

    /// Consume a binary operator if one is next
    fn match_binary_operator(&mut self) -> Option<BinOp> {
        let op = match self.peek_kind() {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Equal => BinOp::Eq,
            TokenKind::NotEqual => BinOp::Ne,
            TokenKind::Less => BinOp::Lt,
            TokenKind::Greater => BinOp::Gt,
            TokenKind::LessEqual => BinOp::Le,
            TokenKind::GreaterEqual => BinOp::Ge,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn starts_primary(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Number
                | TokenKind::String
                | TokenKind::Identifier
                | TokenKind::LParen
                | TokenKind::Unknown
        )
    }

    /// Parse primary (literals, variables, calls, parenthesized expressions)
    fn parse_primary(&mut self) -> Result<(AstNode, usize), ParseError> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Number => {
                self.advance();
                // Generated code stores every value in a C++ `int`
                if token.lexeme.parse::<i32>().is_err() {
                    self.diagnostics.error(
                        format!("integer literal {} is out of range", token.lexeme),
                        token.location,
                    );
                }
                Ok((AstNode::Number(token.lexeme, token.location), 1))
            }
            TokenKind::String => {
                self.advance();
                Ok((AstNode::StringLiteral(token.lexeme, token.location), 1))
            }
            TokenKind::Identifier => {
                let is_call = self
                    .peek_ahead(1)
                    .is_some_and(|next| next.kind == TokenKind::LParen);
                if is_call {
                    return self.parse_measured_call();
                }

                self.advance();
                if !self.symbols.is_declared(&token.lexeme) {
                    self.diagnostics.error(
                        format!("undeclared variable '{}'", token.lexeme),
                        token.location,
                    );
                }
                Ok((AstNode::Identifier(token.lexeme, token.location), 1))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_measured_expression()?;
                self.expect_token(TokenKind::RParen, "')' after expression")?;
                Ok(expr)
            }
            TokenKind::Unknown => {
                self.advance();
                self.diagnostics.error(
                    format!("unexpected {} in expression", token),
                    token.location,
                );
                Ok((AstNode::Unknown(token.lexeme, token.location), 1))
            }
            _ => Err(ParseError::Expected {
                expected: "expression".to_string(),
                found: token.to_string(),
                location: token.location,
            }),
        }
    }

    /// Parse procedure call: IDENT '(' args ')'
    pub(crate) fn parse_call(&mut self) -> Result<AstNode, ParseError> {
        self.parse_measured_call().map(|(node, _)| node)
    }

    fn parse_measured_call(&mut self) -> Result<(AstNode, usize), ParseError> {
        let name = self.expect_identifier("procedure name")?;
        self.expect_token(TokenKind::LParen, "'(' after procedure name")?;
        let (args, args_height) = self.parse_argument_list()?;
        self.expect_token(TokenKind::RParen, "')' after arguments")?;

        let height = args_height + 1;
        if height > MAX_EXPRESSION_HEIGHT {
            return Err(ParseError::TooDeep {
                what: "expression",
                limit: MAX_EXPRESSION_HEIGHT,
                location: name.location,
            });
        }

        let call = AstNode::ProcedureCall {
            name: name.lexeme,
            args,
            location: name.location,
        };
        Ok((call, height))
    }

    /// Parse argument list: expr { ',' expr }
    fn parse_argument_list(&mut self) -> Result<(Vec<AstNode>, usize), ParseError> {
        let mut args = Vec::new();
        let mut height = 0;

        if self.check(TokenKind::RParen) {
            return Ok((args, height));
        }

        loop {
            let (arg, arg_height) = self.parse_measured_expression()?;
            height = height.max(arg_height);
            args.push(arg);

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok((args, height))
    }
}
