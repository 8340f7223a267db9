//! Lexer (tokenizer) for pseudocode source
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! The stream always ends with a single [`TokenKind::Eof`] token.
//!
//! Two-word keywords (`end if`, `end loop`, `end procedure`) are fused into one
//! token when the second word follows the first after optional whitespace;
//! otherwise the cursor is rewound to just after `end`.

use super::ast::SourceLocation;
use log::{debug, trace};
use std::fmt;
use thiserror::Error;

/// Closed set of lexical categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    If,
    Else,
    Elseif,
    While,
    Declare,
    Put,
    Then,
    Loop,
    Procedure,
    Begin,
    End,
    Return,

    // Fused two-word keywords
    EndIf,
    EndLoop,
    EndProcedure,

    // Operators
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Equal,        // =
    NotEqual,     // !=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    Assign,       // <-

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    Comma,     // ,
    Semicolon, // ;

    // Literals and names
    Number,
    String,
    Identifier,

    // Markers
    Unknown,
    UnterminatedString,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::If => write!(f, "'if'"),
            TokenKind::Else => write!(f, "'else'"),
            TokenKind::Elseif => write!(f, "'elseif'"),
            TokenKind::While => write!(f, "'while'"),
            TokenKind::Declare => write!(f, "'declare'"),
            TokenKind::Put => write!(f, "'put'"),
            TokenKind::Then => write!(f, "'then'"),
            TokenKind::Loop => write!(f, "'loop'"),
            TokenKind::Procedure => write!(f, "'procedure'"),
            TokenKind::Begin => write!(f, "'begin'"),
            TokenKind::End => write!(f, "'end'"),
            TokenKind::Return => write!(f, "'return'"),
            TokenKind::EndIf => write!(f, "'end if'"),
            TokenKind::EndLoop => write!(f, "'end loop'"),
            TokenKind::EndProcedure => write!(f, "'end procedure'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Equal => write!(f, "'='"),
            TokenKind::NotEqual => write!(f, "'!='"),
            TokenKind::Less => write!(f, "'<'"),
            TokenKind::LessEqual => write!(f, "'<='"),
            TokenKind::Greater => write!(f, "'>'"),
            TokenKind::GreaterEqual => write!(f, "'>='"),
            TokenKind::Assign => write!(f, "'<-'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::String => write!(f, "string literal"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Unknown => write!(f, "invalid character"),
            TokenKind::UnterminatedString => write!(f, "unterminated string"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

/// A classified, positioned lexical unit.
///
/// `lexeme` is the exact source slice, except for string literals where it is
/// the content between the quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            location,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(f, "identifier '{}'", self.lexeme),
            TokenKind::Number => write!(f, "number {}", self.lexeme),
            TokenKind::String => write!(f, "string literal \"{}\"", self.lexeme),
            TokenKind::Unknown => write!(f, "invalid character '{}'", self.lexeme),
            kind => write!(f, "{}", kind),
        }
    }
}

/// Fatal lexer conditions; both abort tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Lexer error at {location}: unterminated block comment")]
    UnterminatedComment { location: SourceLocation },

    #[error("Lexer error at {location}: unterminated string literal")]
    UnterminatedString { location: SourceLocation },
}

impl LexError {
    pub fn location(&self) -> SourceLocation {
        match self {
            LexError::UnterminatedComment { location }
            | LexError::UnterminatedString { location } => *location,
        }
    }
}

/// Two-word keywords: (first word, second word, fused kind)
const MULTI_WORD_KEYWORDS: &[(&str, &str, TokenKind)] = &[
    ("end", "if", TokenKind::EndIf),
    ("end", "loop", TokenKind::EndLoop),
    ("end", "procedure", TokenKind::EndProcedure),
];

fn opens_multi_word_keyword(word: &str) -> bool {
    MULTI_WORD_KEYWORDS.iter().any(|(first, _, _)| *first == word)
}

fn multi_word_keyword(first: &str, second: &str) -> Option<TokenKind> {
    MULTI_WORD_KEYWORDS
        .iter()
        .find(|(a, b, _)| *a == first && *b == second)
        .map(|(_, _, kind)| *kind)
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "elseif" => TokenKind::Elseif,
        "while" => TokenKind::While,
        "declare" => TokenKind::Declare,
        "put" => TokenKind::Put,
        "then" => TokenKind::Then,
        "loop" => TokenKind::Loop,
        "procedure" => TokenKind::Procedure,
        "begin" => TokenKind::Begin,
        "end" => TokenKind::End,
        "return" => TokenKind::Return,
        _ => return None,
    };
    Some(kind)
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Saved cursor state for the two-word keyword lookahead.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    position: usize,
    line: usize,
    column: usize,
}

/// Lexer for pseudocode source
///
/// A lexer is single-use: [`Lexer::tokenize`] consumes it.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, "", self.current_location()));
                break;
            }

            let token = self.next_token();
            if token.kind == TokenKind::UnterminatedString {
                return Err(LexError::UnterminatedString {
                    location: token.location,
                });
            }

            trace!("{} at {}", token, token.location);
            tokens.push(token);
        }

        debug!("tokenized {} tokens", tokens.len());
        Ok(tokens)
    }

    /// Get next token. Only called when input remains.
    fn next_token(&mut self) -> Token {
        let loc = self.current_location();
        let ch = match self.advance() {
            Some(ch) => ch,
            None => return Token::new(TokenKind::Eof, "", loc),
        };

        match ch {
            '"' => self.string_literal(loc),
            '0'..='9' => self.number_literal(ch, loc),
            c if is_ident_start(c) => self.identifier_or_keyword(ch, loc),

            '+' => Token::new(TokenKind::Plus, "+", loc),
            '-' => Token::new(TokenKind::Minus, "-", loc),
            '*' => Token::new(TokenKind::Star, "*", loc),
            '/' => Token::new(TokenKind::Slash, "/", loc),
            '=' => Token::new(TokenKind::Equal, "=", loc),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::NotEqual, "!=", loc)
                } else {
                    // No unary '!' in the language
                    Token::new(TokenKind::Unknown, "!", loc)
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::LessEqual, "<=", loc)
                } else if self.peek() == Some('-') {
                    self.advance();
                    Token::new(TokenKind::Assign, "<-", loc)
                } else {
                    Token::new(TokenKind::Less, "<", loc)
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::GreaterEqual, ">=", loc)
                } else {
                    Token::new(TokenKind::Greater, ">", loc)
                }
            }
            '(' => Token::new(TokenKind::LParen, "(", loc),
            ')' => Token::new(TokenKind::RParen, ")", loc),
            '{' => Token::new(TokenKind::LBrace, "{", loc),
            '}' => Token::new(TokenKind::RBrace, "}", loc),
            ',' => Token::new(TokenKind::Comma, ",", loc),
            ';' => Token::new(TokenKind::Semicolon, ";", loc),

            other => Token::new(TokenKind::Unknown, other.to_string(), loc),
        }
    }

    /// Parse string literal. The opening quote is already consumed.
    ///
    /// A newline or end of input before the closing quote yields an
    /// [`TokenKind::UnterminatedString`] token.
    fn string_literal(&mut self, loc: SourceLocation) -> Token {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.advance(); // consume closing quote
                    return Token::new(TokenKind::String, string, loc);
                }
                '\n' => break,
                _ => {
                    string.push(ch);
                    self.advance();
                }
            }
        }

        Token::new(TokenKind::UnterminatedString, string, loc)
    }

    /// Parse numeric literal (unsigned integer digit run)
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Token {
        let mut digits = String::new();
        digits.push(first_digit);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::Number, digits, loc)
    }

    /// Parse identifier, single-word keyword or fused two-word keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let start = self.position - 1;
        let ident = self.read_word(first_char);

        if opens_multi_word_keyword(&ident) {
            if let Some(kind) = self.try_fuse_keyword(&ident) {
                let lexeme: String = self.input[start..self.position].iter().collect();
                return Token::new(kind, lexeme, loc);
            }
        }

        match keyword(&ident) {
            Some(kind) => Token::new(kind, ident, loc),
            None => Token::new(TokenKind::Identifier, ident, loc),
        }
    }

    /// Try to consume the second word of a two-word keyword.
    ///
    /// On success the cursor stays after the second word; otherwise it is
    /// restored to just after `first`.
    fn try_fuse_keyword(&mut self, first: &str) -> Option<TokenKind> {
        let saved = self.save();

        self.skip_whitespace();
        if let Some(ch) = self.peek().filter(|c| is_ident_start(*c)) {
            self.advance();
            let second = self.read_word(ch);
            if let Some(kind) = multi_word_keyword(first, &second) {
                return Some(kind);
            }
        }

        self.restore(saved);
        None
    }

    /// Read the rest of an identifier-shaped word
    fn read_word(&mut self, first_char: char) -> String {
        let mut word = String::new();
        word.push(first_char);

        while let Some(ch) = self.peek() {
            if is_ident_continue(ch) {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        word
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance(); // skip '*'
                self.advance(); // skip '/'
                return Ok(());
            }
            self.advance();
        }

        Err(LexError::UnterminatedComment {
            location: start_loc,
        })
    }

    fn save(&self) -> Cursor {
        Cursor {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn restore(&mut self, cursor: Cursor) {
        self.position = cursor.position;
        self.line = cursor.line;
        self.column = cursor.column;
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = Lexer::new("declare x <- 5;").tokenize().unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Declare);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[2].kind, TokenKind::Assign);
        assert_eq!(tokens[3].kind, TokenKind::Number);
        assert_eq!(tokens[3].lexeme, "5");
        assert_eq!(tokens[4].kind, TokenKind::Semicolon);
        assert_eq!(tokens[5].kind, TokenKind::Eof);
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * / = != < > <= >= <- ( ) { } , ;"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Assign,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_less_than_versus_assign() {
        assert_eq!(
            kinds("a<b a<-b a < -b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::Minus,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_bang_without_equal_is_unknown() {
        let tokens = Lexer::new("! x").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].lexeme, "!");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_unrecognized_character_is_soft() {
        let tokens = Lexer::new("x @ y").tokenize().unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Unknown);
        assert_eq!(tokens[1].lexeme, "@");
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("if else elseif while declare put then loop procedure begin end return"),
            vec![
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Elseif,
                TokenKind::While,
                TokenKind::Declare,
                TokenKind::Put,
                TokenKind::Then,
                TokenKind::Loop,
                TokenKind::Procedure,
                TokenKind::Begin,
                TokenKind::End,
                TokenKind::Return,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_multi_word_keywords() {
        assert_eq!(
            kinds("end if end loop end procedure"),
            vec![
                TokenKind::EndIf,
                TokenKind::EndLoop,
                TokenKind::EndProcedure,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_fused_keyword_across_newline_keeps_source_slice() {
        let tokens = Lexer::new("end\n  loop;").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::EndLoop);
        assert_eq!(tokens[0].lexeme, "end\n  loop");
        assert_eq!(tokens[0].location, SourceLocation::new(1, 1));
        assert_eq!(tokens[1].kind, TokenKind::Semicolon);
        assert_eq!(tokens[1].location, SourceLocation::new(2, 7));
    }

    #[test]
    fn test_endif_without_space_is_identifier() {
        let tokens = Lexer::new("endif;").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "endif");
    }

    #[test]
    fn test_end_followed_by_other_word_rewinds() {
        let tokens = Lexer::new("end total").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::End);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "total");
        assert_eq!(tokens[1].location, SourceLocation::new(1, 5));
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("x // comment\ny /* block\ncomment */ z"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_positions_track_lines_through_comments() {
        let tokens = Lexer::new("/* a\nb */ put\n  (x);").tokenize().unwrap();
        assert_eq!(tokens[0].location, SourceLocation::new(2, 6));
        assert_eq!(tokens[1].location, SourceLocation::new(3, 3));
        assert_eq!(tokens[2].location, SourceLocation::new(3, 4));
    }

    #[test]
    fn test_string_literal() {
        let tokens = Lexer::new(r#"put("hello world");"#).tokenize().unwrap();
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[2].lexeme, "hello world");
        assert_eq!(tokens[2].location, SourceLocation::new(1, 5));
    }

    #[test]
    fn test_unterminated_comment_is_fatal() {
        let err = Lexer::new("x /* never closed").tokenize().unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedComment {
                location: SourceLocation::new(1, 3)
            }
        );
    }

    #[test]
    fn test_unterminated_string_across_newline_is_fatal() {
        let err = Lexer::new("put(\"abc\n\");").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
        assert_eq!(err.location(), SourceLocation::new(1, 5));
    }

    #[test]
    fn test_unterminated_string_at_end_of_input_is_fatal() {
        let err = Lexer::new("\"abc").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn test_number_keeps_leading_zeros() {
        let tokens = Lexer::new("007").tokenize().unwrap();
        assert_eq!(tokens[0].lexeme, "007");
    }
}
