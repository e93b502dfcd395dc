use std::{iter::Peekable, str::CharIndices};

use crate::token::{KEYWORDS, Span, Token, TokenKind};

/// Tried in order before single-character punctuation.
const MULTI_CHAR_OPERATORS: [&str; 10] = [
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "++", "--",
];

const PUNCTUATION: &str = "=;:,(){}[].+-*/%<>!";

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    eof_emitted: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
            eof_emitted: false,
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_trivia();

        let Some(&(start, ch)) = self.chars.peek() else {
            self.eof_emitted = true;
            let index = self.input.len();
            return Token::new(
                TokenKind::EOF,
                "",
                Span::new(index, index, self.line, self.column),
            );
        };

        let line = self.line;
        let column = self.column;

        if (ch == '"' || ch == '\'')
            && let Some(token) = self.read_string(start, ch, line, column)
        {
            return token;
        }
        if ch.is_ascii_digit() {
            return self.read_number(start, line, column);
        }
        if is_identifier_start(ch) {
            return self.read_identifier(start, line, column);
        }
        let rest = &self.input[start..];
        if let Some(op) = MULTI_CHAR_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            for _ in 0..op.len() {
                self.advance_char();
            }
            return self.token_from(TokenKind::Operator, start, line, column);
        }
        if PUNCTUATION.contains(ch) {
            self.advance_char();
            return self.token_from(TokenKind::Punctuation, start, line, column);
        }

        self.advance_char();
        self.token_from(TokenKind::Error, start, line, column)
    }

    fn skip_trivia(&mut self) {
        while let Some(&(index, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance_char();
                continue;
            }
            let rest = &self.input[index..];
            if rest.starts_with("//") {
                while let Some(&(_, c)) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance_char();
                }
            } else if rest.starts_with("/*") {
                self.advance_char();
                self.advance_char();
                loop {
                    let index = self.current_index();
                    if self.input[index..].starts_with("*/") {
                        self.advance_char();
                        self.advance_char();
                        break;
                    }
                    if self.advance_char().is_none() {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// `None` when the literal does not close on the same line.
    fn read_string(
        &mut self,
        start: usize,
        quote: char,
        line: usize,
        column: usize,
    ) -> Option<Token<'a>> {
        let mut lookahead = self.chars.clone();
        lookahead.next(); // opening quote
        let mut escaped = false;
        let mut end = None;
        for (index, c) in lookahead {
            if c == '\n' {
                return None;
            }
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                end = Some(index + c.len_utf8());
                break;
            }
        }
        let end = end?;
        while self.current_index() < end {
            self.advance_char();
        }
        Some(self.token_from(TokenKind::String, start, line, column))
    }

    fn read_number(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        let first = self.advance_char().map(|(_, c)| c);
        if first != Some('0') {
            self.consume_digits();
        }

        let mut lookahead = self.chars.clone();
        if let (Some((_, '.')), Some((_, digit))) = (lookahead.next(), lookahead.next())
            && digit.is_ascii_digit()
        {
            self.advance_char(); // '.'
            self.consume_digits();
        }

        self.token_from(TokenKind::Number, start, line, column)
    }

    fn read_identifier(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        self.advance_char();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                self.advance_char();
            } else {
                break;
            }
        }

        let end = self.current_index();
        let text = &self.input[start..end];
        let kind = if KEYWORDS.contains(&text) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.token_from(kind, start, line, column)
    }

    fn consume_digits(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn token_from(
        &mut self,
        kind: TokenKind,
        start: usize,
        line: usize,
        column: usize,
    ) -> Token<'a> {
        let end = self.current_index();
        Token::new(
            kind,
            &self.input[start..end],
            Span::new(start, end, line, column),
        )
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof_emitted {
            return None;
        }
        Some(self.next_token())
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}
