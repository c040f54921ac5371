use std::ops::Index;

use crate::error::GrammarSyntaxError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[rustfmt::skip]
pub enum TokenKind {
    /// `'...'` or `"..."`
    Literal,
    /// `[...]`
    Range,
    /// `#x20`
    Hex,
    Ident,

    Question, Plus, Star, Pipe, Minus,
    LParen, RParen,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct StrSpan {
    pub start: u32,
    pub end: u32,
}

impl StrSpan {
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }
}

impl Index<StrSpan> for str {
    type Output = str;
    fn index(&self, index: StrSpan) -> &Self::Output {
        &self[index.start as usize..index.end as usize]
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: StrSpan,
}

impl Token {
    /// The meaningful text of the token, without quotes or brackets.
    pub fn value(self, src: &str) -> &str {
        let text = &src[self.span];
        match self.kind {
            TokenKind::Literal | TokenKind::Range => &text[1..text.len() - 1],
            _ => text,
        }
    }
}

/// A byte cursor over expression text.
pub struct Lexer<'a> {
    str: &'a [u8],
    pos: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(str: &'a [u8]) -> Self {
        Self { str, pos: 0 }
    }

    pub fn pos(&self) -> u32 {
        self.pos
    }

    pub fn span_since(&self, start: u32) -> StrSpan {
        StrSpan {
            start,
            end: self.pos(),
        }
    }

    pub fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    pub fn peek(&self) -> Option<u8> {
        self.str.get(self.pos as usize).copied()
    }

    pub fn consume_while(&mut self, predicate: impl Fn(u8) -> bool) -> StrSpan {
        let start = self.pos();
        while let Some(c) = self.peek() {
            if predicate(c) {
                self.next();
            } else {
                break;
            }
        }
        self.span_since(start)
    }
}

fn is_word(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphanumeric()
}

/// Splits an expression into tokens, whitespace separates tokens and is otherwise ignored.
pub fn lex(src: &str) -> Result<Vec<Token>, GrammarSyntaxError> {
    use TokenKind::*;

    let mut l = Lexer::new(src.as_bytes());
    let mut tokens = Vec::new();
    loop {
        l.consume_while(|c| c.is_ascii_whitespace());
        let pos = l.pos();
        let Some(c) = l.next() else {
            break;
        };

        let kind = match c {
            b'?' => Question,
            b'+' => Plus,
            b'*' => Star,
            b'|' => Pipe,
            b'-' => Minus,
            b'(' => LParen,
            b')' => RParen,
            quote @ (b'\'' | b'"') => {
                l.consume_while(|c| c != quote);
                if l.next().is_none() {
                    return Err(GrammarSyntaxError::new(format!(
                        "unterminated literal {}",
                        &src[pos as usize..]
                    )));
                }
                Literal
            }
            b'[' => {
                // `\]` does not close the range
                loop {
                    match l.next() {
                        Some(b']') => break,
                        Some(b'\\') => _ = l.next(),
                        Some(_) => {}
                        None => {
                            return Err(GrammarSyntaxError::new(format!(
                                "unterminated range {}",
                                &src[pos as usize..]
                            )))
                        }
                    }
                }
                Range
            }
            b'#' => {
                if l.consume_while(is_word).is_empty() {
                    return Err(GrammarSyntaxError::new("expected codepoint after '#'"));
                }
                Hex
            }
            c if c.is_ascii_alphabetic() => {
                l.consume_while(is_word);
                Ident
            }
            _ => {
                let rest = src[pos as usize..].split_whitespace().next().unwrap_or("");
                return Err(GrammarSyntaxError::new(format!(
                    "unknown terminal {rest:?}"
                )));
            }
        };

        tokens.push(Token {
            kind,
            span: l.span_since(pos),
        });
    }
    Ok(tokens)
}
