use crate::{
    ast::Expr,
    error::GrammarSyntaxError,
    lexer::{lex, Token, TokenKind},
};

type Result<T> = std::result::Result<T, GrammarSyntaxError>;

/// Recursive descent over the tokens of a single expression.
struct ExprParser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        let matches = self.peek() == Some(kind);
        if matches {
            self.pos += 1;
        }
        matches
    }

    fn text(&self, token: Token) -> String {
        token.value(self.src).to_owned()
    }

    fn alt(&mut self, depth: usize) -> Result<Expr> {
        log::trace!("{:depth$}alt", "");
        let mut children = vec![self.seq(depth + 1)?];
        while self.eat(TokenKind::Pipe) {
            children.push(self.seq(depth + 1)?);
        }
        Ok(match children.len() {
            1 => children.pop().unwrap_or(Expr::Empty),
            _ => Expr::Alt(children),
        })
    }

    fn seq(&mut self, depth: usize) -> Result<Expr> {
        log::trace!("{:depth$}seq", "");
        let mut children = Vec::new();
        while let Some(expr) = self.diff(depth + 1)? {
            children.push(expr);
        }
        Ok(match children.len() {
            1 => children.pop().unwrap_or(Expr::Empty),
            _ => Expr::Seq(children),
        })
    }

    fn diff(&mut self, depth: usize) -> Result<Option<Expr>> {
        log::trace!("{:depth$}diff", "");
        let Some(left) = self.postfix(depth + 1)? else {
            return Ok(None);
        };
        if !self.eat(TokenKind::Minus) {
            return Ok(Some(left));
        }
        match self.primary(depth + 1)? {
            Some(right) => Ok(Some(Expr::Diff(Box::new(left), Box::new(right)))),
            None => Err(GrammarSyntaxError::new("diff missing second operand")),
        }
    }

    fn postfix(&mut self, depth: usize) -> Result<Option<Expr>> {
        log::trace!("{:depth$}postfix", "");
        let Some(expr) = self.primary(depth + 1)? else {
            return Ok(None);
        };
        let expr = match self.peek() {
            Some(TokenKind::Question) => Expr::Opt(Box::new(expr)),
            Some(TokenKind::Star) => Expr::Star(Box::new(expr)),
            Some(TokenKind::Plus) => Expr::Plus(Box::new(expr)),
            _ => return Ok(Some(expr)),
        };
        self.pos += 1;
        Ok(Some(expr))
    }

    /// Does not consume anything when the next token can't start a primary.
    fn primary(&mut self, depth: usize) -> Result<Option<Expr>> {
        let Some(kind) = self.peek() else {
            return Ok(None);
        };
        let expr = match kind {
            TokenKind::LParen => {
                self.pos += 1;
                let inner = self.alt(depth + 1)?;
                if !self.eat(TokenKind::RParen) {
                    return Err(GrammarSyntaxError::new("unterminated group"));
                }
                inner
            }
            TokenKind::Literal | TokenKind::Range | TokenKind::Hex | TokenKind::Ident => {
                let Some(token) = self.bump() else {
                    return Ok(None);
                };
                let text = self.text(token);
                match kind {
                    TokenKind::Literal => Expr::Literal(text),
                    TokenKind::Range => Expr::Range(text),
                    TokenKind::Hex => Expr::Hex(text),
                    _ => Expr::Id(text),
                }
            }
            _ => return Ok(None),
        };
        log::trace!("{:depth$}primary {expr}", "");
        Ok(Some(expr))
    }
}

/// Compiles the right hand side of a rule.
///
/// Blank text is [`Expr::Empty`], an empty group `()` is the empty sequence.
pub fn compile_expr(src: &str) -> Result<Expr> {
    let tokens = lex(src)?;
    if tokens.is_empty() {
        return Ok(Expr::Empty);
    }

    let mut parser = ExprParser {
        src,
        tokens,
        pos: 0,
    };
    let expr = parser.alt(0)?;
    match parser.bump() {
        Some(token) => Err(GrammarSyntaxError::new(format!(
            "unexpected {:?}",
            &src[token.span]
        ))),
        None => Ok(expr),
    }
}
