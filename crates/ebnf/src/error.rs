use std::{error, fmt};

/// Grammar text which can not be compiled.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GrammarSyntaxError {
    pub message: String,
    /// The line the offending rule starts on.
    pub line: u32,
    /// The number of the offending rule, if it got that far.
    pub rule: Option<String>,
}

impl GrammarSyntaxError {
    pub(crate) fn new(message: impl Into<String>) -> GrammarSyntaxError {
        GrammarSyntaxError {
            message: message.into(),
            line: 0,
            rule: None,
        }
    }

    pub(crate) fn in_rule(mut self, line: u32, rule: Option<&str>) -> GrammarSyntaxError {
        self.line = line;
        self.rule = rule.map(str::to_owned);
        self
    }
}

impl error::Error for GrammarSyntaxError {}
impl fmt::Display for GrammarSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(rule) = &self.rule {
            write!(f, " in rule [{rule}]")?;
        }
        if self.line > 0 {
            write!(f, " at line {}", self.line)?;
        }
        Ok(())
    }
}

/// S-expression text which does not describe a grammar.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SxpError {
    pub message: String,
    /// Byte offset of the offending text.
    pub offset: usize,
}

impl error::Error for SxpError {}
impl fmt::Display for SxpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

#[test]
fn test_error_display() {
    let err = GrammarSyntaxError::new("diff missing second operand").in_rule(4, Some("12"));
    assert_eq!(
        err.to_string(),
        "diff missing second operand in rule [12] at line 4"
    );
    assert_eq!(
        GrammarSyntaxError::new("unexpected ')'").to_string(),
        "unexpected ')'"
    );
}
