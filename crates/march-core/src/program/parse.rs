//! Parser for march notation.
//!
//! ## Supported Syntax
//!
//! - Elements: `up(w0)`, `down(r1,w0)`, `any(r0)`; separated by `;`,
//!   newlines or plain whitespace
//! - Direction keywords: `up`/`asc`/`^`/`⇑`, `down`/`desc`/`v`/`⇓`,
//!   `any`/`⇕` (run ascending)
//! - Operations: `w0`, `w1`, `r0`, `r1`
//! - Optional enclosing braces: `{ up(w0); up(r0) }`
//! - Comments: `#` or `//` to end of line
//!
//! Keywords and operations are case-insensitive.

use thiserror::Error;

use super::{AddressOrder, Bit, Operation, Phase, TestProgram};

/// Structural violation found while parsing a test program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}{}", token_suffix(.token.as_deref()))]
pub struct MalformedProgram {
    /// 1-indexed line where the violation was found.
    pub line: usize,
    /// Offending token, when there is one.
    pub token: Option<String>,
    /// Description of the violation.
    pub message: String,
}

impl MalformedProgram {
    fn new(line: usize, token: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            line,
            token: token.map(str::to_string),
            message: message.into(),
        }
    }
}

fn token_suffix(token: Option<&str>) -> String {
    token.map_or_else(String::new, |token| format!(" (at '{token}')"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Word(String),
    Symbol(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    line: usize,
}

impl Token {
    fn text(&self) -> String {
        match &self.kind {
            TokenKind::Word(word) => word.clone(),
            TokenKind::Symbol(symbol) => symbol.to_string(),
        }
    }
}

const SYMBOLS: [char; 10] = ['(', ')', ',', ';', '{', '}', '^', '⇑', '⇓', '⇕'];

/// Parses march notation into a [`TestProgram`].
///
/// # Errors
///
/// Returns [`MalformedProgram`] for an empty program, an unknown direction or
/// operation, a pattern bit other than 0/1, an element without operations, or
/// unbalanced punctuation.
pub fn parse_program(text: &str) -> Result<TestProgram, MalformedProgram> {
    let tokens = tokenize(text)?;
    let last_line = text.lines().count().max(1);
    Parser {
        tokens: &tokens,
        position: 0,
        last_line,
    }
    .program()
}

/// Strips a comment from a line (everything from `#` or `//`).
fn strip_comment(line: &str) -> &str {
    let hash = line.find('#');
    let slashes = line.find("//");
    match (hash, slashes) {
        (Some(a), Some(b)) => &line[..a.min(b)],
        (Some(pos), None) | (None, Some(pos)) => &line[..pos],
        (None, None) => line,
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, MalformedProgram> {
    let mut tokens = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let mut chars = strip_comment(raw_line).chars().peekable();

        while let Some(&ch) = chars.peek() {
            if ch.is_whitespace() {
                chars.next();
            } else if SYMBOLS.contains(&ch) {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::Symbol(ch),
                    line,
                });
            } else if ch.is_ascii_alphanumeric() || ch == '_' {
                let mut word = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next.to_ascii_lowercase());
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Word(word),
                    line,
                });
            } else {
                return Err(MalformedProgram::new(
                    line,
                    Some(&ch.to_string()),
                    "unexpected character",
                ));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    last_line: usize,
}

impl Parser<'_> {
    fn program(mut self) -> Result<TestProgram, MalformedProgram> {
        if self.tokens.is_empty() {
            return Err(MalformedProgram::new(
                self.last_line,
                None,
                "test program is empty",
            ));
        }

        let braced = self.eat_symbol('{');
        let mut phases = Vec::new();

        loop {
            while self.eat_symbol(';') {}
            let Some(token) = self.peek() else {
                break;
            };
            if braced && token.kind == TokenKind::Symbol('}') {
                break;
            }
            phases.push(self.phase()?);
        }

        if braced {
            self.expect_symbol('}', "expected '}' to close the program")?;
            while self.eat_symbol(';') {}
            if let Some(token) = self.peek() {
                return Err(MalformedProgram::new(
                    token.line,
                    Some(&token.text()),
                    "unexpected input after '}'",
                ));
            }
        }

        if phases.is_empty() {
            return Err(MalformedProgram::new(
                self.last_line,
                None,
                "test program is empty",
            ));
        }

        Ok(TestProgram::new(phases))
    }

    fn phase(&mut self) -> Result<Phase, MalformedProgram> {
        let order = self.order()?;
        self.expect_symbol('(', "expected '(' after direction")?;

        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Symbol(')') {
                return Err(MalformedProgram::new(
                    token.line,
                    Some(")"),
                    "element has no operations",
                ));
            }
        }

        let mut operations = vec![self.operation()?];
        loop {
            if self.eat_symbol(',') {
                operations.push(self.operation()?);
            } else {
                self.expect_symbol(')', "expected ',' or ')' after operation")?;
                break;
            }
        }

        Ok(Phase::new(order, operations))
    }

    fn order(&mut self) -> Result<AddressOrder, MalformedProgram> {
        let token = self.next_or_eof("expected a direction")?;
        let order = match &token.kind {
            TokenKind::Symbol('^' | '⇑' | '⇕') => Some(AddressOrder::Ascending),
            TokenKind::Symbol('⇓') => Some(AddressOrder::Descending),
            TokenKind::Word(word) => match word.as_str() {
                "up" | "asc" | "any" => Some(AddressOrder::Ascending),
                "down" | "desc" | "v" => Some(AddressOrder::Descending),
                _ => None,
            },
            TokenKind::Symbol(_) => None,
        };
        order.ok_or_else(|| {
            MalformedProgram::new(token.line, Some(&token.text()), "unknown direction")
        })
    }

    fn operation(&mut self) -> Result<Operation, MalformedProgram> {
        let token = self.next_or_eof("expected an operation")?;
        let TokenKind::Word(word) = &token.kind else {
            return Err(MalformedProgram::new(
                token.line,
                Some(&token.text()),
                "expected an operation",
            ));
        };

        let mut chars = word.chars();
        let op = chars.next();
        let pattern = chars.as_str();

        let make: fn(Bit) -> Operation = match op {
            Some('w') => Operation::Write,
            Some('r') => Operation::ReadCheck,
            _ => {
                return Err(MalformedProgram::new(
                    token.line,
                    Some(word),
                    "unknown operation",
                ))
            }
        };

        match pattern {
            "0" => Ok(make(Bit::Zero)),
            "1" => Ok(make(Bit::One)),
            digits if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => Err(
                MalformedProgram::new(token.line, Some(word), "pattern bit must be 0 or 1"),
            ),
            _ => Err(MalformedProgram::new(
                token.line,
                Some(word),
                "unknown operation",
            )),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next_or_eof(&mut self, message: &str) -> Result<Token, MalformedProgram> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| MalformedProgram::new(self.last_line, None, message))?;
        self.position += 1;
        Ok(token)
    }

    fn eat_symbol(&mut self, symbol: char) -> bool {
        let matched = self
            .peek()
            .is_some_and(|token| token.kind == TokenKind::Symbol(symbol));
        if matched {
            self.position += 1;
        }
        matched
    }

    fn expect_symbol(&mut self, symbol: char, message: &str) -> Result<(), MalformedProgram> {
        if self.eat_symbol(symbol) {
            return Ok(());
        }
        Err(match self.peek() {
            Some(token) => MalformedProgram::new(token.line, Some(&token.text()), message),
            None => MalformedProgram::new(self.last_line, None, message),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::parse_program;
    use crate::program::{AddressOrder, Bit, Operation, Phase, TestProgram};

    #[test]
    fn parses_mats_plus() {
        let program = parse_program("up(w0); up(r0,w1); down(r1,w0)").unwrap();
        assert_eq!(
            program,
            TestProgram::new(vec![
                Phase::new(AddressOrder::Ascending, vec![Operation::Write(Bit::Zero)]),
                Phase::new(
                    AddressOrder::Ascending,
                    vec![Operation::ReadCheck(Bit::Zero), Operation::Write(Bit::One)]
                ),
                Phase::new(
                    AddressOrder::Descending,
                    vec![Operation::ReadCheck(Bit::One), Operation::Write(Bit::Zero)]
                ),
            ])
        );
    }

    #[test]
    fn arrow_glyphs_and_braces_match_keywords() {
        let glyphs = parse_program("{⇕(w0); ⇑(r0,w1); ⇓(r1,w0)}").unwrap();
        let ascii = parse_program("^(w0) ^(r0,w1) v(r1,w0)").unwrap();
        let words = parse_program("any(w0)\nasc(r0, w1)\ndesc(r1, w0)\n").unwrap();
        assert_eq!(glyphs, ascii);
        assert_eq!(ascii, words);
    }

    #[test]
    fn comments_blank_lines_and_case_are_ignored() {
        let text = "# March X\n\n// init\nUP(W0) ; trailing\n";
        let err = parse_program(text).unwrap_err();
        assert_eq!(err.line, 4);

        let text = "# March X\n\n// init\nUP(W0);   # background\nDown(R0, w1)\n";
        let program = parse_program(text).unwrap();
        assert_eq!(program.phases.len(), 2);
        assert_eq!(program.phases[1].order, AddressOrder::Descending);
    }

    #[test]
    fn elements_may_span_lines() {
        let program = parse_program("up(\n  r0,\n  w1\n)").unwrap();
        assert_eq!(program.phases[0].operations.len(), 2);
    }

    #[rstest]
    #[case("", 1, "test program is empty")]
    #[case("# only a comment\n\n", 2, "test program is empty")]
    #[case(";;", 1, "test program is empty")]
    #[case("sideways(w0)", 1, "unknown direction")]
    #[case("up(x0)", 1, "unknown operation")]
    #[case("up(w)", 1, "unknown operation")]
    #[case("up(w2)", 1, "pattern bit must be 0 or 1")]
    #[case("up(r10)", 1, "pattern bit must be 0 or 1")]
    #[case("up()", 1, "element has no operations")]
    #[case("up w0", 1, "expected '(' after direction")]
    #[case("up(w0", 1, "expected ',' or ')' after operation")]
    #[case("up(w0 r0)", 1, "expected ',' or ')' after operation")]
    #[case("up(w0,)", 1, "expected an operation")]
    #[case("up(w0)\ndown(r0", 2, "expected ',' or ')' after operation")]
    #[case("{up(w0)", 1, "expected '}' to close the program")]
    #[case("{up(w0)} up(r0)", 1, "unexpected input after '}'")]
    #[case("up(w0) @", 1, "unexpected character")]
    fn malformed_programs_are_rejected(
        #[case] text: &str,
        #[case] line: usize,
        #[case] message: &str,
    ) {
        let err = parse_program(text).unwrap_err();
        assert_eq!(err.line, line, "{err}");
        assert_eq!(err.message, message, "{err}");
    }

    #[test]
    fn error_display_includes_line_and_token() {
        let err = parse_program("up(w0)\nup(q1)").unwrap_err();
        assert_eq!(err.to_string(), "line 2: unknown operation (at 'q1')");

        let err = parse_program("").unwrap_err();
        assert_eq!(err.to_string(), "line 1: test program is empty");
        let err: &dyn std::error::Error = &err;
        assert!(err.source().is_none());
    }
}
