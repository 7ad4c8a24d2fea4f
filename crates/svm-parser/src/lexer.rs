//! Line-oriented netlist lexer.
//!
//! The netlist is a list of whitespace-separated records. Comments run from
//! `//` or `#` to the end of the line. Commas are kept inside fields since
//! they double as a decimal separator.

/// Token types for svm netlists.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A whitespace-delimited field.
    Field(String),
    /// End of a non-empty record.
    Eol,
    /// End of input.
    Eof,
}

/// A token with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
}

/// Lexer for svm netlists.
pub struct Lexer<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().enumerate(),
        }
    }

    /// Tokenize the whole input. Blank and comment-only lines produce nothing.
    pub fn tokenize(self) -> Vec<SpannedToken> {
        let mut tokens = Vec::new();
        let mut last_line = 1;

        for (idx, raw) in self.lines {
            let line = idx + 1;
            last_line = line;
            let body = strip_comment(raw);

            let start = tokens.len();
            tokens.extend(body.split_whitespace().map(|f| SpannedToken {
                token: Token::Field(f.to_string()),
                line,
            }));
            if tokens.len() > start {
                tokens.push(SpannedToken {
                    token: Token::Eol,
                    line,
                });
            }
        }

        tokens.push(SpannedToken {
            token: Token::Eof,
            line: last_line,
        });
        tokens
    }
}

/// Text before the first comment marker.
fn strip_comment(line: &str) -> &str {
    let cut = [line.find("//"), line.find('#')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..cut]
}
