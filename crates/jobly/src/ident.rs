//! SQL identifier handling.
//!
//! Identifiers can't be bound as parameters, so every column name that ends up
//! in a compiled clause goes through [`Ident`] first:
//!
//! - [`Ident::parse`] accepts declared column names, optionally dotted
//!   (`j.title`) or quoted (`"Title"`). Unquoted segments must match
//!   `[A-Za-z_][A-Za-z0-9_$]*`.
//! - [`Ident::quoted`] wraps any name (except an empty one or one containing
//!   NUL) in double quotes, doubling embedded quotes.

use crate::error::{JoblyError, JoblyResult};

/// One `.`-separated segment of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

/// A validated SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    /// Quote `name` as a single identifier segment.
    pub fn quoted(name: &str) -> JoblyResult<Self> {
        check_quotable(name)?;
        Ok(Self {
            parts: vec![IdentPart::Quoted(name.to_string())],
        })
    }

    /// Parse a declared identifier (`name`, `t.name`, `"Name"`, `public."Jobs".id`).
    pub fn parse(s: &str) -> JoblyResult<Self> {
        if s.is_empty() {
            return Err(JoblyError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(JoblyError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        loop {
            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            name.push('"');
                        }
                        Some('"') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(JoblyError::validation(format!(
                                "Unclosed quoted identifier in '{s}'"
                            )));
                        }
                    }
                }
                check_quotable(&name)?;
                parts.push(IdentPart::Quoted(name));
            } else {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '.' {
                        break;
                    }
                    let ok = if name.is_empty() {
                        c == '_' || c.is_ascii_alphabetic()
                    } else {
                        c == '_' || c == '$' || c.is_ascii_alphanumeric()
                    };
                    if !ok {
                        return Err(JoblyError::validation(format!(
                            "Invalid character '{c}' in identifier '{s}'"
                        )));
                    }
                    name.push(c);
                    chars.next();
                }
                if name.is_empty() {
                    return Err(JoblyError::validation(format!(
                        "Empty segment in identifier '{s}'"
                    )));
                }
                parts.push(IdentPart::Unquoted(name));
            }

            match chars.next() {
                None => break,
                Some('.') if chars.peek().is_some() => continue,
                Some('.') => {
                    return Err(JoblyError::validation(format!(
                        "Trailing '.' in identifier '{s}'"
                    )));
                }
                Some(c) => {
                    return Err(JoblyError::validation(format!(
                        "Expected '.' between identifier parts in '{s}', got '{c}'"
                    )));
                }
            }
        }

        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
            }
        }
    }
}

fn check_quotable(name: &str) -> JoblyResult<()> {
    if name.is_empty() {
        return Err(JoblyError::validation("Empty quoted identifier"));
    }
    if name.contains('\0') {
        return Err(JoblyError::validation(
            "Identifier cannot contain NUL character",
        ));
    }
    Ok(())
}
