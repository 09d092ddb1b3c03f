//! Validated SQL identifiers.
//!
//! [`Ident`] is a dotted identifier such as `a.display_name` or `public."Tenants"`.
//! It is the only way a column or alias name enters a statement tree, so every
//! name is checked once here instead of at each mutation site.
//!
//! - Unquoted parts must match `[A-Za-z_][A-Za-z0-9_$]*` and are folded to
//!   lower case, as Postgres does.
//! - Quoted parts keep their exact spelling; `""` escapes a quote.

use crate::error::{LedgerError, LedgerResult};

/// One `.`-separated part of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

impl IdentPart {
    /// The name as Postgres resolves it.
    pub fn name(&self) -> String {
        match self {
            IdentPart::Unquoted(s) => s.to_ascii_lowercase(),
            IdentPart::Quoted(s) => s.clone(),
        }
    }
}

/// A validated, possibly alias-qualified SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier, supporting dotted and quoted forms.
    pub fn parse(s: &str) -> LedgerResult<Self> {
        if s.is_empty() {
            return Err(LedgerError::validation("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(LedgerError::validation(
                "identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut rest = s;
        loop {
            let (part, tail) = if let Some(quoted) = rest.strip_prefix('"') {
                split_quoted(quoted, s)?
            } else {
                split_unquoted(rest, s)?
            };
            parts.push(part);

            match tail.strip_prefix('.') {
                Some("") => {
                    return Err(LedgerError::validation(format!(
                        "trailing '.' in identifier '{s}'"
                    )));
                }
                Some(next) => rest = next,
                None if tail.is_empty() => break,
                None => {
                    return Err(LedgerError::validation(format!(
                        "expected '.' between identifier parts in '{s}'"
                    )));
                }
            }
        }

        Ok(Self { parts })
    }

    /// Build `alias.column` from two unquoted names.
    pub fn qualified(alias: &str, column: &str) -> LedgerResult<Self> {
        let mut ident = Self::parse(alias)?;
        ident.parts.extend(Self::parse(column)?.parts);
        Ok(ident)
    }

    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// Resolved names of every part, in order.
    pub fn names(&self) -> impl Iterator<Item = String> + '_ {
        self.parts.iter().map(IdentPart::name)
    }

    /// The last part, i.e. the bare column name.
    pub fn column(&self) -> String {
        self.parts.last().map(IdentPart::name).unwrap_or_default()
    }

    pub fn is_qualified(&self) -> bool {
        self.parts.len() > 1
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
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
        out
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn split_quoted<'a>(body: &'a str, whole: &str) -> LedgerResult<(IdentPart, &'a str)> {
    let mut name = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '"' {
            name.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '"'))) {
            chars.next();
            name.push('"');
            continue;
        }
        if name.is_empty() {
            return Err(LedgerError::validation(format!(
                "empty quoted identifier in '{whole}'"
            )));
        }
        return Ok((IdentPart::Quoted(name), &body[i + 1..]));
    }
    Err(LedgerError::validation(format!(
        "unclosed quoted identifier in '{whole}'"
    )))
}

fn split_unquoted<'a>(s: &'a str, whole: &str) -> LedgerResult<(IdentPart, &'a str)> {
    let end = s.find('.').unwrap_or(s.len());
    let segment = &s[..end];

    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return Err(LedgerError::validation(format!(
            "empty identifier segment in '{whole}'"
        )));
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return Err(LedgerError::validation(format!(
            "invalid identifier start character '{first}' in '{whole}'"
        )));
    }
    if let Some(bad) = chars.find(|c| !(*c == '_' || *c == '$' || c.is_ascii_alphanumeric())) {
        return Err(LedgerError::validation(format!(
            "invalid character '{bad}' in identifier '{whole}'"
        )));
    }

    Ok((IdentPart::Unquoted(segment.to_string()), &s[end..]))
}
