//! Sort tokens and typed sort keys.
//!
//! A request carries tokens shaped `column[:ASC|DESC][:NULLS FIRST|NULLS LAST]`.
//! [`SortToken::parse`] only checks that shape; mapping the wire column onto a
//! real database column is the resource's job, which produces [`SortKey`]s.

use std::sync::OnceLock;

use pg_query::protobuf::{Node, SortByDir, SortByNulls};
use regex::Regex;

use super::nodes;
use crate::error::{LedgerError, LedgerResult};
use crate::ident::Ident;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullsOrder {
    /// Postgres default: last for ASC, first for DESC.
    #[default]
    Default,
    First,
    Last,
}

/// A syntactically valid sort token, not yet resolved to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortToken {
    pub column: String,
    pub dir: SortDir,
    pub nulls: NullsOrder,
}

fn token_regex() -> &'static Regex {
    static SORT_RE: OnceLock<Regex> = OnceLock::new();
    SORT_RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?::(ASC|DESC)(?::(NULLS FIRST|NULLS LAST))?)?$")
            .expect("invalid built-in sort token regex")
    })
}

impl SortToken {
    /// Parse one wire token. Anything off-pattern is a [`LedgerError::Validation`].
    pub fn parse(token: &str) -> LedgerResult<Self> {
        let caps = token_regex().captures(token).ok_or_else(|| {
            LedgerError::validation(format!(
                "invalid sort token '{token}': expected column[:ASC|DESC][:NULLS FIRST|NULLS LAST]"
            ))
        })?;

        let dir = match caps.get(2).map(|m| m.as_str()) {
            Some("DESC") => SortDir::Desc,
            _ => SortDir::Asc,
        };
        let nulls = match caps.get(3).map(|m| m.as_str()) {
            Some("NULLS FIRST") => NullsOrder::First,
            Some("NULLS LAST") => NullsOrder::Last,
            _ => NullsOrder::Default,
        };

        Ok(Self {
            column: caps[1].to_string(),
            dir,
            nulls,
        })
    }

    /// Parse every token of a request, in order.
    pub fn parse_all<S: AsRef<str>>(tokens: &[S]) -> LedgerResult<Vec<Self>> {
        tokens.iter().map(|t| Self::parse(t.as_ref())).collect()
    }
}

/// One ORDER BY key over a resolved, alias-qualified column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: Ident,
    pub dir: SortDir,
    pub nulls: NullsOrder,
}

impl SortKey {
    pub fn new(column: Ident, dir: SortDir) -> Self {
        Self {
            column,
            dir,
            nulls: NullsOrder::Default,
        }
    }

    pub fn with_nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = nulls;
        self
    }

    pub(crate) fn to_node(&self) -> Node {
        let dir = match self.dir {
            SortDir::Asc => SortByDir::SortbyAsc,
            SortDir::Desc => SortByDir::SortbyDesc,
        };
        let nulls = match self.nulls {
            NullsOrder::Default => SortByNulls::SortbyNullsDefault,
            NullsOrder::First => SortByNulls::SortbyNullsFirst,
            NullsOrder::Last => SortByNulls::SortbyNullsLast,
        };
        nodes::sort_by(nodes::column_ref(&self.column), dir, nulls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_shapes() {
        let t = SortToken::parse("displayName").unwrap();
        assert_eq!(t.column, "displayName");
        assert_eq!(t.dir, SortDir::Asc);
        assert_eq!(t.nulls, NullsOrder::Default);

        let t = SortToken::parse("displayName:DESC").unwrap();
        assert_eq!(t.dir, SortDir::Desc);

        let t = SortToken::parse("description:ASC:NULLS LAST").unwrap();
        assert_eq!(t.dir, SortDir::Asc);
        assert_eq!(t.nulls, NullsOrder::Last);
    }

    #[test]
    fn rejects_malformed_tokens() {
        for bad in [
            "",
            "displayName:desc",
            "displayName:",
            "displayName:DESC:NULLS",
            "displayName:NULLS FIRST",
            "a.display_name",
            "name; DROP TABLE accounts",
            "displayName:ASC:NULLS LAST:extra",
        ] {
            let err = SortToken::parse(bad).unwrap_err();
            assert!(err.is_client_error(), "{bad:?} should be a validation error");
        }
    }
}
