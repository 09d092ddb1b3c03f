use serde::Deserialize;

/// Configuration for the statement builders.
///
/// Deserializable so hosts can load it from their own config files, e.g. a
/// `[builder]` table in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    /// LIMIT applied when a list request carries no `count`. `None` means unbounded.
    pub default_count: Option<i64>,
    /// Largest `count` a list request may ask for.
    pub max_count: i64,
    /// Parse each template once per process and clone it per request.
    pub cache_templates: bool,
    /// Truncate SQL in log events (in bytes). `None` logs the full text.
    pub max_logged_sql_length: Option<usize>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            default_count: Some(100),
            max_count: 1000,
            cache_templates: true,
            max_logged_sql_length: Some(200),
        }
    }
}

impl BuilderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_count(mut self, count: Option<i64>) -> Self {
        self.default_count = count;
        self
    }

    pub fn with_max_count(mut self, max: i64) -> Self {
        self.max_count = max;
        self
    }

    pub fn with_template_cache(mut self, enabled: bool) -> Self {
        self.cache_templates = enabled;
        self
    }

    pub fn with_max_logged_sql_length(mut self, len: Option<usize>) -> Self {
        self.max_logged_sql_length = len;
        self
    }

    pub(crate) fn truncate_for_log<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_logged_sql_length {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end]).into()
            }
            _ => sql.into(),
        }
    }
}
