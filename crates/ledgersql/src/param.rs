//! Bound statement arguments.

use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly bound value.
///
/// Values are shared through an `Arc`, so a list statement's arguments can be
/// handed to its count derivative without copying them.
#[derive(Clone)]
pub struct Param(Arc<dyn ToSql + Send + Sync>);

impl Param {
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// The value as a `tokio-postgres` parameter reference.
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.0, f)
    }
}

/// Ordered positional arguments; entry `i` binds placeholder `$(i + 1)`.
#[derive(Clone, Debug, Default)]
pub struct ArgumentList {
    params: Vec<Param>,
}

impl ArgumentList {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Append a value and return the ordinal it binds.
    pub fn push<T: ToSql + Send + Sync + 'static>(&mut self, value: T) -> i32 {
        self.push_param(Param::new(value))
    }

    /// Append a pre-wrapped value and return the ordinal it binds.
    pub fn push_param(&mut self, param: Param) -> i32 {
        self.params.push(param);
        // Placeholder numbers are i32 in the parse tree; argument lists never
        // come close to that bound.
        self.params.len() as i32
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    /// All values as references, ready for `tokio-postgres`.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(Param::as_sql).collect()
    }
}

impl FromIterator<Param> for ArgumentList {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_one_based_ordinals() {
        let mut args = ArgumentList::new();
        assert_eq!(args.push("Root"), 1);
        assert_eq!(args.push(3i64), 2);
        assert_eq!(args.push(Option::<String>::None), 3);
        assert_eq!(args.len(), 3);
        assert_eq!(args.as_refs().len(), 3);
    }

    #[test]
    fn debug_shows_bound_value() {
        let mut args = ArgumentList::new();
        args.push("%Root%".to_string());
        args.push(Option::<String>::None);
        assert_eq!(format!("{:?}", args.get(0).unwrap()), "\"%Root%\"");
        assert_eq!(format!("{:?}", args.get(1).unwrap()), "None");
    }
}
