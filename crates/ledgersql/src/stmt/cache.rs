//! Process-wide memo of parsed template trees.
//!
//! Templates are `&'static str` constants, so the key is the template text
//! itself. Cached trees are never handed out mutably: [`TemplateCache::statement`]
//! clones the stored tree, and the caller mutates its own copy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use pg_query::protobuf::ParseResult;

use super::Statement;
use crate::error::{LedgerError, LedgerResult};

/// Template cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl TemplateCacheStats {
    /// Hit ratio (0.0 - 1.0). Returns 0.0 if no lookups have occurred.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct TemplateCache {
    trees: RwLock<HashMap<&'static str, Arc<ParseResult>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every builder in the process.
    pub fn global() -> &'static TemplateCache {
        static GLOBAL: OnceLock<TemplateCache> = OnceLock::new();
        GLOBAL.get_or_init(TemplateCache::new)
    }

    /// A fresh, caller-owned statement for `template`.
    pub fn statement(&self, template: &'static str) -> LedgerResult<Statement> {
        let tree = self.tree(template)?;
        Statement::from_tree(ParseResult::clone(&tree))
    }

    fn tree(&self, template: &'static str) -> LedgerResult<Arc<ParseResult>> {
        {
            let trees = self.trees.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(found) = trees.get(template) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(found));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        // Parse outside the lock; a racing parse of the same constant is harmless.
        let parsed = pg_query::parse(template)
            .map_err(|e| LedgerError::syntax(format!("pg_query parse failed: {e}")))?;
        let tree = Arc::new(parsed.protobuf);

        let mut trees = self.trees.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(trees.entry(template).or_insert(tree)))
    }

    pub fn stats(&self) -> TemplateCacheStats {
        let size = self
            .trees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        TemplateCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size,
        }
    }

    pub fn clear(&self) {
        self.trees
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::{CompareOp, Predicate};
    use crate::ident::Ident;

    const TEMPLATE: &str = "SELECT t.id FROM tenants t";

    #[test]
    fn second_lookup_hits() {
        let cache = TemplateCache::new();
        cache.statement(TEMPLATE).unwrap();
        cache.statement(TEMPLATE).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn mutating_a_copy_leaves_the_cached_tree_alone() {
        let cache = TemplateCache::new();
        let mut first = cache.statement(TEMPLATE).unwrap();
        first
            .add_predicate(Predicate::compare(
                Ident::parse("t.id").unwrap(),
                CompareOp::Eq,
                1,
            ))
            .unwrap();

        let second = cache.statement(TEMPLATE).unwrap();
        assert_eq!(second.render().unwrap(), "SELECT t.id FROM tenants t");
        assert_ne!(first.render().unwrap(), second.render().unwrap());
    }

    #[test]
    fn bad_template_is_not_cached() {
        let cache = TemplateCache::new();
        assert!(cache.statement("SELEC 1").unwrap_err().is_fatal());
        assert_eq!(cache.stats().size, 0);
    }
}
