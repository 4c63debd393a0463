//! Record filtering
//!
//! A handler's filter is applied after the level gate (spec §4.2, §4.3). A
//! string filter `p` passes a record `r` iff `r.name == p` or `r.name` starts
//! with `p + "."`; a predicate filter is invoked directly.

use crate::record::Record;
use std::sync::Arc;

/// Per-handler filter: a namespace prefix, an arbitrary predicate, or none.
#[derive(Clone)]
pub enum Filter {
    /// No filtering; every record passes.
    None,
    /// Namespace-prefix filter over `record.name`.
    Namespace(String),
    /// Arbitrary predicate over the record.
    Predicate(Arc<dyn Fn(&Record) -> bool + Send + Sync>),
}

impl Filter {
    pub fn namespace(prefix: impl Into<String>) -> Self {
        Filter::Namespace(prefix.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(f))
    }

    /// Returns `true` if `record` passes this filter.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::None => true,
            Filter::Namespace(prefix) => matches_namespace(prefix, &record.name),
            Filter::Predicate(f) => f(record),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::None
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::None => write!(f, "Filter::None"),
            Filter::Namespace(p) => write!(f, "Filter::Namespace({p:?})"),
            Filter::Predicate(_) => write!(f, "Filter::Predicate(<fn>)"),
        }
    }
}

fn matches_namespace(prefix: &str, name: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    name == prefix || name.starts_with(&format!("{prefix}."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::record::{CallSite, Record};
    use chrono::Utc;
    use std::collections::HashMap;

    fn record_named(name: &str) -> Record {
        let mut record = Record::new(
            Level::Info,
            "m".to_string(),
            CallSite {
                file: "f",
                line: 1,
                module: name,
                function: "f",
            },
            Utc::now(),
            None,
            HashMap::new(),
        );
        record.name = name.to_string();
        record
    }

    #[test]
    fn namespace_filter_matches_self_and_children_only() {
        let filter = Filter::namespace("app.db");
        assert!(filter.matches(&record_named("app.db")));
        assert!(filter.matches(&record_named("app.db.pool")));
        assert!(!filter.matches(&record_named("app")));
        assert!(!filter.matches(&record_named("app.web")));
        assert!(!filter.matches(&record_named("app.dbx")));
    }

    #[test]
    fn none_filter_passes_everything() {
        let filter = Filter::None;
        assert!(filter.matches(&record_named("anything")));
    }

    #[test]
    fn predicate_filter_is_invoked_directly() {
        let filter = Filter::predicate(|r: &Record| r.name.len() > 3);
        assert!(filter.matches(&record_named("long-name")));
        assert!(!filter.matches(&record_named("ab")));
    }
}
