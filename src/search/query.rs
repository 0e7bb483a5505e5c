//! Turning a search intent into a catalog query.

use crate::taxonomy::{Taxonomy, subcategory_key};

/// A catalog query derived from the visitor's search text or category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    /// String sent to the catalog and used in the cache key.
    pub query: String,
    /// Subcategory key whose relevance keywords apply to the results.
    /// `None` for category browsing.
    pub filter_key: Option<String>,
}

/// Resolve the catalog query for a search.
///
/// Search text wins when it is non-blank and is not the placeholder
/// `default_term`, compared case-insensitively but untrimmed. Its lower-cased
/// trimmed form is looked up as a
/// subcategory key: a known key expands to the table's query, anything else
/// is sent verbatim. Without search text the category's keywords are used,
/// and `default_term` when the category is unknown.
pub fn resolve_query(
    search_text: &str,
    category_id: &str,
    taxonomy: &Taxonomy,
    default_term: &str,
) -> ResolvedQuery {
    let key = subcategory_key(search_text);
    let is_placeholder = search_text.to_lowercase() == default_term.to_lowercase();
    if !key.is_empty() && !is_placeholder {
        let query = taxonomy
            .search_terms(&key)
            .map_or_else(|| search_text.to_owned(), str::to_owned);
        return ResolvedQuery {
            query,
            filter_key: Some(key),
        };
    }

    let query = taxonomy
        .category(category_id)
        .map_or_else(|| default_term.to_owned(), |c| c.keywords.clone());
    ResolvedQuery {
        query,
        filter_key: None,
    }
}
