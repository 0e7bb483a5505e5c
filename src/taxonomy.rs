//! Category taxonomy: category keywords, subcategory query expansions and
//! relevance filters.
//!
//! The tables are immutable once loaded. The built-in set is embedded from
//! `data/taxonomy.toml`; a deployment can replace it with its own file via
//! `search.taxonomy_path`, read once at startup.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorefrontError};

const BUILTIN_TAXONOMY: &str = include_str!("../data/taxonomy.toml");

/// A top-level storefront category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    /// Catalog query used when this category is selected and no search
    /// text is active.
    pub keywords: String,
    /// Display names of the subcategories shown under this category.
    #[serde(default)]
    pub subcategories: Vec<String>,
}

/// Query expansion and relevance keywords for one subcategory key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryTerms {
    pub query: String,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    categories: Vec<Category>,
    #[serde(default)]
    subcategories: HashMap<String, SubcategoryTerms>,
}

/// Read-only lookup tables for query resolution and relevance filtering.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<Category>,
    subcategories: HashMap<String, SubcategoryTerms>,
}

/// Lower-case and trim a subcategory name or typed search term into a
/// table key.
pub fn subcategory_key(text: &str) -> String {
    text.trim().to_lowercase()
}

impl Taxonomy {
    /// The taxonomy shipped with the binary.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Config`] if the embedded data is invalid.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_TAXONOMY)
    }

    /// Load the taxonomy from `path`, or the built-in one when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                tracing::info!(path = %path.display(), "loading taxonomy");
                Self::from_toml_str(&content)
            }
            None => Self::builtin(),
        }
    }

    /// Parse and validate a taxonomy document.
    ///
    /// Subcategory keys and filter keywords are normalised to lower case so
    /// lookups and matching are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Config`] on malformed TOML, an empty or
    /// duplicated category id, or a subcategory with an empty query.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TaxonomyFile = toml::from_str(content)
            .map_err(|e| StorefrontError::Config(format!("taxonomy: {e}")))?;

        let mut seen = std::collections::HashSet::new();
        for category in &file.categories {
            if category.id.trim().is_empty() {
                return Err(StorefrontError::Config(
                    "taxonomy: category id must not be empty".into(),
                ));
            }
            if !seen.insert(category.id.as_str()) {
                return Err(StorefrontError::Config(format!(
                    "taxonomy: duplicate category id {:?}",
                    category.id
                )));
            }
        }

        let mut subcategories = HashMap::with_capacity(file.subcategories.len());
        for (key, terms) in file.subcategories {
            if terms.query.trim().is_empty() {
                return Err(StorefrontError::Config(format!(
                    "taxonomy: subcategory {key:?} has an empty query"
                )));
            }
            let terms = SubcategoryTerms {
                query: terms.query,
                filters: terms
                    .filters
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            };
            subcategories.insert(subcategory_key(&key), terms);
        }

        Ok(Self {
            categories: file.categories,
            subcategories,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Expanded catalog query for a subcategory key.
    pub fn search_terms(&self, key: &str) -> Option<&str> {
        self.subcategories.get(key).map(|t| t.query.as_str())
    }

    /// Lower-cased relevance keywords for a subcategory key, `None` when the
    /// key is unknown or has no keywords.
    pub fn filter_keywords(&self, key: &str) -> Option<&[String]> {
        self.subcategories
            .get(key)
            .map(|t| t.filters.as_slice())
            .filter(|f| !f.is_empty())
    }
}
