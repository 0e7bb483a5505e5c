//! Result shaping: dedup by ASIN, relevance filter, review ranking.
//!
//! The cache stores the output of [`dedup_and_rank`]; [`present`] is applied
//! on every read so a cached list is filtered exactly once per request.

use std::collections::HashSet;

use storefront_catalog::Product;

/// Collapse products sharing an ASIN, keeping the first occurrence in
/// source order.
pub fn dedup_by_asin(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::with_capacity(products.len());
    products
        .into_iter()
        .filter(|p| seen.insert(p.asin.clone()))
        .collect()
}

/// Stable sort by review count, most reviewed first.
pub fn sort_by_reviews(products: &mut [Product]) {
    products.sort_by(|a, b| b.reviews.cmp(&a.reviews));
}

/// Whether any lower-cased keyword occurs in the product's title or category.
pub fn matches_keywords(product: &Product, keywords: &[String]) -> bool {
    let haystack = format!("{} {}", product.title, product.category).to_lowercase();
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}

/// Keep only products matching `keywords`. `None` or an empty set keeps all.
pub fn apply_relevance_filter<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    keywords: Option<&[String]>,
) -> Vec<&'a Product> {
    match keywords {
        Some(keywords) if !keywords.is_empty() => products
            .into_iter()
            .filter(|p| matches_keywords(p, keywords))
            .collect(),
        _ => products.into_iter().collect(),
    }
}

/// Fresh catalog page to cacheable superset: dedup then rank.
pub fn dedup_and_rank(products: Vec<Product>) -> Vec<Product> {
    let mut products = dedup_by_asin(products);
    sort_by_reviews(&mut products);
    products
}

/// Cached or fresh superset to the page shown: filter then truncate.
pub fn present(products: &[Product], keywords: Option<&[String]>, page_size: usize) -> Vec<Product> {
    apply_relevance_filter(products, keywords)
        .into_iter()
        .take(page_size)
        .cloned()
        .collect()
}
