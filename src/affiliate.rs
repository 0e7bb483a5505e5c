//! Tagged outbound product links.

use storefront_catalog::Product;
use url::Url;

use crate::marketplace::Marketplace;

/// Query parameter that carries the affiliate tag.
const TAG_PARAM: &str = "tag";

/// Outbound link for `product` carrying `marketplace`'s affiliate tag.
///
/// A provider link that is an http(s) URL on the marketplace's domain keeps
/// its path and query; its `tag` parameter is set or replaced. Any other
/// link is replaced by the canonical `/dp/{asin}` product page.
pub fn affiliate_link(product: &Product, marketplace: &Marketplace) -> String {
    if let Some(url) = retag(&product.affiliate_link, marketplace) {
        return url;
    }
    product_page_link(&product.asin, marketplace)
}

/// Canonical tagged product page on `marketplace`.
///
/// The ASIN and the tag are percent-encoded.
pub fn product_page_link(asin: &str, marketplace: &Marketplace) -> String {
    let base = format!("https://www.{}/dp/", marketplace.domain);
    let Ok(mut url) = Url::parse(&base) else {
        tracing::warn!(domain = %marketplace.domain, "marketplace domain is not a valid host");
        return base;
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(asin.trim());
    }
    url.query_pairs_mut()
        .append_pair(TAG_PARAM, &marketplace.affiliate_tag);
    url.into()
}

/// Copy of `product` whose link carries the marketplace tag.
pub fn tag_product(product: &Product, marketplace: &Marketplace) -> Product {
    Product {
        affiliate_link: affiliate_link(product, marketplace),
        ..product.clone()
    }
}

fn retag(link: &str, marketplace: &Marketplace) -> Option<String> {
    let mut url = Url::parse(link.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();
    let domain = marketplace.domain.to_ascii_lowercase();
    let on_domain = host == domain || host.ends_with(&format!(".{domain}"));
    if !on_domain {
        return None;
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != TAG_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair(TAG_PARAM, &marketplace.affiliate_tag);
    Some(url.into())
}
