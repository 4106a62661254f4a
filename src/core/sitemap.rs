use crate::utils::error::Result;
use reqwest::Client;
use roxmltree::Document;
use std::collections::BTreeSet;
use std::time::Duration;

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Child sitemap filename fragments that carry redirectable content.
pub const DEFAULT_SITEMAP_FRAGMENTS: [&str; 4] = [
    "sitemap_products_",
    "sitemap_pages_",
    "sitemap_collections_",
    "sitemap_blogs_",
];

/// Fetches a sitemap index and the child sitemaps selected for a set of
/// locale prefixes. Requests run one after another.
pub struct SitemapFetcher {
    client: Client,
    index_url: String,
    old_domain: String,
    fragments: Vec<String>,
}

impl SitemapFetcher {
    pub fn new(
        index_url: impl Into<String>,
        old_domain: impl Into<String>,
        timeout: Duration,
        fragments: Vec<String>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            index_url: index_url.into(),
            old_domain: old_domain.into(),
            fragments,
        })
    }

    pub fn old_domain(&self) -> &str {
        &self.old_domain
    }

    /// Returns every page URL listed by the matching child sitemaps.
    ///
    /// Failures never abort the run: a broken index yields an empty set and a
    /// broken child sitemap only drops its own URLs.
    pub async fn collect_urls(&self, locale_prefixes: &[String]) -> BTreeSet<String> {
        let mut urls = BTreeSet::new();

        let index_xml = match self.fetch_document(&self.index_url).await {
            Ok(Some(body)) => body,
            Ok(None) => return urls,
            Err(e) => {
                tracing::warn!("❌ Failed to load sitemap index: {}", e);
                return urls;
            }
        };

        let selected = match select_child_sitemaps(
            &index_xml,
            &self.old_domain,
            locale_prefixes,
            &self.fragments,
        ) {
            Ok(selected) => selected,
            Err(e) => {
                tracing::warn!("❌ Failed to parse sitemap index: {}", e);
                return urls;
            }
        };

        tracing::debug!("Selected {} child sitemaps", selected.len());

        for sitemap_url in selected {
            match self.fetch_child(&sitemap_url).await {
                Ok(locs) => {
                    tracing::debug!("{} URLs in {}", locs.len(), sitemap_url);
                    urls.extend(locs);
                }
                Err(e) => tracing::warn!("❌ Failed to load {}: {}", sitemap_url, e),
            }
        }

        urls
    }

    async fn fetch_child(&self, sitemap_url: &str) -> Result<Vec<String>> {
        match self.fetch_document(sitemap_url).await? {
            Some(body) => parse_url_locs(&body),
            None => Ok(Vec::new()),
        }
    }

    /// `Ok(None)` for a non-success status, which is logged but not an error.
    async fn fetch_document(&self, url: &str) -> Result<Option<String>> {
        tracing::debug!("Fetching sitemap: {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            tracing::warn!("⚠️ {} answered with status {}", url, response.status());
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }
}

/// Picks the `<sitemap><loc>` entries of an index that sit under one of the
/// locale prefixes of `old_domain` and name a recognised content type.
pub fn select_child_sitemaps(
    index_xml: &str,
    old_domain: &str,
    locale_prefixes: &[String],
    fragments: &[String],
) -> Result<Vec<String>> {
    let doc = Document::parse(index_xml)?;

    Ok(child_locs(&doc, "sitemap")
        .into_iter()
        .filter(|loc| {
            locale_prefixes
                .iter()
                .any(|prefix| loc.starts_with(&format!("{}{}", old_domain, prefix)))
        })
        .filter(|loc| fragments.iter().any(|fragment| loc.contains(fragment.as_str())))
        .collect())
}

/// All `<url><loc>` entries of a child sitemap.
pub fn parse_url_locs(sitemap_xml: &str) -> Result<Vec<String>> {
    let doc = Document::parse(sitemap_xml)?;
    Ok(child_locs(&doc, "url"))
}

fn child_locs(doc: &Document, entry_tag: &str) -> Vec<String> {
    doc.root_element()
        .children()
        .filter(|node| node.has_tag_name((SITEMAP_NAMESPACE, entry_tag)))
        .filter_map(|entry| {
            entry
                .children()
                .find(|child| child.has_tag_name((SITEMAP_NAMESPACE, "loc")))
                .and_then(|loc| loc.text())
        })
        .map(str::trim)
        .filter(|loc| !loc.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strips the old domain so sitemap URLs compare against generated source paths.
pub fn to_site_path(url: &str, old_domain: &str) -> String {
    url.strip_prefix(old_domain).unwrap_or(url).to_string()
}
