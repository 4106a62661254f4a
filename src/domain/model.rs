use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Provenance label for redirects generated from the sitemap rather than a sheet.
pub const FALLBACK_LABEL: &str = "Auto-Fallback";

/// A single `source_path -> target` redirect. Ordering and equality cover all
/// three fields, so two rules that only differ in `origin_label` stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RedirectRule {
    pub source_path: String,
    pub target: String,
    pub origin_label: String,
}

impl RedirectRule {
    pub fn new(
        source_path: impl Into<String>,
        target: impl Into<String>,
        origin_label: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            target: target.into(),
            origin_label: origin_label.into(),
        }
    }

    pub fn fallback(source_path: impl Into<String>, new_domain: &str) -> Self {
        Self::new(source_path, new_domain, FALLBACK_LABEL)
    }
}

/// Content type of a handle-mapping sheet, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Products,
    Collections,
    BlogArticles,
    Pages,
}

impl ContentType {
    pub fn path_prefix(self) -> &'static str {
        match self {
            ContentType::Products => "products/",
            ContentType::Collections => "collections/",
            ContentType::BlogArticles => "blogs/articles/",
            ContentType::Pages => "pages/",
        }
    }
}

/// A target shop: the new domain plus the locale prefixes it takes over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetShop {
    pub new_domain: String,
    pub locale_prefixes: Vec<String>,
}

impl TargetShop {
    /// `["/fr/", "/fr-fr/"]` becomes `fr_fr-fr`; used to name output files.
    pub fn slug_key(&self) -> String {
        self.locale_prefixes
            .iter()
            .map(|prefix| prefix.trim_matches('/'))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// One worksheet read into memory: a header row and string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn cell<'a>(&'a self, row: &'a [String], column: usize) -> &'a str {
        row.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Everything Pipeline A extracts for one shop.
#[derive(Debug, Clone, Default)]
pub struct SitemapSnapshot {
    pub sitemap_paths: BTreeSet<String>,
    pub sheets: Vec<SheetTable>,
}

/// Explicit redirects built from the handle workbook.
#[derive(Debug, Clone, Default)]
pub struct HandleMappings {
    pub rules: Vec<RedirectRule>,
    pub old_handles: BTreeSet<String>,
    pub redirect_sources: BTreeSet<String>,
    pub custom_sources: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectStats {
    pub slug_key: String,
    pub handles_in_excel: usize,
    pub sitemap_urls: usize,
    pub custom_redirects: usize,
    pub fallback_redirects: usize,
    pub sitemap_not_in_excel: usize,
    pub total_redirects: usize,
}

impl RedirectStats {
    pub fn rows(&self) -> Vec<(String, usize)> {
        vec![
            ("Handles in Excel".to_string(), self.handles_in_excel),
            (format!("Sitemap URLs for {}", self.slug_key), self.sitemap_urls),
            ("Custom redirects (mapped)".to_string(), self.custom_redirects),
            (
                "Fallback redirects (unmapped)".to_string(),
                self.fallback_redirects,
            ),
            ("Sitemap URLs not in Excel".to_string(), self.sitemap_not_in_excel),
            ("Total redirects created".to_string(), self.total_redirects),
        ]
    }
}

/// Result of Pipeline A's transform step for one shop.
#[derive(Debug, Clone)]
pub struct RedirectPlan {
    pub rules: BTreeSet<RedirectRule>,
    pub missing_paths: BTreeSet<String>,
    pub stats: RedirectStats,
}

/// A row of the pre-matched workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRow {
    pub source_url: String,
    pub matched_target: String,
    pub content_type: Option<String>,
}

/// One line of the importer CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRow {
    #[serde(rename = "Redirect from")]
    pub redirect_from: String,
    #[serde(rename = "Redirect to")]
    pub redirect_to: String,
    #[serde(rename = "Redirect Type")]
    pub redirect_type: String,
    #[serde(rename = "Command")]
    pub command: String,
}

/// Result of Pipeline B's transform step.
#[derive(Debug, Clone, Default)]
pub struct MatchedImport {
    pub total_entries: usize,
    pub import_rows: Vec<ImportRow>,
    /// Unmatched rows with every original column, headers first.
    pub no_match: SheetTable,
    pub type_counts: Option<Vec<(String, usize)>>,
}

impl MatchedImport {
    pub fn valid_count(&self) -> usize {
        self.import_rows.len()
    }

    pub fn no_match_count(&self) -> usize {
        self.no_match.rows.len()
    }
}

/// Value counts in descending order, ties broken by first appearance.
pub fn count_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (position, value) in values.into_iter().enumerate() {
        counts.entry(value).or_insert((0, position)).0 += 1;
    }

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    sorted
        .into_iter()
        .map(|(value, (count, _))| (value.to_string(), count))
        .collect()
}
