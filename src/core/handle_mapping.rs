use crate::domain::model::{ContentType, HandleMappings, RedirectRule, SheetTable, TargetShop};
use crate::utils::error::Result;
use regex::Regex;

pub const OLD_HANDLE_COLUMN: &str = "Handle (Old)";
pub const NEW_HANDLE_COLUMN: &str = "Handle (New)";

/// Sheet-name substring match, first hit wins: product, collection, blog, pages.
pub fn classify_sheet(sheet_name: &str) -> ContentType {
    let name = sheet_name.to_lowercase();
    if name.contains("product") {
        ContentType::Products
    } else if name.contains("collection") {
        ContentType::Collections
    } else if name.contains("blog") {
        ContentType::BlogArticles
    } else {
        ContentType::Pages
    }
}

pub fn is_skipped_sheet(sheet_name: &str) -> bool {
    sheet_name.to_lowercase().contains("skip")
}

/// Predicate deciding whether a generated source path becomes a redirect.
/// Built from exclusion regexes; with none configured every path is accepted.
#[derive(Debug, Clone, Default)]
pub struct SourceFilter {
    excluded: Vec<Regex>,
}

impl SourceFilter {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let excluded = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| crate::utils::error::RedirectError::ConfigValidationError {
                field: "sitemap_redirects.exclude_source_patterns".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { excluded })
    }

    pub fn accepts(&self, source_path: &str) -> bool {
        !self.excluded.iter().any(|re| re.is_match(source_path))
    }
}

/// Resolves `relative` against the locale prefix the way a browser resolves a
/// relative link: everything after the prefix's last `/` is replaced.
pub fn join_locale_path(locale_prefix: &str, relative: &str) -> String {
    if relative.starts_with('/') {
        return relative.to_string();
    }
    let base = match locale_prefix.rfind('/') {
        Some(idx) => &locale_prefix[..=idx],
        None => "",
    };
    format!("{}{}", base, relative)
}

/// Target for a row. A blank new handle redirects to the bare domain.
pub fn build_target_url(new_domain: &str, new_handle: &str, content_type: ContentType) -> String {
    let handle = new_handle.trim().trim_start_matches('/');
    if handle.is_empty() {
        return new_domain.to_string();
    }

    let prefix = content_type.path_prefix();
    if handle.starts_with(prefix) {
        format!("{}/{}", new_domain, handle)
    } else {
        format!("{}/{}{}", new_domain, prefix, handle)
    }
}

/// Turns the handle sheets into explicit redirects for one shop.
///
/// Each row yields one rule per locale prefix, all sharing the row's target.
/// Sheets named with "skip" and sheets without the old-handle column add
/// nothing.
pub fn build_handle_mappings(
    sheets: &[SheetTable],
    shop: &TargetShop,
    source_filter: &SourceFilter,
) -> HandleMappings {
    let mut mappings = HandleMappings::default();

    for sheet in sheets {
        if is_skipped_sheet(&sheet.name) {
            tracing::debug!("Skipping sheet: {}", sheet.name);
            continue;
        }

        let Some(old_col) = sheet.column_index(OLD_HANDLE_COLUMN) else {
            tracing::debug!("Sheet '{}' has no '{}' column", sheet.name, OLD_HANDLE_COLUMN);
            continue;
        };
        let new_col = sheet.column_index(NEW_HANDLE_COLUMN);

        let content_type = classify_sheet(&sheet.name);
        let prefix = content_type.path_prefix();
        tracing::info!("🔄 Processing sheet: {} (prefix: /{})", sheet.name, prefix);

        for row in &sheet.rows {
            let old_handle = sheet.cell(row, old_col).trim();
            if old_handle.is_empty() {
                continue;
            }
            mappings.old_handles.insert(old_handle.to_string());

            let new_handle = new_col.map(|col| sheet.cell(row, col).trim()).unwrap_or("");
            let target = build_target_url(&shop.new_domain, new_handle, content_type);
            let relative = format!("{}{}", prefix, old_handle);

            for locale in &shop.locale_prefixes {
                let source_path = join_locale_path(locale, &relative);
                if !source_filter.accepts(&source_path) {
                    continue;
                }

                if !new_handle.is_empty() {
                    mappings.custom_sources.insert(source_path.clone());
                }
                mappings.redirect_sources.insert(source_path.clone());
                mappings
                    .rules
                    .push(RedirectRule::new(source_path, target.clone(), sheet.name.clone()));
            }
        }
    }

    mappings
}
