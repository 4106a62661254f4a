use crate::domain::model::{count_values, ImportRow, MatchedImport, MatchedRow, SheetTable};
use crate::utils::error::{RedirectError, Result};
use url::Url;

pub const NO_MATCH_SENTINEL: &str = "no match";
pub const IMPORT_COMMAND: &str = "MERGE";
pub const DEFAULT_REDIRECT_TYPE: &str = "301";

/// Column names of the pre-matched workbook.
#[derive(Debug, Clone)]
pub struct MatchedColumns {
    pub url: String,
    pub matched: String,
    pub content_type: String,
    pub default_redirect_type: String,
}

impl Default for MatchedColumns {
    fn default() -> Self {
        Self {
            url: "url".to_string(),
            matched: "matched_final".to_string(),
            content_type: "type".to_string(),
            default_redirect_type: DEFAULT_REDIRECT_TYPE.to_string(),
        }
    }
}

pub fn is_no_match(value: &str) -> bool {
    value.to_lowercase() == NO_MATCH_SENTINEL
}

/// Path component of a URL, sliced from the input as written: no percent
/// encoding and no dot-segment resolution. A bare host has an empty path.
/// Relative input keeps everything before the query or fragment; anything
/// unparseable becomes an empty path.
pub fn url_path(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) => {
            // the scheme is ASCII, so its length is also its byte offset in `raw`
            let after_scheme = &raw[url.scheme().len() + 1..];
            let path_and_rest = match after_scheme.strip_prefix("//") {
                Some(authority_and_rest) => {
                    let end = authority_and_rest
                        .find(['/', '?', '#'])
                        .unwrap_or(authority_and_rest.len());
                    &authority_and_rest[end..]
                }
                None => after_scheme,
            };
            strip_query_and_fragment(path_and_rest).to_string()
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => strip_query_and_fragment(raw).to_string(),
        Err(e) => {
            tracing::debug!("Could not parse '{}' as URL: {}", raw, e);
            String::new()
        }
    }
}

fn strip_query_and_fragment(path_and_rest: &str) -> &str {
    path_and_rest
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
}

fn require_column(table: &SheetTable, column: &str) -> Result<usize> {
    table
        .column_index(column)
        .ok_or_else(|| RedirectError::MissingColumnError {
            sheet: table.name.clone(),
            column: column.to_string(),
        })
}

/// Splits the workbook on the "no match" sentinel and formats the matched
/// rows for the redirect importer.
pub fn build_matched_import(table: &SheetTable, columns: &MatchedColumns) -> Result<MatchedImport> {
    let url_col = require_column(table, &columns.url)?;
    let match_col = require_column(table, &columns.matched)?;
    let type_col = table.column_index(&columns.content_type);

    let mut matched = Vec::new();
    let mut no_match = SheetTable {
        name: table.name.clone(),
        headers: table.headers.clone(),
        rows: Vec::new(),
    };

    for row in &table.rows {
        let entry = MatchedRow {
            source_url: table.cell(row, url_col).to_string(),
            matched_target: table.cell(row, match_col).to_string(),
            content_type: type_col.map(|col| table.cell(row, col).to_string()),
        };

        if is_no_match(&entry.matched_target) {
            no_match.rows.push(row.clone());
        } else {
            matched.push(entry);
        }
    }

    let type_counts = type_col.map(|_| {
        count_values(
            matched
                .iter()
                .filter_map(|row| row.content_type.as_deref())
                .filter(|value| !value.is_empty()),
        )
    });

    let import_rows = matched
        .iter()
        .map(|row| ImportRow {
            redirect_from: url_path(&row.source_url),
            redirect_to: url_path(&row.matched_target),
            redirect_type: row
                .content_type
                .clone()
                .unwrap_or_else(|| columns.default_redirect_type.clone()),
            command: IMPORT_COMMAND.to_string(),
        })
        .collect();

    Ok(MatchedImport {
        total_entries: table.rows.len(),
        import_rows,
        no_match,
        type_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> SheetTable {
        SheetTable {
            name: "Sheet1".to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_url_path() {
        assert_eq!(url_path("https://shop.com/products/a?x=1"), "/products/a");
        assert_eq!(url_path("/pages/about#team"), "/pages/about");
        assert_eq!(url_path(""), "");
        assert_eq!(url_path("http://[::1"), "");
    }

    #[test]
    fn test_url_path_keeps_path_text_as_written() {
        assert_eq!(url_path("https://shop.com/produits/été"), "/produits/été");
        assert_eq!(url_path("https://shop.com/pages/a b"), "/pages/a b");
        assert_eq!(url_path("https://shop.com/a/../b"), "/a/../b");
        assert_eq!(url_path("https://shop.com:8443/fr/x?y=1#z"), "/fr/x");
        assert_eq!(url_path("https://shop.com"), "");
        assert_eq!(url_path("https://shop.com?q=1"), "");
    }

    #[test]
    fn test_no_match_is_case_insensitive() {
        assert!(is_no_match("No Match"));
        assert!(is_no_match("NO MATCH"));
        assert!(!is_no_match("https://shop.com/no-match"));
    }

    #[test]
    fn test_split_and_format_with_type_column() {
        let input = table(
            &["url", "matched_final", "type", "keyword"],
            &[
                &["https://old.com/a", "https://new.com/products/a", "product", "k1"],
                &["https://old.com/b", "No Match", "page", "k2"],
                &["https://old.com/c", "https://new.com/products/c", "product", "k3"],
                &["https://old.com/d", "https://new.com/pages/d", "page", "k4"],
            ],
        );

        let result = build_matched_import(&input, &MatchedColumns::default()).unwrap();

        assert_eq!(result.total_entries, 4);
        assert_eq!(result.valid_count(), 3);
        assert_eq!(result.no_match_count(), 1);
        assert_eq!(result.no_match.headers.len(), 4);
        assert_eq!(result.no_match.rows[0][3], "k2");
        assert!(result
            .import_rows
            .iter()
            .all(|row| row.redirect_from != "/b" && row.command == "MERGE"));
        assert_eq!(result.import_rows[0].redirect_to, "/products/a");
        assert_eq!(result.import_rows[0].redirect_type, "product");
        assert_eq!(
            result.type_counts,
            Some(vec![("product".to_string(), 2), ("page".to_string(), 1)])
        );
    }

    #[test]
    fn test_default_redirect_type_without_type_column() {
        let input = table(&["url", "matched_final"], &[&["/x", "/y"]]);
        let result = build_matched_import(&input, &MatchedColumns::default()).unwrap();

        assert_eq!(result.import_rows[0].redirect_type, "301");
        assert!(result.type_counts.is_none());
        assert_eq!(result.no_match_count(), 0);
    }

    #[test]
    fn test_missing_match_column_is_an_error() {
        let input = table(&["url"], &[&["/x"]]);
        let err = build_matched_import(&input, &MatchedColumns::default()).unwrap_err();
        assert!(matches!(err, RedirectError::MissingColumnError { .. }));
    }
}
