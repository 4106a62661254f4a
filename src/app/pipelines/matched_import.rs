use crate::config::toml_config::MatchedImportConfig;
use crate::core::export::{self, OutputFile};
use crate::core::matched::{build_matched_import, MatchedColumns};
use crate::core::spreadsheet;
use crate::core::{Pipeline, SheetTable, Storage};
use crate::domain::model::MatchedImport;
use crate::utils::error::Result;
use std::path::PathBuf;

const BUNDLE_FILENAME: &str = "matched_import_bundle.zip";

/// Formats an already-matched URL workbook for the redirect importer.
pub struct MatchedImportPipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) workbook: PathBuf,
    pub(crate) sheet: Option<String>,
    pub(crate) columns: MatchedColumns,
    pub(crate) import_filename: String,
    pub(crate) no_match_filename: String,
    pub(crate) type_breakdown_filename: String,
    pub(crate) output_path: String,
    pub(crate) bundle_zip: bool,
}

impl<S: Storage> MatchedImportPipeline<S> {
    pub fn new(
        storage: S,
        settings: &MatchedImportConfig,
        output_path: impl Into<String>,
        bundle_zip: bool,
    ) -> Self {
        Self {
            storage,
            workbook: PathBuf::from(&settings.workbook),
            sheet: settings.sheet.clone(),
            columns: settings.columns(),
            import_filename: settings.import_filename(),
            no_match_filename: settings.no_match_filename(),
            type_breakdown_filename: settings.type_breakdown_filename(),
            output_path: output_path.into(),
            bundle_zip,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for MatchedImportPipeline<S> {
    type Extracted = SheetTable;
    type Transformed = MatchedImport;

    fn name(&self) -> String {
        format!("matched import from {}", self.workbook.display())
    }

    async fn extract(&self) -> Result<SheetTable> {
        tracing::info!("📥 Reading matched workbook: {}", self.workbook.display());
        let table = spreadsheet::read_sheet(&self.workbook, self.sheet.as_deref())?;
        tracing::debug!("Sheet '{}' has {} rows", table.name, table.rows.len());
        Ok(table)
    }

    async fn transform(&self, data: SheetTable) -> Result<MatchedImport> {
        let result = build_matched_import(&data, &self.columns)?;

        tracing::info!("🔢 Redirect Statistics:");
        tracing::info!("- Total entries: {}", result.total_entries);
        tracing::info!("- Valid redirects: {}", result.valid_count());
        tracing::info!("- No match entries removed: {}", result.no_match_count());

        if let Some(type_counts) = &result.type_counts {
            tracing::info!("🔎 Redirects by Type:");
            for (value, count) in type_counts {
                tracing::info!("  {}: {}", value, count);
            }
        }

        Ok(result)
    }

    async fn load(&self, result: MatchedImport) -> Result<String> {
        let mut files = Vec::new();

        if let Some(type_counts) = &result.type_counts {
            files.push(OutputFile::new(
                self.type_breakdown_filename.clone(),
                export::type_breakdown_xlsx(type_counts)?,
            ));
            tracing::info!("✅ Type breakdown saved: {}", self.type_breakdown_filename);
        }

        files.push(OutputFile::new(
            self.import_filename.clone(),
            export::import_csv(&result.import_rows)?,
        ));
        tracing::info!("✅ Redirect import file saved: {}", self.import_filename);

        if !result.no_match.rows.is_empty() {
            files.push(OutputFile::new(
                self.no_match_filename.clone(),
                export::sheet_xlsx(&result.no_match)?,
            ));
            tracing::warn!("⚠️ No match export saved: {}", self.no_match_filename);
        }

        for file in &files {
            self.storage.write_file(&file.name, &file.data).await?;
        }

        if self.bundle_zip {
            let bundle = export::bundle_zip(&files)?;
            self.storage.write_file(BUNDLE_FILENAME, &bundle).await?;
            tracing::info!("📦 Bundle saved: {}", BUNDLE_FILENAME);
        }

        Ok(self.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn pipeline(storage: MockStorage) -> MatchedImportPipeline<MockStorage> {
        MatchedImportPipeline {
            storage,
            workbook: PathBuf::from("unused.xlsx"),
            sheet: None,
            columns: MatchedColumns::default(),
            import_filename: "redirects_import.csv".to_string(),
            no_match_filename: "redirects_no_match.xlsx".to_string(),
            type_breakdown_filename: "redirects_by_type.xlsx".to_string(),
            output_path: ".".to_string(),
            bundle_zip: false,
        }
    }

    fn table(rows: &[[&str; 2]]) -> SheetTable {
        SheetTable {
            name: "Sheet1".to_string(),
            headers: vec!["url".to_string(), "matched_final".to_string()],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_no_match_file_only_when_needed() {
        let storage = MockStorage::default();
        let pipeline = pipeline(storage.clone());

        let result = pipeline
            .transform(table(&[["https://old.com/a", "https://new.com/b"]]))
            .await
            .unwrap();
        pipeline.load(result).await.unwrap();

        let files = storage.files.lock().await;
        assert!(files.contains_key("redirects_import.csv"));
        assert!(!files.contains_key("redirects_no_match.xlsx"));
        assert!(!files.contains_key("redirects_by_type.xlsx"));

        let csv = String::from_utf8(files["redirects_import.csv"].clone()).unwrap();
        assert_eq!(
            csv,
            "Redirect from,Redirect to,Redirect Type,Command\n/a,/b,301,MERGE\n"
        );
    }

    #[tokio::test]
    async fn test_unmatched_rows_go_to_review_workbook() {
        let storage = MockStorage::default();
        let pipeline = pipeline(storage.clone());

        let result = pipeline
            .transform(table(&[
                ["https://old.com/a", "no match"],
                ["https://old.com/c", "https://new.com/d"],
            ]))
            .await
            .unwrap();
        pipeline.load(result).await.unwrap();

        let files = storage.files.lock().await;
        let review = spreadsheet::read_workbook_bytes(files["redirects_no_match.xlsx"].clone())
            .unwrap();
        assert_eq!(review[0].headers, vec!["url", "matched_final"]);
        assert_eq!(review[0].rows, vec![vec!["https://old.com/a", "no match"]]);

        let csv = String::from_utf8(files["redirects_import.csv"].clone()).unwrap();
        assert!(!csv.contains("/a,"));
    }
}
