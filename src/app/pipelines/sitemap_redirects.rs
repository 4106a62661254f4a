use crate::config::toml_config::SitemapRedirectConfig;
use crate::core::export::{self, OutputFile};
use crate::core::handle_mapping::{build_handle_mappings, SourceFilter};
use crate::core::reconcile::reconcile;
use crate::core::sitemap::{to_site_path, SitemapFetcher};
use crate::core::spreadsheet;
use crate::core::{Pipeline, RedirectPlan, Storage, TargetShop};
use crate::domain::model::SitemapSnapshot;
use crate::utils::error::Result;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Sitemap-reconciled redirect builder for a single target shop.
pub struct SitemapRedirectPipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) shop: TargetShop,
    pub(crate) fetcher: SitemapFetcher,
    pub(crate) mapping_workbook: PathBuf,
    pub(crate) source_filter: SourceFilter,
    pub(crate) output_path: String,
    pub(crate) bundle_zip: bool,
}

impl<S: Storage> SitemapRedirectPipeline<S> {
    pub fn new(
        storage: S,
        settings: &SitemapRedirectConfig,
        shop: TargetShop,
        output_path: impl Into<String>,
        bundle_zip: bool,
    ) -> Result<Self> {
        let fetcher = SitemapFetcher::new(
            settings.index_url.clone(),
            settings.old_domain.clone(),
            settings.timeout(),
            settings.sitemap_fragments(),
        )?;

        Ok(Self {
            storage,
            shop,
            fetcher,
            mapping_workbook: PathBuf::from(&settings.mapping_workbook),
            source_filter: settings.source_filter()?,
            output_path: output_path.into(),
            bundle_zip,
        })
    }

    fn output_files(&self, plan: &RedirectPlan) -> Result<Vec<OutputFile>> {
        let slugs = self.shop.slug_key();
        Ok(vec![
            OutputFile::new(
                format!("redirects_{}.csv", slugs),
                export::redirects_csv(&plan.rules)?,
            ),
            OutputFile::new(
                format!("redirects_upload_{}.csv", slugs),
                export::upload_csv(&plan.rules)?,
            ),
            OutputFile::new(
                format!("missing_{}.csv", slugs),
                export::missing_csv(&plan.missing_paths)?,
            ),
            OutputFile::new(
                format!("redirect_stats_{}.csv", slugs),
                export::stats_csv(&plan.stats)?,
            ),
        ])
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for SitemapRedirectPipeline<S> {
    type Extracted = SitemapSnapshot;
    type Transformed = RedirectPlan;

    fn name(&self) -> String {
        format!(
            "sitemap redirects for {} ({})",
            self.shop.new_domain,
            self.shop.slug_key()
        )
    }

    async fn extract(&self) -> Result<SitemapSnapshot> {
        let slugs = self.shop.slug_key();
        tracing::info!("🔁 Generating redirects for: {} ({})", self.shop.new_domain, slugs);

        tracing::info!("📥 Loading sitemap URLs...");
        let sitemap_urls = self.fetcher.collect_urls(&self.shop.locale_prefixes).await;
        let sitemap_paths: BTreeSet<String> = sitemap_urls
            .iter()
            .map(|url| to_site_path(url, self.fetcher.old_domain()))
            .collect();
        tracing::info!("🔍 Found {} URLs in sitemap for {}.", sitemap_paths.len(), slugs);

        // a missing or unreadable workbook aborts this shop's run
        tracing::debug!("Reading workbook: {}", self.mapping_workbook.display());
        let sheets = spreadsheet::read_workbook(&self.mapping_workbook)?;

        Ok(SitemapSnapshot {
            sitemap_paths,
            sheets,
        })
    }

    async fn transform(&self, data: SitemapSnapshot) -> Result<RedirectPlan> {
        let mappings = build_handle_mappings(&data.sheets, &self.shop, &self.source_filter);
        tracing::debug!(
            "{} explicit redirects from {} old handles",
            mappings.rules.len(),
            mappings.old_handles.len()
        );

        let plan = reconcile(&self.shop, &data.sitemap_paths, mappings);
        for (metric, value) in plan.stats.rows() {
            tracing::info!("📊 {}: {}", metric, value);
        }
        Ok(plan)
    }

    async fn load(&self, plan: RedirectPlan) -> Result<String> {
        let files = self.output_files(&plan)?;

        for file in &files {
            self.storage.write_file(&file.name, &file.data).await?;
        }

        if self.bundle_zip {
            let bundle_name = format!("redirect_bundle_{}.zip", self.shop.slug_key());
            let bundle = export::bundle_zip(&files)?;
            self.storage.write_file(&bundle_name, &bundle).await?;
            tracing::info!("📦 Bundle saved: {}", bundle_name);
        }

        tracing::info!("✅ Export complete for {}.", self.shop.slug_key());
        Ok(self.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SheetTable;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_text(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|data| String::from_utf8_lossy(data).into_owned())
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn pipeline(storage: MockStorage, bundle_zip: bool) -> SitemapRedirectPipeline<MockStorage> {
        SitemapRedirectPipeline {
            storage,
            shop: TargetShop {
                new_domain: "https://fr.yourshop.com".to_string(),
                locale_prefixes: vec!["/fr/".to_string()],
            },
            fetcher: SitemapFetcher::new(
                "http://127.0.0.1:9/sitemap.xml",
                "https://yourshop.com",
                Duration::from_secs(1),
                Vec::new(),
            )
            .unwrap(),
            mapping_workbook: PathBuf::from("unused.xlsx"),
            source_filter: SourceFilter::default(),
            output_path: "./redirect_exports".to_string(),
            bundle_zip,
        }
    }

    fn snapshot() -> SitemapSnapshot {
        SitemapSnapshot {
            sitemap_paths: ["/fr/products/old-item", "/fr/products/kept"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sheets: vec![SheetTable {
                name: "Products".to_string(),
                headers: vec!["Handle (Old)".to_string(), "Handle (New)".to_string()],
                rows: vec![vec!["kept".to_string(), "summer-sale".to_string()]],
            }],
        }
    }

    #[tokio::test]
    async fn test_transform_and_load_write_four_files() {
        let storage = MockStorage::default();
        let pipeline = pipeline(storage.clone(), false);

        let plan = pipeline.transform(snapshot()).await.unwrap();
        assert_eq!(plan.stats.custom_redirects, 1);
        assert_eq!(plan.stats.fallback_redirects, 1);

        let output = pipeline.load(plan).await.unwrap();
        assert_eq!(output, "./redirect_exports");

        let redirects = storage.get_text("redirects_fr.csv").await.unwrap();
        assert!(redirects.contains(
            "/fr/products/kept,https://fr.yourshop.com/products/summer-sale,Products"
        ));
        assert!(redirects.contains("/fr/products/old-item,https://fr.yourshop.com,Auto-Fallback"));

        let missing = storage.get_text("missing_fr.csv").await.unwrap();
        assert_eq!(missing, "Missing Sitemap URLs\n/fr/products/old-item\n");

        let stats = storage.get_text("redirect_stats_fr.csv").await.unwrap();
        assert!(stats.contains("Sitemap URLs for fr,2"));
        assert!(stats.contains("Total redirects created,2"));

        assert!(storage.get_text("redirects_upload_fr.csv").await.is_some());
        assert!(storage.get_text("redirect_bundle_fr.zip").await.is_none());
    }

    #[tokio::test]
    async fn test_load_writes_bundle_when_enabled() {
        let storage = MockStorage::default();
        let pipeline = pipeline(storage.clone(), true);

        let plan = pipeline.transform(snapshot()).await.unwrap();
        pipeline.load(plan).await.unwrap();

        let files = storage.files.lock().await;
        let bundle = files.get("redirect_bundle_fr.zip").unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(bundle.clone())).unwrap();
        assert_eq!(archive.len(), 4);
    }
}
