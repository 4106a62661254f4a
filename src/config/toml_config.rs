use crate::core::handle_mapping::SourceFilter;
use crate::core::matched::{MatchedColumns, DEFAULT_REDIRECT_TYPE};
use crate::core::sitemap::{DEFAULT_SITEMAP_FRAGMENTS, DEFAULT_TIMEOUT_SECONDS};
use crate::domain::model::TargetShop;
use crate::utils::error::{RedirectError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    pub output: OutputConfig,
    pub sitemap_redirects: Option<SitemapRedirectConfig>,
    pub matched_import: Option<MatchedImportConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_path: String,
    pub bundle_zip: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapRedirectConfig {
    pub index_url: String,
    pub old_domain: String,
    pub mapping_workbook: String,
    pub timeout_seconds: Option<u64>,
    pub sitemap_fragments: Option<Vec<String>>,
    pub exclude_source_patterns: Option<Vec<String>>,
    pub shops: Vec<TargetShop>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedImportConfig {
    pub workbook: String,
    pub sheet: Option<String>,
    pub url_column: Option<String>,
    pub match_column: Option<String>,
    pub type_column: Option<String>,
    pub default_redirect_type: Option<String>,
    pub filenames: Option<MatchedFilenames>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedFilenames {
    pub import: Option<String>,
    pub no_match: Option<String>,
    pub type_breakdown: Option<String>,
}

impl RedirectConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RedirectError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| RedirectError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces environment variable references such as `${SHOP_DOMAIN}`.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn output_path(&self) -> &str {
        &self.output.output_path
    }

    pub fn bundle_zip(&self) -> bool {
        self.output.bundle_zip.unwrap_or(false)
    }

    pub fn sitemap_redirects(&self) -> Result<&SitemapRedirectConfig> {
        validation::validate_required_field("sitemap_redirects", &self.sitemap_redirects)
    }

    pub fn matched_import(&self) -> Result<&MatchedImportConfig> {
        validation::validate_required_field("matched_import", &self.matched_import)
    }

    /// Checks that the configured values make sense together.
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("output.output_path", &self.output.output_path)?;

        if self.sitemap_redirects.is_none() && self.matched_import.is_none() {
            return Err(RedirectError::MissingConfigError {
                field: "sitemap_redirects or matched_import".to_string(),
            });
        }

        if let Some(sitemap) = &self.sitemap_redirects {
            sitemap.validate()?;
        }
        if let Some(matched) = &self.matched_import {
            matched.validate()?;
        }

        Ok(())
    }
}

impl SitemapRedirectConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn sitemap_fragments(&self) -> Vec<String> {
        self.sitemap_fragments.clone().unwrap_or_else(|| {
            DEFAULT_SITEMAP_FRAGMENTS
                .iter()
                .map(|f| f.to_string())
                .collect()
        })
    }

    pub fn source_filter(&self) -> Result<SourceFilter> {
        match &self.exclude_source_patterns {
            Some(patterns) => SourceFilter::new(patterns),
            None => Ok(SourceFilter::default()),
        }
    }

    pub fn find_shop(&self, new_domain: &str) -> Option<&TargetShop> {
        self.shops.iter().find(|shop| shop.new_domain == new_domain)
    }

    /// Shops a run covers: only the one named by `--shop`, or all of them.
    pub fn select_shops(&self, only_shop: Option<&str>) -> Result<Vec<TargetShop>> {
        match only_shop {
            Some(domain) => {
                let shop = self.find_shop(domain).cloned().ok_or_else(|| {
                    RedirectError::InvalidConfigValueError {
                        field: "--shop".to_string(),
                        value: domain.to_string(),
                        reason: "No shop with this new_domain is configured".to_string(),
                    }
                })?;
                Ok(vec![shop])
            }
            None => Ok(self.shops.clone()),
        }
    }
}

impl Validate for SitemapRedirectConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("sitemap_redirects.index_url", &self.index_url)?;
        validation::validate_domain("sitemap_redirects.old_domain", &self.old_domain)?;
        validation::validate_path(
            "sitemap_redirects.mapping_workbook",
            &self.mapping_workbook,
        )?;
        validation::validate_workbook_extension(
            "sitemap_redirects.mapping_workbook",
            &self.mapping_workbook,
        )?;

        if let Some(timeout) = self.timeout_seconds {
            validation::validate_positive_number("sitemap_redirects.timeout_seconds", timeout, 1)?;
        }

        if let Some(fragments) = &self.sitemap_fragments {
            for fragment in fragments {
                validation::validate_non_empty_string("sitemap_redirects.sitemap_fragments", fragment)?;
            }
        }

        if let Some(patterns) = &self.exclude_source_patterns {
            for pattern in patterns {
                validation::validate_regex("sitemap_redirects.exclude_source_patterns", pattern)?;
            }
        }

        if self.shops.is_empty() {
            return Err(RedirectError::MissingConfigError {
                field: "sitemap_redirects.shops".to_string(),
            });
        }

        for shop in &self.shops {
            validation::validate_domain("sitemap_redirects.shops.new_domain", &shop.new_domain)?;
            if shop.locale_prefixes.is_empty() {
                return Err(RedirectError::InvalidConfigValueError {
                    field: "sitemap_redirects.shops.locale_prefixes".to_string(),
                    value: shop.new_domain.clone(),
                    reason: "At least one locale prefix is required".to_string(),
                });
            }
            for prefix in &shop.locale_prefixes {
                if !prefix.starts_with('/') {
                    return Err(RedirectError::InvalidConfigValueError {
                        field: "sitemap_redirects.shops.locale_prefixes".to_string(),
                        value: prefix.clone(),
                        reason: "Locale prefix must start with '/'".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl MatchedImportConfig {
    pub fn columns(&self) -> MatchedColumns {
        let defaults = MatchedColumns::default();
        MatchedColumns {
            url: self.url_column.clone().unwrap_or(defaults.url),
            matched: self.match_column.clone().unwrap_or(defaults.matched),
            content_type: self.type_column.clone().unwrap_or(defaults.content_type),
            default_redirect_type: self
                .default_redirect_type
                .clone()
                .unwrap_or_else(|| DEFAULT_REDIRECT_TYPE.to_string()),
        }
    }

    pub fn import_filename(&self) -> String {
        self.filenames
            .as_ref()
            .and_then(|f| f.import.clone())
            .unwrap_or_else(|| "redirects_import.csv".to_string())
    }

    pub fn no_match_filename(&self) -> String {
        self.filenames
            .as_ref()
            .and_then(|f| f.no_match.clone())
            .unwrap_or_else(|| "redirects_no_match.xlsx".to_string())
    }

    pub fn type_breakdown_filename(&self) -> String {
        self.filenames
            .as_ref()
            .and_then(|f| f.type_breakdown.clone())
            .unwrap_or_else(|| "redirects_by_type.xlsx".to_string())
    }
}

impl Validate for MatchedImportConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("matched_import.workbook", &self.workbook)?;
        validation::validate_workbook_extension("matched_import.workbook", &self.workbook)?;

        let columns = self.columns();
        validation::validate_non_empty_string("matched_import.url_column", &columns.url)?;
        validation::validate_non_empty_string("matched_import.match_column", &columns.matched)?;
        validation::validate_non_empty_string(
            "matched_import.default_redirect_type",
            &columns.default_redirect_type,
        )?;

        Ok(())
    }
}

impl Validate for RedirectConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[output]
output_path = "./redirect_exports"
bundle_zip = true

[sitemap_redirects]
index_url = "https://yourshop.com/sitemap.xml"
old_domain = "https://yourshop.com"
mapping_workbook = "./redirect_mapping_input.xlsx"

[[sitemap_redirects.shops]]
new_domain = "https://it.yourshop.com"
locale_prefixes = ["/it/", "/it-it/", "/fr-it/"]

[[sitemap_redirects.shops]]
new_domain = "https://fr.yourshop.com"
locale_prefixes = ["/fr/", "/fr-fr/"]

[matched_import]
workbook = "./slug_keyword_url_mapping.xlsx"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = RedirectConfig::from_toml_str(FULL_CONFIG).unwrap();

        assert!(config.validate().is_ok());
        assert!(config.bundle_zip());

        let sitemap = config.sitemap_redirects().unwrap();
        assert_eq!(sitemap.shops.len(), 2);
        assert_eq!(sitemap.shops[1].slug_key(), "fr_fr-fr");
        assert_eq!(sitemap.timeout(), Duration::from_secs(10));
        assert_eq!(sitemap.sitemap_fragments().len(), 4);
        assert!(sitemap.find_shop("https://fr.yourshop.com").is_some());

        let matched = config.matched_import().unwrap();
        let columns = matched.columns();
        assert_eq!(columns.url, "url");
        assert_eq!(columns.matched, "matched_final");
        assert_eq!(columns.default_redirect_type, "301");
        assert_eq!(matched.import_filename(), "redirects_import.csv");
    }

    #[test]
    fn test_select_shops_limits_to_requested_shop() {
        let config = RedirectConfig::from_toml_str(FULL_CONFIG).unwrap();
        let sitemap = config.sitemap_redirects().unwrap();

        let all = sitemap.select_shops(None).unwrap();
        assert_eq!(all.len(), 2);

        let only_fr = sitemap.select_shops(Some("https://fr.yourshop.com")).unwrap();
        assert_eq!(only_fr.len(), 1);
        assert_eq!(only_fr[0].new_domain, "https://fr.yourshop.com");

        let err = sitemap.select_shops(Some("https://de.yourshop.com")).unwrap_err();
        assert!(matches!(err, RedirectError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("REDIRECT_TEST_OUTPUT", "/tmp/redirects");

        let config = RedirectConfig::from_toml_str(
            r#"
[output]
output_path = "${REDIRECT_TEST_OUTPUT}"

[matched_import]
workbook = "matches.xlsx"
"#,
        )
        .unwrap();
        assert_eq!(config.output_path(), "/tmp/redirects");

        std::env::remove_var("REDIRECT_TEST_OUTPUT");
    }

    #[test]
    fn test_rejects_bad_locale_prefix() {
        let config = RedirectConfig::from_toml_str(&FULL_CONFIG.replace("\"/fr/\"", "\"fr/\""))
            .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_pipelines() {
        let config = RedirectConfig::from_toml_str(
            r#"
[output]
output_path = "./out"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(RedirectError::MissingConfigError { .. })
        ));
        assert!(config.sitemap_redirects().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = RedirectConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.output_path(), "./redirect_exports");
    }
}
