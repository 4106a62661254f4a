pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use app::pipelines::{MatchedImportPipeline, SitemapRedirectPipeline};
pub use config::{cli::LocalStorage, toml_config::RedirectConfig};
pub use core::etl::EtlEngine;
pub use domain::model::{RedirectRule, TargetShop};
pub use utils::error::{RedirectError, Result};
