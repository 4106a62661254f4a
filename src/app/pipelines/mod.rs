pub mod matched_import;
pub mod sitemap_redirects;

pub use matched_import::MatchedImportPipeline;
pub use sitemap_redirects::SitemapRedirectPipeline;
