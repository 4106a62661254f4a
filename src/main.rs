use anyhow::Context;
use clap::Parser;
use redirect_mapper::config::toml_config::{MatchedImportConfig, SitemapRedirectConfig};
use redirect_mapper::config::{CliArgs, Command, LogFormat};
use redirect_mapper::utils::error::ErrorSeverity;
use redirect_mapper::utils::{logger, validation::Validate};
use redirect_mapper::{
    EtlEngine, LocalStorage, MatchedImportPipeline, RedirectConfig, RedirectError,
    SitemapRedirectPipeline, TargetShop,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    logger::init_cli_logger(args.verbose, args.log_format == LogFormat::Json);

    tracing::info!("🚀 Starting redirect-mapper");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = RedirectConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let result = match &args.command {
        Command::Sitemap { shop } => run_sitemap(&config, shop.as_deref(), args.dry_run).await,
        Command::Matched => run_matched(&config, args.dry_run).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run_sitemap(
    config: &RedirectConfig,
    only_shop: Option<&str>,
    dry_run: bool,
) -> Result<(), RedirectError> {
    let settings = config.sitemap_redirects()?;

    let shops = settings.select_shops(only_shop)?;

    if dry_run {
        print_sitemap_summary(config, settings, &shops);
        return Ok(());
    }

    for shop in shops {
        let storage = LocalStorage::new(config.output_path());
        let pipeline = SitemapRedirectPipeline::new(
            storage,
            settings,
            shop,
            config.output_path(),
            config.bundle_zip(),
        )?;

        let output_path = EtlEngine::new(pipeline).run().await?;
        println!("📁 Output saved to: {}", output_path);
    }

    Ok(())
}

async fn run_matched(config: &RedirectConfig, dry_run: bool) -> Result<(), RedirectError> {
    let settings = config.matched_import()?;

    if dry_run {
        print_matched_summary(config, settings);
        return Ok(());
    }

    let storage = LocalStorage::new(config.output_path());
    let pipeline =
        MatchedImportPipeline::new(storage, settings, config.output_path(), config.bundle_zip());

    let output_path = EtlEngine::new(pipeline).run().await?;
    println!("📁 Output saved to: {}", output_path);
    Ok(())
}

fn print_sitemap_summary(
    config: &RedirectConfig,
    settings: &SitemapRedirectConfig,
    shops: &[TargetShop],
) {
    println!("🔍 Dry Run: sitemap redirects");
    println!("  Sitemap index: {}", settings.index_url);
    println!("  Old domain: {}", settings.old_domain);
    println!("  Handle workbook: {}", settings.mapping_workbook);
    println!("  Timeout: {:?}", settings.timeout());
    println!("  Fragments: {}", settings.sitemap_fragments().join(", "));
    println!("  Output: {}", config.output_path());
    for shop in shops {
        println!(
            "  🏪 {} <- {} (files: *_{}.csv)",
            shop.new_domain,
            shop.locale_prefixes.join(" "),
            shop.slug_key()
        );
    }
}

fn print_matched_summary(config: &RedirectConfig, settings: &MatchedImportConfig) {
    let columns = settings.columns();
    println!("🔍 Dry Run: matched import");
    println!("  Workbook: {}", settings.workbook);
    println!(
        "  Columns: url={}, match={}, type={}",
        columns.url, columns.matched, columns.content_type
    );
    println!("  Default redirect type: {}", columns.default_redirect_type);
    println!("  Import file: {}", settings.import_filename());
    println!("  Output: {}", config.output_path());
}
