use crate::domain::model::{
    HandleMappings, RedirectPlan, RedirectRule, RedirectStats, TargetShop,
};
use std::collections::BTreeSet;

/// Adds a fallback to the bare new domain for every sitemap path the workbook
/// did not cover, then deduplicates and counts the result.
pub fn reconcile(
    shop: &TargetShop,
    sitemap_paths: &BTreeSet<String>,
    mappings: HandleMappings,
) -> RedirectPlan {
    let missing_paths: BTreeSet<String> = sitemap_paths
        .difference(&mappings.redirect_sources)
        .cloned()
        .collect();

    let mut rules: BTreeSet<RedirectRule> = mappings.rules.into_iter().collect();
    rules.extend(
        missing_paths
            .iter()
            .map(|path| RedirectRule::fallback(path.clone(), &shop.new_domain)),
    );

    let stats = RedirectStats {
        slug_key: shop.slug_key(),
        handles_in_excel: mappings.old_handles.len(),
        sitemap_urls: sitemap_paths.len(),
        custom_redirects: sitemap_paths.intersection(&mappings.custom_sources).count(),
        fallback_redirects: missing_paths.len(),
        sitemap_not_in_excel: missing_paths.len(),
        total_redirects: rules.len(),
    };

    RedirectPlan {
        rules,
        missing_paths,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FALLBACK_LABEL;

    fn shop() -> TargetShop {
        TargetShop {
            new_domain: "https://fr.yourshop.com".to_string(),
            locale_prefixes: vec!["/fr/".to_string()],
        }
    }

    fn paths(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fallback_for_unmapped_sitemap_url() {
        let sitemap = paths(&["/fr/products/old-item"]);
        let plan = reconcile(&shop(), &sitemap, HandleMappings::default());

        assert!(plan.rules.contains(&RedirectRule::new(
            "/fr/products/old-item",
            "https://fr.yourshop.com",
            FALLBACK_LABEL
        )));
        assert_eq!(plan.stats.fallback_redirects, 1);
        assert_eq!(plan.stats.custom_redirects, 0);
    }

    #[test]
    fn test_every_sitemap_path_is_covered() {
        let sitemap = paths(&["/fr/products/a", "/fr/products/b", "/fr/pages/c"]);

        let mut mappings = HandleMappings::default();
        mappings.rules.push(RedirectRule::new(
            "/fr/products/a",
            "https://fr.yourshop.com/products/new-a",
            "Products",
        ));
        mappings.rules.push(RedirectRule::new(
            "/fr/products/a",
            "https://fr.yourshop.com/products/new-a",
            "Products",
        ));
        mappings.redirect_sources.insert("/fr/products/a".to_string());
        mappings.custom_sources.insert("/fr/products/a".to_string());
        mappings.old_handles.insert("a".to_string());

        let plan = reconcile(&shop(), &sitemap, mappings);

        let sources: BTreeSet<&str> = plan.rules.iter().map(|r| r.source_path.as_str()).collect();
        for path in &sitemap {
            assert!(sources.contains(path.as_str()));
        }
        assert_eq!(
            plan.stats.custom_redirects + plan.stats.fallback_redirects,
            plan.stats.sitemap_urls
        );
        assert_eq!(plan.stats.total_redirects, 3);
        assert_eq!(plan.missing_paths, paths(&["/fr/pages/c", "/fr/products/b"]));
    }

    #[test]
    fn test_stats_rows_labels() {
        let plan = reconcile(&shop(), &paths(&["/fr/pages/x"]), HandleMappings::default());
        let labels: Vec<String> = plan.stats.rows().into_iter().map(|(k, _)| k).collect();
        assert_eq!(labels[1], "Sitemap URLs for fr");
        assert_eq!(labels[5], "Total redirects created");
    }
}
