//! Catalog routing of page URLs into output buckets

use regex::Regex;

use crate::config::Catalog;
use crate::error::{Error, Result};

/// Routing decision for a single URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Archive the page under `bucket` (`""` is the root bucket)
    Archive { bucket: &'a str },

    /// The URL matches no rule and is not archived
    Skip,
}

impl<'a> Route<'a> {
    /// Bucket name when the URL is in scope
    pub fn bucket(&self) -> Option<&'a str> {
        match *self {
            Route::Archive { bucket } => Some(bucket),
            Route::Skip => None,
        }
    }
}

/// First-match router over compiled catalog rules
#[derive(Debug, Clone)]
pub struct CatalogRouter {
    // None routes everything to the root bucket
    rules: Option<Vec<(String, Regex)>>,
}

impl CatalogRouter {
    /// Compile the rules of `catalog`, or route everything to the root bucket
    /// when no catalog is configured
    pub fn new(catalog: Option<&Catalog>) -> Result<Self> {
        let rules = catalog
            .map(|catalog| {
                catalog
                    .rules()
                    .iter()
                    .map(|rule| {
                        Regex::new(&rule.pattern)
                            .map(|regex| (rule.bucket.clone(), regex))
                            .map_err(|e| {
                                Error::Config(format!(
                                    "pattern for bucket '{}': {}",
                                    rule.bucket, e
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;
        Ok(Self { rules })
    }

    /// Route `url` to the first bucket whose pattern occurs anywhere in it
    pub fn route(&self, url: &str) -> Route<'_> {
        let Some(rules) = &self.rules else {
            return Route::Archive { bucket: "" };
        };

        rules
            .iter()
            .find(|(_, regex)| regex.is_match(url))
            .map_or(Route::Skip, |(bucket, _)| Route::Archive {
                bucket: bucket.as_str(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "https://example.com";

    fn router(rules: &[(&str, &str)]) -> CatalogRouter {
        let catalog: Catalog = rules.iter().copied().collect();
        CatalogRouter::new(Some(&catalog)).unwrap()
    }

    #[test]
    fn test_no_catalog_routes_everything_to_root() {
        let router = CatalogRouter::new(None).unwrap();
        assert_eq!(
            router.route(&format!("{HOST}/anything")),
            Route::Archive { bucket: "" }
        );
    }

    #[test]
    fn test_blog_and_docs_rules() {
        let router = router(&[("blog", "/blog/"), ("docs", "/docs/")]);

        let route = router.route(&format!("{HOST}/blog/post1"));
        assert_eq!(route, Route::Archive { bucket: "blog" });
        assert_eq!(route.bucket(), Some("blog"));

        let route = router.route(&format!("{HOST}/docs/intro"));
        assert_eq!(route, Route::Archive { bucket: "docs" });

        let route = router.route(&format!("{HOST}/other"));
        assert_eq!(route, Route::Skip);
        assert_eq!(route.bucket(), None);
    }

    #[test]
    fn test_first_match_wins() {
        // Both rules match; declaration order decides
        let router = router(&[("posts", "post"), ("blog", "/blog/")]);
        assert_eq!(
            router.route(&format!("{HOST}/blog/post1")),
            Route::Archive { bucket: "posts" }
        );
    }

    #[test]
    fn test_patterns_search_unless_anchored() {
        let router = router(&[("exact", "^https://example\\.com/only$"), ("any", "about")]);
        assert_eq!(
            router.route(&format!("{HOST}/company/about-us")),
            Route::Archive { bucket: "any" }
        );
        assert_eq!(
            router.route(&format!("{HOST}/only")),
            Route::Archive { bucket: "exact" }
        );
        assert_eq!(router.route(&format!("{HOST}/only/more")), Route::Skip);
    }

    #[test]
    fn test_empty_catalog_skips_everything() {
        let catalog = Catalog::default();
        let router = CatalogRouter::new(Some(&catalog)).unwrap();
        assert_eq!(router.route(&format!("{HOST}/page")), Route::Skip);
    }
}
