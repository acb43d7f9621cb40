//! Asset cache policy.
//!
//! An ordered list of URL-pattern rules. The first rule whose pattern matches a
//! request URL decides the strategy, the cache it lands in, and how long entries live.

use std::num::NonZeroUsize;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;

use crate::config::WorkerSettings;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

const IMAGES_MAX_ENTRIES: usize = 64;
const IMAGES_MAX_AGE: Duration = Duration::from_secs(30 * DAY.as_secs());
const FONTS_MAX_ENTRIES: usize = 10;
const FONTS_MAX_AGE: Duration = Duration::from_secs(365 * DAY.as_secs());
const STATIC_MAX_ENTRIES: usize = 64;
const STATIC_MAX_AGE: Duration = Duration::from_secs(7 * DAY.as_secs());
const PAGES_MAX_ENTRIES: usize = 64;
const PAGES_MAX_AGE: Duration = DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strategy {
    CacheFirst,
    StaleWhileRevalidate,
    NetworkFirst,
}

/// One URL-pattern rule. Built at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CacheRule {
    pub pattern: Regex,
    pub strategy: Strategy,
    pub cache_name: &'static str,
    pub max_entries: NonZeroUsize,
    pub max_age: Duration,
    /// Only meaningful for [`Strategy::NetworkFirst`].
    pub network_timeout: Option<Duration>,
}

impl CacheRule {
    pub fn new(
        pattern: Regex,
        strategy: Strategy,
        cache_name: &'static str,
        max_entries: usize,
        max_age: Duration,
    ) -> Self {
        Self {
            pattern,
            strategy,
            cache_name,
            // A zero limit would make the cache useless; clamp like the other limits.
            max_entries: NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN),
            max_age,
            network_timeout: None,
        }
    }

    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout = Some(timeout);
        self
    }

    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}

/// Ordered rule list; first match wins.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    rules: Vec<CacheRule>,
}

impl CachePolicy {
    pub fn new(rules: Vec<CacheRule>) -> Self {
        Self { rules }
    }

    /// The site's standard rules for images, fonts, scripts/styles and pages.
    pub fn standard(image_host: &str, network_timeout: Duration) -> Self {
        let image_pattern = format!("^https://{}/", regex::escape(image_host));
        Self::new(vec![
            CacheRule::new(
                compile(&image_pattern),
                Strategy::CacheFirst,
                "images",
                IMAGES_MAX_ENTRIES,
                IMAGES_MAX_AGE,
            ),
            CacheRule::new(
                compile(r"^https://fonts\.(googleapis|gstatic)\.com/"),
                Strategy::CacheFirst,
                "fonts",
                FONTS_MAX_ENTRIES,
                FONTS_MAX_AGE,
            ),
            CacheRule::new(
                compile(r"\.(js|css)(\?.*)?$"),
                Strategy::StaleWhileRevalidate,
                "static-assets",
                STATIC_MAX_ENTRIES,
                STATIC_MAX_AGE,
            ),
            CacheRule::new(
                compile(r"^https?://"),
                Strategy::NetworkFirst,
                "pages",
                PAGES_MAX_ENTRIES,
                PAGES_MAX_AGE,
            )
            .with_network_timeout(network_timeout),
        ])
    }

    pub fn from_settings(settings: &WorkerSettings) -> Self {
        Self::standard(&settings.image_host, settings.network_timeout)
    }

    pub fn rules(&self) -> &[CacheRule] {
        &self.rules
    }

    /// First rule whose pattern matches `url`.
    pub fn rule_for(&self, url: &str) -> Option<&CacheRule> {
        self.rules.iter().find(|rule| rule.matches(url))
    }

    /// JSON-ready description of the rules for the browser-side worker.
    pub fn manifest(&self) -> CacheManifest {
        CacheManifest {
            rules: self.rules.iter().map(ManifestRule::from).collect(),
        }
    }
}

// Patterns above are literals or escaped input and always compile.
fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => unreachable!("built-in cache pattern `{pattern}` is invalid: {err}"),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheManifest {
    pub rules: Vec<ManifestRule>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRule {
    pub pattern: String,
    pub handler: Strategy,
    pub cache_name: &'static str,
    pub expiration: ManifestExpiration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestExpiration {
    pub max_entries: usize,
    pub max_age_seconds: u64,
}

impl From<&CacheRule> for ManifestRule {
    fn from(rule: &CacheRule) -> Self {
        Self {
            pattern: rule.pattern.as_str().to_string(),
            handler: rule.strategy,
            cache_name: rule.cache_name,
            expiration: ManifestExpiration {
                max_entries: rule.max_entries.get(),
                max_age_seconds: rule.max_age.as_secs(),
            },
            network_timeout_seconds: rule.network_timeout.map(|timeout| timeout.as_secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn policy() -> CachePolicy {
        CachePolicy::standard("cdn.sanity.io", Duration::from_secs(10))
    }

    #[test]
    fn image_host_is_cache_first() {
        let policy = policy();
        let rule = policy
            .rule_for("https://cdn.sanity.io/images/abc/production/hero.jpg?w=800")
            .expect("rule");
        assert_eq!(rule.cache_name, "images");
        assert_eq!(rule.strategy, Strategy::CacheFirst);
        assert_eq!(rule.max_entries.get(), 64);
        assert_eq!(rule.max_age, Duration::from_secs(30 * 86_400));
    }

    #[test]
    fn fonts_win_over_stylesheet_rule() {
        let policy = policy();
        let rule = policy
            .rule_for("https://fonts.googleapis.com/css2?family=Inter.css")
            .expect("rule");
        assert_eq!(rule.cache_name, "fonts");

        let rule = policy
            .rule_for("https://fonts.gstatic.com/s/inter/v12/font.woff2")
            .expect("rule");
        assert_eq!(rule.max_entries.get(), 10);
    }

    #[test]
    fn scripts_and_styles_use_stale_while_revalidate() {
        let policy = policy();
        for url in [
            "https://agency.example/_app/main.js",
            "https://agency.example/styles/site.css?v=3",
        ] {
            let rule = policy.rule_for(url).expect("rule");
            assert_eq!(rule.strategy, Strategy::StaleWhileRevalidate, "{url}");
            assert_eq!(rule.cache_name, "static-assets");
        }
    }

    #[test]
    fn everything_else_is_network_first_with_timeout() {
        let policy = policy();
        let rule = policy.rule_for("https://agency.example/about").expect("rule");
        assert_eq!(rule.strategy, Strategy::NetworkFirst);
        assert_eq!(rule.network_timeout, Some(Duration::from_secs(10)));
        assert!(policy.rule_for("data:image/png;base64,AAAA").is_none());
    }

    #[test]
    fn image_host_is_escaped() {
        let policy = CachePolicy::standard("img.example.com", Duration::from_secs(5));
        let rule = policy.rule_for("https://imgXexample.com/a.png").expect("rule");
        assert_eq!(rule.cache_name, "pages");
    }

    #[test]
    fn zero_limit_clamps_to_one() {
        let rule = CacheRule::new(
            compile("^x"),
            Strategy::CacheFirst,
            "tiny",
            0,
            Duration::from_secs(1),
        );
        assert_eq!(rule.max_entries.get(), 1);
    }

    #[test]
    fn manifest_uses_worker_field_names() {
        let manifest = serde_json::to_value(policy().manifest()).expect("serialize");
        let rules = manifest["rules"].as_array().expect("rules");
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[0]["handler"], json!("CacheFirst"));
        assert_eq!(rules[0]["cacheName"], json!("images"));
        assert_eq!(rules[0]["expiration"]["maxEntries"], json!(64));
        assert_eq!(rules[1]["expiration"]["maxAgeSeconds"], json!(365 * 86_400));
        assert!(rules[2].get("networkTimeoutSeconds").is_none());
        assert_eq!(rules[3]["networkTimeoutSeconds"], json!(10));
    }
}
