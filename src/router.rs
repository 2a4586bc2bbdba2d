//! Request classification and routing
//!
//! An ordered table of URL-pattern rules maps each request to a caching
//! strategy and a namespace kind, or to pass-through. Rules are evaluated
//! by a single dispatch loop in declared order; the first match wins and no
//! match means pass-through. Keeping the table explicit makes rule order
//! and exhaustiveness independently testable.
//!
//! Rationale behind the table: build artifacts and song archives are
//! content-addressed by naming convention, so permanent caching is safe and
//! maximizes offline availability. Chart and manifest files can change
//! without a filename change and need network-first freshness with offline
//! fallback. Skin, resource and font assets are large and slowly-changing
//! and tolerate a stale copy while refreshing in the background. General
//! site pages want freshest content but should degrade to cache offline.

use tracing::debug;

use crate::namespace::NamespaceKind;
use crate::request::RequestDescriptor;
use crate::strategy::StrategyKind;

/// Origins and prefixes the rule table is built from
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Site origin, no trailing slash (e.g. `https://example.com`)
    pub site_origin: String,
    /// Absolute build prefix (e.g. `https://example.com/build/`)
    pub build_prefix: String,
    /// Absolute skin prefix
    pub skin_prefix: String,
    /// Absolute resource prefix
    pub res_prefix: String,
    /// External font-hosting origin
    pub font_origin: String,
    /// Absolute URL of the bootstrap entry file, excluded from permanent
    /// caching so update detection keeps working
    pub bootstrap_url: String,
}

impl RouteConfig {
    /// Conventional prefixes for a site origin
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            site_origin: origin.to_string(),
            build_prefix: format!("{origin}/build/"),
            skin_prefix: format!("{origin}/skins/"),
            res_prefix: format!("{origin}/res/"),
            font_origin: "https://fonts.googleapis.com/".to_string(),
            bootstrap_url: format!("{origin}/build/boot.js"),
        }
    }
}

/// What the router decided for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// Not intercepted; the request proceeds on the default network path
    PassThrough,
    /// Serve through a strategy against one namespace kind
    Serve {
        strategy: StrategyKind,
        kind: NamespaceKind,
    },
}

/// URL-shape predicate for one rule
#[derive(Debug, Clone)]
enum Matcher {
    /// Request carries a byte-range directive
    RangeHeader,
    /// URL starts with the build prefix but is not the bootstrap file
    BuildAsset,
    /// Packaged-song-archive suffix: `assets/<name>.bemuse`
    SongArchive,
    /// Legacy chart suffix or index/metadata manifest filename
    ChartOrManifest,
    /// URL starts with a literal prefix
    Prefix(String),
}

/// One entry in the ordered rule table
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Rule name for logs and tests
    pub name: &'static str,
    matcher: Matcher,
    action: RouteAction,
}

impl PatternRule {
    /// The action this rule selects when it matches
    pub fn action(&self) -> RouteAction {
        self.action
    }
}

/// Legacy chart file suffixes
const CHART_SUFFIXES: [&str; 3] = [".bms", ".bme", ".bml"];
/// Index manifest filename
const INDEX_MANIFEST: &str = "/index.json";
/// Metadata manifest filename
const METADATA_MANIFEST: &str = "/assets/metadata.json";
/// Packaged song archive suffix
const SONG_ARCHIVE_SUFFIX: &str = ".bemuse";

fn is_song_archive(url: &str) -> bool {
    let Some(stripped) = url.strip_suffix(SONG_ARCHIVE_SUFFIX) else {
        return false;
    };
    // assets/<name>.bemuse with no path separator inside <name>
    match stripped.rfind('/') {
        Some(idx) => !stripped[idx + 1..].is_empty() && stripped[..=idx].ends_with("assets/"),
        None => false,
    }
}

fn is_chart_or_manifest(url: &str) -> bool {
    CHART_SUFFIXES.iter().any(|s| url.ends_with(s))
        || url.ends_with(INDEX_MANIFEST)
        || url.ends_with(METADATA_MANIFEST)
}

/// Ordered first-match-wins request classifier
pub struct Router {
    config: RouteConfig,
    rules: Vec<PatternRule>,
}

impl Router {
    /// Build the rule table for a configuration.
    ///
    /// Declared order is the evaluation order and is part of the contract:
    /// the bootstrap file deliberately falls past the build-asset rule and
    /// lands on the site rule, so a fresh bootstrap script is always
    /// fetched network-first.
    pub fn new(config: RouteConfig) -> Self {
        let rules = vec![
            PatternRule {
                name: "range-bypass",
                matcher: Matcher::RangeHeader,
                action: RouteAction::PassThrough,
            },
            PatternRule {
                name: "build-assets",
                matcher: Matcher::BuildAsset,
                action: RouteAction::Serve {
                    strategy: StrategyKind::CacheForever,
                    kind: NamespaceKind::AppShell,
                },
            },
            PatternRule {
                name: "song-archives",
                matcher: Matcher::SongArchive,
                action: RouteAction::Serve {
                    strategy: StrategyKind::CacheForever,
                    kind: NamespaceKind::SongData,
                },
            },
            PatternRule {
                name: "charts-and-manifests",
                matcher: Matcher::ChartOrManifest,
                action: RouteAction::Serve {
                    strategy: StrategyKind::FetchThenCache,
                    kind: NamespaceKind::SongData,
                },
            },
            PatternRule {
                name: "skins",
                matcher: Matcher::Prefix(config.skin_prefix.clone()),
                action: RouteAction::Serve {
                    strategy: StrategyKind::StaleWhileRevalidate,
                    kind: NamespaceKind::Skin,
                },
            },
            PatternRule {
                name: "resources",
                matcher: Matcher::Prefix(config.res_prefix.clone()),
                action: RouteAction::Serve {
                    strategy: StrategyKind::StaleWhileRevalidate,
                    kind: NamespaceKind::Resource,
                },
            },
            PatternRule {
                name: "site",
                matcher: Matcher::Prefix(config.site_origin.clone()),
                action: RouteAction::Serve {
                    strategy: StrategyKind::FetchThenCache,
                    kind: NamespaceKind::Site,
                },
            },
            PatternRule {
                name: "external-fonts",
                matcher: Matcher::Prefix(config.font_origin.clone()),
                action: RouteAction::Serve {
                    strategy: StrategyKind::StaleWhileRevalidate,
                    kind: NamespaceKind::Skin,
                },
            },
        ];

        Self { config, rules }
    }

    /// The rule table, in evaluation order
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Classify a request: first matching rule wins, no match is pass-through
    pub fn route(&self, request: &RequestDescriptor) -> RouteAction {
        for rule in &self.rules {
            if self.matches(&rule.matcher, request) {
                debug!(rule = rule.name, url = %request.url, "rule matched");
                return rule.action;
            }
        }
        debug!(url = %request.url, "no rule matched, passing through");
        RouteAction::PassThrough
    }

    /// Name of the first matching rule, for logs and tests
    pub fn matching_rule(&self, request: &RequestDescriptor) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| self.matches(&rule.matcher, request))
            .map(|rule| rule.name)
    }

    fn matches(&self, matcher: &Matcher, request: &RequestDescriptor) -> bool {
        match matcher {
            Matcher::RangeHeader => request.has_range_header(),
            Matcher::BuildAsset => {
                request.url.starts_with(&self.config.build_prefix)
                    && request.url != self.config.bootstrap_url
            }
            Matcher::SongArchive => is_song_archive(&request.url),
            Matcher::ChartOrManifest => is_chart_or_manifest(&request.url),
            Matcher::Prefix(prefix) => request.url.starts_with(prefix),
        }
    }
}
