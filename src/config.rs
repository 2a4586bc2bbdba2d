//! Configuration for Manna
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use uuid::Uuid;

use crate::router::RouteConfig;

/// When an activated gateway instance takes over open clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClaimPolicy {
    /// Claim all active clients now. Already-open sessions may see a mix of
    /// old and new cached assets until they next navigate.
    Immediate,
    /// Defer takeover until each client's next navigation.
    OnNavigation,
}

impl std::fmt::Display for ClaimPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ClaimPolicy::Immediate => "immediate",
            ClaimPolicy::OnNavigation => "on-navigation",
        })
    }
}

/// Manna - request-interception caching gateway
///
/// "Gather enough for today"
#[derive(Parser, Debug, Clone)]
#[command(name = "manna")]
#[command(about = "Request-interception caching gateway")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Site origin this gateway fronts (scheme + host, no trailing slash)
    #[arg(long, env = "ORIGIN", default_value = "http://localhost:8000")]
    pub origin: String,

    /// Build-version string, used verbatim in cache namespace names.
    /// Bumping it is the cache-busting mechanism for versioned namespaces.
    #[arg(long, env = "BUILD_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    pub build_version: String,

    /// Origin-relative prefix of compiled application assets
    #[arg(long, env = "BUILD_PREFIX", default_value = "/build/")]
    pub build_prefix: String,

    /// Origin-relative prefix of skin assets
    #[arg(long, env = "SKIN_PREFIX", default_value = "/skins/")]
    pub skin_prefix: String,

    /// Origin-relative prefix of shared resources
    #[arg(long, env = "RES_PREFIX", default_value = "/res/")]
    pub res_prefix: String,

    /// External font-hosting origin served through the skin namespace
    #[arg(long, env = "FONT_ORIGIN", default_value = "https://fonts.googleapis.com/")]
    pub font_origin: String,

    /// Bootstrap entry file under the build prefix, always fetched fresh
    /// so a new deploy is detected
    #[arg(long, env = "BOOTSTRAP_FILE", default_value = "boot.js")]
    pub bootstrap_file: String,

    /// Client takeover policy at activate
    #[arg(long, env = "CLAIM_POLICY", value_enum, default_value_t = ClaimPolicy::Immediate)]
    pub claim_policy: ClaimPolicy,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Site origin with any trailing slash removed
    pub fn site_origin(&self) -> String {
        self.origin.trim_end_matches('/').to_string()
    }

    /// Resolve the configured prefixes into an absolute route table config
    pub fn route_config(&self) -> RouteConfig {
        let origin = self.site_origin();
        let build_prefix = format!("{}{}", origin, self.build_prefix);
        RouteConfig {
            site_origin: origin.clone(),
            bootstrap_url: format!("{}{}", build_prefix, self.bootstrap_file),
            build_prefix,
            skin_prefix: format!("{}{}", origin, self.skin_prefix),
            res_prefix: format!("{}{}", origin, self.res_prefix),
            font_origin: self.font_origin.clone(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.origin.starts_with("http://") && !self.origin.starts_with("https://") {
            return Err("ORIGIN must start with http:// or https://".to_string());
        }

        for (name, prefix) in [
            ("BUILD_PREFIX", &self.build_prefix),
            ("SKIN_PREFIX", &self.skin_prefix),
            ("RES_PREFIX", &self.res_prefix),
        ] {
            if !prefix.starts_with('/') || !prefix.ends_with('/') {
                return Err(format!("{name} must start and end with '/'"));
            }
        }

        if self.build_version.trim().is_empty() {
            return Err("BUILD_VERSION must not be empty".to_string());
        }

        if self.bootstrap_file.contains('/') {
            return Err("BOOTSTRAP_FILE must be a bare filename".to_string());
        }

        Ok(())
    }
}
