//! Versioned cache namespace naming
//!
//! Namespace names partition the cache store by semantic kind and build
//! version: `{kind}-v{version}`, e.g. `site-v1.2.3`. Bumping the build
//! version retargets every strategy at fresh namespaces, which is the only
//! cache-busting mechanism this core has. The app-shell kind is the one
//! exception: build artifacts are content-addressed by filename, so the
//! shell namespace is a fixed literal and survives upgrades.
//!
//! Namespaces from prior versions become orphans. The registry can
//! enumerate them for an external reaper but never deletes anything itself.

use std::fmt;

/// Fixed namespace name for the app shell, unrelated to version
const APP_SHELL_NAMESPACE: &str = "app";

/// Semantic kind of a cache namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    /// General site pages and the root document
    Site,
    /// Shared resources (large, slowly-changing assets)
    Resource,
    /// Skin assets and externally-hosted fonts
    Skin,
    /// Song archives, chart files and manifests
    SongData,
    /// Compiled application assets under the build prefix
    AppShell,
}

impl NamespaceKind {
    /// Short name used in namespace naming
    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceKind::Site => "site",
            NamespaceKind::Resource => "res",
            NamespaceKind::Skin => "skin",
            NamespaceKind::SongData => "songs",
            NamespaceKind::AppShell => "app",
        }
    }

    /// All kinds, for enumeration at activate time
    pub fn all() -> [NamespaceKind; 5] {
        [
            NamespaceKind::Site,
            NamespaceKind::Resource,
            NamespaceKind::Skin,
            NamespaceKind::SongData,
            NamespaceKind::AppShell,
        ]
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes versioned namespace names from a build-version string.
///
/// Pure and deterministic: repeated calls within one build version always
/// yield the same name, so reads and writes target the same store.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    version: String,
}

impl NamespaceRegistry {
    /// Create a registry for a build version (used verbatim in names)
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
        }
    }

    /// The build version this registry was created with
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Namespace name for a kind under the current build version
    pub fn name_for(&self, kind: NamespaceKind) -> String {
        match kind {
            NamespaceKind::AppShell => APP_SHELL_NAMESPACE.to_string(),
            _ => format!("{}-v{}", kind.as_str(), self.version),
        }
    }

    /// All logically active namespace names for this version
    pub fn current_names(&self) -> Vec<String> {
        NamespaceKind::all()
            .iter()
            .map(|k| self.name_for(*k))
            .collect()
    }

    /// Whether a namespace name is active under the current version
    pub fn is_current(&self, name: &str) -> bool {
        self.current_names().iter().any(|n| n == name)
    }

    /// Split existing namespace names into orphans from prior versions.
    ///
    /// An orphan is a name that follows our `{kind}-v` naming but carries a
    /// different version. Names this registry never produced (foreign
    /// namespaces in a shared store) are left alone.
    pub fn orphaned<'a>(&self, existing: &'a [String]) -> Vec<&'a str> {
        existing
            .iter()
            .filter(|name| !self.is_current(name))
            .filter(|name| {
                NamespaceKind::all()
                    .iter()
                    .any(|k| name.starts_with(&format!("{}-v", k.as_str())))
            })
            .map(|s| s.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_kind_plus_version() {
        let registry = NamespaceRegistry::new("1.2.3");
        assert_eq!(registry.name_for(NamespaceKind::Site), "site-v1.2.3");
        assert_eq!(registry.name_for(NamespaceKind::Skin), "skin-v1.2.3");
        assert_eq!(registry.name_for(NamespaceKind::SongData), "songs-v1.2.3");
        assert_eq!(registry.name_for(NamespaceKind::Resource), "res-v1.2.3");
    }

    #[test]
    fn test_app_shell_name_is_fixed() {
        let a = NamespaceRegistry::new("1.2.3");
        let b = NamespaceRegistry::new("9.9.9");
        assert_eq!(a.name_for(NamespaceKind::AppShell), "app");
        assert_eq!(b.name_for(NamespaceKind::AppShell), "app");
    }

    #[test]
    fn test_name_stable_across_calls() {
        let registry = NamespaceRegistry::new("1.2.3");
        let first = registry.name_for(NamespaceKind::Site);
        let second = registry.name_for(NamespaceKind::Site);
        assert_eq!(first, second);
    }

    #[test]
    fn test_name_differs_across_versions() {
        let old = NamespaceRegistry::new("1.2.3");
        let new = NamespaceRegistry::new("1.2.4");
        assert_ne!(
            old.name_for(NamespaceKind::Site),
            new.name_for(NamespaceKind::Site)
        );
    }

    #[test]
    fn test_orphan_classification() {
        let registry = NamespaceRegistry::new("2.0.0");
        let existing = vec![
            "site-v2.0.0".to_string(),
            "site-v1.9.0".to_string(),
            "skin-v1.9.0".to_string(),
            "app".to_string(),
            "unrelated-store".to_string(),
        ];
        let orphans = registry.orphaned(&existing);
        assert_eq!(orphans, vec!["site-v1.9.0", "skin-v1.9.0"]);
    }

    #[test]
    fn test_current_names_cover_all_kinds() {
        let registry = NamespaceRegistry::new("1.0.0");
        let names = registry.current_names();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"app".to_string()));
        assert!(registry.is_current("site-v1.0.0"));
        assert!(!registry.is_current("site-v0.9.0"));
    }
}
