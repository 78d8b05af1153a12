//! Checker discovery
//!
//! A run enables checkers named in two manifests, the site-wide one next to
//! the executable and the per-user one in the home directory, read in that
//! order. Names map to constructors in a [`CheckerCatalog`].

use crate::checker::Checker;
use crate::checkers::FormatArgsChecker;
use crate::error::AnalysisError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub type Constructor = fn() -> Box<dyn Checker>;

/// Constructors for every checker a manifest may name
#[derive(Default)]
pub struct CheckerCatalog {
    constructors: BTreeMap<String, Constructor>,
}

impl CheckerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The checkers shipped with lighthouse
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(crate::checkers::format_args::NAME, || Box::new(FormatArgsChecker::new()));
        catalog
    }

    pub fn register(&mut self, name: &str, constructor: Constructor) {
        self.constructors.insert(name.to_string(), constructor);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn construct(&self, name: &str) -> Option<Box<dyn Checker>> {
        self.constructors.get(name).map(|constructor| constructor())
    }
}

/// `{ "checkers": ["format-args", ...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub checkers: Vec<String>,
}

impl Manifest {
    pub fn parse(text: &str, path: &Path) -> Result<Manifest, AnalysisError> {
        serde_json::from_str(text).map_err(|e| AnalysisError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read a manifest; a missing file is not an error
    pub fn load(path: &Path) -> Result<Option<Manifest>, AnalysisError> {
        match fs::read_to_string(path) {
            Ok(text) => Manifest::parse(&text, path).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no checker manifest at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(AnalysisError::Manifest {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }
}

/// Where a run looks for checkers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub site_manifest: Option<PathBuf>,
    pub user_manifest: Option<PathBuf>,
    /// Enabled in addition to whatever the manifests name
    pub extra_checkers: Vec<String>,
}

impl AnalysisConfig {
    /// `<exe dir>/analysers/checkers.json` and `$HOME/.lh/checkers.json`
    pub fn with_default_locations() -> Self {
        let site_manifest = std::env::current_exe()
            .ok()
            .and_then(|exe| fs::canonicalize(exe).ok())
            .and_then(|exe| exe.parent().map(|dir| dir.join("analysers").join("checkers.json")));
        let user_manifest = std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".lh").join("checkers.json"));

        Self {
            site_manifest,
            user_manifest,
            extra_checkers: Vec::new(),
        }
    }

    /// Manifest paths in the order they are read
    pub fn manifest_locations(&self) -> impl Iterator<Item = &Path> {
        self.site_manifest.iter().chain(&self.user_manifest).map(PathBuf::as_path)
    }
}

/// The checkers enabled for one run
#[derive(Default)]
pub struct CheckerRegistry {
    checkers: Vec<Box<dyn Checker>>,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable every checker named by the configured manifests and extras
    pub fn from_config(config: &AnalysisConfig, catalog: &CheckerCatalog) -> Result<Self, AnalysisError> {
        let mut registry = Self::new();

        for path in config.manifest_locations() {
            if let Some(manifest) = Manifest::load(path)? {
                info!("reading checkers from {}", path.display());
                for name in &manifest.checkers {
                    registry.enable(name, catalog);
                }
            }
        }
        for name in &config.extra_checkers {
            registry.enable(name, catalog);
        }

        info!("{} checker(s) enabled", registry.len());
        Ok(registry)
    }

    /// Enable a checker by name. Unknown names are skipped and a name
    /// already enabled is not enabled twice.
    pub fn enable(&mut self, name: &str, catalog: &CheckerCatalog) -> bool {
        if self.checkers.iter().any(|c| c.name() == name) {
            debug!("checker '{name}' already enabled");
            return false;
        }
        match catalog.construct(name) {
            Some(checker) => {
                self.checkers.push(checker);
                true
            }
            None => {
                warn!("unknown checker '{name}' ignored");
                false
            }
        }
    }

    pub fn add(&mut self, checker: Box<dyn Checker>) {
        self.checkers.push(checker);
    }

    pub fn checkers(&self) -> &[Box<dyn Checker>] {
        &self.checkers
    }

    pub fn names(&self) -> Vec<&str> {
        self.checkers.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::HandlerTable;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    struct Quiet {
        handlers: HandlerTable,
    }

    impl Checker for Quiet {
        fn name(&self) -> &str {
            "quiet"
        }

        fn handlers(&self) -> &HandlerTable {
            &self.handlers
        }
    }

    fn catalog() -> CheckerCatalog {
        let mut catalog = CheckerCatalog::builtin();
        catalog.register("quiet", || Box::new(Quiet { handlers: HandlerTable::new() }));
        catalog
    }

    fn manifest_file(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = CheckerCatalog::builtin();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["format-args"]);
        assert!(catalog.construct("format-args").is_some());
        assert!(catalog.construct("nope").is_none());
    }

    #[test]
    fn test_site_then_user_with_duplicates() {
        let site = manifest_file(indoc! {r#"
            { "checkers": ["format-args", "missing-checker"] }
        "#});
        let user = manifest_file(indoc! {r#"
            { "checkers": ["quiet", "format-args"] }
        "#});
        let config = AnalysisConfig {
            site_manifest: Some(site.path().to_path_buf()),
            user_manifest: Some(user.path().to_path_buf()),
            extra_checkers: vec!["quiet".to_string()],
        };

        let registry = CheckerRegistry::from_config(&config, &catalog()).unwrap();
        assert_eq!(registry.names(), vec!["format-args", "quiet"]);
    }

    #[test]
    fn test_missing_manifests_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig {
            site_manifest: Some(dir.path().join("analysers").join("checkers.json")),
            user_manifest: Some(dir.path().join(".lh").join("checkers.json")),
            extra_checkers: Vec::new(),
        };
        let registry = CheckerRegistry::from_config(&config, &catalog()).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_malformed_manifest() {
        let site = manifest_file("{ \"checkers\": [\"format-args\" ");
        let config = AnalysisConfig {
            site_manifest: Some(site.path().to_path_buf()),
            ..AnalysisConfig::default()
        };
        let result = CheckerRegistry::from_config(&config, &catalog());
        assert!(matches!(result, Err(AnalysisError::Manifest { .. })));
    }

    #[test]
    fn test_empty_manifest_object() {
        let manifest = Manifest::parse("{}", Path::new("checkers.json")).unwrap();
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn test_manifest_locations_order() {
        let config = AnalysisConfig {
            site_manifest: Some(PathBuf::from("/opt/lh/analysers/checkers.json")),
            user_manifest: Some(PathBuf::from("/home/u/.lh/checkers.json")),
            extra_checkers: Vec::new(),
        };
        let locations: Vec<&Path> = config.manifest_locations().collect();
        assert_eq!(
            locations,
            vec![
                Path::new("/opt/lh/analysers/checkers.json"),
                Path::new("/home/u/.lh/checkers.json")
            ]
        );
    }

    #[test]
    fn test_default_locations() {
        let config = AnalysisConfig::with_default_locations();
        if let Some(site) = &config.site_manifest {
            assert!(site.ends_with("analysers/checkers.json"));
        }
        if let Some(user) = &config.user_manifest {
            assert!(user.ends_with(".lh/checkers.json"));
        }
    }
}
