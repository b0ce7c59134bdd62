//! Build type for Cargo projects.
//!
//! Rewrites versions in Cargo manifests with toml_edit so formatting and
//! comments survive, the same way the release tooling bumps workspaces.

use crate::build::EnvVarMap;
use crate::error::{Result, VersionError};
use crate::version::BuildTypeAction;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, TableLike};

/// Environment variable telling the pipeline not to run `cargo publish`
pub const CARGO_PUBLISH_SKIP: &str = "CARGO_PUBLISH_SKIP";
/// Environment variable telling the pipeline not to archive build artifacts
pub const GITFLOW_SKIP_ARCHIVE: &str = "GITFLOW_SKIP_ARCHIVE";

const DEPENDENCY_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Version handling for a Cargo package or workspace
#[derive(Debug, Clone)]
pub struct CargoBuildType {
    root: PathBuf,
}

impl CargoBuildType {
    /// Build type for the project rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn root_manifest(&self) -> PathBuf {
        self.root.join("Cargo.toml")
    }

    fn read_manifest(path: &Path) -> Result<DocumentMut> {
        let content = std::fs::read_to_string(path).map_err(|e| VersionError::TomlUpdateFailed {
            path: path.to_path_buf(),
            reason: format!("Failed to read file: {}", e),
        })?;
        let doc = content
            .parse::<DocumentMut>()
            .map_err(|e| VersionError::TomlUpdateFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;
        Ok(doc)
    }

    /// Root manifest followed by every workspace member manifest
    fn manifests(&self) -> Result<Vec<PathBuf>> {
        let root_manifest = self.root_manifest();
        let doc = Self::read_manifest(&root_manifest)?;

        let patterns = |key: &str| -> Vec<String> {
            doc.get("workspace")
                .and_then(|w| w.get(key))
                .and_then(Item::as_array)
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default()
        };

        let excluded: BTreeSet<PathBuf> = patterns("exclude")
            .iter()
            .map(|p| self.root.join(p))
            .collect();

        let mut members = BTreeSet::new();
        for pattern in patterns("members") {
            let full_pattern = self.root.join(&pattern).to_string_lossy().to_string();
            let paths = glob::glob(&full_pattern).map_err(|e| VersionError::TomlUpdateFailed {
                path: root_manifest.clone(),
                reason: format!("Invalid workspace member pattern '{}': {}", pattern, e),
            })?;
            for dir in paths.flatten() {
                let manifest = dir.join("Cargo.toml");
                if !excluded.contains(&dir) && manifest.is_file() && manifest != root_manifest {
                    members.insert(manifest);
                }
            }
        }

        let mut manifests = vec![root_manifest];
        manifests.extend(members);
        Ok(manifests)
    }

    /// Apply `version` to one manifest, returning whether anything changed
    fn update_manifest(doc: &mut DocumentMut, version: &str) -> bool {
        let mut modified = false;

        // `version.workspace = true` is a table, so inherited versions are left alone
        if let Some(package) = doc.get_mut("package").and_then(Item::as_table_like_mut) {
            modified |= Self::set_version(package, version);
        }

        if let Some(workspace_package) = doc
            .get_mut("workspace")
            .and_then(|w| w.get_mut("package"))
            .and_then(Item::as_table_like_mut)
        {
            modified |= Self::set_version(workspace_package, version);
        }

        let mut dependency_tables: Vec<&mut Item> = Vec::new();
        for (key, item) in doc.iter_mut() {
            if DEPENDENCY_TABLES.contains(&key.get()) {
                dependency_tables.push(item);
            } else if key.get() == "workspace"
                && let Some(deps) = item.get_mut("dependencies")
            {
                dependency_tables.push(deps);
            }
        }

        for table in dependency_tables {
            if let Some(table) = table.as_table_like_mut() {
                for (_, dependency) in table.iter_mut() {
                    if let Some(dependency) = dependency.as_table_like_mut()
                        && dependency.contains_key("path")
                    {
                        modified |= Self::set_version(dependency, version);
                    }
                }
            }
        }

        modified
    }

    /// Replace a plain `version` string, returning whether its value changed
    fn set_version(table: &mut dyn TableLike, version: &str) -> bool {
        match table.get("version").and_then(Item::as_str) {
            Some(current) if current != version => {
                table.insert("version", toml_edit::value(version));
                true
            }
            _ => false,
        }
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl BuildTypeAction for CargoBuildType {
    fn update_version(&self, version: &str) -> Result<Vec<String>> {
        semver::Version::parse(version).map_err(|e| VersionError::ParseFailed {
            version: version.to_string(),
            source: e,
        })?;

        let mut changed = Vec::new();
        for manifest in self.manifests()? {
            let mut doc = Self::read_manifest(&manifest)?;
            if !Self::update_manifest(&mut doc, version) {
                continue;
            }
            std::fs::write(&manifest, doc.to_string()).map_err(|e| {
                VersionError::TomlUpdateFailed {
                    path: manifest.clone(),
                    reason: format!("Failed to write file: {}", e),
                }
            })?;
            changed.push(self.relative_path(&manifest));
        }

        log::debug!("Set version {} in {:?}", version, changed);
        Ok(changed)
    }

    fn current_version(&self) -> Result<Option<String>> {
        let doc = Self::read_manifest(&self.root_manifest())?;
        let package_version = doc
            .get("package")
            .and_then(|p| p.get("version"))
            .and_then(Item::as_str);
        let workspace_version = doc
            .get("workspace")
            .and_then(|w| w.get("package"))
            .and_then(|p| p.get("version"))
            .and_then(Item::as_str);
        Ok(package_version.or(workspace_version).map(str::to_string))
    }

    fn prevent_archive_publication(&self, env_vars: &mut EnvVarMap) {
        env_vars.insert(CARGO_PUBLISH_SKIP.to_string(), "true".to_string());
        env_vars.insert(GITFLOW_SKIP_ARCHIVE.to_string(), "true".to_string());
    }
}
