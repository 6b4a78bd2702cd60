pub mod check_config;
pub mod simulate;
pub mod timeline;
pub mod visemes;

use std::path::Path;
use std::sync::Arc;

use mimic_rig_model::VisemeSet;

/// The custom viseme set at `path`, or the built-in one.
pub fn load_visemes(path: Option<&Path>) -> anyhow::Result<Arc<VisemeSet>> {
    match path {
        Some(path) => VisemeSet::from_file(path)
            .map(Arc::new)
            .map_err(|e| anyhow::anyhow!("Failed to load viseme set {}: {e}", path.display())),
        None => Ok(VisemeSet::shared_builtin()),
    }
}
