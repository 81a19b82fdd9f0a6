use std::path::{Path, PathBuf};

use crate::config::RunConfig;

/// Every spec document under `root`, recursively, sorted by path. A file
/// given directly as `root` is returned as is.
pub fn discover(root: &Path, config: &RunConfig) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut found = Vec::new();
    collect_specs(root, config, &mut found);
    found.sort();
    found
}

fn collect_specs(dir: &Path, config: &RunConfig, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(path = %dir.display(), %error, "cannot read spec folder");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_specs(&path, config, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if config.matches_extension(name) {
                out.push(path);
            }
        }
    }
}
