//! Kubernetes manifest discovery

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

static RE_WORKLOAD_KIND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*kind:\s*["']?(Deployment|StatefulSet|DaemonSet|Pod)["']?\s*(?:#.*)?$"#)
        .expect("valid regex")
});

/// True when the text declares a workload kind that carries container requests
pub fn is_workload_manifest(content: &str) -> bool {
    content.contains("apiVersion:") && RE_WORKLOAD_KIND.is_match(content)
}

/// Every `*.yaml` / `*.yml` workload manifest under `root`, in path order
pub fn find_manifests(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for entry in walkdir::WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path.extension().and_then(|e| e.to_str());
        if !matches!(ext, Some("yaml") | Some("yml")) {
            continue;
        }
        match std::fs::read_to_string(path) {
            Ok(content) if is_workload_manifest(&content) => found.push(path.to_path_buf()),
            Ok(_) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable file"),
        }
    }

    found
}
