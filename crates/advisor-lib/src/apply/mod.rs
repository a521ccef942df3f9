//! Best-effort manifest applier
//!
//! Takes the actions a decision pass chose to apply and edits the
//! matching Kubernetes manifests in place. Every action gets an explicit
//! outcome; nothing here feeds back into the plan.

mod discovery;
mod patch;

pub use discovery::{find_manifests, is_workload_manifest};
pub use patch::{patch_manifest, request_key, scale_quantity, Patch};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::{DecisionSummary, FixAction, FixPlan, Provider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStatus {
    Modified,
    Unchanged,
    Failed,
}

impl fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApplyStatus::Modified => "modified",
            ApplyStatus::Unchanged => "unchanged",
            ApplyStatus::Failed => "failed",
        })
    }
}

/// What happened to one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub action_id: String,
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub status: ApplyStatus,
    pub detail: String,
}

impl ApplyOutcome {
    fn failed(action_id: &str, resource: &str, file: Option<PathBuf>, detail: String) -> Self {
        Self {
            action_id: action_id.to_string(),
            resource: resource.to_string(),
            file,
            status: ApplyStatus::Failed,
            detail,
        }
    }
}

/// Applies fix actions to the workload manifests found under a root
#[derive(Debug, Clone)]
pub struct ManifestApplier {
    root: PathBuf,
    manifests: Vec<PathBuf>,
}

impl ManifestApplier {
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let manifests = find_manifests(&root);
        debug!(root = %root.display(), manifests = manifests.len(), "Discovered manifests");
        Self { root, manifests }
    }

    pub fn manifests(&self) -> &[PathBuf] {
        &self.manifests
    }

    /// Apply the "apply" verdicts of `decisions`, in ranked order
    pub fn apply_decisions(&self, plan: &FixPlan, decisions: &DecisionSummary) -> Vec<ApplyOutcome> {
        decisions
            .to_apply()
            .map(|decision| {
                let action = decision
                    .action_id
                    .strip_prefix("action-")
                    .and_then(|n| n.parse::<usize>().ok())
                    .and_then(|n| plan.actions.get(n));
                match action {
                    Some(action) => self.apply(&decision.action_id, action),
                    None => ApplyOutcome::failed(
                        &decision.action_id,
                        &decision.resource,
                        None,
                        "decision does not reference an action of this plan".to_string(),
                    ),
                }
            })
            .collect()
    }

    pub fn apply(&self, action_id: &str, action: &FixAction) -> ApplyOutcome {
        if action.provider != Provider::Kubernetes {
            return ApplyOutcome::failed(
                action_id,
                &action.resource,
                None,
                format!("no manifest editor for provider {}", action.provider),
            );
        }

        let Some(file) = self.target_file(action) else {
            return ApplyOutcome::failed(
                action_id,
                &action.resource,
                None,
                format!("no manifest mentions '{}'", action.resource),
            );
        };

        let content = match std::fs::read_to_string(&file) {
            Ok(content) => content,
            Err(e) => {
                return ApplyOutcome::failed(
                    action_id,
                    &action.resource,
                    Some(file),
                    format!("read failed: {}", e),
                )
            }
        };

        let (status, detail) = match patch_manifest(&content, &action.resource, &action.action) {
            Ok(Patch::Modified(text)) => match std::fs::write(&file, text) {
                Ok(()) => (
                    ApplyStatus::Modified,
                    format!("{} {} {}", action.action.field, action.action.operation.as_str(), action.action.value),
                ),
                Err(e) => (ApplyStatus::Failed, format!("write failed: {}", e)),
            },
            Ok(Patch::Unchanged) => (
                ApplyStatus::Unchanged,
                format!("{} already at the requested value", action.action.field),
            ),
            Err(reason) => (ApplyStatus::Failed, reason),
        };

        ApplyOutcome {
            action_id: action_id.to_string(),
            resource: action.resource.clone(),
            file: Some(file),
            status,
            detail,
        }
    }

    /// First discovered manifest naming the resource, else the action's own hint
    fn target_file(&self, action: &FixAction) -> Option<PathBuf> {
        self.manifests
            .iter()
            .find(|path| {
                std::fs::read_to_string(path)
                    .map(|c| c.contains(action.resource.as_str()))
                    .unwrap_or(false)
            })
            .cloned()
            .or_else(|| action.files_to_edit.first().map(|f| self.resolve(f)))
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
