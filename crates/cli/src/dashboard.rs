//! Dashboard client for publishing scan results and decisions

use advisor_lib::{DecisionSummary, ScanReport};
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable holding the dashboard bearer token
pub const API_KEY_ENV: &str = "RSZ_DASHBOARD_API_KEY";

/// Repository the results belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub owner: String,
    pub name: String,
}

impl RepoInfo {
    pub fn unknown() -> Self {
        Self {
            owner: "unknown".to_string(),
            name: "unknown".to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Parse `git@github.com:owner/repo.git` or `https://github.com/owner/repo(.git)`
    pub fn from_remote(remote: &str) -> Option<Self> {
        let remote = remote.trim();
        let path = if let Some(rest) = remote.strip_prefix("git@github.com:") {
            rest.to_string()
        } else {
            let url = Url::parse(remote).ok()?;
            if url.host_str() != Some("github.com") {
                return None;
            }
            url.path().trim_start_matches('/').to_string()
        };

        let mut parts = path.trim_end_matches('/').splitn(2, '/');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let name = parts.next()?.trim_end_matches(".git");
        if name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Repository of the working directory's `origin` remote
    pub fn detect() -> Self {
        std::process::Command::new("git")
            .args(["remote", "get-url", "origin"])
            .output()
            .ok()
            .filter(|out| out.status.success())
            .and_then(|out| Self::from_remote(&String::from_utf8_lossy(&out.stdout)))
            .unwrap_or_else(Self::unknown)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardUpdate {
    pub repo_owner: String,
    pub repo_name: String,
    pub repo_full_name: String,
    pub scan_data: ScanReport,
    pub decision_data: DecisionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
    pub timestamp: String,
}

impl DashboardUpdate {
    pub fn new(repo: &RepoInfo, scan_data: ScanReport, decision_data: DecisionSummary) -> Self {
        Self {
            repo_owner: repo.owner.clone(),
            repo_name: repo.name.clone(),
            repo_full_name: repo.full_name(),
            scan_data,
            decision_data,
            pr_url: None,
            pr_number: None,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    }
}

/// Client for the dashboard submit endpoint
pub struct DashboardClient {
    client: Client,
    submit_url: Url,
    api_key: Option<String>,
}

impl DashboardClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        let submit_url = Url::parse(&format!("{}/api/submit", base_url.trim_end_matches('/')))
            .context("Invalid dashboard URL")?;

        Ok(Self {
            client,
            submit_url,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Client configured from the environment's API key
    pub fn from_env(base_url: &str) -> Result<Self> {
        Self::new(base_url, std::env::var(API_KEY_ENV).ok())
    }

    pub fn submit_url(&self) -> &Url {
        &self.submit_url
    }

    /// POST the update; only 200 and 201 count as success
    pub async fn send(&self, update: &DashboardUpdate) -> Result<()> {
        let mut request = self.client.post(self.submit_url.clone()).json(update);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("Failed to send dashboard update")?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Dashboard returned {}: {}", status, body);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_lib::{rank_decisions, run_scan, DecisionPolicy, EngineConfig, FixPlan};

    fn update() -> DashboardUpdate {
        let report = run_scan(&Default::default(), &EngineConfig::default());
        let plan = FixPlan {
            total_current_cost_usd: 0.0,
            total_optimal_cost_usd: 0.0,
            total_savings_usd: 0.0,
            budget_target_usd: 0.0,
            meets_budget: false,
            requires_approval: true,
            actions: Vec::new(),
            summary: String::new(),
        };
        let decisions = rank_decisions(&plan, &DecisionPolicy::default());
        DashboardUpdate::new(&RepoInfo::from_remote("git@github.com:acme/shop.git").unwrap(), report, decisions)
    }

    #[test]
    fn test_parse_remotes() {
        let ssh = RepoInfo::from_remote("git@github.com:acme/shop.git\n").unwrap();
        assert_eq!(ssh.full_name(), "acme/shop");

        let https = RepoInfo::from_remote("https://github.com/acme/shop").unwrap();
        assert_eq!(https, ssh);

        let https_git = RepoInfo::from_remote("https://github.com/acme/shop.git").unwrap();
        assert_eq!(https_git, ssh);

        assert!(RepoInfo::from_remote("https://gitlab.com/acme/shop.git").is_none());
        assert!(RepoInfo::from_remote("not a remote").is_none());
    }

    #[test]
    fn test_payload_shape() {
        let value = serde_json::to_value(update()).unwrap();
        assert_eq!(value["repo_full_name"], "acme/shop");
        assert!(value["scan_data"]["summary"].is_object());
        assert!(value["decision_data"]["decisions"].is_array());
        assert!(value.get("pr_url").is_none());
    }

    #[tokio::test]
    async fn test_send_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/submit")
            .match_header("authorization", "Bearer secret")
            .with_status(201)
            .create_async()
            .await;

        let client = DashboardClient::new(&format!("{}/", server.url()), Some("secret".into())).unwrap();
        client.send(&update()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_reports_failure_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/submit")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = DashboardClient::new(&server.url(), None).unwrap();
        let err = client.send(&update()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
