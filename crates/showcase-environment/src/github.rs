// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! GitHub repository read-through.
//!
//! Stateless pass-through to the GitHub REST API used by the projects page.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// GitHub client configuration.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Account whose repositories are listed
    pub username: String,
    /// Optional personal access token (raises the rate limit)
    pub token: Option<String>,
    /// API base URL
    pub api_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            username: "amirjimdaniels".to_string(),
            token: None,
            api_url: "https://api.github.com".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Repository summary as returned by the GitHub API.
///
/// Field names follow the API schema.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub clone_url: String,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub watchers_count: u64,
    pub open_issues_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub default_branch: String,
}

/// Aggregate numbers across a user's repositories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubStats {
    /// Sum of stargazers.
    pub total_stars: u64,
    /// Sum of forks.
    pub total_forks: u64,
    /// Number of repositories.
    pub total_repos: usize,
    /// Number of repositories per primary language.
    pub languages: BTreeMap<String, u64>,
    /// When the stats were computed.
    pub last_updated: DateTime<Utc>,
}

impl GitHubStats {
    /// Aggregate stats over `repos`.
    pub fn from_repos(repos: &[GitHubRepo]) -> Self {
        let mut languages = BTreeMap::new();
        for language in repos.iter().filter_map(|r| r.language.as_ref()) {
            *languages.entry(language.clone()).or_insert(0) += 1;
        }

        Self {
            total_stars: repos.iter().map(|r| r.stargazers_count).sum(),
            total_forks: repos.iter().map(|r| r.forks_count).sum(),
            total_repos: repos.len(),
            languages,
            last_updated: Utc::now(),
        }
    }
}

/// Thin client over the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubClient {
    /// Create a new client.
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::Other("GITHUB_TOKEN contains invalid characters".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// Repositories owned by the configured user, most recently updated first.
    pub async fn list_own_repos(&self) -> Result<Vec<GitHubRepo>> {
        self.list_repos(&self.config.username).await
    }

    /// Repositories owned by `username`, most recently updated first.
    #[instrument(skip(self))]
    pub async fn list_repos(&self, username: &str) -> Result<Vec<GitHubRepo>> {
        let url = format!("{}/users/{}/repos", self.base_url(), username);
        let mut repos: Vec<GitHubRepo> = self
            .http
            .get(&url)
            .header(USER_AGENT, user_agent())
            .query(&[("sort", "updated"), ("per_page", "100"), ("type", "owner")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        repos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        debug!(count = repos.len(), "Fetched repositories");
        Ok(repos)
    }

    /// A single repository, or `None` if GitHub answers 404.
    #[instrument(skip(self))]
    pub async fn get_repo(&self, owner: &str, repo: &str) -> Result<Option<GitHubRepo>> {
        let url = format!("{}/repos/{}/{}", self.base_url(), owner, repo);
        let response = self
            .http
            .get(&url)
            .header(USER_AGENT, user_agent())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let repo = response.error_for_status()?.json().await?;
        Ok(Some(repo))
    }

    /// Aggregate stats for `username`.
    pub async fn stats(&self, username: &str) -> Result<GitHubStats> {
        let repos = self.list_repos(username).await?;
        Ok(GitHubStats::from_repos(&repos))
    }

    fn base_url(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }
}

fn user_agent() -> &'static str {
    concat!("showcase-environment/", env!("CARGO_PKG_VERSION"))
}
