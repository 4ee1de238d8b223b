//! # Forge API Client
//!
//! Read-only client for pull-request metadata on the source forge
//! (GitHub's REST API). Used to warn when a tracked pull request targets a
//! different base branch than the project's series, and to group pending
//! merges by lifecycle state (open / closed / merged).
//!
//! Authentication is optional: when `GITHUB_TOKEN` is set it is sent as a
//! bearer token, which lifts the anonymous rate limit.

use std::env;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("odoo-toolbox/", env!("CARGO_PKG_VERSION"));

/// A pull request identified from a forge URL:
/// `https://github.com/<upstream>/<repo>/pull/<number>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub upstream: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    /// Parse a pull-request URL.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        match segments.as_slice() {
            [upstream, repo, "pull", number, ..] => {
                let number = number
                    .parse()
                    .map_err(|_| Error::precondition(format!("{:?} is not a pull request number", number)))?;
                Ok(PullRequestRef {
                    upstream: upstream.to_string(),
                    repo: repo.to_string(),
                    number,
                })
            }
            _ => Err(Error::Precondition {
                message: format!("{} is not a pull request URL", raw),
                hint: Some("expected https://github.com/<org>/<repo>/pull/<number>".to_string()),
            }),
        }
    }

    /// The git ref the forge exposes for this pull request.
    pub fn merge_ref(&self) -> String {
        format!("refs/pull/{}/head", self.number)
    }
}

/// Subset of the forge's pull-request payload this tool reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestInfo {
    /// `"open"` or `"closed"`.
    pub state: String,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub title: String,
    pub base: BaseRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseRef {
    #[serde(rename = "ref")]
    pub r#ref: String,
}

impl PullRequestInfo {
    /// Lifecycle bucket used by `pending show` and `pending upgrade`.
    pub fn lifecycle(&self) -> Lifecycle {
        if self.state == "open" {
            Lifecycle::Open
        } else if self.merged {
            Lifecycle::Merged
        } else {
            Lifecycle::Closed
        }
    }
}

/// Pull-request lifecycle buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Open,
    Closed,
    Merged,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Open => write!(f, "open"),
            Lifecycle::Closed => write!(f, "closed (unmerged)"),
            Lifecycle::Merged => write!(f, "merged"),
        }
    }
}

/// Blocking GitHub REST client.
pub struct ForgeClient {
    api_base: String,
    token: Option<String>,
    http: reqwest::blocking::Client,
}

impl ForgeClient {
    /// Client against the public API, token taken from `GITHUB_TOKEN`.
    pub fn from_env() -> Self {
        Self::new(DEFAULT_API_BASE, env::var("GITHUB_TOKEN").ok())
    }

    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        ForgeClient {
            api_base: api_base.into(),
            token,
            http,
        }
    }

    /// Fetch the metadata for one pull request.
    pub fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestInfo> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_base, pr.upstream, pr.repo, pr.number
        );
        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .map_err(|e| Error::Network {
                url: url.clone(),
                message: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| Error::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;
        response.json().map_err(|e| Error::Network {
            url,
            message: format!("invalid pull request payload: {}", e),
        })
    }
}
