//! HTTP backend abstraction for the GitHub API.
//!
//! This module provides a trait-based HTTP backend that allows for
//! dependency injection and easy testing. Requests are never retried.

use crate::error::{GithubError, GithubResult};
use crate::models::{GhErrorBody, GithubConfig};
use async_trait::async_trait;
use modpkg_core::is_rate_limit_message;
use serde::de::DeserializeOwned;
use url::Url;

/// Longest response body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends that can fetch JSON from URLs.
///
/// This is an implementation detail - external code should use the
/// `RemoteVersionSource` trait.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Fetch JSON from a URL and deserialize it.
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> GithubResult<T>;

    /// Fetch one page of a list endpoint, returning the `rel="next"` link.
    async fn get_json_paginated<T: DeserializeOwned + Send>(
        &self,
        url: &Url,
    ) -> GithubResult<(T, Option<Url>)>;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest.
pub struct ReqwestBackend {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl ReqwestBackend {
    /// Create a new reqwest backend with the given configuration.
    pub fn new(config: &GithubConfig) -> GithubResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            auth_token: config.token.clone(),
        })
    }

    /// Build a request, attaching the token only when one is configured.
    fn build_request(&self, url: &Url) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url.as_str())
            .header("Accept", "application/vnd.github+json");
        if let Some(ref token) = self.auth_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request
    }

    async fn fetch(&self, url: &Url) -> GithubResult<reqwest::Response> {
        tracing::debug!(target: "modpkg.github", url = %url, "GET");
        let response = self.build_request(url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let quota_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|h| h.to_str().ok())
            .is_some_and(|remaining| remaining.trim() == "0");
        let body = response.text().await.unwrap_or_default();

        Err(classify_failure(status.as_u16(), quota_exhausted, url, &body))
    }
}

/// Map a non-2xx response to an error, detecting rate limiting.
fn classify_failure(status: u16, quota_exhausted: bool, url: &Url, body: &str) -> GithubError {
    let message = serde_json::from_str::<GhErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| truncate(body));

    if status == 429 || (status == 403 && quota_exhausted) || is_rate_limit_message(body) {
        tracing::warn!(target: "modpkg.github", status, url = %url, "Rate limit exceeded");
        return GithubError::RateLimited { message };
    }

    GithubError::ApiRequestFailed {
        status,
        url: url.to_string(),
        body: message,
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

/// Extract the `rel="next"` target from a `Link` header.
fn parse_next_link(header: &str) -> Option<Url> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.split(';').any(|p| p.trim() == "rel=\"next\"") {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> GithubResult<T> {
        let response = self.fetch(url).await?;
        let data: T = response.json().await?;
        Ok(data)
    }

    async fn get_json_paginated<T: DeserializeOwned + Send>(
        &self,
        url: &Url,
    ) -> GithubResult<(T, Option<Url>)> {
        let response = self.fetch(url).await?;

        let next = response
            .headers()
            .get("Link")
            .and_then(|h| h.to_str().ok())
            .and_then(parse_next_link);

        let data: T = response.json().await?;
        Ok((data, next))
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Canned response for the fake backend.
    #[derive(Clone)]
    pub enum CannedResponse {
        Ok {
            json: serde_json::Value,
            next: Option<String>,
        },
        Failure {
            status: u16,
            rate_limit_exhausted: bool,
            body: String,
        },
    }

    impl CannedResponse {
        pub const fn ok(json: serde_json::Value) -> Self {
            Self::Ok { json, next: None }
        }

        pub fn page(json: serde_json::Value, next: &str) -> Self {
            Self::Ok {
                json,
                next: Some(next.to_string()),
            }
        }

        pub fn failure(status: u16, body: &str) -> Self {
            Self::Failure {
                status,
                rate_limit_exhausted: false,
                body: body.to_string(),
            }
        }

        pub fn quota_exhausted() -> Self {
            Self::Failure {
                status: 403,
                rate_limit_exhausted: true,
                body: r#"{"message":"API rate limit exceeded for 127.0.0.1."}"#.to_string(),
            }
        }
    }

    /// A fake HTTP backend that returns canned responses and records the
    /// URLs it was asked for.
    #[derive(Default)]
    pub struct FakeBackend {
        responses: Vec<(String, CannedResponse)>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a canned response for URLs containing `url_contains`.
        ///
        /// Patterns are matched in insertion order.
        pub fn with_response(mut self, url_contains: &str, response: CannedResponse) -> Self {
            self.responses.push((url_contains.to_string(), response));
            self
        }

        /// Handle on the list of requested URLs.
        pub fn requests(&self) -> Arc<Mutex<Vec<String>>> {
            Arc::clone(&self.requests)
        }

        fn respond(&self, url: &Url) -> GithubResult<(serde_json::Value, Option<Url>)> {
            self.requests.lock().unwrap().push(url.to_string());
            let canned = self
                .responses
                .iter()
                .find(|(pattern, _)| url.as_str().contains(pattern.as_str()))
                .map(|(_, response)| response.clone())
                .unwrap_or_else(|| CannedResponse::failure(404, r#"{"message":"Not Found"}"#));

            match canned {
                CannedResponse::Ok { json, next } => {
                    let next = next.map(|n| Url::parse(&n)).transpose()?;
                    Ok((json, next))
                }
                CannedResponse::Failure {
                    status,
                    rate_limit_exhausted,
                    body,
                } => Err(classify_failure(status, rate_limit_exhausted, url, &body)),
            }
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> GithubResult<T> {
            let (json, _) = self.respond(url)?;
            serde_json::from_value(json).map_err(Into::into)
        }

        async fn get_json_paginated<T: DeserializeOwned + Send>(
            &self,
            url: &Url,
        ) -> GithubResult<(T, Option<Url>)> {
            let (json, next) = self.respond(url)?;
            let data: T = serde_json::from_value(json)?;
            Ok((data, next))
        }
    }
}
