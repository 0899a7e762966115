//! Devman review API client

use std::time::Duration;

use async_trait::async_trait;
use devwatch_core::{Cursor, PollResponse, Result, ReviewSource, Settings};
use reqwest::header::AUTHORIZATION;
use tracing::{debug, info};
use url::Url;

use crate::error::{check_status, from_reqwest};
use crate::USER_AGENT;

/// Client for the Devman long-polling and user reviews endpoints
pub struct DevmanClient {
    http: reqwest::Client,
    endpoint_url: Url,
    reviews_url: Url,
    token: String,
}

impl DevmanClient {
    /// Create a client authenticating with `token`
    ///
    /// No client-wide timeout is set; each poll passes its own bound.
    pub fn new(token: impl Into<String>, endpoint_url: Url, reviews_url: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(from_reqwest)?;

        info!(endpoint = %endpoint_url, "Created Devman client");

        Ok(Self {
            http,
            endpoint_url,
            reviews_url,
            token: token.into(),
        })
    }

    /// Create a client from resolved settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.api_token.clone(),
            settings.endpoint_url.clone(),
            settings.reviews_url.clone(),
        )
    }

    /// Long-polling endpoint in use
    pub fn endpoint_url(&self) -> &Url {
        &self.endpoint_url
    }

    fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Fetch every review of the authenticated user as raw JSON
    pub async fn fetch_user_reviews(&self) -> Result<serde_json::Value> {
        debug!(url = %self.reviews_url, "Fetching user reviews");

        let response = self
            .http
            .get(self.reviews_url.clone())
            .header(AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(from_reqwest)?;

        let body = check_status(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ReviewSource for DevmanClient {
    async fn poll(&self, cursor: Cursor, timeout: Option<Duration>) -> Result<PollResponse> {
        let mut request = self
            .http
            .get(self.endpoint_url.clone())
            .header(AUTHORIZATION, self.authorization())
            .query(&[("timestamp", cursor.to_string())]);

        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(from_reqwest)?;
        let body = check_status(response).await?;

        PollResponse::from_json(&body)
    }
}

impl std::fmt::Debug for DevmanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevmanClient")
            .field("endpoint_url", &self.endpoint_url.as_str())
            .field("reviews_url", &self.reviews_url.as_str())
            .finish_non_exhaustive()
    }
}
