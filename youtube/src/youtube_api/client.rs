//! Core YouTube API client functionality and authentication management.

use crate::oauth::OAuthManager;
use crate::youtube_api::{
    broadcasts::{LiveBroadcast, LiveBroadcastInsertRequest},
    error::ApiError,
    streams::{LiveStream, LiveStreamInsertRequest},
};
use eyre::Context;
use http::Method;
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::instrument;

/// Where the YouTube Data API v3 lives.
pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct TimeBoundAccessToken {
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer)
    expires_at: SystemTime,
}

impl TimeBoundAccessToken {
    /// Wraps a token that is already expired, forcing a refresh before first use.
    ///
    /// Tokens loaded from storage carry no issue time, so their remaining lifetime is unknown.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: SystemTime::UNIX_EPOCH,
            token,
        }
    }

    /// Wraps a freshly issued token.
    ///
    /// The expiry time is calculated from the token's `expires_in` field minus
    /// a 5-minute safety buffer.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Self::calculate_token_expiry(&token),
            token,
        }
    }

    pub fn raw_token(&self) -> &BasicTokenResponse {
        &self.token
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }

    /// Refreshes this token using the provided OAuth manager, preserving the refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token was successfully refreshed
    /// * `Ok(false)` - Refresh failed (invalid grant, no refresh token, etc.)
    /// * `Err(_)` - Network or other error occurred
    pub async fn refresh(&mut self, oauth_manager: &OAuthManager) -> eyre::Result<bool> {
        tracing::trace!("refreshing token");
        match oauth_manager
            .refresh_token(&self.token)
            .await
            .context("refresh OAuth token")?
        {
            Some(new_token) => {
                let old_token = std::mem::replace(&mut self.token, new_token);

                // Google usually omits the refresh token from refresh responses
                if self.token.refresh_token().is_none() {
                    tracing::trace!("new token lacks refresh token, preserving original");
                    self.token
                        .set_refresh_token(old_token.refresh_token().cloned());
                } else {
                    tracing::debug!("new token includes refresh token");
                }

                self.expires_at = Self::calculate_token_expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Uses the current time + expires_in - 5 minute safety buffer.
    /// If no expires_in is provided, assumes a conservative 55-minute lifetime.
    fn calculate_token_expiry(token: &BasicTokenResponse) -> SystemTime {
        let now = SystemTime::now();
        match token.expires_in() {
            Some(expires_in) => (now + expires_in)
                .checked_sub(Duration::from_secs(300))
                .unwrap_or(now),
            None => now + Duration::from_secs(3300),
        }
    }
}

/// Client for the parts of the YouTube Data API v3 needed to schedule a live event.
///
/// The client refreshes its access token before a call whenever it has expired, using
/// the refresh token and the shared [`OAuthManager`].
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    token: Arc<Mutex<TimeBoundAccessToken>>,
    oauth_manager: Arc<OAuthManager>,
    client: reqwest::Client,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(token: TimeBoundAccessToken, oauth_manager: Arc<OAuthManager>) -> Self {
        Self::with_base_url(token, oauth_manager, YOUTUBE_API_BASE_URL)
    }

    /// Creates a client that talks to a YouTube-compatible API at `base_url` instead.
    pub fn with_base_url(
        token: TimeBoundAccessToken,
        oauth_manager: Arc<OAuthManager>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            oauth_manager,
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns a clone of the current OAuth2 token, e.g. for writing it back to storage.
    pub async fn token(&self) -> BasicTokenResponse {
        self.token.lock().await.token.clone()
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn fresh_access_token(&self) -> eyre::Result<String> {
        let mut token = self.token.lock().await;

        if token.is_expired() {
            tracing::debug!("access token expired, attempting refresh");

            if token.refresh(&self.oauth_manager).await? {
                tracing::debug!("access token successfully refreshed");
            } else {
                tracing::error!("access token refresh failed, client is unusable");
                eyre::bail!("unable to refresh expired access token");
            }
        }

        Ok(token.token.access_token().secret().to_string())
    }

    /// Makes an authenticated HTTP request to the YouTube API.
    ///
    /// Takes care of token freshness, the authorization header, query parameters, the
    /// optional JSON body, and turning non-success statuses into [`ApiError`].
    #[instrument(skip(self, json_body), level = tracing::Level::TRACE)]
    async fn make_authenticated_request(
        &self,
        method: Method,
        path: &str,
        query_params: &[(&str, &str)],
        json_body: Option<&impl Serialize>,
    ) -> eyre::Result<reqwest::Response> {
        let access_token = self.fresh_access_token().await?;
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .query(query_params);

        request = match json_body {
            Some(body) => request.json(body),
            // Google rejects bodiless POSTs that lack a Content-Length
            None => request.header(http::header::CONTENT_LENGTH, "0"),
        };

        let response = request
            .send()
            .await
            .with_context(|| format!("send {} request to YouTube API: {}", method, url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ApiError {
                method,
                url,
                status,
                body,
            }
            .into());
        }

        Ok(response)
    }

    /// Creates a broadcast with the given title, schedule, and privacy status.
    ///
    /// The broadcast starts out unbound; see [`Self::bind_live_broadcast`].
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/insert>
    #[instrument(skip(self), ret)]
    pub async fn insert_live_broadcast(
        &self,
        request: &LiveBroadcastInsertRequest,
    ) -> eyre::Result<LiveBroadcast> {
        let response = self
            .make_authenticated_request(
                Method::POST,
                "/liveBroadcasts",
                &[("part", "snippet,status")],
                Some(request),
            )
            .await?;

        let broadcast: LiveBroadcast = response
            .json()
            .await
            .context("parse YouTube liveBroadcasts.insert response as JSON")?;

        tracing::debug!(broadcast_id = broadcast.id, "inserted broadcast");

        Ok(broadcast)
    }

    /// Creates a stream with the given title, video format, and ingestion protocol.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveStreams/insert>
    #[instrument(skip(self), ret)]
    pub async fn insert_live_stream(
        &self,
        request: &LiveStreamInsertRequest,
    ) -> eyre::Result<LiveStream> {
        let response = self
            .make_authenticated_request(
                Method::POST,
                "/liveStreams",
                &[("part", "snippet,cdn")],
                Some(request),
            )
            .await?;

        let stream: LiveStream = response
            .json()
            .await
            .context("parse YouTube liveStreams.insert response as JSON")?;

        tracing::debug!(stream_id = stream.id, "inserted stream");

        Ok(stream)
    }

    /// Binds a broadcast to a stream, so that video sent to the stream shows up in the broadcast.
    ///
    /// The returned broadcast only carries its `id` and `contentDetails`.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/bind>
    #[instrument(skip(self), ret)]
    pub async fn bind_live_broadcast(
        &self,
        broadcast_id: &str,
        stream_id: &str,
    ) -> eyre::Result<LiveBroadcast> {
        let query_params = [
            ("part", "id,contentDetails"),
            ("id", broadcast_id),
            ("streamId", stream_id),
        ];

        let response = self
            .make_authenticated_request(
                Method::POST,
                "/liveBroadcasts/bind",
                &query_params,
                None::<&()>,
            )
            .await?;

        let broadcast: LiveBroadcast = response
            .json()
            .await
            .context("parse YouTube liveBroadcasts.bind response as JSON")?;

        tracing::debug!(broadcast_id, stream_id, "bound broadcast to stream");

        Ok(broadcast)
    }
}
