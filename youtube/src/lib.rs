use crate::credentials::TokenStorage;
use crate::oauth::{AuthFlowOptions, OAuthManager};
use crate::youtube_api::client::{TimeBoundAccessToken, YouTubeClient};
use eyre::Context;
use oauth2::url::Url;
use std::sync::Arc;

pub mod credentials;
pub mod oauth;
pub mod workflow;
pub mod youtube_api;

#[cfg(test)]
mod mock;

/// Produces a usable token for the user, reusing stored credentials when possible.
///
/// Stored credentials are refreshed straight away since their remaining lifetime is unknown.
/// If there are none, or the refresh is rejected, the user goes through the interactive
/// OAuth flow. Whatever token comes out is written back to `storage`.
pub async fn obtain_token(
    oauth_manager: &OAuthManager,
    storage: &TokenStorage,
    flow: &AuthFlowOptions,
) -> eyre::Result<TimeBoundAccessToken> {
    obtain_token_with(oauth_manager, storage, flow, |url| {
        oauth::present_auth_url(url, flow.open_browser)
    })
    .await
}

async fn obtain_token_with(
    oauth_manager: &OAuthManager,
    storage: &TokenStorage,
    flow: &AuthFlowOptions,
    present: impl FnOnce(&Url),
) -> eyre::Result<TimeBoundAccessToken> {
    if let Some(stored) = storage.load().await.context("load stored credentials")? {
        let mut token = TimeBoundAccessToken::expired(stored);
        if token
            .refresh(oauth_manager)
            .await
            .context("refresh stored credentials")?
        {
            tracing::debug!("reusing stored credentials");
            storage
                .save(token.raw_token())
                .await
                .context("store refreshed credentials")?;
            return Ok(token);
        }
        tracing::warn!("stored credentials are no longer valid, re-authorizing");
    }

    let raw_token = oauth_manager
        .authenticate(flow, present)
        .await
        .context("authorize user to YouTube")?;
    storage
        .save(&raw_token)
        .await
        .context("store new credentials")?;
    Ok(TimeBoundAccessToken::new(raw_token))
}

/// Writes the client's current token back to `storage`, so a refresh that happened while
/// making API calls survives into the next run.
pub async fn store_token(yt: &YouTubeClient, storage: &TokenStorage) -> eyre::Result<()> {
    storage
        .save(&yt.token().await)
        .await
        .context("store current credentials")
}

/// Complete client setup: OAuth manager, token acquisition, and the API client itself.
pub async fn setup_youtube_client(
    secrets: credentials::ClientSecrets,
    storage: &TokenStorage,
    flow: &AuthFlowOptions,
) -> eyre::Result<YouTubeClient> {
    let oauth_manager = OAuthManager::new(secrets)?;
    let token = obtain_token(&oauth_manager, storage, flow).await?;
    Ok(YouTubeClient::new(token, Arc::new(oauth_manager)))
}
