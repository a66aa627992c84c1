//! OAuth 2.0 management for YouTube API authentication.
//!
//! This module encapsulates the OAuth operations needed to act on the user's behalf:
//! the interactive authorization-code flow (with PKCE and a loopback redirect server),
//! and refreshing an existing token.

use crate::credentials::ClientSecrets;
use bytes::Bytes;
use eyre::Context;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::url::Url;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    Scope, TokenResponse, TokenUrl,
};
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

/// Read/write access to the user's YouTube account.
const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube";

const OAUTH_DONE_HTML: &str = "The authentication flow has completed. You may close this window.";
const OAUTH_FAILED_HTML: &str = "The authentication flow has failed. Check the terminal for details.";

/// How the interactive authorization flow reaches the user.
#[derive(Debug, Clone)]
pub struct AuthFlowOptions {
    /// Host name the loopback redirect server binds to and that Google redirects to.
    pub host: String,
    /// Port for the loopback redirect server; 0 picks any free port.
    pub port: u16,
    /// Whether to open the authorization URL in the system browser.
    pub open_browser: bool,
}

impl Default for AuthFlowOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            open_browser: true,
        }
    }
}

/// Manages OAuth 2.0 authentication flows for YouTube API access.
///
/// Holds the client credentials and the HTTP client used for token requests, so that
/// initial authorization and refresh share the same configuration.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    secrets: ClientSecrets,
    http_client: reqwest::Client,
}

impl OAuthManager {
    /// Creates a new OAuth manager for the given client credentials.
    pub fn new(secrets: ClientSecrets) -> eyre::Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")?;
        Ok(Self {
            secrets,
            http_client,
        })
    }

    fn token_url(&self) -> eyre::Result<TokenUrl> {
        TokenUrl::new(self.secrets.token_uri.clone()).context("parse token endpoint URL")
    }

    /// Performs a complete OAuth 2.0 authorization flow to obtain a new access token.
    ///
    /// This method:
    /// 1. starts a loopback HTTP server to receive the authorization callback,
    /// 2. sends the user to Google's consent page,
    /// 3. exchanges the returned authorization code for an access token.
    ///
    /// The consent page URL is handed to `present`, normally [`present_auth_url`].
    pub async fn authenticate(
        &self,
        options: &AuthFlowOptions,
        present: impl FnOnce(&Url),
    ) -> eyre::Result<BasicTokenResponse> {
        let csrf = CsrfToken::new_random();
        let (redirect_url, eventually_authorization_code) = self
            .setup_redirect(options, csrf.clone())
            .await
            .context("set up redirect endpoint")?;

        let auth_url = AuthUrl::new(self.secrets.auth_uri.clone())
            .context("parse authorization endpoint URL")?;
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(self.token_url()?)
            .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || csrf.clone())
            .add_scope(Scope::new(YOUTUBE_SCOPE.to_string()))
            // without this Google does not hand out a refresh token
            .add_extra_param("access_type", "offline")
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        present(&auth_url);

        let authorization_code = eventually_authorization_code
            .await
            .context("await user authorization code")?;

        let token_result = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http_client)
            .await
            .context("exchange authorization code with access token")?;

        eprintln!("Authentication successful.");
        Ok(token_result)
    }

    /// Attempts to refresh an existing OAuth token using its refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(new_token))` - Refresh succeeded, new token is available
    /// * `Ok(None)` - The token has no refresh token, or Google rejected it as an invalid grant
    /// * `Err(_)` - Network or other error occurred during refresh attempt
    ///
    /// When this returns `Ok(None)` the user has to go through [`Self::authenticate`] again.
    pub async fn refresh_token(
        &self,
        token: &BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        };

        tracing::debug!("attempting to refresh OAuth token");

        // no redirect URL needed for refresh
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_token_uri(self.token_url()?);

        match client
            .exchange_refresh_token(refresh_token)
            .request_async(&self.http_client)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(new_token))
            }
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref sr))
                if matches!(
                    sr.error(),
                    oauth2::basic::BasicErrorResponseType::InvalidGrant
                ) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }

    /// Sets up a local HTTP server to receive the OAuth authorization callback.
    ///
    /// Returns the redirect URL to use in the OAuth flow, and a future that resolves to the
    /// authorization code once the callback has been received and validated.
    async fn setup_redirect(
        &self,
        options: &AuthFlowOptions,
        csrf: CsrfToken,
    ) -> eyre::Result<(
        RedirectUrl,
        impl Future<Output = eyre::Result<AuthorizationCode>>,
    )> {
        let socket = tokio::net::TcpListener::bind((options.host.as_str(), options.port))
            .await
            .with_context(|| format!("bind to {}:{}", options.host, options.port))?;
        let addr = socket.local_addr().context("get local address")?;
        let url = RedirectUrl::new(format!("http://{}:{}", options.host, addr.port()))
            .context("construct redirect url")?;
        tracing::debug!(%addr, "listening for OAuth redirect");

        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let r = async move {
                let (conn, _) = socket.accept().await.context("accept")?;
                let conn = hyper_util::rt::TokioIo::new(conn);
                let (got, mut gotten) = tokio::sync::mpsc::channel(1);
                let service = service_fn(move |req: Request<body::Incoming>| {
                    let csrf = csrf.clone();
                    let got = got.clone();
                    async move {
                        let outcome = parse_callback(req.uri().query().unwrap_or(""), &csrf);
                        let page = if outcome.is_ok() {
                            OAUTH_DONE_HTML
                        } else {
                            OAUTH_FAILED_HTML
                        };
                        // only the first callback counts; later requests find the receiver gone
                        let _ = got.send(outcome).await;
                        Ok::<_, Infallible>(Response::new(Full::<Bytes>::from(page)))
                    }
                });
                let mut serve = std::pin::pin!(
                    hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
                );

                tokio::select! {
                    exit = serve.as_mut() => {
                        if let Err(e) = exit {
                            Err(e).context("redirect server got bad request")
                        } else {
                            eyre::bail!("redirect server exit prematurely");
                        }
                    }
                    outcome = gotten.recv() => {
                        serve.as_mut().graceful_shutdown();
                        // let the response page reach the browser
                        let _ = tokio::time::timeout(Duration::from_secs(5), serve).await;
                        let outcome = outcome
                            .ok_or_else(|| eyre::eyre!("redirect handler exited without a result"))?;
                        outcome.map_err(|e| eyre::eyre!(e))
                    }
                }
            };
            let _ = tx.send(r.await);
        });
        Ok((url, async move {
            rx.await.context("redirect future dropped prematurely")?
        }))
    }
}

/// Opens the consent page in the user's browser, or asks them to do it themselves.
pub fn present_auth_url(url: &Url, open_browser: bool) {
    if !open_browser {
        eprintln!("Go to the following link in your browser:\n\n    {url}\n");
        return;
    }
    match webbrowser::open(url.as_str()) {
        Ok(()) => eprintln!("Your browser has been opened to visit:\n\n    {url}\n"),
        Err(e) => {
            tracing::warn!(error = %e, "could not open the user's browser");
            eprintln!("Go to the following link in your browser:\n\n    {url}\n");
        }
    }
}

/// Extracts the authorization code from the query string of an OAuth redirect.
fn parse_callback(query: &str, csrf: &CsrfToken) -> Result<AuthorizationCode, String> {
    let mut presented_state = None;
    let mut presented_code = None;
    let mut presented_error = None;
    for (k, v) in form_urlencoded::parse(query.as_bytes()) {
        match &*k {
            "state" => presented_state = Some(v),
            "code" => presented_code = Some(v),
            "error" => presented_error = Some(v),
            _ => {}
        }
    }
    if presented_state.as_deref() != Some(csrf.secret().as_str()) {
        return Err("invalid csrf token".to_string());
    }
    if let Some(error) = presented_error {
        return Err(format!("authorization denied: {error}"));
    }
    let Some(code) = presented_code else {
        return Err("no authorization code found".to_string());
    };
    Ok(AuthorizationCode::new(code.into_owned()))
}
