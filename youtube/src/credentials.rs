//! On-disk OAuth configuration: the client secrets downloaded from the Google Cloud console,
//! and the cached token obtained by authorizing with them.

use eyre::Context;
use oauth2::basic::BasicTokenResponse;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client credentials for the YouTube Data API.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The two layouts Google hands out, keyed by application type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClientSecretsFile {
    Installed(ClientSecrets),
    Web(ClientSecrets),
}

impl ClientSecrets {
    /// Parses the contents of a `client_secrets.json` file.
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_str(json).context("parse client secrets JSON")?;
        Ok(match file {
            ClientSecretsFile::Installed(secrets) | ClientSecretsFile::Web(secrets) => secrets,
        })
    }

    /// Reads and parses a `client_secrets.json` file.
    ///
    /// A missing file is reported with instructions for obtaining one.
    pub async fn load(path: &Path) -> eyre::Result<Self> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eyre::bail!(
                    "client secrets file not found at {}\n\n\
                     To run this program you need OAuth 2.0 client credentials for the \
                     YouTube Data API v3. Create a Desktop app OAuth client at \
                     https://console.cloud.google.com/apis/credentials, download its JSON \
                     and save it to the path above (or pass --client-secrets).",
                    path.display()
                );
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read client secrets from {}", path.display()));
            }
        };
        Self::from_json(&json).with_context(|| format!("load {}", path.display()))
    }
}

/// File-backed storage for the user's OAuth token.
#[derive(Debug, Clone)]
pub struct TokenStorage {
    path: PathBuf,
}

impl TokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored token.
    ///
    /// Returns `Ok(None)` when there is no token to reuse, which includes a file whose
    /// contents are no longer a valid token.
    pub async fn load(&self) -> eyre::Result<Option<BasicTokenResponse>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no stored credentials");
                return Ok(None);
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read credentials from {}", self.path.display()));
            }
        };

        match serde_json::from_str(&json) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "stored credentials are invalid, ignoring them"
                );
                Ok(None)
            }
        }
    }

    /// Writes the token, replacing whatever was stored before.
    ///
    /// On Unix the file is only readable by its owner.
    pub async fn save(&self, token: &BasicTokenResponse) -> eyre::Result<()> {
        let json = serde_json::to_vec_pretty(token).context("serialize OAuth token")?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&self.path)
            .await
            .with_context(|| format!("open {} for writing", self.path.display()))?;
        // mode() only applies to newly created files
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .with_context(|| format!("restrict permissions of {}", self.path.display()))?;
        }
        file.write_all(&json)
            .await
            .with_context(|| format!("write credentials to {}", self.path.display()))?;
        file.flush().await.context("flush credentials file")?;

        tracing::debug!(path = %self.path.display(), "stored credentials");
        Ok(())
    }
}
