use anyhow::{bail, Context, Result};
use jsonwebtoken::{decode, DecodingKey, Validation};
use log::{debug, info, warn};

use crate::prompt::CredentialProvider;
use crate::store::TokenStore;
use crate::types::token::{TokenClaims, TokenStrategy, REFRESH_TOKEN_KEY};

use super::AuthApi;

/// Obtains a usable bearer token, logging in or refreshing as the strategy requires.
pub struct TokenManager<A, S, P> {
    api: A,
    store: S,
    credentials: P,
    strategy: TokenStrategy,
}

impl<A, S, P> TokenManager<A, S, P>
where
    A: AuthApi,
    S: TokenStore,
    P: CredentialProvider,
{
    pub fn new(api: A, store: S, credentials: P, strategy: TokenStrategy) -> Self {
        Self {
            api,
            store,
            credentials,
            strategy,
        }
    }

    pub fn strategy(&self) -> TokenStrategy {
        self.strategy
    }

    /// The persisted long-lived token of the current strategy.
    pub fn stored_token(&self) -> Result<Option<String>> {
        self.store
            .get(self.strategy.store_key())
            .context("read token store")
    }

    /// Perform a full login with fresh credentials.
    ///
    /// On success the long-lived token is persisted (overwriting any previous one) and the
    /// token for the current connection is returned. A failed login is logged and yields
    /// `None`; only a failure to read credentials or to persist the token is an error.
    pub async fn login(&self) -> Result<Option<String>> {
        let credentials = self.credentials.credentials().context("get credentials")?;

        info!("Logging in as '{}'", credentials.identifier);
        let tokens = match self.api.login(&credentials).await {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!("Login error: {err}");
                return Ok(None);
            }
        };
        drop(credentials);

        let (key, value) = tokens.persisted();
        self.store.set(key, value).context("save token")?;
        info!("Login success, token saved as '{key}'");

        Ok(Some(tokens.into_bearer()))
    }

    /// Exchange a refresh token for a new access token, rotating the persisted refresh
    /// token. A rejected (401) refresh token falls back to a full login whose result is
    /// returned unchanged. Any other failure is an error.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<Option<String>> {
        if self.strategy != TokenStrategy::Pair {
            bail!("token refresh requires the 'pair' token strategy");
        }

        debug!("Refreshing access token");
        match self.api.refresh(refresh_token).await {
            Ok(pair) => {
                self.store
                    .set(REFRESH_TOKEN_KEY, &pair.refresh_token)
                    .context("save refresh token")?;
                info!("Access token refreshed");
                Ok(Some(pair.access_token))
            }
            Err(err) if err.is_unauthorized() => {
                info!("Refresh token was rejected, login is required");
                self.login().await
            }
            Err(err) => Err(err).context("refresh access token"),
        }
    }

    /// Get a token for a new connection: use the stored JWT (single) or refresh with the
    /// stored refresh token (pair), and log in when nothing is stored.
    pub async fn acquire_token(&self) -> Result<String> {
        let token = match (self.strategy, self.stored_token()?) {
            (TokenStrategy::Single, Some(token)) => {
                debug!("Use stored jwt token");
                Some(token)
            }
            (TokenStrategy::Pair, Some(refresh_token)) => {
                self.refresh_access_token(&refresh_token).await?
            }
            (_, None) => {
                info!("No stored token, login is required");
                self.login().await?
            }
        };

        match token {
            Some(token) => Ok(token),
            None => bail!("no usable token, login failed"),
        }
    }

    /// Forget the stored token. With the pair strategy the refresh token is revoked on the
    /// server first; a failed revocation is only logged. Returns whether a token was
    /// stored.
    pub async fn logout(&self) -> Result<bool> {
        let key = self.strategy.store_key();
        let token = match self.stored_token()? {
            Some(token) => token,
            None => return Ok(false),
        };

        if self.strategy == TokenStrategy::Pair {
            if let Err(err) = self.api.logout(&token).await {
                warn!("Logout error: {err}");
            }
        }

        self.store.remove(key).context("remove token")?;
        info!("Token '{key}' removed");
        Ok(true)
    }
}

/// Decode the claims of a JWT without verifying it, for display.
pub fn inspect_token(token: &str) -> Option<TokenClaims> {
    let header = jsonwebtoken::decode_header(token).ok()?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    Some(data.claims)
}
