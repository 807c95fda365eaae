use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::AuthConfig;
use game_types::Identity;

const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub aud: String,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
    pub sub: Option<String>,
    pub user_id: Option<String>, // Same value as sub on most providers
    pub email: Option<String>,
}

impl IdTokenClaims {
    fn subject(self) -> Option<String> {
        self.user_id.or(self.sub).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksKey {
    pub kty: String,
    pub kid: String,
    pub n: Option<String>,
    pub e: Option<String>,
    pub x5c: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<JwksKey>,
}

pub struct AuthService {
    client: Client,
    jwks_cache: RwLock<HashMap<String, (DecodingKey, SystemTime)>>,
    project_id: String,
    issuer: String,
    jwks_url: String,
    dev_mode: bool,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: Client::new(),
            jwks_cache: RwLock::new(HashMap::new()),
            project_id: config.project_id.clone(),
            issuer: config.issuer.clone(),
            jwks_url: config.jwks_url.clone(),
            dev_mode: config.dev_mode,
        }
    }

    /// Accepts unsigned tokens; never use outside local development.
    pub fn new_dev_mode() -> Self {
        Self {
            client: Client::new(),
            jwks_cache: RwLock::new(HashMap::new()),
            project_id: "dev".to_string(),
            issuer: "dev".to_string(),
            jwks_url: String::new(),
            dev_mode: true,
        }
    }

    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Work out who is calling. A bearer token wins over the `userId`
    /// parameter, and a bad token is an error rather than a silent
    /// downgrade to the fallback. Other authorization schemes are ignored.
    pub async fn resolve_identity(
        &self,
        auth_header: Option<&str>,
        fallback_user_id: Option<&str>,
    ) -> Result<Option<Identity>, AuthError> {
        let bearer = auth_header
            .map(str::trim)
            .and_then(|header| header.strip_prefix("Bearer "));

        if let Some(token) = bearer {
            let user_id = self.validate_token(token.trim()).await?;
            return Ok(Some(Identity::authenticated(user_id)));
        }

        Ok(fallback_user_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(Identity::fallback))
    }

    /// Verify the token and return the user id it was issued for
    pub async fn validate_token(&self, token: &str) -> Result<String, AuthError> {
        if self.dev_mode {
            return self.validate_dev_token(token);
        }

        let header = decode_header(token).map_err(|e| {
            tracing::warn!("Failed to decode JWT header: {:?}", e);
            AuthError::InvalidToken
        })?;
        let kid = header.kid.ok_or_else(|| {
            tracing::warn!("JWT header missing 'kid' field");
            AuthError::InvalidToken
        })?;

        let decoding_key = self.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[&self.issuer]);

        let token_data = decode::<IdTokenClaims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::warn!("JWT validation failed for kid {}: {:?}", kid, e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::AudienceMismatch,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
                _ => AuthError::InvalidToken,
            }
        })?;

        tracing::debug!(
            "Token claims - aud: {}, iss: {}",
            token_data.claims.aud,
            token_data.claims.iss
        );

        token_data.claims.subject().ok_or_else(|| {
            tracing::warn!("Token has neither user_id nor sub claim");
            AuthError::InvalidToken
        })
    }

    async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.jwks_cache.read().await;
            if let Some((key, cached_at)) = cache.get(kid) {
                let age = cached_at.elapsed().unwrap_or(JWKS_CACHE_TTL);
                if age < JWKS_CACHE_TTL {
                    tracing::debug!("Using cached decoding key for kid '{}'", kid);
                    return Ok(key.clone());
                }
                tracing::debug!("Cached key for kid '{}' is stale, refetching", kid);
            }
        }

        tracing::debug!("Fetching JWKS from {}", self.jwks_url);
        let response = self.client.get(&self.jwks_url).send().await.map_err(|e| {
            tracing::warn!("Failed to fetch JWKS: {:?}", e);
            AuthError::JwksFetchError
        })?;

        if !response.status().is_success() {
            tracing::warn!("JWKS fetch returned status: {}", response.status());
            return Err(AuthError::JwksFetchError);
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse JWKS JSON: {:?}", e);
            AuthError::JwksFetchError
        })?;

        let jwks_key = jwks.keys.iter().find(|key| key.kid == kid).ok_or_else(|| {
            tracing::warn!("Key with kid '{}' not found in JWKS", kid);
            AuthError::KeyNotFound
        })?;

        let decoding_key = Self::decoding_key_from_jwk(jwks_key)?;

        self.jwks_cache
            .write()
            .await
            .insert(kid.to_string(), (decoding_key.clone(), SystemTime::now()));

        Ok(decoding_key)
    }

    fn decoding_key_from_jwk(jwk: &JwksKey) -> Result<DecodingKey, AuthError> {
        if let (Some(n), Some(e)) = (&jwk.n, &jwk.e) {
            return DecodingKey::from_rsa_components(n, e).map_err(|e| {
                tracing::warn!("Failed to create decoding key from RSA components: {:?}", e);
                AuthError::InvalidKey
            });
        }

        let cert = jwk
            .x5c
            .as_ref()
            .and_then(|chain| chain.first())
            .ok_or_else(|| {
                tracing::warn!("JWKS key has neither n,e components nor x5c certificate");
                AuthError::InvalidKey
            })?;

        let cert_der = base64::engine::general_purpose::STANDARD
            .decode(cert)
            .map_err(|e| {
                tracing::warn!("Failed to decode x5c certificate: {:?}", e);
                AuthError::InvalidKey
            })?;

        Ok(DecodingKey::from_rsa_der(&cert_der))
    }

    /// Dev tokens are read, not verified. Three shapes are accepted: an
    /// unsigned JWT, a JSON object with `user_id`, or `user_id[:anything]`.
    fn validate_dev_token(&self, token: &str) -> Result<String, AuthError> {
        tracing::debug!(
            "Validating dev token (first 20 chars): {}",
            token.chars().take(20).collect::<String>()
        );

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() == 3 {
            let payload = URL_SAFE_NO_PAD
                .decode(parts[1].trim_end_matches('='))
                .map_err(|e| {
                    tracing::warn!("Failed to decode JWT payload in dev mode: {:?}", e);
                    AuthError::InvalidToken
                })?;

            #[derive(Deserialize)]
            struct DevClaims {
                sub: Option<String>,
                user_id: Option<String>,
            }

            let claims: DevClaims = serde_json::from_slice(&payload).map_err(|e| {
                tracing::warn!("Failed to parse JWT claims in dev mode: {:?}", e);
                AuthError::InvalidToken
            })?;

            return claims
                .user_id
                .or(claims.sub)
                .filter(|id| !id.is_empty())
                .ok_or(AuthError::InvalidToken);
        }

        if token.starts_with('{') && token.ends_with('}') {
            #[derive(Deserialize)]
            struct DevJson {
                user_id: String,
            }

            let claims: DevJson =
                serde_json::from_str(token).map_err(|_| AuthError::InvalidToken)?;
            return Some(claims.user_id)
                .filter(|id| !id.is_empty())
                .ok_or(AuthError::InvalidToken);
        }

        token
            .split(':')
            .next()
            .map(str::trim)
            .filter(|id| !id.is_empty() && !id.contains(char::is_whitespace))
            .map(str::to_string)
            .ok_or(AuthError::InvalidToken)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to fetch JWKS")]
    JwksFetchError,
    #[error("Key not found")]
    KeyNotFound,
    #[error("Invalid key")]
    InvalidKey,
    #[error("Audience mismatch")]
    AudienceMismatch,
    #[error("Issuer mismatch")]
    IssuerMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_types::IdentitySource;

    fn test_config() -> AuthConfig {
        AuthConfig {
            dev_mode: false,
            project_id: "test-project".to_string(),
            jwks_url: "http://127.0.0.1:9/keys".to_string(),
            issuer: "https://securetoken.google.com/test-project".to_string(),
        }
    }

    fn unsigned_jwt(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_auth_service_creation() {
        let auth_service = AuthService::new(&test_config());

        assert_eq!(auth_service.project_id, "test-project");
        assert_eq!(auth_service.issuer, "https://securetoken.google.com/test-project");
        assert!(!auth_service.is_dev_mode());
    }

    #[tokio::test]
    async fn test_invalid_token_validation() {
        let auth_service = AuthService::new(&test_config());

        let result = auth_service.validate_token("invalid-token").await;
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_dev_mode_token_shapes() {
        let auth_service = AuthService::new_dev_mode();

        let jwt = unsigned_jwt(r#"{"sub":"uid-from-sub"}"#);
        assert_eq!(auth_service.validate_token(&jwt).await.unwrap(), "uid-from-sub");

        let jwt = unsigned_jwt(r#"{"sub":"ignored","user_id":"uid-preferred"}"#);
        assert_eq!(auth_service.validate_token(&jwt).await.unwrap(), "uid-preferred");

        let json = r#"{"user_id":"uid-json"}"#;
        assert_eq!(auth_service.validate_token(json).await.unwrap(), "uid-json");

        assert_eq!(
            auth_service.validate_token("uid-plain:alice@example.com").await.unwrap(),
            "uid-plain"
        );
        assert!(auth_service.validate_token("").await.is_err());
        assert!(auth_service.validate_token("a.b.c").await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_identity() {
        let auth_service = AuthService::new_dev_mode();

        let identity = auth_service
            .resolve_identity(Some("Bearer web-user"), Some("ignored"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.id, "web-user");
        assert_eq!(identity.source, IdentitySource::Authenticated);

        let identity = auth_service
            .resolve_identity(None, Some("amzn1.ask.account.X"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.id, "amzn1.ask.account.X");
        assert!(!identity.is_authenticated());

        assert!(auth_service.resolve_identity(None, Some("  ")).await.unwrap().is_none());
        assert!(auth_service.resolve_identity(None, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bad_token_is_not_downgraded_to_fallback() {
        let auth_service = AuthService::new(&test_config());

        let result = auth_service
            .resolve_identity(Some("Bearer garbage"), Some("fallback-user"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_uses_fallback() {
        let auth_service = AuthService::new_dev_mode();

        let identity = auth_service
            .resolve_identity(Some("Basic dXNlcjpwdw=="), Some("alexa-user"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.id, "alexa-user");
        assert_eq!(identity.source, IdentitySource::Fallback);

        let identity = auth_service
            .resolve_identity(Some("   "), Some("alexa-user"))
            .await
            .unwrap();
        assert_eq!(identity.map(|i| i.id).as_deref(), Some("alexa-user"));

        assert!(auth_service
            .resolve_identity(Some("Basic dXNlcjpwdw=="), None)
            .await
            .unwrap()
            .is_none());
    }
}
