use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::utils::config::Config;

#[derive(Error, Debug)]
pub enum AuthServiceError {
    #[error("Authentication failed: invalid credentials")]
    AuthenticationFailed,

    #[error("Admin login required")]
    Unauthorized,

    #[error("Token creation failed: {0}")]
    TokenCreationFailed(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

/// The single administrator identity.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password_hash: String,
}

impl AdminCredentials {
    pub fn new(username: &str, password_hash: &str) -> Self {
        Self {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        }
    }

    pub fn from_password(
        username: &str,
        password: &str,
        cost: u32,
    ) -> Result<Self, AuthServiceError> {
        let password_hash = bcrypt::hash(password, cost)?;
        Ok(Self::new(username, &password_hash))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password hash is checked even when the username is wrong.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let password_ok = bcrypt::verify(password, &self.password_hash).unwrap_or(false);
        username == self.username && password_ok
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // admin username
    pub iat: i64,
    pub exp: i64, // last activity + idle timeout
    pub jti: String,
}

/// Admin Gate state for one browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminSession {
    Anonymous,
    Authenticated {
        username: String,
        expires_at: DateTime<Utc>,
    },
}

impl AdminSession {
    pub fn is_admin(&self) -> bool {
        matches!(self, AdminSession::Authenticated { .. })
    }
}

/// Guard run at the top of every mutation, before any other work.
pub fn require_admin(session: &AdminSession) -> Result<(), AuthServiceError> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(AuthServiceError::Unauthorized)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService {
    credentials: AdminCredentials,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_timeout: Duration,
}

impl AuthService {
    pub fn new(credentials: AdminCredentials, secret_key: &str, session_timeout: Duration) -> Self {
        Self {
            credentials,
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            session_timeout,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let credentials = config.admin_credentials()?;
        Ok(Self::new(
            credentials,
            &config.secret_key,
            config.session_timeout,
        ))
    }

    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    pub fn login(&self, username: &str, password: &str) -> Result<SessionToken, AuthServiceError> {
        self.login_at(username, password, Utc::now())
    }

    /// Anonymous to authenticated. A wrong username and a wrong password are
    /// indistinguishable to the caller.
    pub fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, AuthServiceError> {
        if !self.credentials.verify(username, password) {
            warn!("Admin login failed");
            return Err(AuthServiceError::AuthenticationFailed);
        }

        let token = self.issue_token(now)?;
        info!("Admin {} logged in", self.credentials.username());
        Ok(token)
    }

    pub fn logout(&self, session: &AdminSession) -> AdminSession {
        if let AdminSession::Authenticated { username, .. } = session {
            info!("Admin {} logged out", username);
        }
        AdminSession::Anonymous
    }

    pub fn authorize(&self, token: Option<&str>) -> AdminSession {
        self.authorize_at(token, Utc::now())
    }

    /// Resolves a presented token to a session state. Idle expiry is checked
    /// here, when the next request arrives; there is no background timer.
    pub fn authorize_at(&self, token: Option<&str>, now: DateTime<Utc>) -> AdminSession {
        let Some(token) = token else {
            return AdminSession::Anonymous;
        };

        let claims = match self.decode_token(token) {
            Ok(data) => data.claims,
            Err(_) => return AdminSession::Anonymous,
        };

        if claims.sub != self.credentials.username() {
            debug!("Session token issued for a different admin identity");
            return AdminSession::Anonymous;
        }

        if claims.exp <= now.timestamp() {
            debug!("Admin session expired");
            return AdminSession::Anonymous;
        }

        match Utc.timestamp_opt(claims.exp, 0).single() {
            Some(expires_at) => AdminSession::Authenticated {
                username: claims.sub,
                expires_at,
            },
            None => AdminSession::Anonymous,
        }
    }

    /// Re-issues the token so the idle timeout counts from `now`.
    pub fn refresh_at(
        &self,
        session: &AdminSession,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionToken>, AuthServiceError> {
        match session {
            AdminSession::Authenticated { .. } => Ok(Some(self.issue_token(now)?)),
            AdminSession::Anonymous => Ok(None),
        }
    }

    fn issue_token(&self, now: DateTime<Utc>) -> Result<SessionToken, AuthServiceError> {
        let expires_at = now + self.session_timeout;
        let claims = Claims {
            sub: self.credentials.username().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthServiceError::TokenCreationFailed(e.to_string()))?;

        Ok(SessionToken { token, expires_at })
    }

    fn decode_token(&self, token: &str) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is compared against the caller's clock in authorize_at
        validation.validate_exp = false;

        decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("Session token rejected: {}", e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_service(secret: &str) -> AuthService {
        let credentials = AdminCredentials::from_password("admin", "admin123", 4).unwrap();
        AuthService::new(credentials, secret, Duration::minutes(30))
    }

    #[test]
    fn test_login_success() {
        let auth = auth_service("test-secret");
        let now = Utc::now();

        let token = auth.login_at("admin", "admin123", now).unwrap();
        assert!(!token.token.is_empty());

        let session = auth.authorize_at(Some(&token.token), now);
        assert!(session.is_admin());
    }

    #[test]
    fn test_login_failure_does_not_reveal_field() {
        let auth = auth_service("test-secret");

        let wrong_user = auth.login("root", "admin123");
        let wrong_password = auth.login("admin", "nope");

        assert!(matches!(wrong_user, Err(AuthServiceError::AuthenticationFailed)));
        assert!(matches!(wrong_password, Err(AuthServiceError::AuthenticationFailed)));
        assert_eq!(
            wrong_user.unwrap_err().to_string(),
            wrong_password.unwrap_err().to_string()
        );
    }

    #[test]
    fn test_missing_token_is_anonymous() {
        let auth = auth_service("test-secret");
        assert_eq!(auth.authorize(None), AdminSession::Anonymous);
        assert_eq!(auth.authorize(Some("garbage")), AdminSession::Anonymous);
    }

    #[test]
    fn test_session_expires_after_idle_timeout() {
        let auth = auth_service("test-secret");
        let start = Utc::now();
        let token = auth.login_at("admin", "admin123", start).unwrap();

        let later = start + Duration::minutes(29);
        assert!(auth.authorize_at(Some(&token.token), later).is_admin());

        let expired = start + Duration::minutes(31);
        assert_eq!(
            auth.authorize_at(Some(&token.token), expired),
            AdminSession::Anonymous
        );
    }

    #[test]
    fn test_refresh_slides_the_timeout() {
        let auth = auth_service("test-secret");
        let start = Utc::now();
        let first = auth.login_at("admin", "admin123", start).unwrap();

        let activity = start + Duration::minutes(20);
        let session = auth.authorize_at(Some(&first.token), activity);
        let second = auth.refresh_at(&session, activity).unwrap().unwrap();

        let check = start + Duration::minutes(45);
        assert!(!auth.authorize_at(Some(&first.token), check).is_admin());
        assert!(auth.authorize_at(Some(&second.token), check).is_admin());
    }

    #[test]
    fn test_refresh_anonymous_issues_nothing() {
        let auth = auth_service("test-secret");
        let refreshed = auth.refresh_at(&AdminSession::Anonymous, Utc::now()).unwrap();
        assert!(refreshed.is_none());
    }

    #[test]
    fn test_token_from_other_key_is_rejected() {
        let ours = auth_service("test-secret");
        let theirs = auth_service("other-secret");

        let token = theirs.login("admin", "admin123").unwrap();
        assert_eq!(ours.authorize(Some(&token.token)), AdminSession::Anonymous);
    }

    #[test]
    fn test_logout_returns_anonymous() {
        let auth = auth_service("test-secret");
        let token = auth.login("admin", "admin123").unwrap();
        let session = auth.authorize(Some(&token.token));

        assert_eq!(auth.logout(&session), AdminSession::Anonymous);
    }

    #[test]
    fn test_require_admin_guard() {
        assert!(matches!(
            require_admin(&AdminSession::Anonymous),
            Err(AuthServiceError::Unauthorized)
        ));
        let session = AdminSession::Authenticated {
            username: "admin".to_string(),
            expires_at: Utc::now(),
        };
        assert!(require_admin(&session).is_ok());
    }
}
