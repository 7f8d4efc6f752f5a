//! Account directory: registration, login, refresh and logout.
//!
//! Orchestrates the Sanitizer, password hashing, the token service and the
//! account and refresh-token stores. Transport concerns (status codes, JSON
//! envelopes) live in the handlers; everything here returns [`AppResult`].

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tokio::sync::OnceCell;
use trancendos_core::error::{CoreError, CredentialFailure, FieldError, RefreshFailure};
use trancendos_core::roles::Role;
use trancendos_core::sanitize::{sanitize_tenant_id, validate_email, validate_password, MAX_ID_LEN};
use trancendos_db::models::account::{Account, CreateAccount};
use trancendos_db::models::refresh_token::RefreshTokenRecord;
use trancendos_db::repositories::{AccountRepo, RefreshTokenRepo};
use trancendos_db::{AuthStore, DbError};
use uuid::Uuid;

use crate::auth::jwt::{
    generate_access_token, generate_refresh_token, verify_refresh_token, JwtConfig, TokenPayload,
};
use crate::auth::password::{hash_password_blocking, verify_password_blocking, PasswordError};
use crate::error::{AppError, AppResult};

/// Roles a caller may pick for themselves at registration.
const SELF_REGISTRABLE_ROLES: [Role; 4] = [Role::Guest, Role::User, Role::Moderator, Role::Admin];

const DUPLICATE_ACCOUNT: &str = "User already exists";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub user_id: String,
    pub email: String,
    pub tenant_id: String,
    pub role: String,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            user_id: account.user_id.clone(),
            email: account.email.clone(),
            tenant_id: account.tenant_id.clone(),
            role: account.role.clone(),
        }
    }
}

/// Result of a successful registration or login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: AccountInfo,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AccountDirectory {
    store: AuthStore,
    jwt: Arc<JwtConfig>,
    /// Hash of a random password, verified against when the account is unknown.
    decoy_hash: OnceCell<String>,
}

impl AccountDirectory {
    pub fn new(store: AuthStore, jwt: Arc<JwtConfig>) -> Self {
        Self {
            store,
            jwt,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Token settings used by this directory; shared with the auth middleware.
    pub fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    /// Create an account and issue its first token pair.
    ///
    /// `role` defaults to `user`; `superadmin` cannot be self-assigned.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        tenant_id: &str,
        role: Option<&str>,
    ) -> AppResult<AuthSession> {
        let mut errors = Vec::new();

        let email_check = validate_email(email);
        if let Some(error) = email_check.error {
            errors.push(FieldError::new("email", error));
        }
        if let Some(error) = validate_password(password).error {
            errors.push(FieldError::new("password", error));
        }
        let tenant_id = match checked_tenant_id(tenant_id) {
            Ok(tenant_id) => tenant_id,
            Err(message) => {
                errors.push(FieldError::new("tenantId", message));
                String::new()
            }
        };
        let role = match role {
            None => Role::User,
            Some(raw) => match SELF_REGISTRABLE_ROLES.iter().find(|r| r.as_str() == raw) {
                Some(role) => *role,
                None => {
                    errors.push(FieldError::new(
                        "role",
                        "Role must be one of guest, user, moderator, admin",
                    ));
                    Role::User
                }
            },
        };

        if !errors.is_empty() {
            return Err(CoreError::ValidationFields(errors).into());
        }
        let email = email_check.sanitized;

        // Fail fast before hashing; the atomic insert below still decides races.
        if AccountRepo::find_by_email(&self.store, &tenant_id, &email)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(DUPLICATE_ACCOUNT.into()).into());
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;

        let input = CreateAccount {
            user_id: format!("user_{}", Uuid::new_v4().simple()),
            email,
            password_hash,
            tenant_id,
            role: role.as_str().to_string(),
        };
        let account = AccountRepo::create(&self.store, &input)
            .await
            .map_err(|e| match e {
                DbError::Duplicate(_) => AppError::Core(CoreError::Conflict(DUPLICATE_ACCOUNT.into())),
                other => AppError::Database(other),
            })?;

        tracing::info!(
            user_id = %account.user_id,
            tenant_id = %account.tenant_id,
            role = %account.role,
            "Account registered"
        );

        self.issue_session(&account).await
    }

    /// Authenticate with email and password and issue a new token pair.
    ///
    /// Unknown accounts and wrong passwords fail identically. Earlier refresh
    /// tokens for the account stay valid.
    pub async fn login(&self, email: &str, password: &str, tenant_id: &str) -> AppResult<AuthSession> {
        let email_check = validate_email(email);
        if !email_check.valid {
            return Err(CoreError::Validation(INVALID_CREDENTIALS.into()).into());
        }
        if password.is_empty() {
            return Err(CoreError::Validation("Password is required".into()).into());
        }
        let tenant_id = checked_tenant_id(tenant_id).map_err(|m| CoreError::Validation(m.into()))?;

        let Some(account) =
            AccountRepo::find_by_email(&self.store, &tenant_id, &email_check.sanitized).await?
        else {
            // Pay for one verify so unknown accounts cost the same as wrong passwords.
            let decoy = self.decoy_hash().await?.to_string();
            verify_password_blocking(password.to_string(), decoy).await?;
            return Err(CoreError::InvalidCredentials(CredentialFailure::UnknownAccount).into());
        };

        let verified =
            verify_password_blocking(password.to_string(), account.password_hash.clone()).await?;
        if !verified {
            return Err(CoreError::InvalidCredentials(CredentialFailure::WrongPassword).into());
        }

        tracing::info!(user_id = %account.user_id, tenant_id = %account.tenant_id, "Login succeeded");
        self.issue_session(&account).await
    }

    async fn decoy_hash(&self) -> Result<&str, PasswordError> {
        self.decoy_hash
            .get_or_try_init(|| hash_password_blocking(Uuid::new_v4().to_string()))
            .await
            .map(String::as_str)
    }

    /// Exchange a recorded refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        if refresh_token.is_empty() {
            return Err(CoreError::Validation("refreshToken is required".into()).into());
        }

        let claims = verify_refresh_token(refresh_token, &self.jwt).map_err(CoreError::from)?;

        let reject = |reason| AppError::Core(CoreError::InvalidRefreshToken(reason));

        let record = RefreshTokenRepo::find(&self.store, refresh_token)
            .await?
            .ok_or_else(|| reject(RefreshFailure::UnknownToken))?;
        if record.user_id != claims.user_id || record.tenant_id != claims.tenant_id {
            return Err(reject(RefreshFailure::UserMismatch));
        }

        let account = AccountRepo::find_by_id(&self.store, &claims.tenant_id, &claims.user_id)
            .await?
            .ok_or_else(|| reject(RefreshFailure::AccountMissing))?;
        if account.token_version != claims.token_version {
            return Err(reject(RefreshFailure::VersionMismatch));
        }

        let access_token = generate_access_token(&access_payload(&account), &self.jwt)
            .map_err(CoreError::from)?;
        tracing::debug!(user_id = %account.user_id, tenant_id = %account.tenant_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Forget a refresh token. Unknown tokens are ignored.
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let removed = RefreshTokenRepo::delete(&self.store, refresh_token).await?;
        tracing::info!(removed, "Logout");
        Ok(())
    }

    /// Look up an account's public profile within a tenant.
    pub async fn find_profile(&self, tenant_id: &str, user_id: &str) -> AppResult<AccountInfo> {
        AccountRepo::find_by_id(&self.store, tenant_id, user_id)
            .await?
            .map(|account| AccountInfo::from(&account))
            .ok_or_else(|| {
                AppError::Core(CoreError::NotFound {
                    entity: "User",
                    id: user_id.to_string(),
                })
            })
    }

    async fn issue_session(&self, account: &Account) -> AppResult<AuthSession> {
        let access_token = generate_access_token(&access_payload(account), &self.jwt)
            .map_err(CoreError::from)?;

        let refresh_payload = TokenPayload {
            user_id: account.user_id.clone(),
            tenant_id: account.tenant_id.clone(),
            token_version: Some(account.token_version),
            ..TokenPayload::default()
        };
        let refresh_token =
            generate_refresh_token(&refresh_payload, &self.jwt).map_err(CoreError::from)?;

        let now = Utc::now();
        RefreshTokenRepo::create(
            &self.store,
            &refresh_token,
            RefreshTokenRecord {
                user_id: account.user_id.clone(),
                tenant_id: account.tenant_id.clone(),
                issued_at: now,
                expires_at: now + Duration::seconds(self.jwt.refresh_token_ttl_secs),
            },
        )
        .await?;

        Ok(AuthSession {
            user: AccountInfo::from(account),
            access_token,
            refresh_token,
        })
    }
}

fn access_payload(account: &Account) -> TokenPayload {
    TokenPayload {
        user_id: account.user_id.clone(),
        tenant_id: account.tenant_id.clone(),
        role: Some(account.role.clone()),
        email: Some(account.email.clone()),
        token_version: None,
    }
}

/// Length-check a raw tenant id, then reduce it to its identifier form.
fn checked_tenant_id(raw: &str) -> Result<String, &'static str> {
    let len = raw.chars().count();
    if len == 0 || len > MAX_ID_LEN {
        return Err("Tenant ID must be 1-100 characters");
    }
    let sanitized = sanitize_tenant_id(raw);
    if sanitized.is_empty() {
        return Err("Tenant ID must contain letters, digits, '-' or '_'");
    }
    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::auth::jwt::verify_access_token;

    const PASSWORD: &str = "Sup3rSecret";

    fn directory() -> AccountDirectory {
        let jwt = JwtConfig {
            access_secret: "directory-access-secret".into(),
            refresh_secret: "directory-refresh-secret".into(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 3600,
        };
        AccountDirectory::new(AuthStore::in_memory(), Arc::new(jwt))
    }

    #[tokio::test]
    async fn register_issues_tokens() {
        let dir = directory();
        let session = dir
            .register("Alice@Example.com", PASSWORD, "acme", None)
            .await
            .unwrap();

        assert!(session.user.user_id.starts_with("user_"));
        assert_eq!(session.user.email, "alice@example.com");
        assert_eq!(session.user.tenant_id, "acme");
        assert_eq!(session.user.role, "user");

        let claims = verify_access_token(&session.access_token, dir.jwt()).unwrap();
        assert_eq!(claims.user_id, session.user.user_id);
        assert_eq!(claims.aud, "acme");

        let record = RefreshTokenRepo::find(&dir.store, &session.refresh_token)
            .await
            .unwrap()
            .expect("refresh token recorded");
        assert_eq!(record.user_id, session.user.user_id);
        assert!(record.expires_at > record.issued_at);
    }

    #[tokio::test]
    async fn register_collects_field_errors() {
        let dir = directory();
        let result = dir.register("nope", "short", "", Some("superadmin")).await;

        assert_matches!(
            result,
            Err(AppError::Core(CoreError::ValidationFields(errors))) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["email", "password", "tenantId", "role"]);
            }
        );
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let dir = directory();
        let result = dir.register("a@b.co", "alllowercase1", "acme", None).await;
        assert_matches!(result, Err(AppError::Core(CoreError::ValidationFields(errors))) => {
            assert_eq!(errors[0].field, "password");
        });
    }

    #[tokio::test]
    async fn register_accepts_admin_role() {
        let dir = directory();
        let session = dir
            .register("boss@example.com", PASSWORD, "acme", Some("admin"))
            .await
            .unwrap();
        assert_eq!(session.user.role, "admin");
    }

    #[tokio::test]
    async fn register_sanitizes_tenant() {
        let dir = directory();
        let session = dir
            .register("a@example.com", PASSWORD, "tenant@#$123", None)
            .await
            .unwrap();
        assert_eq!(session.user.tenant_id, "tenant123");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let dir = directory();
        dir.register("a@example.com", PASSWORD, "acme", None).await.unwrap();

        let again = dir.register("A@EXAMPLE.COM", PASSWORD, "acme", None).await;
        assert_matches!(again, Err(AppError::Core(CoreError::Conflict(_))));

        // Same email in another tenant is a different account.
        assert!(dir.register("a@example.com", PASSWORD, "globex", None).await.is_ok());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let dir = directory();
        dir.register("a@example.com", PASSWORD, "acme", None).await.unwrap();

        let wrong_password = dir.login("a@example.com", "Wrong-Passw0rd", "acme").await;
        let unknown = dir.login("ghost@example.com", PASSWORD, "acme").await;
        let other_tenant = dir.login("a@example.com", PASSWORD, "globex").await;

        assert_matches!(
            wrong_password,
            Err(AppError::Core(CoreError::InvalidCredentials(CredentialFailure::WrongPassword)))
        );
        assert_matches!(
            unknown,
            Err(AppError::Core(CoreError::InvalidCredentials(CredentialFailure::UnknownAccount)))
        );
        assert_matches!(
            other_tenant,
            Err(AppError::Core(CoreError::InvalidCredentials(CredentialFailure::UnknownAccount)))
        );
    }

    #[tokio::test]
    async fn unknown_account_still_verifies_a_hash() {
        let dir = directory();
        assert!(dir.decoy_hash.get().is_none());

        let unknown = dir.login("ghost@example.com", PASSWORD, "acme").await;
        assert_matches!(
            unknown,
            Err(AppError::Core(CoreError::InvalidCredentials(CredentialFailure::UnknownAccount)))
        );
        let decoy = dir.decoy_hash.get().expect("decoy hash initialised").clone();
        assert!(decoy.starts_with("$argon2id$"));

        // The same hash is reused by later lookups.
        let _ = dir.login("nobody@example.com", PASSWORD, "acme").await;
        assert_eq!(dir.decoy_hash.get(), Some(&decoy));
    }

    #[tokio::test]
    async fn login_validates_input() {
        let dir = directory();
        assert_matches!(
            dir.login("not-an-email", PASSWORD, "acme").await,
            Err(AppError::Core(CoreError::Validation(msg))) if msg == INVALID_CREDENTIALS
        );
        assert_matches!(
            dir.login("a@example.com", "", "acme").await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_matches!(
            dir.login("a@example.com", PASSWORD, "").await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }

    #[tokio::test]
    async fn login_normalizes_email() {
        let dir = directory();
        let registered = dir
            .register("bob@googlemail.com", PASSWORD, "acme", None)
            .await
            .unwrap();
        let session = dir.login("BOB@gmail.com", PASSWORD, "acme").await.unwrap();
        assert_eq!(session.user, registered.user);
        assert_ne!(session.refresh_token, registered.refresh_token);
    }

    #[tokio::test]
    async fn refresh_then_logout() {
        let dir = directory();
        let session = dir.register("a@example.com", PASSWORD, "acme", None).await.unwrap();

        let access = dir.refresh(&session.refresh_token).await.unwrap();
        let claims = verify_access_token(&access, dir.jwt()).unwrap();
        assert_eq!(claims.user_id, session.user.user_id);
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.role, "user");

        dir.logout(&session.refresh_token).await.unwrap();
        assert_matches!(
            dir.refresh(&session.refresh_token).await,
            Err(AppError::Core(CoreError::InvalidRefreshToken(RefreshFailure::UnknownToken)))
        );

        // Logging out twice is fine.
        assert!(dir.logout(&session.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn login_keeps_earlier_refresh_tokens() {
        let dir = directory();
        let first = dir.register("a@example.com", PASSWORD, "acme", None).await.unwrap();
        let second = dir.login("a@example.com", PASSWORD, "acme").await.unwrap();

        assert!(dir.refresh(&first.refresh_token).await.is_ok());
        assert!(dir.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_rejects_unrecorded_and_forged_tokens() {
        let dir = directory();
        let session = dir.register("a@example.com", PASSWORD, "acme", None).await.unwrap();

        let unrecorded = generate_refresh_token(
            &TokenPayload {
                user_id: session.user.user_id.clone(),
                tenant_id: "acme".into(),
                ..TokenPayload::default()
            },
            dir.jwt(),
        )
        .unwrap();
        assert_matches!(
            dir.refresh(&unrecorded).await,
            Err(AppError::Core(CoreError::InvalidRefreshToken(RefreshFailure::UnknownToken)))
        );

        assert_matches!(
            dir.refresh(&session.access_token).await,
            Err(AppError::Core(CoreError::InvalidRefreshToken(RefreshFailure::BadSignature)))
        );
        assert_matches!(dir.refresh("").await, Err(AppError::Core(CoreError::Validation(_))));
    }

    async fn record(dir: &AccountDirectory, token: &str, user_id: &str) {
        let now = Utc::now();
        RefreshTokenRepo::create(
            &dir.store,
            token,
            RefreshTokenRecord {
                user_id: user_id.into(),
                tenant_id: "acme".into(),
                issued_at: now,
                expires_at: now + Duration::hours(1),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn refresh_checks_record_account_and_version() {
        let dir = directory();
        let session = dir.register("a@example.com", PASSWORD, "acme", None).await.unwrap();
        let user_id = session.user.user_id.clone();

        let token_for = |user_id: &str, version: u32| {
            generate_refresh_token(
                &TokenPayload {
                    user_id: user_id.into(),
                    tenant_id: "acme".into(),
                    token_version: Some(version),
                    ..TokenPayload::default()
                },
                dir.jwt(),
            )
            .unwrap()
        };

        let mismatched = token_for(&user_id, 0);
        record(&dir, &mismatched, "user_someone_else").await;
        assert_matches!(
            dir.refresh(&mismatched).await,
            Err(AppError::Core(CoreError::InvalidRefreshToken(RefreshFailure::UserMismatch)))
        );

        let orphan = token_for("user_deleted", 0);
        record(&dir, &orphan, "user_deleted").await;
        assert_matches!(
            dir.refresh(&orphan).await,
            Err(AppError::Core(CoreError::InvalidRefreshToken(RefreshFailure::AccountMissing)))
        );

        let stale = token_for(&user_id, 5);
        record(&dir, &stale, &user_id).await;
        assert_matches!(
            dir.refresh(&stale).await,
            Err(AppError::Core(CoreError::InvalidRefreshToken(RefreshFailure::VersionMismatch)))
        );
    }

    #[tokio::test]
    async fn find_profile_scoped_to_tenant() {
        let dir = directory();
        let session = dir.register("a@example.com", PASSWORD, "acme", None).await.unwrap();

        let profile = dir.find_profile("acme", &session.user.user_id).await.unwrap();
        assert_eq!(profile, session.user);

        assert_matches!(
            dir.find_profile("globex", &session.user.user_id).await,
            Err(AppError::Core(CoreError::NotFound { entity: "User", .. }))
        );
    }
}
