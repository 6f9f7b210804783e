//! Authentication service.
//!
//! Email + password accounts. Passwords are hashed with Argon2id and a
//! random salt; the hash string carries its own parameters so verification
//! needs nothing else.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use gamestore_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Verified against when no account matches, so sign-in for an unknown email
/// costs the same Argon2 work as for a registered one.
static UNKNOWN_ACCOUNT_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("no account has this password").unwrap_or_default());

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a shopper account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short or the
    /// confirmation does not match.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        if password != confirm {
            return Err(AuthError::WeakPassword("passwords do not match".to_owned()));
        }
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        self.users
            .create(&email, &password_hash, false)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Sign in with email and password.
    ///
    /// Every failure other than a database error is reported as
    /// `InvalidCredentials` so callers cannot tell which part was wrong.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Err(reject_unknown(password));
        };

        let Some(account) = self.users.get_with_hash(&email).await? else {
            return Err(reject_unknown(password));
        };

        verify_password(password, &account.password_hash)?;

        Ok(account.user)
    }

    /// Create an admin account, or promote an existing one and reset its
    /// password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword` for bad
    /// input.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;
        Ok(self.users.upsert_admin(&email, &password_hash).await?)
    }

    /// Grant or revoke admin by email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has this email.
    pub async fn set_admin_by_email(&self, email: &str, is_admin: bool) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(self.users.set_admin(user.id, is_admin).await?)
    }

    /// Fetch an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if it does not exist.
    pub async fn get_user(&self, id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Check password strength.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Burn one verification for a sign-in that has no account behind it.
fn reject_unknown(password: &str) -> AuthError {
    verify_password(password, &UNKNOWN_ACCOUNT_HASH)
        .err()
        .unwrap_or(AuthError::InvalidCredentials)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter23", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same-pass").unwrap(), hash_password("same-pass").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_account_pays_for_a_real_verification() {
        assert!(UNKNOWN_ACCOUNT_HASH.starts_with("$argon2id$"));
        assert!(PasswordHash::new(&UNKNOWN_ACCOUNT_HASH).is_ok());
        assert!(matches!(
            reject_unknown("hunter22"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            reject_unknown("no account has this password"),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("ééééé").is_err());
    }
}
