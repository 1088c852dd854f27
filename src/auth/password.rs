use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error, PartialEq)]
pub enum PasswordError {
    #[error("Password must be at least {0} characters")]
    TooShort(usize),

    #[error("Password hash failed: {0}")]
    Hash(String),
}

/// Verified against when the account does not exist, so unknown emails cost
/// the same as wrong passwords.
static DUMMY_HASH: Lazy<Option<Password>> = Lazy::new(|| Password::new("not-a-real-password").ok());

/// Argon2 password hash as stored on a user record
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password").field("hash", &"[REDACTED]").finish()
    }
}

impl Password {
    pub fn new(plain_text: &str) -> Result<Self, PasswordError> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort(MIN_PASSWORD_LENGTH));
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Ok(Self { hash: hash.to_string() })
    }

    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// False for a wrong password and for a malformed stored hash.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Argon2::default().verify_password(plain_text.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }

    /// Burn a verification for a login attempt against a missing account.
    pub fn verify_dummy(plain_text: &str) {
        if let Some(dummy) = DUMMY_HASH.as_ref() {
            let _ = dummy.verify(plain_text);
        }
    }
}
