use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use super::AuthError;

/// Argon2 PHC string for storage
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Hashing is CPU-bound, keep it off the async workers.
pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// False for a wrong password or an unparseable stored hash.
pub async fn verify_password(password: String, stored_hash: String) -> bool {
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&stored_hash) else {
            tracing::error!("Stored password hash is not a valid PHC string");
            return false;
        };
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    })
    .await
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verifies_matching_password_only() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse".into(), hash.clone()).await);
        assert!(!verify_password("battery staple".into(), hash).await);
    }

    #[tokio::test]
    async fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything".into(), "not-a-hash".into()).await);
    }

    #[tokio::test]
    async fn blocking_hash_produces_unique_salts() {
        let a = hash_password_blocking("pw".into()).await.unwrap();
        let b = hash_password_blocking("pw".into()).await.unwrap();
        assert_ne!(a, b);
    }
}
