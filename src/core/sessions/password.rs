//! Password verifiers.
//!
//! The tracker never stores passwords. On first login it derives an
//! argon2id verifier (PHC string, salt embedded) and persists that; later
//! logins are checked against the verifier.
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// It derives the verifier to be stored for a new account.
///
/// # Errors
///
/// Will return an error if the hash cannot be computed.
pub fn derive_verifier(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// It checks a login password against a stored verifier.
///
/// A verifier that cannot be parsed counts as a mismatch.
#[must_use]
pub fn matches(password: &str, verifier: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(verifier) else {
        return false;
    };

    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::{derive_verifier, matches};

    #[test]
    fn it_should_accept_the_original_password() {
        let verifier = derive_verifier("pw123456").unwrap();

        assert!(matches("pw123456", &verifier));
    }

    #[test]
    fn it_should_reject_a_different_password() {
        let verifier = derive_verifier("pw123456").unwrap();

        assert!(!matches("wrong", &verifier));
    }

    #[test]
    fn it_should_reject_an_unparseable_verifier() {
        assert!(!matches("pw123456", "plaintext-leftover"));
    }

    #[test]
    fn it_should_salt_each_verifier_independently() {
        let first = derive_verifier("pw123456").unwrap();
        let second = derive_verifier("pw123456").unwrap();

        assert_ne!(first, second);
    }
}
