use argon2_kdf::{Algorithm, Hash, Hasher, Secret};
use std::fmt;
use std::str::FromStr;

#[derive(Debug)]
pub enum PasswordHashError {
    HashFailure(String),
}

impl std::error::Error for PasswordHashError {}

impl fmt::Display for PasswordHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordHashError::HashFailure(msg) => write!(f, "Hashing failed: {}", msg),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HashParams {
    pub salt_length: u32,
    pub hash_length: u32,
    pub iterations: u32,
    pub memory_cost_kib: u32,
    pub threads: u32,
}

pub fn hash_password(
    password: &str,
    params: &HashParams,
    hashing_key: &[u8],
) -> Result<String, PasswordHashError> {
    let hash = Hasher::default()
        .algorithm(Algorithm::Argon2id)
        .salt_length(params.salt_length)
        .hash_length(params.hash_length)
        .iterations(params.iterations)
        .memory_cost_kib(params.memory_cost_kib)
        .threads(params.threads)
        .secret(Secret::using(hashing_key))
        .hash(password.as_bytes())
        .map_err(|e| PasswordHashError::HashFailure(e.to_string()))?;

    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str, hashing_key: &[u8]) -> bool {
    match Hash::from_str(hash) {
        Ok(h) => h.verify_with_secret(password.as_bytes(), Secret::using(hashing_key)),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &[u8] = b"test-hashing-key";

    fn test_params() -> HashParams {
        // Deliberately cheap parameters; these protect nothing
        HashParams {
            salt_length: 16,
            hash_length: 32,
            iterations: 1,
            memory_cost_kib: 1024,
            threads: 1,
        }
    }

    #[test]
    fn test_hash_password_verifies_with_correct_password() {
        let hash = hash_password("OAgZbc6d&ARg*Wq#NPe3", &test_params(), TEST_KEY).unwrap();

        assert!(!hash.contains("OAgZbc6d&ARg*Wq#NPe3"));
        assert!(verify_password("OAgZbc6d&ARg*Wq#NPe3", &hash, TEST_KEY));
    }

    #[test]
    fn test_verify_password_rejects_wrong_password() {
        let hash = hash_password("OAgZbc6d&ARg*Wq#NPe3", &test_params(), TEST_KEY).unwrap();

        assert!(!verify_password("wrong-password", &hash, TEST_KEY));
        assert!(!verify_password("", &hash, TEST_KEY));
    }

    #[test]
    fn test_verify_password_rejects_wrong_key() {
        let hash = hash_password("OAgZbc6d&ARg*Wq#NPe3", &test_params(), TEST_KEY).unwrap();

        assert!(!verify_password(
            "OAgZbc6d&ARg*Wq#NPe3",
            &hash,
            b"another-key"
        ));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(!verify_password("password", "not-an-argon2-hash", TEST_KEY));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("OAgZbc6d&ARg*Wq#NPe3", &test_params(), TEST_KEY).unwrap();
        let second = hash_password("OAgZbc6d&ARg*Wq#NPe3", &test_params(), TEST_KEY).unwrap();

        assert_ne!(first, second);
    }
}
