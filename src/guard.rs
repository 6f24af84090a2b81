//! Delete confirmation guard.
//!
//! Deletes must carry a token equal to the hex SHA-256 of
//! `DELETE:{environment}:{table}:{primaryValue}`. The inputs and hash are
//! public, so this only stops a delete that the client did not compute on
//! purpose. It is not an authorization check.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// The supplied token does not match the request it came with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid confirmation token. Please confirm the deletion properly.")]
pub struct InvalidConfirmationToken;

/// Expected confirmation token for deleting `primary_value` from `table`.
pub fn confirmation_token(environment: &str, table: &str, primary_value: &str) -> String {
    let data = format!("DELETE:{}:{}:{}", environment, table, primary_value);
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// Recompute the token and require an exact match.
pub fn verify(
    environment: &str,
    table: &str,
    primary_value: &str,
    token: &str,
) -> Result<(), InvalidConfirmationToken> {
    if confirmation_token(environment, table, primary_value) == token {
        Ok(())
    } else {
        Err(InvalidConfirmationToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_sha256_hex_of_delete_string() {
        let expected = hex::encode(Sha256::digest(b"DELETE:staging:users:42"));
        assert_eq!(confirmation_token("staging", "users", "42"), expected);
        assert_eq!(expected.len(), 64);
        assert!(expected.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_known_vector() {
        // sha256("abc"), to pin the hash function itself
        assert_eq!(
            hex::encode(Sha256::digest(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify() {
        let token = confirmation_token("staging", "users", "42");
        assert_eq!(verify("staging", "users", "42", &token), Ok(()));

        assert_eq!(verify("staging", "users", "43", &token), Err(InvalidConfirmationToken));
        assert_eq!(verify("production", "users", "42", &token), Err(InvalidConfirmationToken));
        assert_eq!(
            verify("staging", "users", "42", &token.to_uppercase()),
            Err(InvalidConfirmationToken)
        );
        assert_eq!(verify("staging", "users", "42", ""), Err(InvalidConfirmationToken));
    }
}
