//! PKCE (RFC 7636) verifier and challenge generation using `ring`.

use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use sgid_lib::base64url_encode;

use super::constants::{CODE_VERIFIER_ENTROPY_BYTES, DEFAULT_CODE_VERIFIER_LENGTH, DEFAULT_NONCE_BYTES};
use super::error::SgidError;
use super::types::{PkcePair, check_verifier_length};

fn random_bytes(len: usize) -> Result<Vec<u8>, SgidError> {
    let mut buf = vec![0u8; len];
    SystemRandom::new().fill(&mut buf).map_err(|_| SgidError::Rng)?;
    Ok(buf)
}

/// Generate a code verifier of `length` url-safe characters.
///
/// 96 random bytes encode to 128 characters, so every allowed prefix is uniformly random.
pub fn generate_code_verifier(length: usize) -> Result<String, SgidError> {
    check_verifier_length(length)?;
    let mut verifier = base64url_encode(&random_bytes(CODE_VERIFIER_ENTROPY_BYTES)?);
    verifier.truncate(length);
    Ok(verifier)
}

/// `base64url(SHA-256(verifier))`, unpadded.
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = digest::digest(&digest::SHA256, verifier.as_bytes());
    base64url_encode(hash.as_ref())
}

/// Generate a verifier of `length` characters together with its S256 challenge.
pub fn generate_pkce_pair(length: usize) -> Result<PkcePair, SgidError> {
    check_verifier_length(length)?;
    let code_verifier = generate_code_verifier(length)?;
    let code_challenge = generate_code_challenge(&code_verifier);
    Ok(PkcePair { code_verifier, code_challenge })
}

/// A pair with the default 43 character verifier.
pub fn generate_default_pkce_pair() -> Result<PkcePair, SgidError> {
    generate_pkce_pair(DEFAULT_CODE_VERIFIER_LENGTH)
}

/// A fresh nonce: 32 random bytes, base64url without padding.
pub fn generate_nonce() -> Result<String, SgidError> {
    generate_nonce_with_length(DEFAULT_NONCE_BYTES)
}

/// A fresh nonce built from `bytes` random bytes.
pub fn generate_nonce_with_length(bytes: usize) -> Result<String, SgidError> {
    Ok(base64url_encode(&random_bytes(bytes)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_unreserved(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
    }

    #[test]
    fn rfc7636_appendix_b_vector() {
        assert_eq!(
            generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn challenge_is_deterministic() {
        let verifier = generate_code_verifier(64).unwrap();
        assert_eq!(generate_code_challenge(&verifier), generate_code_challenge(&verifier));
    }

    #[test]
    fn verifier_accepts_every_allowed_length() {
        for length in 43..=128 {
            let verifier = generate_code_verifier(length).unwrap();
            assert_eq!(verifier.len(), length);
            assert!(is_unreserved(&verifier));
        }
    }

    #[test]
    fn verifier_rejects_out_of_range_lengths() {
        for length in [0, 42, 129, 999] {
            let err = generate_code_verifier(length).unwrap_err();
            assert!(matches!(err, SgidError::InvalidPkceLength { length: l } if l == length));
        }
    }

    #[test]
    fn pair_rejects_out_of_range_lengths() {
        for length in [0, 42, 129, 999] {
            assert!(matches!(
                generate_pkce_pair(length),
                Err(SgidError::InvalidPkceLength { .. })
            ));
        }
    }

    #[test]
    fn pair_challenge_matches_verifier() {
        let pair = generate_pkce_pair(100).unwrap();
        assert_eq!(pair.code_verifier.len(), 100);
        assert_eq!(pair.code_challenge, generate_code_challenge(&pair.code_verifier));
    }

    #[test]
    fn default_pair_has_43_char_verifier() {
        let pair = generate_default_pkce_pair().unwrap();
        assert_eq!(pair.code_verifier.len(), 43);
        assert_ne!(pair.code_verifier, generate_default_pkce_pair().unwrap().code_verifier);
    }

    #[test]
    fn nonce_is_43_chars_by_default() {
        let nonce = generate_nonce().unwrap();
        assert_eq!(nonce.len(), 43);
        assert!(is_unreserved(&nonce));
        assert_eq!(generate_nonce_with_length(16).unwrap().len(), 22);
    }
}
