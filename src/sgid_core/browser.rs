//! PKCE helpers for `wasm32` and other targets without `ring`.
//!
//! Randomness comes from `getrandom` (the `js` backend in browsers) and hashing
//! from `sha2`. Output is identical to [`super::pkce`] for the same verifier.

use sha2::{Digest, Sha256};
use sgid_lib::base64url_encode;

use super::constants::{CODE_VERIFIER_ENTROPY_BYTES, DEFAULT_CODE_VERIFIER_LENGTH, DEFAULT_NONCE_BYTES};
use super::error::SgidError;
use super::types::{PkcePair, check_verifier_length};

pub fn generate_code_verifier(length: usize) -> Result<String, SgidError> {
    check_verifier_length(length)?;
    let mut bytes = [0u8; CODE_VERIFIER_ENTROPY_BYTES];
    getrandom::getrandom(&mut bytes).map_err(|_| SgidError::Rng)?;
    let mut verifier = base64url_encode(&bytes);
    verifier.truncate(length);
    Ok(verifier)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    base64url_encode(&hash)
}

pub fn generate_pkce_pair(length: usize) -> Result<PkcePair, SgidError> {
    check_verifier_length(length)?;
    let code_verifier = generate_code_verifier(length)?;
    let code_challenge = generate_code_challenge(&code_verifier);
    Ok(PkcePair { code_verifier, code_challenge })
}

pub fn generate_default_pkce_pair() -> Result<PkcePair, SgidError> {
    generate_pkce_pair(DEFAULT_CODE_VERIFIER_LENGTH)
}

pub fn generate_nonce() -> Result<String, SgidError> {
    generate_nonce_with_length(DEFAULT_NONCE_BYTES)
}

pub fn generate_nonce_with_length(bytes: usize) -> Result<String, SgidError> {
    let mut buf = vec![0u8; bytes];
    getrandom::getrandom(&mut buf).map_err(|_| SgidError::Rng)?;
    Ok(base64url_encode(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn challenge_matches_ring_variant() {
        use crate::sgid_core::pkce;

        for length in [43, 77, 128] {
            let verifier = generate_code_verifier(length).unwrap();
            assert_eq!(
                generate_code_challenge(&verifier),
                pkce::generate_code_challenge(&verifier)
            );
        }
    }

    #[test]
    fn rfc7636_appendix_b_vector() {
        assert_eq!(
            generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn rejects_invalid_lengths() {
        assert!(matches!(
            generate_code_verifier(42),
            Err(SgidError::InvalidPkceLength { length: 42 })
        ));
        assert!(generate_pkce_pair(129).is_err());
    }

    #[test]
    fn default_pair_is_consistent() {
        let pair = generate_default_pkce_pair().unwrap();
        assert_eq!(pair.code_verifier.len(), 43);
        assert_eq!(pair.code_challenge, generate_code_challenge(&pair.code_verifier));
    }

    #[test]
    fn nonce_is_unpadded_base64url() {
        let nonce = generate_nonce().unwrap();
        assert_eq!(nonce.len(), 43);
        assert!(!nonce.contains('='));
        assert_eq!(generate_nonce_with_length(16).unwrap().len(), 22);
    }
}
