//! Compact JWE (RFC 7516) for the algorithms sgID uses.
//!
//! Key management: RSA-OAEP-256, dir, A128KW/A192KW/A256KW and
//! A128GCMKW/A192GCMKW/A256GCMKW (RFC 7518 §4.3, §4.4, §4.5, §4.7).
//! Content encryption: A128GCM/A192GCM/A256GCM (RFC 7518 §5.3), with the
//! protected header segment as additional authenticated data.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, OsRng, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, KeyInit, Nonce};
use aes_kw::{KekAes128, KekAes192, KekAes256};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sgid_lib::{base64url_decode, base64url_encode};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

type Aes192Gcm = AesGcm<aes_gcm::aes::Aes192, U12>;

const GCM_IV_LENGTH: usize = 12;
const GCM_TAG_LENGTH: usize = 16;
/// AES-KW prepends one 64-bit integrity block.
const AES_KW_OVERHEAD: usize = 8;

#[derive(Debug, Error)]
pub enum JweError {
    #[error("malformed JWE: {0}")]
    Format(String),
    #[error("unsupported JWE algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("key does not fit algorithm {0}")]
    KeyMismatch(&'static str),
    #[error("invalid JWK: {0}")]
    InvalidJwk(String),
    #[error("JWE decryption failed")]
    Decryption,
    #[error("JWE encryption failed: {0}")]
    Encryption(String),
}

/// `alg` header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyManagement {
    RsaOaep256,
    Dir,
    A128Kw,
    A192Kw,
    A256Kw,
    A128GcmKw,
    A192GcmKw,
    A256GcmKw,
}

impl KeyManagement {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "RSA-OAEP-256" => Self::RsaOaep256,
            "dir" => Self::Dir,
            "A128KW" => Self::A128Kw,
            "A192KW" => Self::A192Kw,
            "A256KW" => Self::A256Kw,
            "A128GCMKW" => Self::A128GcmKw,
            "A192GCMKW" => Self::A192GcmKw,
            "A256GCMKW" => Self::A256GcmKw,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::RsaOaep256 => "RSA-OAEP-256",
            Self::Dir => "dir",
            Self::A128Kw => "A128KW",
            Self::A192Kw => "A192KW",
            Self::A256Kw => "A256KW",
            Self::A128GcmKw => "A128GCMKW",
            Self::A192GcmKw => "A192GCMKW",
            Self::A256GcmKw => "A256GCMKW",
        }
    }

    /// Required key-encryption-key length for the AES based algorithms.
    fn kek_len(self) -> Option<usize> {
        match self {
            Self::A128Kw | Self::A128GcmKw => Some(16),
            Self::A192Kw | Self::A192GcmKw => Some(24),
            Self::A256Kw | Self::A256GcmKw => Some(32),
            Self::RsaOaep256 | Self::Dir => None,
        }
    }
}

/// `enc` header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncryption {
    A128Gcm,
    A192Gcm,
    A256Gcm,
}

impl ContentEncryption {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "A128GCM" => Self::A128Gcm,
            "A192GCM" => Self::A192Gcm,
            "A256GCM" => Self::A256Gcm,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
        }
    }

    pub fn key_len(self) -> usize {
        match self {
            Self::A128Gcm => 16,
            Self::A192Gcm => 24,
            Self::A256Gcm => 32,
        }
    }
}

/// Symmetric key material, imported from an `oct` JWK.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: Zeroizing<Vec<u8>>,
    alg: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct OctJwk {
    kty: String,
    k: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alg: Option<String>,
}

impl SymmetricKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SymmetricKey { bytes: Zeroizing::new(bytes.into()), alg: None }
    }

    /// Parse and import a JSON-serialized `oct` JWK.
    pub fn from_jwk_json(json: &[u8]) -> Result<Self, JweError> {
        let jwk: OctJwk =
            serde_json::from_slice(json).map_err(|e| JweError::InvalidJwk(e.to_string()))?;
        if jwk.kty != "oct" {
            return Err(JweError::InvalidJwk(format!("expected kty oct, got {}", jwk.kty)));
        }
        let bytes = Zeroizing::new(
            base64url_decode(&jwk.k).map_err(|e| JweError::InvalidJwk(e.to_string()))?,
        );
        if bytes.is_empty() {
            return Err(JweError::InvalidJwk("empty key".to_string()));
        }
        Ok(SymmetricKey { bytes, alg: jwk.alg })
    }

    /// Serialize as an `oct` JWK.
    pub fn to_jwk_json(&self) -> Result<String, JweError> {
        let jwk = OctJwk {
            kty: "oct".to_string(),
            k: base64url_encode(&self.bytes),
            alg: self.alg.clone(),
        };
        serde_json::to_string(&jwk).map_err(|e| JweError::Encryption(e.to_string()))
    }

    pub fn with_alg(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    pub fn alg(&self) -> Option<&str> {
        self.alg.as_deref()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("len", &self.bytes.len())
            .field("alg", &self.alg)
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum DecryptionKey<'a> {
    Rsa(&'a RsaPrivateKey),
    Symmetric(&'a SymmetricKey),
}

#[derive(Debug, Clone, Copy)]
pub enum EncryptionKey<'a> {
    Rsa(&'a RsaPublicKey),
    Symmetric(&'a SymmetricKey),
}

#[derive(Debug, Serialize, Deserialize)]
struct ProtectedHeader {
    alg: String,
    enc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zip: Option<String>,
    /// GCMKW key-wrap IV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iv: Option<String>,
    /// GCMKW key-wrap tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
}

fn decode_part(part: &str, name: &str) -> Result<Vec<u8>, JweError> {
    base64url_decode(part).map_err(|e| JweError::Format(format!("{}: {}", name, e)))
}

/// Decrypt a compact JWE, returning the plaintext bytes.
pub fn decrypt(jwe: &str, key: DecryptionKey<'_>) -> Result<Vec<u8>, JweError> {
    let parts: Vec<&str> = jwe.trim().split('.').collect();
    if parts.len() != 5 {
        return Err(JweError::Format(format!("expected 5 parts, got {}", parts.len())));
    }
    let header_b64 = parts[0];
    let header: ProtectedHeader = serde_json::from_slice(&decode_part(header_b64, "header")?)
        .map_err(|e| JweError::Format(e.to_string()))?;
    if let Some(zip) = header.zip {
        return Err(JweError::UnsupportedAlgorithm(format!("zip {}", zip)));
    }
    let alg = KeyManagement::from_name(&header.alg)
        .ok_or_else(|| JweError::UnsupportedAlgorithm(header.alg.clone()))?;
    let enc = ContentEncryption::from_name(&header.enc)
        .ok_or_else(|| JweError::UnsupportedAlgorithm(header.enc.clone()))?;

    let encrypted_key = decode_part(parts[1], "encrypted key")?;
    let cek: Zeroizing<Vec<u8>> = match (alg, key) {
        (KeyManagement::RsaOaep256, DecryptionKey::Rsa(private_key)) => Zeroizing::new(
            private_key
                .decrypt(Oaep::new::<Sha256>(), &encrypted_key)
                .map_err(|_| JweError::Decryption)?,
        ),
        (KeyManagement::Dir, DecryptionKey::Symmetric(k)) => {
            if !encrypted_key.is_empty() {
                return Err(JweError::Format("dir must not carry an encrypted key".to_string()));
            }
            Zeroizing::new(k.as_bytes().to_vec())
        }
        (KeyManagement::A128Kw | KeyManagement::A192Kw | KeyManagement::A256Kw, DecryptionKey::Symmetric(k)) => {
            check_kek(alg, k)?;
            aes_kw_unwrap(k.as_bytes(), &encrypted_key)?
        }
        (
            KeyManagement::A128GcmKw | KeyManagement::A192GcmKw | KeyManagement::A256GcmKw,
            DecryptionKey::Symmetric(k),
        ) => {
            check_kek(alg, k)?;
            let iv = decode_part(header.iv.as_deref().unwrap_or_default(), "header iv")?;
            let tag = decode_part(header.tag.as_deref().unwrap_or_default(), "header tag")?;
            Zeroizing::new(gcm_open(k.as_bytes(), &iv, &encrypted_key, &tag, b"")?)
        }
        _ => return Err(JweError::KeyMismatch(alg.name())),
    };
    if cek.len() != enc.key_len() {
        return Err(JweError::Decryption);
    }

    let iv = decode_part(parts[2], "iv")?;
    let ciphertext = decode_part(parts[3], "ciphertext")?;
    let tag = decode_part(parts[4], "tag")?;
    gcm_open(&cek, &iv, &ciphertext, &tag, header_b64.as_bytes())
}

/// Encrypt `plaintext` into a compact JWE.
pub fn encrypt(
    plaintext: &[u8],
    key: EncryptionKey<'_>,
    alg: KeyManagement,
    enc: ContentEncryption,
) -> Result<String, JweError> {
    let mut header = ProtectedHeader {
        alg: alg.name().to_string(),
        enc: enc.name().to_string(),
        zip: None,
        iv: None,
        tag: None,
    };

    let (cek, encrypted_key) = match (alg, key) {
        (KeyManagement::RsaOaep256, EncryptionKey::Rsa(public_key)) => {
            let cek = random_key(enc.key_len())?;
            let wrapped = public_key
                .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &cek)
                .map_err(|e| JweError::Encryption(e.to_string()))?;
            (cek, wrapped)
        }
        (KeyManagement::Dir, EncryptionKey::Symmetric(k)) => {
            if k.as_bytes().len() != enc.key_len() {
                return Err(JweError::KeyMismatch(enc.name()));
            }
            (Zeroizing::new(k.as_bytes().to_vec()), Vec::new())
        }
        (KeyManagement::A128Kw | KeyManagement::A192Kw | KeyManagement::A256Kw, EncryptionKey::Symmetric(k)) => {
            check_kek(alg, k)?;
            let cek = random_key(enc.key_len())?;
            let wrapped = aes_kw_wrap(k.as_bytes(), &cek)?;
            (cek, wrapped)
        }
        (
            KeyManagement::A128GcmKw | KeyManagement::A192GcmKw | KeyManagement::A256GcmKw,
            EncryptionKey::Symmetric(k),
        ) => {
            check_kek(alg, k)?;
            let cek = random_key(enc.key_len())?;
            let iv = random_iv()?;
            let (wrapped, tag) = gcm_seal(k.as_bytes(), &iv, &cek, b"")?;
            header.iv = Some(base64url_encode(&iv));
            header.tag = Some(base64url_encode(&tag));
            (cek, wrapped)
        }
        _ => return Err(JweError::KeyMismatch(alg.name())),
    };

    let header_json =
        serde_json::to_vec(&header).map_err(|e| JweError::Encryption(e.to_string()))?;
    let header_b64 = base64url_encode(&header_json);
    let iv = random_iv()?;
    let (ciphertext, tag) = gcm_seal(&cek, &iv, plaintext, header_b64.as_bytes())?;

    Ok(format!(
        "{}.{}.{}.{}.{}",
        header_b64,
        base64url_encode(&encrypted_key),
        base64url_encode(&iv),
        base64url_encode(&ciphertext),
        base64url_encode(&tag)
    ))
}

fn check_kek(alg: KeyManagement, key: &SymmetricKey) -> Result<(), JweError> {
    match alg.kek_len() {
        Some(len) if len == key.as_bytes().len() => Ok(()),
        _ => Err(JweError::KeyMismatch(alg.name())),
    }
}

fn random_key(len: usize) -> Result<Zeroizing<Vec<u8>>, JweError> {
    let mut cek = Zeroizing::new(vec![0u8; len]);
    getrandom::getrandom(&mut cek).map_err(|e| JweError::Encryption(format!("RNG failed: {}", e)))?;
    Ok(cek)
}

fn random_iv() -> Result<[u8; GCM_IV_LENGTH], JweError> {
    let mut iv = [0u8; GCM_IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| JweError::Encryption(format!("RNG failed: {}", e)))?;
    Ok(iv)
}

fn aes_kw_unwrap(kek: &[u8], wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>, JweError> {
    if wrapped.len() < 2 * AES_KW_OVERHEAD || wrapped.len() % AES_KW_OVERHEAD != 0 {
        return Err(JweError::Decryption);
    }
    let mut out = Zeroizing::new(vec![0u8; wrapped.len() - AES_KW_OVERHEAD]);
    let result = match kek.len() {
        16 => KekAes128::from(to_array::<16>(kek)?).unwrap(wrapped, &mut out),
        24 => KekAes192::from(to_array::<24>(kek)?).unwrap(wrapped, &mut out),
        32 => KekAes256::from(to_array::<32>(kek)?).unwrap(wrapped, &mut out),
        _ => return Err(JweError::KeyMismatch("AES-KW")),
    };
    result.map_err(|_| JweError::Decryption)?;
    Ok(out)
}

fn aes_kw_wrap(kek: &[u8], cek: &[u8]) -> Result<Vec<u8>, JweError> {
    let mut out = vec![0u8; cek.len() + AES_KW_OVERHEAD];
    let result = match kek.len() {
        16 => KekAes128::from(to_array::<16>(kek)?).wrap(cek, &mut out),
        24 => KekAes192::from(to_array::<24>(kek)?).wrap(cek, &mut out),
        32 => KekAes256::from(to_array::<32>(kek)?).wrap(cek, &mut out),
        _ => return Err(JweError::KeyMismatch("AES-KW")),
    };
    result.map_err(|e| JweError::Encryption(format!("AES-KW wrap failed: {:?}", e)))?;
    Ok(out)
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], JweError> {
    <[u8; N]>::try_from(bytes).map_err(|_| JweError::KeyMismatch("AES"))
}

fn gcm_open(key: &[u8], iv: &[u8], ciphertext: &[u8], tag: &[u8], aad: &[u8]) -> Result<Vec<u8>, JweError> {
    if iv.len() != GCM_IV_LENGTH || tag.len() != GCM_TAG_LENGTH {
        return Err(JweError::Decryption);
    }
    let mut msg = ciphertext.to_vec();
    msg.extend_from_slice(tag);
    match key.len() {
        16 => open_with::<Aes128Gcm>(key, iv, &msg, aad),
        24 => open_with::<Aes192Gcm>(key, iv, &msg, aad),
        32 => open_with::<Aes256Gcm>(key, iv, &msg, aad),
        _ => Err(JweError::Decryption),
    }
}

fn open_with<C: KeyInit + Aead<NonceSize = U12>>(
    key: &[u8],
    iv: &[u8],
    msg: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, JweError> {
    let cipher = C::new_from_slice(key).map_err(|_| JweError::Decryption)?;
    cipher
        .decrypt(Nonce::from_slice(iv), Payload { msg, aad })
        .map_err(|_| JweError::Decryption)
}

/// Returns `(ciphertext, tag)`.
fn gcm_seal(key: &[u8], iv: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<(Vec<u8>, Vec<u8>), JweError> {
    let mut sealed = match key.len() {
        16 => seal_with::<Aes128Gcm>(key, iv, plaintext, aad),
        24 => seal_with::<Aes192Gcm>(key, iv, plaintext, aad),
        32 => seal_with::<Aes256Gcm>(key, iv, plaintext, aad),
        _ => Err(JweError::KeyMismatch("AES-GCM")),
    }?;
    let tag = sealed.split_off(sealed.len() - GCM_TAG_LENGTH);
    Ok((sealed, tag))
}

fn seal_with<C: KeyInit + Aead<NonceSize = U12>>(
    key: &[u8],
    iv: &[u8],
    msg: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, JweError> {
    let cipher = C::new_from_slice(key).map_err(|e| JweError::Encryption(format!("AES-GCM init: {:?}", e)))?;
    cipher
        .encrypt(Nonce::from_slice(iv), Payload { msg, aad })
        .map_err(|e| JweError::Encryption(format!("AES-GCM encrypt: {:?}", e)))
}
