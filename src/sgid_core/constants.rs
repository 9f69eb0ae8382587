//! Fixed sgID protocol parameters.

/// Production sgID base URL.
pub const DEFAULT_HOSTNAME: &str = "https://api.id.gov.sg";

/// sgID API version; the issuer carries it as a `/v{N}` suffix.
pub const API_VERSION: u32 = 2;

pub const DEFAULT_SCOPE: &str = "myinfo.name openid";

pub const RESPONSE_TYPE: &str = "code";

pub const CODE_CHALLENGE_METHOD: &str = "S256";

pub const MIN_CODE_VERIFIER_LENGTH: usize = 43;
pub const MAX_CODE_VERIFIER_LENGTH: usize = 128;
pub const DEFAULT_CODE_VERIFIER_LENGTH: usize = 43;

/// 96 random bytes encode to 128 base64url characters, enough for any verifier length.
pub const CODE_VERIFIER_ENTROPY_BYTES: usize = 96;

pub const DEFAULT_NONCE_BYTES: usize = 32;

/// How long fetched signing keys are trusted before the JWKS is fetched again.
pub const JWKS_TTL_SECS: u64 = 600;

/// Minimum gap between fetches triggered by a token naming an unknown `kid`.
pub const JWKS_REFETCH_COOLDOWN_SECS: u64 = 60;
