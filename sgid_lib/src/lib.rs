#[cfg(feature = "url_encoding")]
pub mod url_encoding;

#[cfg(feature = "base64url")]
pub mod base64url;

#[cfg(feature = "url_encoding")]
pub use url_encoding::{encode_form, encode_url_owned};

#[cfg(feature = "base64url")]
pub use base64url::{base64url_decode, base64url_encode};
