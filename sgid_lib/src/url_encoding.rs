use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_encode};

/// Encode set for application/x-www-form-urlencoded values. RFC 3986 unreserved
/// characters pass through untouched so PKCE verifiers and challenges stay readable.
const FORM_URLENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encodes a string for URL safety and returns an owned `String`
///
/// # Example
/// ```
/// use sgid_lib::url_encoding::encode_url_owned;
/// let encoded = encode_url_owned("myinfo.name openid");
/// assert_eq!(encoded, "myinfo.name%20openid");
/// ```
pub fn encode_url_owned(input: &str) -> String {
    percent_encode(input.as_bytes(), FORM_URLENCODE_SET).to_string()
}

/// Joins key/value pairs into a `k=v&k=v` string, encoding both sides.
///
/// Used for authorization query strings and form-encoded token requests alike.
///
/// # Example
/// ```
/// use sgid_lib::url_encoding::encode_form;
/// let body = encode_form(&[("grant_type", "authorization_code"), ("code", "a b")]);
/// assert_eq!(body, "grant_type=authorization_code&code=a%20b");
/// ```
pub fn encode_form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode_url_owned(k), encode_url_owned(v)))
        .collect::<Vec<_>>()
        .join("&")
}
