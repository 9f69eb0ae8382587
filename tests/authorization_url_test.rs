mod common;

use std::collections::HashMap;

use common::*;
use sgid_client::{
    AuthorizationUrlParams, ClientConfig, NonceParam, Scopes, SgidError, generate_code_challenge,
    generate_pkce_pair,
};
use url::Url;

fn query_of(url: &str) -> HashMap<String, String> {
    Url::parse(url).unwrap().query_pairs().into_owned().collect()
}

#[test]
fn default_url_has_all_eight_params() {
    let (client, _) = mock_client(config());
    let result = client
        .authorization_url(AuthorizationUrlParams::new("mockState", "mockCodeChallenge"))
        .unwrap();

    assert!(result.url.starts_with(&format!("{}?", AUTHORIZATION_ENDPOINT)));
    let query = query_of(&result.url);
    assert_eq!(query.len(), 8);
    assert_eq!(query["client_id"], CLIENT_ID);
    assert_eq!(query["scope"], "myinfo.name openid");
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["redirect_uri"], REDIRECT_URI);
    assert_eq!(query["state"], "mockState");
    assert_eq!(query["code_challenge"], "mockCodeChallenge");
    assert_eq!(query["code_challenge_method"], "S256");

    let nonce = result.nonce.expect("nonce returned");
    assert_eq!(nonce.len(), 43);
    assert_eq!(query["nonce"], nonce);
}

#[test]
fn generated_nonces_differ_between_calls() {
    let (client, _) = mock_client(config());
    let a = client.authorization_url(AuthorizationUrlParams::new("s", "c")).unwrap();
    let b = client.authorization_url(AuthorizationUrlParams::new("s", "c")).unwrap();
    assert_ne!(a.nonce, b.nonce);
}

#[test]
fn omitted_nonce_leaves_seven_params() {
    let (client, _) = mock_client(config());
    let result = client
        .authorization_url(AuthorizationUrlParams::new("mockState", "mockCodeChallenge").nonce(NonceParam::Omit))
        .unwrap();

    let query = query_of(&result.url);
    assert_eq!(query.len(), 7);
    assert!(!query.contains_key("nonce"));
    assert!(result.nonce.is_none());
}

#[test]
fn caller_supplied_nonce_is_used() {
    let (client, _) = mock_client(config());
    let result = client
        .authorization_url(
            AuthorizationUrlParams::new("mockState", "mockCodeChallenge").nonce(NonceParam::Use(NONCE.to_string())),
        )
        .unwrap();
    assert_eq!(result.nonce.as_deref(), Some(NONCE));
    assert_eq!(query_of(&result.url)["nonce"], NONCE);
}

#[test]
fn scope_list_is_space_joined() {
    let (client, _) = mock_client(config());
    let result = client
        .authorization_url(
            AuthorizationUrlParams::new("mockState", "mockCodeChallenge")
                .scope(vec!["openid", "myinfo.name", "myinfo.mobile_number"]),
        )
        .unwrap();
    assert_eq!(query_of(&result.url)["scope"], "openid myinfo.name myinfo.mobile_number");

    let result = client
        .authorization_url(AuthorizationUrlParams::new("mockState", "mockCodeChallenge").scope("openid  myinfo.sex"))
        .unwrap();
    assert_eq!(query_of(&result.url)["scope"], Scopes::from("openid myinfo.sex").to_query_value());
}

#[test]
fn first_registered_redirect_uri_is_default() {
    let config = ClientConfig::new(CLIENT_ID, CLIENT_SECRET, CLIENT_KEY_PKCS8)
        .with_hostname(HOSTNAME)
        .with_redirect_uris(["https://sgid.com/first", "https://sgid.com/second"]);
    let (client, _) = mock_client(config);
    let result = client.authorization_url(AuthorizationUrlParams::new("s", "c")).unwrap();
    assert_eq!(query_of(&result.url)["redirect_uri"], "https://sgid.com/first");
}

#[test]
fn missing_redirect_uri_is_rejected() {
    let config = ClientConfig::new(CLIENT_ID, CLIENT_SECRET, CLIENT_KEY_PKCS8).with_hostname(HOSTNAME);
    let (client, _) = mock_client(config);

    let err = client
        .authorization_url(AuthorizationUrlParams::new("mockState", "mockCodeChallenge"))
        .unwrap_err();
    assert!(matches!(err, SgidError::MissingRedirectUri));
    assert!(err.to_string().contains("redirect URI"));

    let ok = client.authorization_url(
        AuthorizationUrlParams::new("mockState", "mockCodeChallenge").redirect_uri(REDIRECT_URI),
    );
    assert!(ok.is_ok());
}

#[test]
fn missing_code_challenge_is_rejected() {
    let (client, _) = mock_client(config());
    let params = AuthorizationUrlParams { state: "mockState".to_string(), ..Default::default() };
    assert!(matches!(client.authorization_url(params), Err(SgidError::MissingCodeChallenge)));
}

#[test]
fn pkce_pair_challenge_round_trips_through_url() {
    let (client, _) = mock_client(config());
    let pair = generate_pkce_pair(64).unwrap();
    let result = client
        .authorization_url(AuthorizationUrlParams::new("mockState", &pair.code_challenge))
        .unwrap();
    let query = query_of(&result.url);
    assert_eq!(query["code_challenge"], generate_code_challenge(&pair.code_verifier));
    assert!(!result.url.contains(&pair.code_verifier));
}

#[test]
fn state_is_percent_encoded() {
    let (client, _) = mock_client(config());
    let result = client
        .authorization_url(AuthorizationUrlParams::new("a b&c=d", "c"))
        .unwrap();
    assert!(result.url.contains("state=a%20b%26c%3Dd"));
    assert_eq!(query_of(&result.url)["state"], "a b&c=d");
}

#[test]
fn building_urls_makes_no_requests() {
    let (client, http) = mock_client(config());
    client.authorization_url(AuthorizationUrlParams::new("s", "c")).unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    assert!(rt.block_on(http.requests()).is_empty());
}
