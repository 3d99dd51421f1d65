//! OAuth 1.0a request signing for the NuOrder API.
//!
//! The upstream service verifies a non-standard variant of OAuth 1.0a: the
//! base string is `METHOD` + url + `?` + unencoded `k=v` pairs in a fixed
//! order, and the signature is the lowercase hex digest (not base64) of
//! HMAC-SHA1 over it. Signing is kept as pure functions over explicit
//! timestamp/nonce inputs so it can be pinned in tests.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OauthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub oauth_token: String,
    pub oauth_token_secret: String,
}

/// Unix seconds, as a decimal string.
pub fn oauth_timestamp() -> String {
    Utc::now().timestamp().to_string()
}

/// First 16 hex chars of a v4 UUID.
pub fn oauth_nonce() -> String {
    let mut nonce = uuid::Uuid::new_v4().simple().to_string();
    nonce.truncate(16);
    nonce
}

fn oauth_args(
    credentials: &OauthCredentials,
    timestamp: &str,
    nonce: &str,
    additional: &[(String, String)],
) -> Vec<(String, String)> {
    let mut args = vec![
        ("oauth_consumer_key".to_string(), credentials.consumer_key.clone()),
        ("oauth_token".to_string(), credentials.oauth_token.clone()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_version".to_string(), "1.0".to_string()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
    ];
    args.extend(additional.iter().cloned());
    args
}

fn join_args(args: &[(String, String)], separator: &str) -> String {
    args.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(separator)
}

pub fn base_string(
    credentials: &OauthCredentials,
    method: &str,
    url: &str,
    timestamp: &str,
    nonce: &str,
    additional: &[(String, String)],
) -> String {
    let args = oauth_args(credentials, timestamp, nonce, additional);
    format!("{method}{url}?{}", join_args(&args, "&"))
}

pub fn signature(credentials: &OauthCredentials, base_string: &str) -> String {
    let key = format!(
        "{}&{}",
        credentials.consumer_secret, credentials.oauth_token_secret
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base_string.as_bytes());
    let digest = mac.finalize().into_bytes();
    hex_encode(&digest)
}

/// Builds the full `Authorization` header value for one request. The
/// signature is inserted ahead of any additional header args, matching the
/// order the upstream verifier expects.
pub fn authorization_header(
    credentials: &OauthCredentials,
    method: &str,
    url: &str,
    timestamp: &str,
    nonce: &str,
    additional_base_args: &[(String, String)],
    additional_header_args: &[(String, String)],
) -> String {
    let base = base_string(credentials, method, url, timestamp, nonce, additional_base_args);
    let signature = signature(credentials, &base);
    tracing::debug!(%base, %signature, "signed request");

    let mut header_extra = vec![("oauth_signature".to_string(), signature)];
    header_extra.extend(additional_header_args.iter().cloned());
    let args = oauth_args(credentials, timestamp, nonce, &header_extra);
    format!("OAuth {}", join_args(&args, ","))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> OauthCredentials {
        OauthCredentials {
            consumer_key: "key123".to_string(),
            consumer_secret: "secretA".to_string(),
            oauth_token: "tok456".to_string(),
            oauth_token_secret: "secretB".to_string(),
        }
    }

    const TIMESTAMP: &str = "1700000000";
    const NONCE: &str = "abcdef0123456789";
    const URL: &str = "https://wholesale.sandbox1.nuorder.com/api/companies/codes/list";

    #[test]
    fn base_string_has_fixed_arg_order_and_no_encoding() {
        let base = base_string(&credentials(), "GET", URL, TIMESTAMP, NONCE, &[]);
        assert_eq!(
            base,
            "GEThttps://wholesale.sandbox1.nuorder.com/api/companies/codes/list\
             ?oauth_consumer_key=key123&oauth_token=tok456\
             &oauth_timestamp=1700000000&oauth_nonce=abcdef0123456789\
             &oauth_version=1.0&oauth_signature_method=HMAC-SHA1"
        );
    }

    #[test]
    fn signature_is_lowercase_hmac_sha1_hex() {
        let base = base_string(&credentials(), "GET", URL, TIMESTAMP, NONCE, &[]);
        let signature = signature(&credentials(), &base);
        assert_eq!(signature, "75354b6c0542ccc9e2eed043c4cbadd7334cdcde");
    }

    #[test]
    fn header_places_signature_before_additional_args() {
        let header = authorization_header(
            &credentials(),
            "GET",
            URL,
            TIMESTAMP,
            NONCE,
            &[("oauth_callback".to_string(), "oob".to_string())],
            &[("application_name".to_string(), "My app".to_string())],
        );
        assert!(header.starts_with("OAuth oauth_consumer_key=key123,"));
        let signature_at = header.find("oauth_signature=").expect("signature present");
        let app_name_at = header.find("application_name=").expect("app name present");
        assert!(signature_at < app_name_at);
    }

    #[test]
    fn nonce_is_sixteen_hex_chars() {
        let nonce = oauth_nonce();
        assert_eq!(nonce.len(), 16);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
