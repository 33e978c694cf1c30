use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Credentials;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 strict set: only ALPHA / DIGIT / "-" / "." / "_" / "~" pass through.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Build the `Authorization: OAuth ...` header value for one request, using a
/// fresh nonce and the current time.
///
/// `params` must hold every query/form parameter that participates in the
/// signature. JSON and multipart bodies are not signed, so v2 JSON endpoints
/// and v1.1 media uploads pass only their query parameters here (usually none).
pub fn authorization_header(
    creds: &Credentials,
    method: &str,
    base_url: &str,
    params: &[(String, String)],
) -> String {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    authorization_header_at(creds, method, base_url, params, &nonce, timestamp)
}

/// Deterministic form of [`authorization_header`] with caller-supplied nonce
/// and timestamp.
pub fn authorization_header_at(
    creds: &Credentials,
    method: &str,
    base_url: &str,
    params: &[(String, String)],
    nonce: &str,
    timestamp: u64,
) -> String {
    let oauth_params = oauth_params(creds, nonce, timestamp);
    let signature = sign(creds, method, base_url, params, &oauth_params);

    let mut header_params = oauth_params;
    header_params.push(("oauth_signature".to_string(), signature));
    header_params.sort();

    let joined = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {joined}")
}

fn oauth_params(creds: &Credentials, nonce: &str, timestamp: u64) -> Vec<(String, String)> {
    vec![
        ("oauth_consumer_key".to_string(), creds.consumer_key.clone()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), creds.access_token.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ]
}

fn sign(
    creds: &Credentials,
    method: &str,
    base_url: &str,
    params: &[(String, String)],
    oauth_params: &[(String, String)],
) -> String {
    let base = signature_base_string(method, base_url, params, oauth_params);
    let key = format!(
        "{}&{}",
        encode(&creds.consumer_secret),
        encode(&creds.access_token_secret)
    );

    // Key length is unconstrained for HMAC; new_from_slice cannot fail.
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).unwrap_or_else(|_| unreachable!());
    mac.update(base.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Parameter normalization + base string per RFC 5849 §3.4.1: encode every
/// key and value, sort, join with `&`, then concatenate with the uppercase
/// method and the encoded base URL.
fn signature_base_string(
    method: &str,
    base_url: &str,
    params: &[(String, String)],
    oauth_params: &[(String, String)],
) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .chain(oauth_params.iter())
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    pairs.sort();

    let param_string = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url),
        encode(&param_string)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference request from the X developer docs ("Creating a signature").
    fn docs_credentials() -> Credentials {
        Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            access_token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        }
    }

    const DOCS_NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
    const DOCS_TIMESTAMP: u64 = 1318622958;

    fn docs_params() -> Vec<(String, String)> {
        vec![
            ("include_entities".to_string(), "true".to_string()),
            (
                "status".to_string(),
                "Hello Ladies + Gentlemen, a signed OAuth request!".to_string(),
            ),
        ]
    }

    #[test]
    fn percent_encoding_is_rfc3986_strict() {
        assert_eq!(encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(encode("safe-._~chars"), "safe-._~chars");
        assert_eq!(encode("☃"), "%E2%98%83");
    }

    #[test]
    fn base_string_matches_docs_example() {
        let creds = docs_credentials();
        let oauth = oauth_params(&creds, DOCS_NONCE, DOCS_TIMESTAMP);
        let base = signature_base_string(
            "post",
            "https://api.twitter.com/1.1/statuses/update.json",
            &docs_params(),
            &oauth,
        );
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&\
             include_entities%3Dtrue%26\
             oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26\
             oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26\
             oauth_signature_method%3DHMAC-SHA1%26\
             oauth_timestamp%3D1318622958%26\
             oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26\
             oauth_version%3D1.0%26\
             status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"
        );
    }

    #[test]
    fn signature_matches_docs_example() {
        let creds = docs_credentials();
        let oauth = oauth_params(&creds, DOCS_NONCE, DOCS_TIMESTAMP);
        let sig = sign(
            &creds,
            "POST",
            "https://api.twitter.com/1.1/statuses/update.json",
            &docs_params(),
            &oauth,
        );
        assert_eq!(sig, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn header_carries_all_oauth_fields() {
        let header = authorization_header_at(
            &docs_credentials(),
            "POST",
            "https://api.twitter.com/2/tweets",
            &[],
            DOCS_NONCE,
            DOCS_TIMESTAMP,
        );
        assert!(header.starts_with("OAuth "));
        for field in [
            "oauth_consumer_key=",
            "oauth_nonce=",
            "oauth_signature=",
            "oauth_signature_method=\"HMAC-SHA1\"",
            "oauth_timestamp=\"1318622958\"",
            "oauth_token=",
            "oauth_version=\"1.0\"",
        ] {
            assert!(header.contains(field), "missing {field} in {header}");
        }
    }
}
