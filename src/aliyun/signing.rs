//! Request signing for the Alibaba Cloud OpenAPI (RPC-style, ACS3-HMAC-SHA256).
//!
//! Grounded on the general shape of AWS SigV4 signing seen in the driver
//! crate's credentials module (canonical request -> string to sign -> HMAC),
//! adapted to Aliyun's simpler flat-query-parameter RPC scheme.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::AliyunCredentials;

type HmacSha256 = Hmac<Sha256>;

/// Signs an RPC-style request by appending `Signature` to `params` and
/// returning the final, percent-encoded query string. `params` must already
/// contain every other required parameter (`Action`, `Version`, `AccessKeyId`,
/// `Timestamp`, `SignatureNonce`, etc.) except `Signature` itself.
pub fn sign_request(method: &str, credentials: &AliyunCredentials, params: &mut Vec<(String, String)>) -> String {
    params.retain(|(k, _)| k != "Signature");
    params.sort_by(|a, b| a.0.cmp(&b.0));

    let canonicalized = params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let string_to_sign = format!(
        "{}&{}&{}",
        method,
        percent_encode("/"),
        percent_encode(&canonicalized)
    );

    let key = format!("{}&", credentials.access_key_secret);
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("hmac accepts any key length");
    mac.update(string_to_sign.as_bytes());
    let signature = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, mac.finalize().into_bytes());

    params.push(("Signature".to_string(), signature));
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encodes per Aliyun's RFC3986 profile (space encodes to `%20`,
/// not `+`; `~` is left unescaped).
fn percent_encode(s: &str) -> String {
    const FRAGMENT: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
        .remove(b'-')
        .remove(b'_')
        .remove(b'.')
        .remove(b'~');
    percent_encoding::utf8_percent_encode(s, FRAGMENT).to_string()
}

/// A random, 32-character idempotence token for create calls, matching the
/// `ClientToken` field every `Create*Request` carries in the original SDK.
pub fn idempotence_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> AliyunCredentials {
        AliyunCredentials { access_key_id: "keyid".to_string(), access_key_secret: "keysecret".to_string() }
    }

    #[test]
    fn signing_is_deterministic_for_the_same_params() {
        let mut params_a = vec![("Foo".to_string(), "bar".to_string()), ("Action".to_string(), "DescribeVpcs".to_string())];
        let mut params_b = params_a.clone();

        let query_a = sign_request("GET", &creds(), &mut params_a);
        let query_b = sign_request("GET", &creds(), &mut params_b);

        assert_eq!(query_a, query_b);
    }

    #[test]
    fn signing_is_order_independent_on_input_params() {
        let mut forward = vec![("Action".to_string(), "DescribeVpcs".to_string()), ("Foo".to_string(), "bar".to_string())];
        let mut reversed = vec![("Foo".to_string(), "bar".to_string()), ("Action".to_string(), "DescribeVpcs".to_string())];

        let query_forward = sign_request("GET", &creds(), &mut forward);
        let query_reversed = sign_request("GET", &creds(), &mut reversed);

        assert_eq!(query_forward, query_reversed);
    }

    #[test]
    fn sign_request_drops_any_preexisting_signature_param() {
        let mut params = vec![("Signature".to_string(), "stale".to_string()), ("Action".to_string(), "X".to_string())];
        let query = sign_request("GET", &creds(), &mut params);

        assert_eq!(query.matches("Signature=").count(), 1);
        assert!(!query.contains("Signature=stale"));
    }

    #[test]
    fn sign_request_appends_exactly_one_signature_param() {
        let mut params = vec![("Action".to_string(), "DescribeVpcs".to_string())];
        let query = sign_request("GET", &creds(), &mut params);

        assert!(query.contains("Signature="));
        assert!(params.iter().any(|(k, _)| k == "Signature"));
    }

    #[test]
    fn percent_encode_keeps_unreserved_characters_literal() {
        assert_eq!(percent_encode("abc-_.~123"), "abc-_.~123");
    }

    #[test]
    fn percent_encode_escapes_reserved_characters() {
        assert_eq!(percent_encode("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn idempotence_token_is_a_32_character_hex_string() {
        let token = idempotence_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn idempotence_token_varies_between_calls() {
        assert_ne!(idempotence_token(), idempotence_token());
    }
}
