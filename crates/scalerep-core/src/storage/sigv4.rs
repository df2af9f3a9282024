//! AWS Signature Version 4 for body-less S3 requests.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 of the empty payload.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Headers that must accompany a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: &'static str,
    pub security_token: Option<String>,
}

impl SignedHeaders {
    /// `Name: value` lines ready for a curl header list.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Authorization: {}", self.authorization),
            format!("x-amz-content-sha256: {}", self.content_sha256),
            format!("x-amz-date: {}", self.amz_date),
        ];
        if let Some(token) = &self.security_token {
            lines.push(format!("x-amz-security-token: {}", token));
        }
        lines
    }
}

/// Bytes left unescaped in an S3 canonical path: unreserved characters and `/`.
const S3_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode an S3 object path; `/` is kept.
pub fn uri_encode_path(path: &str) -> String {
    utf8_percent_encode(path, S3_PATH).to_string()
}

fn hmac(key: &[u8], data: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

pub(crate) fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{}", secret).as_bytes(), date);
    let k_region = hmac(&k_date, region);
    let k_service = hmac(&k_region, service);
    hmac(&k_service, "aws4_request")
}

/// Canonical request for a body-less request with no query string.
/// `path` must already be URI-encoded.
pub(crate) fn canonical_request(
    method: &str,
    path: &str,
    host: &str,
    amz_date: &str,
    security_token: Option<&str>,
) -> (String, String) {
    let mut headers = vec![
        ("host", host),
        ("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256),
        ("x-amz-date", amz_date),
    ];
    if let Some(token) = security_token {
        headers.push(("x-amz-security-token", token));
    }
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");
    let request = format!(
        "{}\n{}\n\n{}\n{}\n{}",
        method, path, canonical_headers, signed_headers, EMPTY_PAYLOAD_SHA256
    );
    (request, signed_headers)
}

/// Sign a body-less S3 request at time `now`.
pub fn sign(
    credentials: &Credentials,
    method: &str,
    host: &str,
    path: &str,
    region: &str,
    now: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let scope = format!("{}/{}/s3/aws4_request", date, region);

    let (request, signed_headers) = canonical_request(
        method,
        path,
        host,
        &amz_date,
        credentials.session_token.as_deref(),
    );
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(request.as_bytes()))
    );
    let key = signing_key(&credentials.secret_access_key, &date, region, "s3");
    let signature = hex::encode(hmac(&key, &string_to_sign));

    SignedHeaders {
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
        ),
        amz_date,
        content_sha256: EMPTY_PAYLOAD_SHA256,
        security_token: credentials.session_token.clone(),
    }
}
