//! Twilio request signature verification
//!
//! Twilio signs every webhook with `X-Twilio-Signature`: the base64 HMAC-SHA1,
//! keyed with the account auth token, of the full request URL followed by each
//! form parameter's name and value, sorted by name.
//!
//! JSON bodies are not folded into the signed string. Instead Twilio appends a
//! `bodySHA256` query parameter (hex SHA-256 of the raw body) to the URL, so
//! the URL signature covers the body hash and the hash covers the body.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::payload::WebhookParams;
use crate::errors::signature_error::{SignatureError, SignatureResult};

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the request signature
pub const SIGNATURE_HEADER: &str = "X-Twilio-Signature";

/// Query parameter carrying the body hash for JSON requests
pub const BODY_HASH_PARAM: &str = "bodySHA256";

/// How the signed string is built from the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedBody {
    /// Form parameters are appended to the URL
    Form,
    /// The body is bound through the `bodySHA256` query parameter
    Json,
}

impl SignedBody {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.to_ascii_lowercase().starts_with("application/json") => Self::Json,
            _ => Self::Form,
        }
    }
}

/// Compute the expected signature for `url` and form `params`.
pub fn compute_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
) -> SignatureResult<String> {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes())
        .map_err(|e| SignatureError::ConfigError(format!("HMAC initialization failed: {e}")))?;
    mac.update(url.as_bytes());
    for (name, value) in sorted {
        mac.update(name.as_bytes());
        mac.update(value.as_bytes());
    }

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Hex SHA-256 of a raw body, as Twilio puts it in `bodySHA256`.
pub fn body_sha256(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Verify a webhook request.
///
/// `url` must be the public URL Twilio called, query string included.
pub fn verify_request(
    auth_token: &str,
    url: &str,
    signed_body: SignedBody,
    body: &[u8],
    signature: Option<&str>,
) -> SignatureResult<()> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingSignature)?;

    let expected = match signed_body {
        SignedBody::Form => {
            let params = WebhookParams::from_form(body);
            compute_signature(auth_token, url, &params.0)?
        }
        SignedBody::Json => {
            verify_body_hash(url, body)?;
            compute_signature(auth_token, url, &[])?
        }
    };

    if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
        Ok(())
    } else {
        Err(SignatureError::InvalidSignature)
    }
}

fn verify_body_hash(url: &str, body: &[u8]) -> SignatureResult<()> {
    let parsed = url::Url::parse(url)
        .map_err(|e| SignatureError::InvalidRequest(format!("Invalid webhook URL: {e}")))?;
    let claimed = parsed
        .query_pairs()
        .find(|(name, _)| name == BODY_HASH_PARAM)
        .map(|(_, value)| value.into_owned());

    match claimed {
        Some(claimed) => {
            let actual = body_sha256(body);
            if bool::from(actual.as_bytes().ct_eq(claimed.to_ascii_lowercase().as_bytes())) {
                Ok(())
            } else {
                Err(SignatureError::BodyHashMismatch)
            }
        }
        None if body.is_empty() => Ok(()),
        None => Err(SignatureError::BodyHashMismatch),
    }
}
