//! Digest challenge/response handling
//!
//! The API answers an unauthenticated request with `401` and a
//! `WWW-Authenticate: Digest ...` challenge. We answer it once per request;
//! nothing is cached between requests so the client stays read-only.

use digest_auth::{AuthContext, HttpMethod};
use reqwest::Method;
use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};
use url::Url;

use super::Credentials;
use crate::error::{CoreError, Result};

/// Extract a digest challenge from a 401 response, if the server sent one
pub(crate) fn digest_challenge(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| {
            value
                .get(..6)
                .is_some_and(|scheme| scheme.eq_ignore_ascii_case("digest"))
        })
        .map(str::to_string)
}

/// Compute the `Authorization` header value answering `challenge`
pub(crate) fn authorization(
    challenge: &str,
    credentials: &Credentials,
    method: &Method,
    url: &Url,
    body: Option<&[u8]>,
) -> Result<String> {
    let mut prompt =
        digest_auth::parse(challenge).map_err(|e| CoreError::Auth(e.to_string()))?;

    let uri = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };

    let context = AuthContext::new_with_method(
        credentials.public_key(),
        credentials.private_key(),
        uri.as_str(),
        body,
        HttpMethod::from(method.as_str()),
    );

    let answer = prompt
        .respond(&context)
        .map_err(|e| CoreError::Auth(e.to_string()))?;

    Ok(answer.to_header_string())
}
