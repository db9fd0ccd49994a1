//! Implicit-flow redirect handling
//!
//! The authorize endpoint answers a valid cookie set with a redirect whose
//! fragment carries the access token:
//! `https://playvalorant.com/opt_in#access_token=eyJ...&scope=account&...`.
//! The shape is fixed upstream.

use crate::AuthError;

const ACCESS_TOKEN_MARKER: &str = "access_token=";
const LOGIN_PATH: &str = "/login";

/// Classify an authorize redirect `Location` and pull out the access token.
///
/// Order of checks:
/// 1. a login-page redirect means the cookies aged out
/// 2. no `access_token=` anywhere means there is nothing to extract
/// 3. the token is read from the fragment, up to the next `&`
pub fn access_token_from_location(location: &str) -> Result<String, AuthError> {
    if location.contains(LOGIN_PATH) {
        return Err(AuthError::CookiesExpiredOrInvalid);
    }
    if !location.contains(ACCESS_TOKEN_MARKER) {
        return Err(AuthError::TokenExtractionFailed);
    }

    token_from_fragment(location)
        .map(str::to_string)
        .ok_or(AuthError::TokenExtractionFailed)
}

/// `access_token` parameter of the URI fragment, if present and non-empty
fn token_from_fragment(uri: &str) -> Option<&str> {
    let (_, fragment) = uri.split_once('#')?;
    fragment
        .split('&')
        .find_map(|param| param.strip_prefix(ACCESS_TOKEN_MARKER))
        .filter(|token| !token.is_empty())
}
