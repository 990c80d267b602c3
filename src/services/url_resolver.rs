//! URL Resolver for Hideout.
//!
//! Turns raw address bar input into a [`Destination`]: an internal page, a
//! search engine results url, or a direct http(s) url. Pure, no I/O.
//!
//! Classification order:
//! 1. `hideout://<page>` is always an internal page.
//! 2. Relative paths (`/x`, `./x`, `../x`) join against a proxied tab url.
//! 3. Explicit `http://` / `https://` input is a direct url.
//! 4. Input with whitespace or without a `.` is a search query.
//! 5. Everything else is a direct url, `https://` prepended if no scheme.

use url::Url;

use crate::types::errors::ResolutionError;
use crate::types::page::{Destination, InternalPage, INTERNAL_SCHEME};
use crate::types::settings::SearchEngine;

/// Resolves `input` against the chosen search engine and, optionally, the url of
/// the tab it was typed into.
pub fn resolve(
    input: &str,
    engine: SearchEngine,
    tab_url: Option<&str>,
) -> Result<Destination, ResolutionError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ResolutionError::EmptyInput);
    }

    if let Some(name) = input.strip_prefix(INTERNAL_SCHEME) {
        let name = name.trim_end_matches('/');
        return InternalPage::from_name(name)
            .map(Destination::Internal)
            .ok_or_else(|| ResolutionError::UnknownInternalPage(name.to_string()));
    }

    let has_whitespace = input.chars().any(char::is_whitespace);

    if !has_whitespace {
        if let Some(joined) = tab_url.and_then(|base| join_relative(base, input)) {
            return Ok(Destination::Direct(joined));
        }
        if is_http_url(input) {
            return Ok(Destination::Direct(input.to_string()));
        }
    }

    if has_whitespace || !input.contains('.') {
        return Ok(Destination::Search(search_url(engine, input)));
    }

    match explicit_scheme(input) {
        Some(scheme) if scheme == "http" || scheme == "https" => {
            Ok(Destination::Direct(input.to_string()))
        }
        Some(scheme) => Err(ResolutionError::UnsupportedScheme(scheme)),
        None => Ok(Destination::Direct(format!("https://{}", input))),
    }
}

/// Builds the engine's results url for `query`.
pub fn search_url(engine: SearchEngine, query: &str) -> String {
    engine
        .template()
        .replace("%s", &urlencoding::encode(query))
}

/// True for absolute `http://` / `https://` urls.
pub fn is_http_url(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Returns the lowercase scheme when `input` spells one out as `scheme://`.
fn explicit_scheme(input: &str) -> Option<String> {
    let (scheme, _) = input.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}

fn join_relative(base: &str, input: &str) -> Option<String> {
    let relative = (input.starts_with('/') && !input.starts_with("//"))
        || input.starts_with("./")
        || input.starts_with("../");
    if !relative || !is_http_url(base) {
        return None;
    }
    let base = Url::parse(base).ok()?;
    base.join(input).ok().map(String::from)
}
