//! Wire ⇄ typed conversion for search parameters.
//!
//! Decoding is total for list fields: unknown tokens are dropped. Scalars
//! are strict: anything present but unusable is a [`ValidationError`].
//! Empty scalar values (`time_range=`) count as absent, which is how
//! HTML forms submit unset options.

use url::form_urlencoded;

use crate::query::locale::is_valid_locale;
use crate::query::params::*;

/// A query field could not be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid `{field}`: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Last value given for `name`, if any.
fn lookup<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn scalar<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    lookup(pairs, name).map(str::trim).filter(|v| !v.is_empty())
}

/// Split, trim, drop empty or unknown tokens, collapse duplicates keeping the first.
pub fn decode_list(raw: &str, vocabulary: Option<&[&str]>) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some(allowed) = vocabulary {
            if !allowed.contains(&token) {
                tracing::trace!(token, "Dropping unknown list token");
                continue;
            }
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

pub fn encode_list(tokens: &[String]) -> String {
    tokens.join(",")
}

fn list_or(
    pairs: &[(String, String)],
    name: &str,
    vocabulary: Option<&[&str]>,
    default: &[&str],
) -> Vec<String> {
    match lookup(pairs, name) {
        Some(raw) => decode_list(raw, vocabulary),
        None => default.iter().map(|t| t.to_string()).collect(),
    }
}

fn integer(
    pairs: &[(String, String)],
    field: &'static str,
    min: i64,
    max: Option<i64>,
    default: i64,
) -> Result<i64, ValidationError> {
    let Some(raw) = scalar(pairs, field) else {
        return Ok(default);
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| ValidationError::new(field, format!("`{raw}` is not an integer")))?;
    if value < min {
        return Err(ValidationError::new(field, format!("must be at least {min}")));
    }
    if let Some(max) = max {
        if value > max {
            return Err(ValidationError::new(field, format!("must be at most {max}")));
        }
    }
    Ok(value)
}

fn choice(
    pairs: &[(String, String)],
    field: &'static str,
    allowed: &[&str],
) -> Result<Option<String>, ValidationError> {
    match scalar(pairs, field) {
        None => Ok(None),
        Some(raw) if allowed.contains(&raw) => Ok(Some(raw.to_string())),
        Some(raw) => Err(ValidationError::new(
            field,
            format!("`{raw}` is not one of {}", allowed.join(", ")),
        )),
    }
}

fn boolean(pairs: &[(String, String)], field: &'static str) -> Result<bool, ValidationError> {
    match scalar(pairs, field).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "on" | "yes") => Ok(true),
        Some("0" | "false" | "off" | "no") => Ok(false),
        Some(other) => Err(ValidationError::new(field, format!("`{other}` is not a boolean"))),
    }
}

/// Decode wire pairs into typed parameters.
pub fn decode(pairs: &[(String, String)]) -> Result<SearchParams, ValidationError> {
    let q = scalar(pairs, "q")
        .ok_or_else(|| ValidationError::new("q", "a search query is required"))?
        .to_string();

    let language = match scalar(pairs, "language") {
        None => DEFAULT_LANGUAGE.to_string(),
        Some(raw) if is_valid_locale(raw) => raw.to_string(),
        Some(raw) => {
            return Err(ValidationError::new(
                "language",
                format!("`{raw}` is not a locale"),
            ))
        }
    };

    // Bounds below keep the casts lossless.
    let pageno = integer(pairs, "pageno", MIN_PAGENO as i64, Some(u32::MAX as i64), 1)? as u32;
    let safesearch = integer(pairs, "safesearch", 0, Some(MAX_SAFESEARCH as i64), 0)? as u8;
    let results_on_new_tab = integer(pairs, "results_on_new_tab", 0, Some(1), 0)? == 1;

    Ok(SearchParams {
        q,
        categories: list_or(pairs, "categories", Some(CATEGORIES), &[]),
        engines: list_or(pairs, "engines", None, &[]),
        language,
        pageno,
        time_range: choice(pairs, "time_range", TIME_RANGES)?,
        format: choice(pairs, "format", FORMATS)?.unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
        results_on_new_tab,
        image_proxy: boolean(pairs, "image_proxy")?,
        autocomplete: choice(pairs, "autocomplete", AUTOCOMPLETE)?,
        safesearch,
        theme: scalar(pairs, "theme").unwrap_or(DEFAULT_THEME).to_string(),
        enabled_plugins: list_or(pairs, "enabled_plugins", Some(PLUGINS), DEFAULT_ENABLED_PLUGINS),
        disabled_plugins: list_or(pairs, "disabled_plugins", Some(PLUGINS), DEFAULT_DISABLED_PLUGINS),
        enabled_engines: list_or(pairs, "enabled_engines", None, &[]),
        disabled_engines: list_or(pairs, "disabled_engines", None, &[]),
    })
}

/// Decode a raw query string (`a=b&c=d`).
pub fn decode_query(query: Option<&str>) -> Result<SearchParams, ValidationError> {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .into_owned()
        .collect();
    decode(&pairs)
}

/// Encode typed parameters back into wire pairs.
///
/// Lists whose default is non-empty are always written, so an explicitly
/// emptied plugin list survives a round trip.
pub fn encode(params: &SearchParams) -> Vec<(String, String)> {
    let mut pairs = vec![("q".to_string(), params.q.clone())];
    let mut push = |name: &str, value: String| pairs.push((name.to_string(), value));

    if !params.categories.is_empty() {
        push("categories", encode_list(&params.categories));
    }
    if !params.engines.is_empty() {
        push("engines", encode_list(&params.engines));
    }
    push("language", params.language.clone());
    push("pageno", params.pageno.to_string());
    if let Some(time_range) = &params.time_range {
        push("time_range", time_range.clone());
    }
    push("format", params.format.clone());
    push("results_on_new_tab", u8::from(params.results_on_new_tab).to_string());
    push("image_proxy", params.image_proxy.to_string());
    if let Some(autocomplete) = &params.autocomplete {
        push("autocomplete", autocomplete.clone());
    }
    push("safesearch", params.safesearch.to_string());
    push("theme", params.theme.clone());
    push("enabled_plugins", encode_list(&params.enabled_plugins));
    push("disabled_plugins", encode_list(&params.disabled_plugins));
    if !params.enabled_engines.is_empty() {
        push("enabled_engines", encode_list(&params.enabled_engines));
    }
    if !params.disabled_engines.is_empty() {
        push("disabled_engines", encode_list(&params.disabled_engines));
    }
    pairs
}

/// Encode typed parameters as a form-urlencoded query string.
pub fn to_query_string(params: &SearchParams) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(encode(params))
        .finish()
}
