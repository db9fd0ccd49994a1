//! Browser cookie parsing and filtering
//!
//! Cookie strings arrive copy-pasted from browser devtools, so parsing is
//! best-effort: anything that does not look like `name=value` or
//! `name:value` is dropped rather than rejected.

use std::collections::BTreeMap;

/// Provider session cookies needed to re-run the authorize step
pub const ESSENTIAL_COOKIES: &[&str] = &["ssid", "csid", "clid", "sub", "tdid", "asid", "did"];

/// Canonical cookie name -> value map
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CookieSet {
    cookies: BTreeMap<String, String>,
}

impl CookieSet {
    /// Parse a raw cookie string.
    ///
    /// Segments are split on `;` when present, otherwise on `,`, otherwise the
    /// whole input is one segment. Each segment splits on its first `=`, or
    /// failing that its first `:`. Surrounding quotes are stripped from values.
    pub fn parse(raw: &str) -> Self {
        let cleaned: String = raw.chars().filter(|c| *c != '\r' && *c != '\n').collect();

        let segments: Vec<&str> = if cleaned.contains(';') {
            cleaned.split(';').collect()
        } else if cleaned.contains(',') {
            cleaned.split(',').collect()
        } else {
            vec![cleaned.as_str()]
        };

        let cookies = segments
            .into_iter()
            .filter_map(parse_segment)
            .collect::<BTreeMap<_, _>>();

        Self { cookies }
    }

    /// Restrict to [`ESSENTIAL_COOKIES`]; see [`CookieSet::filter_with`].
    pub fn filter_essential(&self) -> Self {
        self.filter_with(ESSENTIAL_COOKIES)
    }

    /// Keep only allow-listed names with non-empty values.
    ///
    /// If none of the allow-listed cookies are present the whole set is
    /// returned unchanged, so a non-empty input never filters to empty.
    pub fn filter_with<S: AsRef<str>>(&self, allow_list: &[S]) -> Self {
        let filtered: BTreeMap<String, String> = allow_list
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                self.cookies
                    .get(name)
                    .filter(|value| !value.is_empty())
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect();

        if filtered.is_empty() {
            return self.clone();
        }
        Self { cookies: filtered }
    }

    /// Value for the outbound `Cookie` header
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CookieSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cookies: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// Names only: values are session credentials.
impl std::fmt::Debug for CookieSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSet")
            .field("names", &self.cookies.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn parse_segment(segment: &str) -> Option<(String, String)> {
    let segment = segment.trim();
    if segment.is_empty() {
        return None;
    }

    let (name, value) = segment
        .split_once('=')
        .or_else(|| segment.split_once(':'))?;

    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches(|c| c == '"' || c == '\'');

    Some((name.to_string(), value.to_string()))
}
