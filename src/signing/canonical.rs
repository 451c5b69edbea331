use chrono::{DateTime, Utc};
use url::form_urlencoded;

/// Format of the timestamp that is signed and sent in the date header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered request parameters.
///
/// Pairs are kept exactly in insertion order. Names are never reordered or
/// deduplicated, because the server rebuilds the signed string in the same
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((name.into(), value.into()));
        self
    }

    pub fn push_opt(&mut self, name: &str, value: Option<impl Into<String>>) -> &mut Self {
        if let Some(value) = value {
            self.push(name, value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `key=value` pairs joined with '&', values form-urlencoded.
    pub fn to_form(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{key}={}", encode_value(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

fn encode_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// The request as both sides of the exchange see it: the server rebuilds
/// [`CanonicalRequest::string_to_sign`] from the received parameters and the
/// date header, then compares signatures.
#[derive(Debug, Clone)]
pub struct CanonicalRequest {
    method: Method,
    params: Params,
    timestamp: String,
}

impl CanonicalRequest {
    pub fn new(method: Method, params: Params, now: DateTime<Utc>) -> Self {
        Self {
            method,
            params,
            timestamp: format_timestamp(now),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// `<METHOD>&<k1>=<v1>&...&<timestamp>`
    pub fn string_to_sign(&self) -> String {
        let mut out = String::from(self.method.as_str());
        for (key, value) in self.params.0.iter() {
            out.push('&');
            out.push_str(key);
            out.push('=');
            out.push_str(&encode_value(value));
        }
        out.push('&');
        out.push_str(&self.timestamp);
        out
    }
}
