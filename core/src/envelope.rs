//! Decoded response envelope for conditional reads.

use serde_json::Value;

use crate::http::HttpResponse;

/// Status, headers and decoded body of one successful response.
///
/// `json` and `raw_body` are `None` when the body was empty, which is the
/// normal shape of a `304 Not Modified`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub status_code: u16,
    /// Header name to values, grouped by exact name in arrival order.
    pub headers: Vec<(String, Vec<String>)>,
    pub json: Option<Value>,
    pub raw_body: Option<String>,
}

impl JsonResponse {
    pub(crate) fn new(response: &HttpResponse, json: Option<Value>) -> Self {
        Self {
            status_code: response.status,
            headers: group_headers(&response.headers),
            json,
            raw_body: (!response.body.is_empty()).then(|| response.body.clone()),
        }
    }

    /// First value of the first header whose name matches, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    /// Every value of every header whose name matches, ignoring case.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter().map(String::as_str))
    }

    pub fn etag(&self) -> Option<&str> {
        self.header("ETag")
    }

    pub fn is_not_modified(&self) -> bool {
        self.status_code == 304
    }
}

fn group_headers(headers: &[(String, String)]) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (name, value) in headers {
        match grouped.iter_mut().find(|(k, _)| k == name) {
            Some((_, values)) => values.push(value.clone()),
            None => grouped.push((name.clone(), vec![value.clone()])),
        }
    }
    grouped
}
