//! Disambiguation of scrape responses.
//!
//! The scrape endpoint answers with either a spreadsheet or a JSON error
//! object, and its status codes are not a reliable signal: "no results" has
//! been seen as a 404, as JSON on a 200, and as JSON on a non-2xx status.
//! The declared content type is therefore checked first and the status only
//! refines the classification.

use percent_encoding::percent_decode_str;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::StatusCode;
use revscrape_core::Platform;

use crate::artifact::Artifact;
use crate::error::{JobError, JobResult};
use crate::types::ErrorBody;

/// Classifies a fully-read scrape response.
pub(crate) fn classify(
    platform: Platform,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> JobResult {
    let content_type = header_str(headers, CONTENT_TYPE.as_str());

    if content_type.is_some_and(is_json_content_type) {
        return Err(json_failure(status, body));
    }

    if status == StatusCode::NOT_FOUND {
        return Err(JobError::NoResults);
    }

    if !status.is_success() {
        return Err(JobError::UnexpectedStatus {
            status: status.as_u16(),
        });
    }

    if body.is_empty() {
        return Err(JobError::MalformedPayload {
            status: status.as_u16(),
            detail: "empty response body".to_string(),
        });
    }

    let filename = header_str(headers, CONTENT_DISPOSITION.as_str())
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| platform.default_filename().to_string());

    Ok(Artifact {
        filename,
        content_type: content_type.map(str::to_string),
        bytes: body.to_vec(),
    })
}

/// Decodes a JSON error payload into a failure.
fn json_failure(status: StatusCode, body: &[u8]) -> JobError {
    let text = String::from_utf8_lossy(body);
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody {
            error: Some(message),
        }) if !message.trim().is_empty() => JobError::Backend {
            status: status.as_u16(),
            message,
        },
        Ok(_) => JobError::MalformedPayload {
            status: status.as_u16(),
            detail: "JSON body without an error message".to_string(),
        },
        Err(e) => JobError::MalformedPayload {
            status: status.as_u16(),
            detail: e.to_string(),
        },
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Returns `true` for `application/json`, `text/json` and `*/*+json` types,
/// ignoring parameters such as `charset`.
pub(crate) fn is_json_content_type(value: &str) -> bool {
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence == "text/json" || essence.ends_with("+json")
}

/// Extracts a safe filename from a `Content-Disposition` header value.
///
/// The RFC 5987 `filename*` parameter wins over plain `filename`. Any
/// directory part is stripped so the name cannot escape a download folder.
pub(crate) fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in split_params(value).into_iter().skip(1) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_extended(raw.trim()),
            "filename" => plain = Some(unquote(raw.trim())),
            _ => {}
        }
    }

    extended
        .or(plain)
        .and_then(|name| sanitize_filename(&name))
}

/// Splits header parameters on `;`, leaving quoted strings intact.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

/// Decodes `charset'lang'percent-encoded` (RFC 5987).
fn decode_extended(raw: &str) -> Option<String> {
    let encoded = raw.splitn(3, '\'').nth(2)?;
    percent_decode_str(&unquote(encoded))
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// Strips surrounding quotes and resolves `\"`-style escapes inside them.
fn unquote(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) else {
        return raw.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.extend(chars.next());
        } else {
            out.push(c);
        }
    }
    out
}

fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.to_string())
}

#[cfg(test)]
#[path = "response_test.rs"]
mod tests;
