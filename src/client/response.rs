//! Response decoding and error extraction.

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, Result};

/// A downloaded file body.
#[derive(Debug, Clone)]
pub struct Download {
    /// Filename suggested by the server, if any.
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Download {
    /// Name to save the body under in the current directory. The server's
    /// suggestion is reduced to a bare file name; `fallback` is used when
    /// nothing usable is left.
    pub fn filename_or(&self, fallback: &str) -> String {
        self.filename
            .as_deref()
            .and_then(sanitize_filename)
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Reduce a server-suggested name to a single safe path component.
fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let sanitized: String = base
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(100)
        .collect();

    let trimmed = sanitized.trim().trim_matches('_');
    match trimmed {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Turn non-success responses into `ApiError::Status`, using the JSON
/// `error` (or `message`) field when the server provides one.
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status,
        message: error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        }),
    })
}

/// Decode a JSON body, reporting shape mismatches as `Malformed`.
pub(crate) async fn json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    let response = check(response).await?;
    let body = response.text().await.map_err(|e| ApiError::Transport {
        url: url.to_string(),
        source: e,
    })?;
    decode(&body, url)
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str, url: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ApiError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Read a binary body along with its suggested filename.
pub(crate) async fn download(response: Response, url: &str) -> Result<Download> {
    let response = check(response).await?;
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };
    let filename = header("content-disposition")
        .as_deref()
        .and_then(parse_content_disposition_filename);
    let content_type = header("content-type");
    let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
        url: url.to_string(),
        source: e,
    })?;
    Ok(Download {
        filename,
        content_type,
        bytes: bytes.to_vec(),
    })
}

/// Extract a human-readable message from an error body.
fn error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return Some(msg.to_string());
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        None
    } else {
        Some(trimmed.chars().take(200).collect())
    }
}

/// Parse filename from Content-Disposition header value.
/// Parses both `filename="name.pdf"` and `filename*=UTF-8''name.pdf` formats.
pub fn parse_content_disposition_filename(header: &str) -> Option<String> {
    if let Some(start) = header.find("filename*=") {
        let rest = &header[start + 10..];
        if let Some(quote_start) = rest.find("''") {
            let encoded = rest[quote_start + 2..].split([';', ' ']).next()?;
            if let Ok(decoded) = urlencoding::decode(encoded) {
                let filename = decoded.trim().to_string();
                if !filename.is_empty() {
                    return Some(filename);
                }
            }
        }
    }

    if let Some(start) = header.find("filename=") {
        let rest = &header[start + 9..];
        let filename = if let Some(quoted) = rest.strip_prefix('"') {
            quoted.split('"').next()
        } else {
            rest.split([';', ' ']).next()
        };

        if let Some(name) = filename {
            let name = name.trim().to_string();
            if !name.is_empty() {
                return Some(name);
            }
        }
    }

    None
}
