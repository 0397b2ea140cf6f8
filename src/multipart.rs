//! `multipart/form-data` bodies.
//!
//! The whole body is already buffered, so parsing is a matter of slicing it
//! at the boundary lines. Part headers are parsed with `httparse`; part data
//! is a zero-copy [`Bytes`] slice of the request body.

use bytes::Bytes;

const MAX_PART_HEADERS: usize = 8;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MultipartError {
    #[error("missing boundary parameter")]
    NoBoundary,

    #[error("body does not start with the boundary")]
    NoOpening,

    #[error("malformed part headers")]
    BadHeaders,

    #[error("part is not terminated by a boundary")]
    Unterminated,
}

/// One part of a multipart body.
#[derive(Clone, Debug)]
pub struct Part {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A parsed multipart body.
#[derive(Debug, Default)]
pub struct Multipart {
    parts: Vec<Part>,
}

impl Multipart {
    /// Splits `body` using the boundary named in `content_type`.
    pub fn parse(content_type: &str, body: &Bytes) -> Result<Self, MultipartError> {
        let boundary = content_type
            .split(';')
            .filter_map(|param| param.trim().split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("boundary"))
            .map(|(_, v)| v.trim().trim_matches('"'))
            .filter(|v| !v.is_empty())
            .ok_or(MultipartError::NoBoundary)?;

        let opening = format!("--{boundary}");
        let separator = format!("\r\n--{boundary}");

        let mut pos = find(body, opening.as_bytes()).ok_or(MultipartError::NoOpening)?
            + opening.len();
        let mut parts = Vec::new();

        loop {
            let rest = &body[pos..];
            if rest.starts_with(b"--") {
                break;
            }
            pos += if rest.starts_with(b"\r\n") { 2 } else { 0 };

            let mut headers = [httparse::EMPTY_HEADER; MAX_PART_HEADERS];
            let (consumed, headers) = match httparse::parse_headers(&body[pos..], &mut headers) {
                Ok(httparse::Status::Complete((n, h))) => (n, h),
                _ => return Err(MultipartError::BadHeaders),
            };
            let mut part = Part { name: None, file_name: None, content_type: None, data: Bytes::new() };
            for h in headers.iter() {
                let value = String::from_utf8_lossy(h.value);
                if h.name.eq_ignore_ascii_case("content-disposition") {
                    part.name = disposition_param(&value, "name");
                    part.file_name = disposition_param(&value, "filename");
                } else if h.name.eq_ignore_ascii_case("content-type") {
                    part.content_type = Some(value.trim().to_owned());
                }
            }
            pos += consumed;

            let len = find(&body[pos..], separator.as_bytes()).ok_or(MultipartError::Unterminated)?;
            part.data = body.slice(pos..pos + len);
            parts.push(part);
            pos += len + separator.len();
        }

        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[Part] { &self.parts }

    /// Text value of the first non-file field called `name`.
    pub fn field(&self, name: &str) -> Option<String> {
        self.parts.iter()
            .find(|p| p.file_name.is_none() && p.name.as_deref() == Some(name))
            .map(|p| String::from_utf8_lossy(&p.data).into_owned())
    }

    /// The first part that carries a file name.
    pub fn file(&self) -> Option<&Part> {
        self.parts.iter().find(|p| p.file_name.is_some())
    }
}

fn disposition_param(value: &str, key: &str) -> Option<String> {
    value.split(';')
        .skip(1)
        .filter_map(|param| param.trim().split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim().trim_matches('"').to_owned())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
