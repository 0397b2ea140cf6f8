//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use url::form_urlencoded;

use crate::method::Method;
use crate::multipart::{Multipart, MultipartError};

/// An incoming HTTP request, fully buffered.
///
/// The path is percent-decoded for routing; the undecoded form is kept for
/// the access log. The query string is parsed into pairs.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) raw_path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) remote: Option<SocketAddr>,
}

impl Request {
    /// A request for `uri` (path plus optional `?query`) with no headers or body.
    pub fn new(method: Method, uri: &str) -> Self {
        let (raw_path, raw_query) = uri.split_once('?').unwrap_or((uri, ""));
        Self {
            method,
            path: percent_decode_str(raw_path).decode_utf8_lossy().into_owned(),
            raw_path: raw_path.to_owned(),
            query: form_urlencoded::parse(raw_query.as_bytes()).into_owned().collect(),
            headers: Vec::new(),
            body: Bytes::new(),
            remote: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn remote(mut self, addr: SocketAddr) -> Self {
        self.remote = Some(addr);
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    /// The path exactly as it arrived, still percent-encoded.
    pub fn raw_path(&self) -> &str { &self.raw_path }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First query-string value for `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Looks `name` up in the query string, then in a urlencoded form body.
    pub fn arg(&self, name: &str) -> Option<String> {
        if let Some(v) = self.query(name) {
            return Some(v.to_owned());
        }
        if !self.is_content_type("application/x-www-form-urlencoded") {
            return None;
        }
        form_urlencoded::parse(&self.body)
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Splits a `multipart/form-data` body. `None` if the request is not multipart.
    pub fn multipart(&self) -> Option<Result<Multipart, MultipartError>> {
        let content_type = self.header_value("content-type")?;
        if !self.is_content_type("multipart/form-data") {
            return None;
        }
        Some(Multipart::parse(content_type, &self.body))
    }

    fn is_content_type(&self, mime: &str) -> bool {
        self.header_value("content-type")
            .and_then(|v| v.split(';').next())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(mime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_decodes_uri() {
        let req = Request::new(Method::Get, "/posts/hello%20world?p=2&dir=%2Fposts");
        assert_eq!(req.path(), "/posts/hello world");
        assert_eq!(req.raw_path(), "/posts/hello%20world");
        assert_eq!(req.query("p"), Some("2"));
        assert_eq!(req.query("dir"), Some("/posts"));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn arg_prefers_query_then_form_body() {
        let req = Request::new(Method::Post, "/admin/save?file=/a.md")
            .header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
            .body("file=/b.md&content=hello+there%21");
        assert_eq!(req.arg("file").as_deref(), Some("/a.md"));
        assert_eq!(req.arg("content").as_deref(), Some("hello there!"));
    }

    #[test]
    fn form_body_ignored_without_form_content_type() {
        let req = Request::new(Method::Post, "/admin/save").body("content=x");
        assert_eq!(req.arg("content"), None);
        assert!(req.multipart().is_none());
    }
}
