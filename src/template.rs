//! `{{NAME}}` placeholder templates.
//!
//! Templates and partials are plain files under `/templates/` and are read
//! from storage on every render; nothing is cached.
//!
//! Substitution is one left-to-right scan of the template text. Each token
//! whose name has a value is replaced by that value, and scanning resumes
//! *after* the inserted text. A value is therefore never scanned itself: a
//! post title of `{{FOOTER}}` shows up literally instead of pulling in the
//! footer. Tokens with no value stay in the output verbatim.
//!
//! `{{HEADER}}` and `{{FOOTER}}` are filled by the engine from the
//! `header.html` and `footer.html` partials unless the caller sets them.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::warn;

use crate::storage::Storage;

pub const TEMPLATE_DIR: &str = "/templates/";

/// Engine-filled placeholders and the partial each one loads.
const PARTIALS: [(&str, &str); 2] = [("HEADER", "header.html"), ("FOOTER", "footer.html")];

/// Placeholder values, looked up by exact name.
#[derive(Debug, Default)]
pub struct Vars<'a> {
    entries: Vec<(&'a str, Cow<'a, str>)>,
}

impl<'a> Vars<'a> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Sets `name`, replacing an earlier value.
    pub fn set(mut self, name: &'a str, value: impl Into<Cow<'a, str>>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_ref())
    }
}

/// Renders named templates out of storage.
#[derive(Clone)]
pub struct Templates {
    storage: Arc<dyn Storage>,
}

impl Templates {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Loads `name` and fills its placeholders. A missing template renders
    /// as an empty string.
    pub fn render(&self, name: &str, vars: &Vars<'_>) -> String {
        let Some(text) = self.load(name) else {
            warn!(template = name, "template not found");
            return String::new();
        };

        let referenced = placeholders(&text);
        let partials: Vec<(&str, String)> = PARTIALS.iter()
            .filter(|(slot, _)| vars.get(slot).is_none() && referenced.contains(slot))
            .map(|&(slot, file)| (slot, self.load(file).unwrap_or_default()))
            .collect();

        substitute(&text, |key| {
            vars.get(key).or_else(|| {
                partials.iter()
                    .find(|(slot, _)| *slot == key)
                    .map(|(_, body)| body.as_str())
            })
        })
    }

    fn load(&self, name: &str) -> Option<String> {
        self.storage.read_string(&format!("{TEMPLATE_DIR}{name}")).ok()
    }
}

/// Replaces every `{{NAME}}` for which `lookup` has a value, in one pass.
pub fn substitute<'v>(text: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];

        let value = after.find("}}")
            .map(|close| (&after[..close], close))
            .filter(|(name, _)| is_name(name))
            .and_then(|(name, close)| lookup(name).map(|v| (v, close)));

        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Names of every well-formed placeholder in `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        match after.find("}}").map(|close| &after[..close]) {
            Some(name) if is_name(name) => {
                names.push(name);
                rest = &after[name.len() + 2..];
            }
            _ => rest = after,
        }
    }
    names
}

fn is_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// HTML-escapes `& < > " '`.
///
/// Each input character is mapped exactly once, so an `&` produced by one
/// escape is never escaped again. Escaping is not idempotent: `&lt;` becomes
/// `&amp;lt;`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&'  => out.push_str("&amp;"),
            '<'  => out.push_str("&lt;"),
            '>'  => out.push_str("&gt;"),
            '"'  => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c    => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DiskStorage;
    use tempfile::TempDir;

    fn engine(files: &[(&str, &str)]) -> (TempDir, Templates) {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        for (name, body) in files {
            storage.write(&format!("{TEMPLATE_DIR}{name}"), body.as_bytes()).unwrap();
        }
        (dir, Templates::new(Arc::new(storage)))
    }

    #[test]
    fn replaces_every_occurrence() {
        let vars = Vars::new().set("TITLE", "Hi");
        let out = substitute("<title>{{TITLE}}</title><h1>{{TITLE}}</h1>", |k| vars.get(k));
        assert_eq!(out, "<title>Hi</title><h1>Hi</h1>");
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let vars = Vars::new().set("TITLE", "x");
        let text = "<p>plain { braces } and }} stray</p>";
        assert_eq!(substitute(text, |k| vars.get(k)), text);
    }

    #[test]
    fn unknown_and_malformed_tokens_stay_verbatim() {
        let vars = Vars::new().set("A", "1");
        let out = substitute("{{A}} {{B}} {{lower}} {{ A }} {{A", |k| vars.get(k));
        assert_eq!(out, "1 {{B}} {{lower}} {{ A }} {{A");
    }

    #[test]
    fn values_are_not_re_expanded() {
        let vars = Vars::new()
            .set("TITLE", "{{CONTENT}}")
            .set("CONTENT", "body");
        let out = substitute("{{TITLE}}|{{CONTENT}}", |k| vars.get(k));
        assert_eq!(out, "{{CONTENT}}|body");
    }

    #[test]
    fn brace_runs_before_a_token() {
        let vars = Vars::new().set("A", "x");
        assert_eq!(substitute("{{{{A}}", |k| vars.get(k)), "{{x");
    }

    #[test]
    fn later_set_wins() {
        let vars = Vars::new().set("A", "1").set("A", "2");
        assert_eq!(vars.get("A"), Some("2"));
    }

    #[test]
    fn placeholders_lists_names_in_order() {
        assert_eq!(placeholders("{{HEADER}}x{{bad}}{{TITLE}}{{HEADER}}"), ["HEADER", "TITLE", "HEADER"]);
    }

    #[test]
    fn render_injects_partials() {
        let (_dir, engine) = engine(&[
            ("page.html", "{{HEADER}}<main>{{CONTENT}}</main>{{FOOTER}}"),
            ("header.html", "<header>{{TITLE}}</header>"),
            ("footer.html", "<footer/>"),
        ]);
        let out = engine.render("page.html", &Vars::new().set("CONTENT", "hi").set("TITLE", "T"));
        // Partials are values like any other: their own tokens are left alone.
        assert_eq!(out, "<header>{{TITLE}}</header><main>hi</main><footer/>");
    }

    #[test]
    fn missing_template_or_partial_is_empty() {
        let (_dir, engine) = engine(&[("page.html", "[{{HEADER}}]")]);
        assert_eq!(engine.render("page.html", &Vars::new()), "[]");
        assert_eq!(engine.render("nope.html", &Vars::new()), "");
    }

    #[test]
    fn escape_order() {
        assert_eq!(escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
        assert_eq!(escape("&lt;"), "&amp;lt;");
        assert_ne!(escape(&escape("<")), escape("<"));
    }
}
