//! Post and redirect tables with atomic reload.
//!
//! Both tables come from pipe-delimited text files in storage:
//!
//! ```text
//! # /config/routes.txt        urlPath|fileName|title
//! /posts/hello|hello.md|Hello, world
//! /about|about.md|About
//!
//! # /config/redirects.txt     fromPath|toPath
//! /old-hello|/posts/hello
//! ```
//!
//! Blank lines and `#` comments are ignored. A line without enough `|`
//! delimiters is rejected: it is reported as a diagnostic and leaves no trace
//! in the table, so the table length is always the number of usable records.
//!
//! The live tables sit behind an [`ArcSwap`]. A request takes one
//! [`snapshot`](CatalogStore::snapshot) and works from it until it finishes;
//! a reload builds a complete new [`Catalog`] and swaps the pointer, so a
//! handler never sees a half-built or half-freed table.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{info, warn};

use crate::storage::Storage;

pub const ROUTES_PATH: &str = "/config/routes.txt";
pub const REDIRECTS_PATH: &str = "/config/redirects.txt";

/// Binds a public URL path to a stored post file and its display title.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PostMapping {
    pub url_path: String,
    pub file_name: String,
    pub title: String,
}

/// Sends requests for `from_path` to `to_path`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Redirection {
    pub from_path: String,
    pub to_path: String,
}

/// A configuration line that could not be turned into a record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rejected {
    /// 1-based line number in the source file.
    pub line: usize,
    pub reason: &'static str,
}

/// Result of parsing one table file.
#[derive(Debug)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub rejected: Vec<Rejected>,
}

/// An immutable, fully-formed pair of tables, in file order.
#[derive(Debug, Default)]
pub struct Catalog {
    posts: Vec<PostMapping>,
    redirects: Vec<Redirection>,
}

impl Catalog {
    pub fn new(posts: Vec<PostMapping>, redirects: Vec<Redirection>) -> Self {
        Self { posts, redirects }
    }

    pub fn posts(&self) -> &[PostMapping] { &self.posts }

    /// First post mapping whose path equals `path` exactly.
    pub fn post(&self, path: &str) -> Option<&PostMapping> {
        self.posts.iter().find(|p| p.url_path == path)
    }

    /// Target of the first redirect whose source equals `path` exactly.
    pub fn redirect(&self, path: &str) -> Option<&str> {
        self.redirects.iter()
            .find(|r| r.from_path == path)
            .map(|r| r.to_path.as_str())
    }
}

/// What a (re)load produced.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoadReport {
    pub posts: usize,
    pub redirects: usize,
    /// Lines dropped from either file for missing delimiters.
    pub rejected: usize,
}

/// Owner of the live [`Catalog`].
pub struct CatalogStore {
    current: ArcSwap<Catalog>,
}

impl CatalogStore {
    /// An empty store. Call [`reload`](Self::reload) to populate it.
    pub fn new() -> Self {
        Self { current: ArcSwap::from_pointee(Catalog::default()) }
    }

    /// The catalog as of now. Later reloads do not affect the returned handle.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current.load_full()
    }

    /// Re-reads both table files and publishes them together.
    ///
    /// A file that cannot be read yields an empty table of that kind.
    pub fn reload(&self, storage: &dyn Storage) -> LoadReport {
        let posts = load_table(storage, ROUTES_PATH, parse_posts);
        let redirects = load_table(storage, REDIRECTS_PATH, parse_redirects);

        let report = LoadReport {
            posts: posts.records.len(),
            redirects: redirects.records.len(),
            rejected: posts.rejected.len() + redirects.rejected.len(),
        };
        self.current.store(Arc::new(Catalog::new(posts.records, redirects.records)));

        info!(
            posts = report.posts,
            redirects = report.redirects,
            rejected = report.rejected,
            "route tables loaded"
        );
        report
    }
}

impl Default for CatalogStore {
    fn default() -> Self { Self::new() }
}

fn load_table<T>(
    storage: &dyn Storage,
    path: &str,
    parse: fn(&str) -> Parsed<T>,
) -> Parsed<T> {
    let text = match storage.read_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path, error = %e, "table file unavailable, using an empty table");
            return Parsed { records: Vec::new(), rejected: Vec::new() };
        }
    };

    let parsed = parse(&text);
    for r in &parsed.rejected {
        warn!(path, line = r.line, reason = r.reason, "skipping malformed record");
    }
    parsed
}

/// Yields `(line number, trimmed line)` for every line that carries a record.
fn records(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parses `urlPath|fileName|title` lines. The title keeps any further `|`.
pub fn parse_posts(text: &str) -> Parsed<PostMapping> {
    let mut parsed = Parsed { records: Vec::new(), rejected: Vec::new() };

    for (line_no, line) in records(text) {
        let mut fields = line.splitn(3, '|');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(url), Some(file), Some(title)) if !url.trim().is_empty() => {
                parsed.records.push(PostMapping {
                    url_path: url.trim().to_owned(),
                    file_name: file.trim().to_owned(),
                    title: title.trim().to_owned(),
                });
            }
            (Some(url), Some(_), Some(_)) if url.trim().is_empty() => {
                parsed.rejected.push(Rejected { line: line_no, reason: "empty url path" });
            }
            _ => {
                parsed.rejected.push(Rejected { line: line_no, reason: "expected urlPath|fileName|title" });
            }
        }
    }
    parsed
}

/// Parses `fromPath|toPath` lines. The target keeps any further `|`.
pub fn parse_redirects(text: &str) -> Parsed<Redirection> {
    let mut parsed = Parsed { records: Vec::new(), rejected: Vec::new() };

    for (line_no, line) in records(text) {
        match line.split_once('|') {
            Some((from, to)) if !from.trim().is_empty() => {
                parsed.records.push(Redirection {
                    from_path: from.trim().to_owned(),
                    to_path: to.trim().to_owned(),
                });
            }
            Some(_) => {
                parsed.rejected.push(Rejected { line: line_no, reason: "empty source path" });
            }
            None => {
                parsed.rejected.push(Rejected { line: line_no, reason: "expected fromPath|toPath" });
            }
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DiskStorage;
    use tempfile::TempDir;

    const ROUTES: &str = "\
# url|file|title
/posts/one|one.md|First

/posts/two|two.md|Second | with pipe
/broken-line
|nofile.md|No path
/about|about.md|About
";

    #[test]
    fn posts_keep_file_order_and_drop_malformed_lines() {
        let parsed = parse_posts(ROUTES);

        let paths: Vec<_> = parsed.records.iter().map(|p| p.url_path.as_str()).collect();
        assert_eq!(paths, ["/posts/one", "/posts/two", "/about"]);
        assert_eq!(parsed.records[1].title, "Second | with pipe");
        assert_eq!(
            parsed.rejected,
            [
                Rejected { line: 5, reason: "expected urlPath|fileName|title" },
                Rejected { line: 6, reason: "empty url path" },
            ]
        );
    }

    #[test]
    fn redirects_need_one_delimiter() {
        let parsed = parse_redirects("/a|/b\n  # comment\nnodelim\n/c|/d\n");
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1], Redirection { from_path: "/c".into(), to_path: "/d".into() });
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].line, 3);
    }

    #[test]
    fn reload_reports_usable_records_only() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        storage.write(ROUTES_PATH, ROUTES.as_bytes()).unwrap();
        storage.write(REDIRECTS_PATH, b"/old|/posts/one\n").unwrap();

        let store = CatalogStore::new();
        let report = store.reload(&storage);

        assert_eq!(report, LoadReport { posts: 3, redirects: 1, rejected: 2 });
        assert_eq!(store.snapshot().posts().len(), 3);
        assert_eq!(store.snapshot().redirect("/old"), Some("/posts/one"));
    }

    #[test]
    fn missing_files_become_empty_tables() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        storage.write(ROUTES_PATH, b"/posts/one|one.md|First\n").unwrap();

        let store = CatalogStore::new();
        store.reload(&storage);
        assert_eq!(store.snapshot().posts().len(), 1);

        storage.remove(ROUTES_PATH).unwrap();
        let report = store.reload(&storage);
        assert_eq!(report.posts, 0);
        assert_eq!(report.redirects, 0);
        assert!(store.snapshot().posts().is_empty());
    }

    #[test]
    fn snapshot_outlives_reload() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        storage.write(ROUTES_PATH, b"/posts/one|one.md|First\n").unwrap();

        let store = CatalogStore::new();
        store.reload(&storage);
        let before = store.snapshot();

        storage.write(ROUTES_PATH, b"/posts/a|a.md|A\n/posts/b|b.md|B\n").unwrap();
        store.reload(&storage);

        assert_eq!(before.posts().len(), 1);
        assert_eq!(before.post("/posts/one").unwrap().title, "First");
        assert_eq!(store.snapshot().posts().len(), 2);
    }
}
