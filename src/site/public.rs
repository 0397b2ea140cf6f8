//! Public pages: listing, archive, posts and static assets.

use tracing::{debug, warn};

use crate::catalog::PostMapping;
use crate::error::ServeError;
use crate::handler::Outcome;
use crate::pagination::{self, POSTS_PREFIX};
use crate::preview;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::status::Status;
use crate::template::{escape, Vars};

use super::Site;

pub const ARCHIVE_PATH: &str = "/archive";
pub const STATIC_PREFIX: &str = "/static/";

/// Static files above this size are served, with a warning.
const LARGE_ASSET: usize = 200_000;
const ASSET_CACHE: &str = "max-age=86400";

pub(super) fn home(site: &Site, req: &Request) -> Outcome {
    listing(site, req, 0)
}

/// `/page?p=N`. A missing or non-numeric `p` means the first page.
pub(super) fn page(site: &Site, req: &Request) -> Outcome {
    let page = req.query("p")
        .and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(0);
    listing(site, req, page)
}

fn listing(site: &Site, req: &Request, page: i64) -> Outcome {
    let catalog = site.catalog().snapshot();
    let page = pagination::paginate(catalog.posts(), page, site.settings().page_size)
        .ok_or(ServeError::NotFound)?;

    let mut posts = String::new();
    for post in &page.entries {
        posts.push_str(&format!(
            "<div class='post-preview'><h2><a href='{}'>{}</a></h2><p>{}</p></div>",
            escape(&post.url_path),
            escape(&post.title),
            escape(&post_preview(site, post)),
        ));
    }

    let title = format!("{} - Home", site.settings().site_title);
    let vars = Vars::new()
        .set("TITLE", escape(&title))
        .set("POSTS", posts)
        .set("PAGINATION", pagination::controls(&page));

    site.access_log().record(req, Status::Ok);
    Ok(Response::html(site.templates().render("home.html", &vars)))
}

fn post_preview(site: &Site, post: &PostMapping) -> String {
    match site.storage().read_string(&format!("{POSTS_PREFIX}{}", post.file_name)) {
        Ok(text) => preview::extract(&text),
        Err(e) => {
            debug!(post = %post.url_path, error = %e, "no preview");
            preview::UNAVAILABLE.to_owned()
        }
    }
}

pub(super) fn archive(site: &Site, req: &Request) -> Outcome {
    let catalog = site.catalog().snapshot();

    let mut count = 0;
    let mut list = String::new();
    for post in pagination::eligible(catalog.posts()) {
        count += 1;
        list.push_str(&format!(
            "<li><a href='{}'>{}</a></li>",
            escape(&post.url_path),
            escape(&post.title),
        ));
    }

    let vars = Vars::new()
        .set("TITLE", "Archive - All Posts")
        .set("POST_COUNT", count.to_string())
        .set("POST_LIST", list);

    site.access_log().record(req, Status::Ok);
    Ok(Response::html(site.templates().render("archive.html", &vars)))
}

pub(super) fn serve_post(site: &Site, req: &Request, post: &PostMapping) -> Outcome {
    let text = site.storage()
        .read_string(&format!("{POSTS_PREFIX}{}", post.file_name))
        .map_err(|e| {
            warn!(post = %post.url_path, error = %e, "mapped post file unreadable");
            ServeError::NotFound
        })?;

    let title = escape(&post.title);
    let vars = Vars::new()
        .set("TITLE", title.as_str())
        .set("POST_TITLE", title.as_str())
        .set("CONTENT", escape(&text));

    site.access_log().record(req, Status::Ok);
    Ok(Response::html(site.templates().render("post.html", &vars)))
}

pub(super) fn serve_static(site: &Site, req: &Request) -> Outcome {
    let path = req.path();
    let data = site.storage().read(path).map_err(|e| {
        debug!(path, error = %e, "static file unavailable");
        ServeError::NotFound
    })?;
    if data.len() > LARGE_ASSET {
        warn!(path, size = data.len(), "serving large file");
    }

    site.access_log().record(req, Status::Ok);
    Ok(Response::builder()
        .header("cache-control", ASSET_CACHE)
        .bytes(ContentType::from_path(path), data))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body, get, log_lines, site, site_with};
    use crate::status::Status;

    #[test]
    fn home_lists_first_page_with_previews() {
        let (_dir, site) = site();
        let res = get(&site, "/");
        assert_eq!(res.status_code(), Status::Ok);
        assert_eq!(
            body(&res),
            "<header/><title>My Blog - Home</title>\
             <div class='post-preview'><h2><a href='/posts/one'>First &lt;Post&gt;</a></h2>\
             <p>Hello &lt;world&gt; &amp; friends.</p></div>\
             <div class='post-preview'><h2><a href='/posts/two'>Second</a></h2><p>Second body.</p></div>\
             <div class='pagination'>Page 1 of 2 <a href='/page?p=1'>Next »</a></div>"
        );
        assert_eq!(log_lines(&site).len(), 1);
    }

    #[test]
    fn second_page_shows_remaining_posts() {
        let (_dir, site) = site();
        let text = body(&get(&site, "/page?p=1"));
        assert!(text.contains("/posts/three"));
        assert!(text.contains("Preview not available."));
        assert!(text.contains("/posts/ghost"));
        assert!(text.contains("Page 2 of 2"));
        assert!(!text.contains("/about"));
    }

    #[test]
    fn page_parameter_edge_cases() {
        let (_dir, site) = site();
        assert_eq!(get(&site, "/page").status_code(), Status::Ok);
        assert_eq!(get(&site, "/page?p=abc").status_code(), Status::Ok);
        assert_eq!(get(&site, "/page?p=2").status_code(), Status::NotFound);
        assert_eq!(get(&site, "/page?p=-1").status_code(), Status::NotFound);
    }

    #[test]
    fn empty_table_has_no_home_page() {
        let (_dir, site) = site();
        site.storage().remove("/config/routes.txt").unwrap();
        site.reload();
        assert_eq!(get(&site, "/").status_code(), Status::NotFound);
    }

    #[test]
    fn archive_lists_every_eligible_post() {
        let (_dir, site) = site_with(|s| s.page_size = 1);
        let text = body(&get(&site, "/archive"));
        assert!(text.starts_with("<title>Archive - All Posts</title>4<ul>"));
        assert_eq!(text.matches("<li>").count(), 4);
        assert!(!text.contains("/about"));
        assert!(!text.contains("/shadowed"));
    }

    #[test]
    fn static_assets_carry_type_and_cache_header() {
        let (_dir, site) = site();
        let res = get(&site, "/static/style.css");
        assert_eq!(res.status_code(), Status::Ok);
        assert_eq!(res.header("content-type"), Some("text/css"));
        assert_eq!(res.header("cache-control"), Some("max-age=86400"));
        assert_eq!(res.body(), b"body{}");
    }

    #[test]
    fn missing_or_escaping_static_paths_are_not_found() {
        let (_dir, site) = site();
        assert_eq!(get(&site, "/static/nope.png").status_code(), Status::NotFound);
        assert_eq!(get(&site, "/static/../config/routes.txt").status_code(), Status::NotFound);
    }
}
