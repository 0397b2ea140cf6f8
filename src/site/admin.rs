//! The admin panel. Every route here sits behind Basic auth.

use tracing::info;

use crate::error::ServeError;
use crate::handler::Outcome;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::template::{escape, Vars};

use super::Site;

const ROOT: &str = "/admin";
const DEFAULT_DIR: &str = "/posts";
const EDITABLE: [&str; 4] = [".md", ".txt", ".css", ".html"];
/// Edits above this many characters get a warning next to the size.
const LARGE_EDIT: usize = 4_000;
const LOG_VIEW_LINES: usize = 100;

pub(super) fn mount(router: Router) -> Router {
    router
        .guarded(Method::Get,  ROOT,             dashboard)
        .guarded(Method::Get,  "/admin/files",   files)
        .guarded(Method::Get,  "/admin/edit",    edit)
        .guarded(Method::Post, "/admin/save",    save)
        .guarded(Method::Post, "/admin/upload",  upload)
        .guarded(Method::Post, "/admin/delete",  delete)
        .guarded(Method::Get,  "/admin/reload",  reload)
        .guarded(Method::Get,  "/admin/logs",    logs)
}

fn required(req: &Request, name: &str) -> Result<String, ServeError> {
    req.arg(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServeError::BadRequest(format!("missing `{name}`")))
}

fn success(site: &Site, icon: &str, message: &str, details: String) -> Outcome {
    let vars = Vars::new()
        .set("REDIRECT_URL", ROOT)
        .set("ICON", icon)
        .set("MESSAGE", message)
        .set("DETAILS", details);
    Ok(Response::html(site.templates().render("admin-success.html", &vars)))
}

fn dashboard(site: &Site, _req: &Request) -> Outcome {
    let vars = Vars::new().set("TITLE", "Admin Panel");
    Ok(Response::html(site.templates().render("admin.html", &vars)))
}

fn files(site: &Site, req: &Request) -> Outcome {
    let dir = req.arg("dir")
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DIR.to_owned());
    let entries = site.storage()
        .list(&dir)
        .map_err(|_| ServeError::Missing("Error: Cannot open directory"))?;

    let base = if dir.ends_with('/') { dir.clone() } else { format!("{dir}/") };
    let mut list = String::new();
    for entry in entries.iter().filter(|e| !e.is_dir && !e.name.starts_with('.')) {
        let name = escape(&entry.name);
        let path = escape(&format!("{base}{}", entry.name));

        list.push_str("<li class='file-item'>");
        list.push_str(&format!("<span class='file-name'>{name} ({} bytes)</span>", entry.size));
        list.push_str("<div class='actions'>");
        if EDITABLE.iter().any(|ext| entry.name.ends_with(ext)) {
            list.push_str(&format!("<a href='/admin/edit?file={path}' class='btn'>✏️ Edit</a>"));
        }
        list.push_str(&format!(
            "<form method='POST' action='/admin/delete' style='display:inline;margin:0'>\
             <input type='hidden' name='file' value='{path}'>\
             <button type='submit' class='btn btn-danger' \
             onclick='return confirm(\"Delete {name}?\")'>🗑️ Delete</button></form>"
        ));
        list.push_str("</div></li>");
    }
    if list.is_empty() {
        list.push_str("<li class='file-item'><em>No files found in this directory</em></li>");
    }

    let vars = Vars::new()
        .set("DIRECTORY", escape(&dir))
        .set("FILE_LIST", list);
    Ok(Response::html(site.templates().render("admin-files.html", &vars)))
}

fn edit(site: &Site, req: &Request) -> Outcome {
    let path = required(req, "file")?;
    let content = site.storage()
        .read_string(&path)
        .map_err(|_| ServeError::Missing("File not found"))?;

    let chars = content.chars().count();
    let mut length = format!("{chars} characters");
    if chars > LARGE_EDIT {
        length.push_str(" ⚠️ WARNING: large files may fail to save");
    }

    let vars = Vars::new()
        .set("FILE_PATH", escape(&path))
        .set("CONTENT", escape(&content))
        .set("CONTENT_LENGTH", length);
    Ok(Response::html(site.templates().render("admin-edit.html", &vars)))
}

fn save(site: &Site, req: &Request) -> Outcome {
    let path = required(req, "file")?;
    let content = req.arg("content").unwrap_or_default();
    info!(file = %path, len = content.len(), "admin save");
    if content.is_empty() {
        return Err(ServeError::EmptyPayload { path });
    }

    site.storage()
        .write(&path, content.as_bytes())
        .map_err(ServeError::storage("Cannot open file for writing"))?;

    success(
        site,
        "✅",
        "File Saved Successfully!",
        format!("<p>{}</p><p>{} bytes written</p>", escape(&path), content.len()),
    )
}

/// Stores the first file part. The target comes from `path` (query string
/// or form field); a target ending in `/` gets the uploaded file's name.
fn upload(site: &Site, req: &Request) -> Outcome {
    let form = req.multipart()
        .ok_or_else(|| ServeError::BadRequest("expected multipart/form-data".to_owned()))?
        .map_err(|e| ServeError::BadRequest(e.to_string()))?;
    let file = form.file()
        .ok_or_else(|| ServeError::BadRequest("no file in upload".to_owned()))?;
    let mut path = req.query("path")
        .map(str::to_owned)
        .or_else(|| form.field("path"))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ServeError::BadRequest("missing `path`".to_owned()))?;
    if path.ends_with('/') {
        path.push_str(file.file_name.as_deref().unwrap_or_default());
    }

    site.storage()
        .write(&path, &file.data)
        .map_err(ServeError::storage("Upload Failed"))?;
    info!(file = %path, size = file.data.len(), "admin upload");

    success(
        site,
        "✅",
        "File Uploaded Successfully!",
        format!("<p>{}</p><p>{} bytes</p>", escape(&path), file.data.len()),
    )
}

fn delete(site: &Site, req: &Request) -> Outcome {
    let path = required(req, "file")?;
    site.storage()
        .remove(&path)
        .map_err(ServeError::storage("Delete Failed"))?;
    info!(file = %path, "admin delete");

    success(site, "✅", "File Deleted Successfully!", format!("<p>{}</p>", escape(&path)))
}

fn reload(site: &Site, _req: &Request) -> Outcome {
    let report = site.reload();
    success(
        site,
        "🔄",
        "Configuration Reloaded!",
        format!("<p>Posts: {}</p><p>Redirects: {}</p>", report.posts, report.redirects),
    )
}

fn logs(site: &Site, _req: &Request) -> Outcome {
    let vars = match site.access_log().tail(LOG_VIEW_LINES) {
        Some(tail) => {
            let entries: String = tail.lines.iter()
                .map(|line| format!("<div class='log-entry'>{}</div>", escape(line)))
                .collect();
            let note = if tail.is_truncated() {
                format!("Showing last {} entries (of {} total)", tail.lines.len(), tail.total)
            } else {
                String::new()
            };
            Vars::new()
                .set("LOG_SIZE", tail.size.to_string())
                .set("LOG_COUNT", tail.total.to_string())
                .set("LOG_NOTE", note)
                .set("LOG_ENTRIES", entries)
        }
        None => Vars::new()
            .set("LOG_SIZE", "0")
            .set("LOG_COUNT", "0")
            .set("LOG_NOTE", "")
            .set(
                "LOG_ENTRIES",
                "<p class='empty'>No log file found. Logs will appear here once traffic starts.</p>",
            ),
    };
    Ok(Response::html(site.templates().render("admin-logs.html", &vars)))
}
