//! Paged listing over the post table.
//!
//! Only mappings under [`POSTS_PREFIX`] take part; other mappings (an
//! `/about` page, say) are reachable by URL but never listed. Order is the
//! route file's order.

use crate::catalog::PostMapping;

pub const POSTS_PREFIX: &str = "/posts/";

/// Path of the paged listing; the page number travels as `?p=N`.
pub const PAGE_PATH: &str = "/page";

/// One page of eligible posts.
#[derive(Debug)]
pub struct Page<'a> {
    /// 0-based.
    pub index: usize,
    pub total_pages: usize,
    pub entries: Vec<&'a PostMapping>,
}

impl Page<'_> {
    pub fn has_previous(&self) -> bool { self.index > 0 }
    pub fn has_next(&self) -> bool { self.index + 1 < self.total_pages }
}

/// Mappings that belong in listings, in table order.
pub fn eligible(posts: &[PostMapping]) -> impl Iterator<Item = &PostMapping> {
    posts.iter().filter(|p| p.url_path.starts_with(POSTS_PREFIX))
}

/// `ceil(count / page_size)`; zero posts means zero pages.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

/// The `page`-th slice of eligible posts, or `None` if the page does not
/// exist. Negative pages and pages past the end are both out of range.
pub fn paginate(posts: &[PostMapping], page: i64, page_size: usize) -> Option<Page<'_>> {
    let page_size = page_size.max(1);
    let index = usize::try_from(page).ok()?;

    let count = eligible(posts).count();
    if index.checked_mul(page_size)? >= count {
        return None;
    }

    Some(Page {
        index,
        total_pages: total_pages(count, page_size),
        entries: eligible(posts).skip(index * page_size).take(page_size).collect(),
    })
}

/// Previous/next links around a "Page X of Y" label.
pub fn controls(page: &Page<'_>) -> String {
    let mut html = String::from("<div class='pagination'>");
    if page.has_previous() {
        html.push_str(&format!("<a href='{PAGE_PATH}?p={}'>« Previous</a> ", page.index - 1));
    }
    html.push_str(&format!("Page {} of {}", page.index + 1, page.total_pages));
    if page.has_next() {
        html.push_str(&format!(" <a href='{PAGE_PATH}?p={}'>Next »</a>", page.index + 1));
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(posts: usize) -> Vec<PostMapping> {
        let mut table = vec![PostMapping {
            url_path: "/about".into(),
            file_name: "about.md".into(),
            title: "About".into(),
        }];
        table.extend((0..posts).map(|i| PostMapping {
            url_path: format!("/posts/{i}"),
            file_name: format!("{i}.md"),
            title: format!("Post {i}"),
        }));
        table
    }

    #[test]
    fn pages_reassemble_the_eligible_list() {
        let posts = table(7);
        let total = total_pages(eligible(&posts).count(), 3);
        assert_eq!(total, 3);

        let joined: Vec<&str> = (0..total as i64)
            .flat_map(|p| paginate(&posts, p, 3).unwrap().entries)
            .map(|p| p.url_path.as_str())
            .collect();
        let expected: Vec<&str> = eligible(&posts).map(|p| p.url_path.as_str()).collect();
        assert_eq!(joined, expected);
        assert_eq!(paginate(&posts, 2, 3).unwrap().entries.len(), 1);
    }

    #[test]
    fn out_of_range_pages_do_not_exist() {
        let posts = table(4);
        assert!(paginate(&posts, -1, 2).is_none());
        assert!(paginate(&posts, 2, 2).is_none());
        assert!(paginate(&posts, i64::MAX, 2).is_none());
    }

    #[test]
    fn no_posts_means_no_pages() {
        let posts = table(0);
        assert_eq!(total_pages(eligible(&posts).count(), 20), 0);
        assert!(paginate(&posts, 0, 20).is_none());
    }

    #[test]
    fn boundary_flags() {
        let posts = table(5);
        let first = paginate(&posts, 0, 2).unwrap();
        let last = paginate(&posts, 2, 2).unwrap();
        assert!(!first.has_previous() && first.has_next());
        assert!(last.has_previous() && !last.has_next());
    }

    #[test]
    fn controls_markup() {
        let posts = table(5);
        let middle = paginate(&posts, 1, 2).unwrap();
        assert_eq!(
            controls(&middle),
            "<div class='pagination'><a href='/page?p=0'>« Previous</a> Page 2 of 3 \
             <a href='/page?p=2'>Next »</a></div>"
        );
        let only = paginate(&posts, 0, 10).unwrap();
        assert_eq!(controls(&only), "<div class='pagination'>Page 1 of 1</div>");
    }
}
