//! tululu.org page parsers: book detail pages and category listing pages.

use crate::model::BookRecord;
use crate::scraper::error::ScraperError;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

/// Parse a CSS selector or return an error (avoids panics from Selector::parse).
fn parse_selector(sel: &str) -> Result<Selector, ScraperError> {
    Selector::parse(sel).map_err(|e| ScraperError::Selector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

fn element_text(e: ElementRef<'_>) -> String {
    e.text().collect::<String>().trim().to_string()
}

/// Split a page title into (name, author).
///
/// Titles look like `"{name} - {author}, читать онлайн..."`. Everything after the
/// first comma is dropped first, then the rest is split on the last `" - "` so that
/// hyphens inside the book name survive.
pub fn split_title(title: &str) -> Option<(String, String)> {
    let head = title.split(',').next().unwrap_or(title);
    let (name, author) = head.rsplit_once(" - ")?;
    let name = name.trim();
    let author = author.trim();
    if name.is_empty() || author.is_empty() {
        return None;
    }
    Some((name.to_string(), author.to_string()))
}

/// Extract a [BookRecord] from a detail page. `base_url` is the URL the page was served from.
pub fn parse_detail_page(id: u32, html: &str, base_url: &Url) -> Result<BookRecord, ScraperError> {
    let parse_error = |message: &str| ScraperError::ParseDetailPage {
        url: base_url.to_string(),
        message: message.to_string(),
    };

    let doc = Html::parse_document(html);
    let title_sel = parse_selector("title")?;
    let image_sel = parse_selector("div.bookimage img")?;
    let genre_sel = parse_selector("span.d_book")?;
    let link_sel = parse_selector("a")?;
    let comment_sel = parse_selector("div.texts")?;
    let span_sel = parse_selector("span")?;

    let title = doc
        .select(&title_sel)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| parse_error("missing title"))?;
    let (name, author) =
        split_title(&title).ok_or_else(|| parse_error("title is not \"name - author\""))?;

    let src = doc
        .select(&image_sel)
        .next()
        .ok_or_else(|| parse_error("missing cover image container"))?
        .value()
        .attr("src")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| parse_error("cover image has no src"))?;
    let image_url = base_url
        .join(src)
        .map_err(|e| parse_error(&format!("bad cover image src {:?}: {}", src, e)))?;

    let genres = doc
        .select(&genre_sel)
        .flat_map(|span| span.select(&link_sel).map(element_text).collect::<Vec<_>>())
        .filter(|g| !g.is_empty())
        .collect();

    let comments = doc
        .select(&comment_sel)
        .filter_map(|div| div.select(&span_sel).next())
        .map(element_text)
        .collect();

    Ok(BookRecord {
        id,
        name,
        author,
        genres,
        image_url: image_url.to_string(),
        local_image_path: None,
        comments,
    })
}

/// Book id from a detail link such as `/b239/`. Returns None for anything else.
pub fn book_id_from_href(href: &str) -> Option<u32> {
    let digits = href.trim().trim_matches('/').strip_prefix('b')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Ids of every book linked from a category listing page, in page order.
pub fn parse_listing_page(html: &str) -> Result<Vec<u32>, ScraperError> {
    let doc = Html::parse_document(html);
    let link_sel = parse_selector(".d_book .bookimage a")?;
    Ok(doc
        .select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(book_id_from_href)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_html(title: &str, img: &str) -> String {
        format!(
            r#"<!DOCTYPE html><html><head><title>{title}</title></head><body>
<table class="d_book"><tr><td>
<div class="bookimage"><a href="/b5/"><img src="{img}" alt="cover"></a></div>
</td></tr></table>
<span class="d_book"><b>Жанр книги:</b> <a href="/l55/" title="Научная фантастика">Научная фантастика</a>, <a href="/l7/">Прочие приключения</a></span>
<span class="d_book"><b>Жанр:</b> <a href="/l99/">Повесть</a></span>
<div class="texts"><b>Reader</b><span class="black">Great read.</span></div>
<div class="texts"><b>Other</b><span class="black">Too short.</span></div>
</body></html>"#
        )
    }

    #[test]
    fn title_truncates_at_comma_then_splits_on_last_dash() {
        assert_eq!(
            split_title("Eagle's Flight - J. Doe, fantasy"),
            Some(("Eagle's Flight".to_string(), "J. Doe".to_string()))
        );
        assert_eq!(
            split_title("Space - The Final - Frontier - A. Writer, read online, free"),
            Some(("Space - The Final - Frontier".to_string(), "A. Writer".to_string()))
        );
    }

    #[test]
    fn title_without_separator_is_rejected() {
        assert_eq!(split_title("Just a title, with comma"), None);
        assert_eq!(split_title(" - Author"), None);
        assert_eq!(split_title("Name - , fantasy"), None);
    }

    #[test]
    fn parse_detail_page_extracts_all_fields() -> Result<(), Box<dyn std::error::Error>> {
        let base = Url::parse("https://site.example/b5/")?;
        let html = detail_html("Eagle's Flight - J. Doe, fantasy", "/files/x.jpg");
        let book = parse_detail_page(5, &html, &base)?;
        assert_eq!(book.id, 5);
        assert_eq!(book.name, "Eagle's Flight");
        assert_eq!(book.author, "J. Doe");
        assert_eq!(book.image_url, "https://site.example/files/x.jpg");
        assert_eq!(
            book.genres,
            vec!["Научная фантастика", "Прочие приключения", "Повесть"]
        );
        assert_eq!(book.comments, vec!["Great read.", "Too short."]);
        assert!(book.local_image_path.is_none());
        Ok(())
    }

    #[test]
    fn relative_cover_path_resolves_against_page_dir() -> Result<(), Box<dyn std::error::Error>> {
        let base = Url::parse("https://site.example/b5/")?;
        let html = detail_html("A - B", "../shots/5.jpg");
        let book = parse_detail_page(5, &html, &base)?;
        assert_eq!(book.image_url, "https://site.example/shots/5.jpg");
        Ok(())
    }

    #[test]
    fn page_without_comments_yields_empty_list() -> Result<(), Box<dyn std::error::Error>> {
        let base = Url::parse("https://tululu.org/b1/")?;
        let html = r#"<html><head><title>Name - Author</title></head><body>
<div class="bookimage"><img src="/images/nopic.gif"></div></body></html>"#;
        let book = parse_detail_page(1, html, &base)?;
        assert!(book.comments.is_empty());
        assert!(book.genres.is_empty());
        assert_eq!(book.image_url, "https://tululu.org/images/nopic.gif");
        Ok(())
    }

    #[test]
    fn missing_cover_container_is_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let base = Url::parse("https://tululu.org/b1/")?;
        let html = "<html><head><title>Name - Author</title></head><body></body></html>";
        let err = parse_detail_page(1, html, &base)
            .err()
            .ok_or("expected parse error")?;
        assert!(err.is_not_found());
        assert!(err.to_string().contains("cover image container"));
        Ok(())
    }

    #[test]
    fn missing_title_is_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let base = Url::parse("https://tululu.org/b1/")?;
        let html = r#"<html><body><div class="bookimage"><img src="/x.jpg"></div></body></html>"#;
        match parse_detail_page(1, html, &base) {
            Err(ScraperError::ParseDetailPage { message, .. }) => {
                assert!(message.contains("title"));
                Ok(())
            }
            other => Err(format!("expected ParseDetailPage, got {:?}", other).into()),
        }
    }

    #[test]
    fn book_id_from_href_variants() {
        assert_eq!(book_id_from_href("/b239/"), Some(239));
        assert_eq!(book_id_from_href("b7"), Some(7));
        assert_eq!(book_id_from_href(" /b12/ "), Some(12));
        assert_eq!(book_id_from_href("/l55/"), None);
        assert_eq!(book_id_from_href("/b/"), None);
        assert_eq!(book_id_from_href("/b12x/"), None);
        assert_eq!(book_id_from_href("https://tululu.org/b5/"), None);
    }

    #[test]
    fn listing_page_skips_malformed_links() -> Result<(), ScraperError> {
        let html = r#"<html><body>
<table class="d_book"><tr><td><div class="bookimage"><a href="/b239/"><img src="/shots/239.jpg"></a></div></td></tr></table>
<table class="d_book"><tr><td><div class="bookimage"><a><img src="/shots/x.jpg"></a></div></td></tr></table>
<table class="d_book"><tr><td><div class="bookimage"><a href="/about/"><img src="/shots/y.jpg"></a></div></td></tr></table>
<table class="d_book"><tr><td><div class="bookimage"><a href="/b550/"><img src="/shots/550.jpg"></a></div></td></tr></table>
<a href="/b999/">not inside a book card</a>
</body></html>"#;
        assert_eq!(parse_listing_page(html)?, vec![239, 550]);
        Ok(())
    }
}
