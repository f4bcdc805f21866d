//! Readable text extraction from scraped HTML
//!
//! Picks the main content container (an `article` or `main` element when it
//! holds most of the page text, otherwise `body`) and joins the text of its
//! paragraph-level blocks with blank lines. Navigation, scripts and similar
//! chrome are skipped.

use scraper::{ElementRef, Html, Selector};

const BLOCK_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, li, blockquote, pre, td, dt, dd";
const CONTAINER_SELECTOR: &str = "article, main, [role=main]";
const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre", "td", "dt", "dd",
];
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "template",
];

/// Title and body text of a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadablePage {
    pub title: String,
    pub content: String,
}

pub fn extract_readable(html: &str) -> ReadablePage {
    let document = Html::parse_document(html);

    let title = first_text(&document, "title")
        .or_else(|| first_text(&document, "h1"))
        .unwrap_or_default();

    let body = select_first(&document, "body");
    let body_text = body.map(block_text).unwrap_or_default();

    let main_text = selector(CONTAINER_SELECTOR)
        .map(|containers| {
            document
                .select(&containers)
                .map(block_text)
                .max_by_key(|text| text.len())
                .unwrap_or_default()
        })
        .unwrap_or_default();

    let content = if !main_text.is_empty() && main_text.len() * 2 >= body_text.len() {
        main_text
    } else if !body_text.is_empty() {
        body_text
    } else {
        body.map(visible_text).unwrap_or_default()
    };

    ReadablePage { title, content }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    document.select(&selector).next()
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    select_first(document, css)
        .map(|element| normalize_whitespace(element.text()))
        .filter(|text| !text.is_empty())
}

/// Text of the outermost block elements inside `container`
fn block_text(container: ElementRef<'_>) -> String {
    let Some(blocks) = selector(BLOCK_SELECTOR) else {
        return String::new();
    };

    container
        .select(&blocks)
        .filter(|block| !has_ancestor_in(block, container, BLOCK_TAGS))
        .filter(|block| !has_ancestor_in(block, container, SKIPPED_TAGS))
        .map(|block| normalize_whitespace(block.text()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fallback for pages without block markup
fn visible_text(container: ElementRef<'_>) -> String {
    let texts = container.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| SKIPPED_TAGS.contains(&ancestor.value().name()));
        (!hidden).then_some(&**text)
    });
    normalize_whitespace(texts)
}

fn has_ancestor_in(element: &ElementRef<'_>, container: ElementRef<'_>, tags: &[&str]) -> bool {
    element
        .ancestors()
        .take_while(|node| node.id() != container.id())
        .filter_map(ElementRef::wrap)
        .any(|ancestor| tags.contains(&ancestor.value().name()))
}

fn normalize_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_content_wins_over_chrome() {
        let page = extract_readable(
            r#"<html><head><title> Data Retention Rule </title><script>var x = 1;</script></head>
            <body>
              <nav><ul><li>Home</li><li>About</li></ul></nav>
              <article>
                <h1>Retention</h1>
                <p>Operators must delete   personal data
                   after 30 days.</p>
                <ul><li><p>Exception: legal holds.</p></li></ul>
              </article>
              <footer><p>Copyright</p></footer>
            </body></html>"#,
        );

        assert_eq!(page.title, "Data Retention Rule");
        assert_eq!(
            page.content,
            "Retention\n\nOperators must delete personal data after 30 days.\n\nException: legal holds."
        );
    }

    #[test]
    fn body_is_used_when_no_main_container() {
        let page = extract_readable(
            "<html><body><h1>Notice</h1><p>First.</p><p>Second.</p></body></html>",
        );
        assert_eq!(page.title, "Notice");
        assert_eq!(page.content, "Notice\n\nFirst.\n\nSecond.");
    }

    #[test]
    fn plain_text_body_falls_back_to_visible_text() {
        let page = extract_readable(
            "<html><body>Just some text<script>ignored()</script> here</body></html>",
        );
        assert_eq!(page.title, "");
        assert_eq!(page.content, "Just some text here");
    }

    #[test]
    fn identical_markup_extracts_identically() {
        let html = "<html><head><title>T</title></head><body><p>Same</p></body></html>";
        assert_eq!(extract_readable(html), extract_readable(html));
    }
}
