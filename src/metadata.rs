use std::sync::LazyLock;

use scraper::{Html, Selector};

pub const NO_TITLE: &str = "No title";
pub const NO_DESCRIPTION: &str = "No description";

const SITE_SUFFIX: &str = " - YouTube";

static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static OG_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());

/// Pull `(title, description)` out of a watch page.
///
/// Title: og:title, then `<title>` minus the site suffix, then a fixed
/// fallback. Description: og:description, then the plain description meta
/// tag, then a fixed fallback. A tag that exists wins its tier even when
/// its content is empty.
pub fn extract_metadata(html: &str) -> (String, String) {
    let document = Html::parse_document(html);
    (extract_title(&document), extract_description(&document))
}

fn extract_title(document: &Html) -> String {
    if let Some(content) = meta_content(document, &OG_TITLE) {
        return content;
    }

    if let Some(el) = document.select(&TITLE).next() {
        let text = el.text().collect::<String>();
        let text = text.trim();
        return text.strip_suffix(SITE_SUFFIX).unwrap_or(text).to_string();
    }

    NO_TITLE.to_string()
}

fn extract_description(document: &Html) -> String {
    meta_content(document, &OG_DESCRIPTION)
        .or_else(|| meta_content(document, &DESCRIPTION))
        .unwrap_or_else(|| NO_DESCRIPTION.to_string())
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.value().attr("content").unwrap_or_default().to_string())
}
