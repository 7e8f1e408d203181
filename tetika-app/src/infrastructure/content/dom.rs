//! Minimal DOM capability used by every analyzer and extractor, so the same
//! logic runs over any parser backend that can answer CSS queries.

use super::normalizer::clean_text;
use scraper::{ElementRef, Html, Selector};
use url::Url;

pub trait DomNode: Sized + Clone {
    /// Lowercase element name.
    fn tag(&self) -> String;

    /// All descendant text, whitespace-collapsed.
    fn text_content(&self) -> String;

    /// Descendant text with subtrees matching any of `selectors` skipped.
    fn text_excluding(&self, selectors: &[String]) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Descendants matching `selector`, in document order. An invalid
    /// selector matches nothing.
    fn query_all(&self, selector: &str) -> Vec<Self>;

    fn query(&self, selector: &str) -> Option<Self> {
        self.query_all(selector).into_iter().next()
    }

    fn class_attr(&self) -> String {
        self.attribute("class").unwrap_or_default()
    }
}

pub trait DomTree {
    type Node<'a>: DomNode
    where
        Self: 'a;

    fn url(&self) -> &Url;

    fn root(&self) -> Self::Node<'_>;

    fn query_all(&self, selector: &str) -> Vec<Self::Node<'_>> {
        self.root().query_all(selector)
    }

    fn count(&self, selector: &str) -> usize {
        self.query_all(selector).len()
    }

    fn title(&self) -> Option<String>;

    fn body_text(&self) -> String;

    fn host(&self) -> Option<String> {
        self.url()
            .host_str()
            .map(|h| h.trim_start_matches("www.").to_lowercase())
    }
}

/// Static HTML document parsed with `scraper`.
pub struct HtmlPage {
    document: Html,
    url: Url,
}

impl HtmlPage {
    pub fn parse(html: &str, url: Url) -> Self {
        Self {
            document: Html::parse_document(html),
            url,
        }
    }

    pub fn meta_content(&self, selector: &str) -> Option<String> {
        self.root()
            .query(selector)
            .and_then(|el| el.value().attr("content").map(clean_text))
            .filter(|s| !s.is_empty())
    }
}

impl DomTree for HtmlPage {
    type Node<'a> = ElementRef<'a>;

    fn url(&self) -> &Url {
        &self.url
    }

    fn root(&self) -> ElementRef<'_> {
        self.document.root_element()
    }

    fn title(&self) -> Option<String> {
        self.root()
            .query("title")
            .map(|el| el.text_content())
            .filter(|t| !t.is_empty())
    }

    fn body_text(&self) -> String {
        match self.root().query("body") {
            Some(body) => body.text_content(),
            None => self.root().text_content(),
        }
    }
}

impl<'a> DomNode for ElementRef<'a> {
    fn tag(&self) -> String {
        self.value().name().to_lowercase()
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(*self, &[], &mut out);
        clean_text(&out)
    }

    fn text_excluding(&self, selectors: &[String]) -> String {
        let parsed: Vec<Selector> = selectors
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect();
        let mut out = String::new();
        collect_text(*self, &parsed, &mut out);
        clean_text(&out)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn query_all(&self, selector: &str) -> Vec<Self> {
        match Selector::parse(selector) {
            Ok(sel) => self.select(&sel).collect(),
            Err(_) => {
                tracing::debug!("Skipping invalid selector {:?}", selector);
                Vec::new()
            }
        }
    }
}

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "section", "table", "td", "th", "tr", "ul",
];

// Inline children are concatenated as-is; block children are padded so
// their text never fuses with a neighbour's.
fn collect_text(element: ElementRef<'_>, skip: &[Selector], out: &mut String) {
    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if skip.iter().any(|sel| sel.matches(&child_el)) {
                continue;
            }
            let block = BLOCK_TAGS.contains(&child_el.value().name());
            if block {
                out.push(' ');
            }
            collect_text(child_el, skip, out);
            if block {
                out.push(' ');
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> HtmlPage {
        HtmlPage::parse(html, Url::parse("https://site.com/partners").unwrap())
    }

    #[test]
    fn test_query_and_text() {
        let page = page(
            "<html><head><title> Partners </title></head>\
             <body><div class='card'><h3>Acme</h3><span>Inc</span></div></body></html>",
        );
        assert_eq!(page.title().as_deref(), Some("Partners"));
        assert_eq!(page.count(".card"), 1);

        let card = page.query_all(".card").remove(0);
        assert_eq!(card.tag(), "div");
        assert_eq!(card.text_content(), "Acme Inc");
        assert_eq!(card.class_attr(), "card");
    }

    #[test]
    fn test_inline_markup_does_not_split_words() {
        let page = page(
            "<html><body><h3>Bio<span>Tech</span></h3><p>Medical<br>imaging</p>\
             <ul><li>One</li><li>Two</li></ul></body></html>",
        );
        assert_eq!(page.root().query("h3").unwrap().text_content(), "BioTech");
        assert_eq!(page.body_text(), "BioTech Medical imaging One Two");
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let page = page("<html><body><p>x</p></body></html>");
        assert!(page.query_all("p[[[").is_empty());
    }

    #[test]
    fn test_text_excluding_skips_noise_subtrees() {
        let page = page(
            "<html><body><nav>Menu Home</nav><p>Real text</p>\
             <script>var x = 1;</script><div class='sidebar-left'>Ads</div></body></html>",
        );
        let body = page.root().query("body").unwrap();
        let text = body.text_excluding(&[
            "nav".to_string(),
            "script".to_string(),
            "[class*='sidebar']".to_string(),
        ]);
        assert_eq!(text, "Real text");
    }

    #[test]
    fn test_host_strips_www() {
        let page = HtmlPage::parse("", Url::parse("https://www.Site.com/x").unwrap());
        assert_eq!(page.host().as_deref(), Some("site.com"));
    }
}
