use crate::config::LinkConfig;
use crate::domain::{LinkData, LinkType};
use crate::infrastructure::content::{
    host_of, is_same_site, is_skippable_href, normalize_url, DomNode, DomTree,
};
use std::collections::HashSet;
use url::Url;

const MIN_PRIORITY: u8 = 1;
const MAX_PRIORITY: u8 = 10;

pub struct LinkClassifier {
    config: LinkConfig,
}

impl LinkClassifier {
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    /// Ranked anchors of the page, highest priority first. Equal priorities
    /// keep document order. Looks at no more than `2 * max_links` candidate
    /// anchors.
    pub fn extract_relevant_links<T: DomTree>(&self, tree: &T, max_links: usize) -> Vec<LinkData> {
        let base = tree.url().as_str();
        let page_host = tree.host();
        let scan_limit = max_links.saturating_mul(2);

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        let mut scanned = 0;

        for anchor in tree.query_all("a[href]") {
            if links.len() >= max_links || scanned >= scan_limit {
                break;
            }

            let href = anchor.attribute("href").unwrap_or_default();
            if is_skippable_href(&href) {
                continue;
            }
            scanned += 1;

            let url = normalize_url(&href, base);
            if !seen.insert(url.clone()) {
                continue;
            }

            let mut text = anchor.text_content();
            if text.is_empty() {
                text = anchor
                    .attribute("title")
                    .or_else(|| anchor.attribute("aria-label"))
                    .unwrap_or_default();
            }

            let (link_type, priority) = self.classify(&url, &text, page_host.as_deref());
            links.push(LinkData::new(url, &text, link_type, priority));
        }

        links.sort_by(|a, b| b.priority.cmp(&a.priority));
        links
    }

    pub fn classify(&self, url: &str, text: &str, page_host: Option<&str>) -> (LinkType, u8) {
        let url_lower = url.to_lowercase();
        let text_lower = text.to_lowercase();
        let path_lower = path_and_query(url).to_lowercase();

        let matches = |patterns: &[String]| {
            patterns
                .iter()
                .any(|p| path_lower.contains(p.as_str()) || text_lower.contains(p.as_str()))
        };

        let (link_type, mut priority) = if matches(&self.config.company_patterns) {
            (LinkType::Company, 8)
        } else if matches(&self.config.detail_patterns) {
            (LinkType::Detail, 7)
        } else if matches(&self.config.navigation_patterns) {
            (LinkType::Navigation, 6)
        } else if is_external(url, page_host) {
            (LinkType::External, 3)
        } else {
            (LinkType::Unknown, 1)
        };

        let boosted = self
            .config
            .boost_keywords
            .iter()
            .any(|kw| url_lower.contains(kw.as_str()) || text_lower.contains(kw.as_str()));
        if boosted {
            priority += self.config.boost;
        }

        let tokens: Vec<&str> = text_lower
            .split(|c: char| !c.is_alphanumeric())
            .chain(path_lower.split(|c: char| !c.is_alphanumeric()))
            .filter(|t| !t.is_empty())
            .collect();
        let is_chrome = self
            .config
            .chrome_terms
            .iter()
            .any(|term| tokens.contains(&term.as_str()));
        if is_chrome {
            priority = priority.saturating_sub(self.config.penalty).max(MIN_PRIORITY);
        }

        (link_type, priority.clamp(MIN_PRIORITY, MAX_PRIORITY))
    }
}

fn path_and_query(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}

fn is_external(url: &str, page_host: Option<&str>) -> bool {
    match (host_of(url), page_host) {
        (Some(link_host), Some(page_host)) => !is_same_site(&link_host, page_host),
        _ => false,
    }
}
