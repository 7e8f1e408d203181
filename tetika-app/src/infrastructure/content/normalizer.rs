use super::dom::{DomNode, DomTree};
use crate::config::ContentConfig;
use url::Url;

/// Collapses every whitespace run (newlines included) to one space and trims.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves `candidate` against `base_url`. Absolute URLs come back
/// unchanged; anything that cannot be resolved is returned as given.
pub fn normalize_url(candidate: &str, base_url: &str) -> String {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return candidate.to_string();
    }

    if Url::parse(trimmed).is_ok() {
        return trimmed.to_string();
    }

    if trimmed.starts_with("www.") {
        return format!("https://{}", trimmed);
    }

    match Url::parse(base_url).and_then(|base| base.join(trimmed)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => candidate.to_string(),
    }
}

/// Host without a leading `www.`, lowercased.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_lowercase())
}

/// Anchor targets that never lead to another page.
pub fn is_skippable_href(href: &str) -> bool {
    let href = href.trim().to_lowercase();
    href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
}

/// True when `host` is `site` itself or one of its subdomains.
pub fn is_same_site(host: &str, site: &str) -> bool {
    host == site || host.ends_with(&format!(".{}", site))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainContent {
    pub text: String,
    pub truncated: bool,
}

/// Picks the page's main readable text: the first content selector with
/// enough text wins, otherwise the body minus navigation chrome.
pub fn extract_main_content<T: DomTree>(tree: &T, config: &ContentConfig) -> MainContent {
    let selected = config.content_selectors.iter().find_map(|selector| {
        tree.query_all(selector)
            .into_iter()
            .map(|node| node.text_excluding(&config.noise_selectors))
            .find(|text| text.chars().count() > config.min_content_chars)
    });

    let text = selected.unwrap_or_else(|| match tree.root().query("body") {
        Some(body) => body.text_excluding(&config.noise_selectors),
        None => tree.root().text_excluding(&config.noise_selectors),
    });

    truncate_content(text, config.max_content_chars, &config.truncation_marker)
}

fn truncate_content(text: String, max_chars: usize, marker: &str) -> MainContent {
    if text.chars().count() <= max_chars {
        return MainContent {
            text,
            truncated: false,
        };
    }

    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str(marker);
    MainContent {
        text: cut,
        truncated: true,
    }
}
