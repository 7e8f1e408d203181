//! Independent ways of finding entities on a page. The extractor runs them in
//! order and keeps the first record found for each name.

use super::name_validation::{is_valid_company_name, MAX_NAME_CHARS};
use super::tags::infer_tags;
use super::website_resolver::WebsiteResolver;
use crate::config::ExtractorConfig;
use crate::domain::CompanyData;
use crate::infrastructure::content::{
    clean_text, host_of, is_same_site, is_skippable_href, normalize_url, DomNode, DomTree,
};
use regex_lite::Regex;
use std::collections::HashSet;
use std::sync::Arc;

pub const CARD_CONFIDENCE: f32 = 0.8;
pub const LIST_LINK_CONFIDENCE: f32 = 0.6;
pub const TEXT_PATTERN_CONFIDENCE: f32 = 0.4;

const MAX_DESCRIPTION_CHARS: usize = 500;
const MIN_DESCRIPTION_CHARS: usize = 10;

pub trait ExtractionStrategy<T: DomTree>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best effort; an unsuitable page yields an empty list.
    fn try_extract(&self, tree: &T) -> Vec<CompanyData>;
}

/// Card-like containers with a heading or name element.
pub struct CardSelectorStrategy {
    config: Arc<ExtractorConfig>,
    resolver: WebsiteResolver,
    employees: Option<Regex>,
}

impl CardSelectorStrategy {
    pub fn new(config: Arc<ExtractorConfig>) -> Self {
        let employees = Regex::new(
            r"(?i)(\d[\d,.]*(?:\s*(?:-|to)\s*\d[\d,.]*)?\+?)\s*(?:employees|employés|staff|people)",
        )
        .ok();
        Self {
            resolver: WebsiteResolver::new(config.clone()),
            config,
            employees,
        }
    }

    fn container_name<N: DomNode>(&self, container: &N) -> Option<String> {
        for selector in &self.config.name_selectors {
            for candidate in container.query_all(selector) {
                let text = candidate.text_content();
                if is_valid_company_name(&text, &self.config) {
                    return Some(text);
                }
            }
        }

        let card_like = container.tag() == "a" || container.query("a[href], img").is_some();
        let own = container.text_content();
        if card_like
            && own.chars().count() <= MAX_NAME_CHARS
            && is_valid_company_name(&own, &self.config)
        {
            return Some(own);
        }
        None
    }

    // A grid of cards matches the container selectors too; skip it so its
    // text does not leak into the first card's record.
    fn is_wrapper<N: DomNode>(&self, container: &N) -> bool {
        let nested = self
            .config
            .container_selectors
            .iter()
            .map(|selector| container.query_all(selector).len())
            .max()
            .unwrap_or(0);
        nested >= 2 && container.query_all("h1, h2, h3, h4, h5").len() >= 2
    }

    fn describe<N: DomNode>(&self, container: &N, name: &str) -> Option<String> {
        self.config.description_selectors.iter().find_map(|selector| {
            container
                .query_all(selector)
                .into_iter()
                .map(|node| node.text_content())
                .find(|text| text != name && text.chars().count() >= MIN_DESCRIPTION_CHARS)
                .map(|text| text.chars().take(MAX_DESCRIPTION_CHARS).collect())
        })
    }

    fn first_text<N: DomNode>(&self, container: &N, selectors: &[String]) -> Option<String> {
        selectors.iter().find_map(|selector| {
            container
                .query_all(selector)
                .into_iter()
                .map(|node| node.text_content())
                .find(|text| !text.is_empty())
        })
    }

    fn employees(&self, text: &str) -> Option<String> {
        self.employees
            .as_ref()?
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    }
}

impl<T: DomTree> ExtractionStrategy<T> for CardSelectorStrategy {
    fn name(&self) -> &'static str {
        "card"
    }

    fn try_extract(&self, tree: &T) -> Vec<CompanyData> {
        let base = tree.url().as_str();
        let page_host = tree.host();
        let mut seen = HashSet::new();
        let mut companies = Vec::new();

        for selector in &self.config.container_selectors {
            for container in tree.query_all(selector) {
                if companies.len() >= self.config.max_companies {
                    return companies;
                }
                if self.is_wrapper(&container) {
                    continue;
                }
                let Some(name) = self.container_name(&container) else {
                    continue;
                };
                if !seen.insert(name.to_lowercase()) {
                    continue;
                }

                let text = container.text_content();
                let mut company = CompanyData::new(name.clone(), "card", CARD_CONFIDENCE);
                company.description = self.describe(&container, &name);
                company.location = self.first_text(&container, &self.config.location_selectors);
                company.employees = self.employees(&text);
                company.logo = container
                    .query("img")
                    .and_then(|img| img.attribute("src").or_else(|| img.attribute("data-src")))
                    .filter(|src| !src.trim().is_empty())
                    .map(|src| normalize_url(&src, base));

                let mut anchors = container.query_all("a[href]");
                if container.tag() == "a" {
                    anchors.insert(0, container.clone());
                }
                for anchor in anchors {
                    let href = anchor.attribute("href").unwrap_or_default();
                    if is_skippable_href(&href) {
                        continue;
                    }
                    let url = normalize_url(&href, base);
                    let on_site = match (host_of(&url), page_host.as_deref()) {
                        (Some(host), Some(page)) => is_same_site(&host, page),
                        _ => false,
                    };
                    if on_site {
                        company.linked_detail_url.get_or_insert(url);
                    } else if !self.resolver.is_social(&url) {
                        company.website.get_or_insert(url);
                    }
                }

                for tag in infer_tags(&text, &self.config.tag_rules) {
                    company.add_tag(&tag);
                }
                company
                    .additional_data
                    .insert("matchedSelector".to_string(), selector.clone());

                companies.push(company);
            }
        }

        companies
    }
}

/// Outbound anchors inside list items and table cells, named by their text.
pub struct ListLinkStrategy {
    config: Arc<ExtractorConfig>,
    resolver: WebsiteResolver,
}

impl ListLinkStrategy {
    pub fn new(config: Arc<ExtractorConfig>) -> Self {
        Self {
            resolver: WebsiteResolver::new(config.clone()),
            config,
        }
    }
}

impl<T: DomTree> ExtractionStrategy<T> for ListLinkStrategy {
    fn name(&self) -> &'static str {
        "list_link"
    }

    fn try_extract(&self, tree: &T) -> Vec<CompanyData> {
        let base = tree.url().as_str();
        let page_host = tree.host();
        let mut seen = HashSet::new();
        let mut companies = Vec::new();

        for selector in &self.config.list_link_selectors {
            for anchor in tree.query_all(selector) {
                if companies.len() >= self.config.max_companies {
                    return companies;
                }

                let href = anchor.attribute("href").unwrap_or_default();
                if is_skippable_href(&href) {
                    continue;
                }
                let url = normalize_url(&href, base);
                let Some(host) = host_of(&url) else {
                    continue;
                };
                if page_host.as_deref().is_some_and(|page| is_same_site(&host, page))
                    || self.resolver.is_social(&url)
                {
                    continue;
                }

                let mut name = anchor.text_content();
                if name.is_empty() {
                    name = anchor
                        .query("img")
                        .and_then(|img| img.attribute("alt"))
                        .map(|alt| clean_text(&alt))
                        .unwrap_or_default();
                }
                if !is_valid_company_name(&name, &self.config) || !seen.insert(name.to_lowercase()) {
                    continue;
                }

                companies.push(
                    CompanyData::new(name, "list_link", LIST_LINK_CONFIDENCE).with_website(Some(url)),
                );
            }
        }

        companies
    }
}

/// Names followed by a legal-form suffix anywhere in the body text.
pub struct TextPatternStrategy {
    config: Arc<ExtractorConfig>,
    pattern: Option<Regex>,
}

impl TextPatternStrategy {
    pub fn new(config: Arc<ExtractorConfig>) -> Self {
        let pattern = Regex::new(
            r"\b([A-Z][A-Za-z0-9&'\-]*(?:\s+[A-Z][A-Za-z0-9&'\-]*){0,4}),?\s+(Inc\.?|Ltd\.?|LLC|Corp\.?|GmbH|SAS|S\.A\.|SA|AG|Co\.)(?:[^A-Za-z0-9]|$)",
        )
        .ok();
        Self { config, pattern }
    }
}

impl<T: DomTree> ExtractionStrategy<T> for TextPatternStrategy {
    fn name(&self) -> &'static str {
        "text_pattern"
    }

    fn try_extract(&self, tree: &T) -> Vec<CompanyData> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };

        let text = tree.body_text();
        let mut seen = HashSet::new();
        let mut companies = Vec::new();

        for caps in pattern.captures_iter(&text) {
            if companies.len() >= self.config.max_companies {
                break;
            }
            let (Some(base), Some(suffix)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let suffix = suffix.as_str();
            let suffix = if suffix.len() > 3 && suffix.matches('.').count() == 1 {
                suffix.trim_end_matches('.')
            } else {
                suffix
            };

            let name = format!("{} {}", base.as_str().trim(), suffix);
            if !is_valid_company_name(&name, &self.config) || !seen.insert(name.to_lowercase()) {
                continue;
            }
            companies.push(CompanyData::new(name, "text_pattern", TEXT_PATTERN_CONFIDENCE));
        }

        companies
    }
}
