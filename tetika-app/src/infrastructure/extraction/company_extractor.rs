use super::strategies::{
    CardSelectorStrategy, ExtractionStrategy, ListLinkStrategy, TextPatternStrategy,
};
use super::tags::infer_tags;
use super::website_resolver::WebsiteResolver;
use crate::config::ExtractorConfig;
use crate::domain::CompanyData;
use crate::infrastructure::content::{is_skippable_href, normalize_url, DomNode, DomTree};
use std::collections::HashSet;
use std::sync::Arc;

const WEBSITE_CONFIDENCE_BONUS: f32 = 0.1;
const SEED_CONFIDENCE: f32 = 0.5;

pub struct CompanyExtractor {
    config: Arc<ExtractorConfig>,
    cards: CardSelectorStrategy,
    list_links: ListLinkStrategy,
    text_patterns: TextPatternStrategy,
    resolver: WebsiteResolver,
}

impl CompanyExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        let config = Arc::new(config);
        Self {
            cards: CardSelectorStrategy::new(config.clone()),
            list_links: ListLinkStrategy::new(config.clone()),
            text_patterns: TextPatternStrategy::new(config.clone()),
            resolver: WebsiteResolver::new(config.clone()),
            config,
        }
    }

    /// Runs every strategy, merges by case-insensitive name, then enriches
    /// the merged records. Never fails; a page without entities gives an
    /// empty list.
    pub fn extract<T: DomTree>(&self, tree: &T) -> Vec<CompanyData> {
        let strategies: [&dyn ExtractionStrategy<T>; 3] =
            [&self.cards, &self.list_links, &self.text_patterns];

        let mut seen = HashSet::new();
        let mut companies = Vec::new();
        for strategy in strategies {
            let found = strategy.try_extract(tree);
            let before = companies.len();
            merge_into(&mut companies, &mut seen, found);
            tracing::debug!(
                "Strategy {} added {} companies on {}",
                strategy.name(),
                companies.len() - before,
                tree.url()
            );
        }

        self.enrich(tree, &mut companies);
        self.add_seeds(tree, &mut seen, &mut companies);
        companies.truncate(self.config.max_companies);

        tracing::info!("Extracted {} companies from {}", companies.len(), tree.url());
        companies
    }

    /// Fills the gaps of a record from the company's own detail page: a
    /// website whose domain resembles the name, and the page description.
    pub fn enrich_from_detail<T: DomTree>(&self, company: &mut CompanyData, detail: &T) {
        if company.website.is_none() {
            let links = page_links(detail);
            company.website =
                self.resolver
                    .by_domain_similarity(&company.name, &links, detail.host().as_deref());
            if company.website.is_some() {
                company.bump_confidence(WEBSITE_CONFIDENCE_BONUS);
            }
        }

        if company.description.is_none() {
            company.description = detail
                .root()
                .query("meta[name='description']")
                .and_then(|meta| meta.attribute("content"))
                .map(|content| content.trim().to_string())
                .filter(|content| !content.is_empty());
        }

        if company.tags.is_empty() {
            if let Some(description) = company.description.clone() {
                for tag in infer_tags(&description, &self.config.tag_rules) {
                    company.add_tag(&tag);
                }
                company.industry = company.tags.first().map(|tag| tag.trim_start_matches('#').to_string());
            }
        }
    }

    fn enrich<T: DomTree>(&self, tree: &T, companies: &mut [CompanyData]) {
        let page_host = tree.host();
        let page_links = page_links(tree);

        for company in companies.iter_mut() {
            let text = format!(
                "{} {}",
                company.name,
                company.description.as_deref().unwrap_or_default()
            );
            for tag in infer_tags(&text, &self.config.tag_rules) {
                company.add_tag(&tag);
            }
            if company.industry.is_none() {
                company.industry = company.tags.first().map(|tag| tag.trim_start_matches('#').to_string());
            }

            if company.website.is_none() {
                company.website = self
                    .resolver
                    .resolve(&company.name, &page_links, page_host.as_deref());
            }
            if company.website.is_some() {
                company.bump_confidence(WEBSITE_CONFIDENCE_BONUS);
            }
        }
    }

    fn add_seeds<T: DomTree>(
        &self,
        tree: &T,
        seen: &mut HashSet<String>,
        companies: &mut Vec<CompanyData>,
    ) {
        let Some(host) = tree.host() else {
            return;
        };

        for seed in &self.config.seeds {
            if !host.contains(seed.host_pattern.as_str()) {
                continue;
            }
            if !seen.insert(seed.name.trim().to_lowercase()) {
                continue;
            }

            let mut company = CompanyData::new(seed.name.clone(), "seed", SEED_CONFIDENCE)
                .with_website(seed.website.clone());
            for tag in &seed.tags {
                company.add_tag(tag);
            }
            company.industry = company.tags.first().map(|tag| tag.trim_start_matches('#').to_string());
            companies.push(company);
        }
    }
}

fn page_links<T: DomTree>(tree: &T) -> Vec<String> {
    let base = tree.url().as_str();
    tree.query_all("a[href]")
        .into_iter()
        .filter_map(|anchor| anchor.attribute("href"))
        .filter(|href| !is_skippable_href(href))
        .map(|href| normalize_url(&href, base))
        .collect()
}

fn merge_into(companies: &mut Vec<CompanyData>, seen: &mut HashSet<String>, found: Vec<CompanyData>) {
    for company in found {
        if seen.insert(company.name_key()) {
            companies.push(company);
        }
    }
}
