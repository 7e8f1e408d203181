use crate::config::ContentConfig;
use crate::domain::{PageMetadata, ScrapeResult, ScrapedImage, ScrapedLink};
use crate::infrastructure::content::{
    extract_main_content, is_skippable_href, normalize_url, DomNode, DomTree, HtmlPage,
};
use crate::infrastructure::fetcher::{FetchedPage, PageFetcher};
use crate::infrastructure::security::InputSanitizer;
use chrono::Utc;
use std::collections::HashSet;
use tetika_errors::AppError;
use url::Url;

pub const MAX_SCRAPED_LINKS: usize = 100;
pub const MAX_SCRAPED_IMAGES: usize = 50;

/// One-shot scrape: fetch a page and return its readable content, links,
/// images and metadata.
pub struct ScrapePage {
    fetcher: PageFetcher,
    sanitizer: InputSanitizer,
    content: ContentConfig,
}

impl ScrapePage {
    pub fn new(fetcher: PageFetcher, sanitizer: InputSanitizer, content: ContentConfig) -> Self {
        Self {
            fetcher,
            sanitizer,
            content,
        }
    }

    pub async fn execute(&self, url: &str) -> Result<ScrapeResult, AppError> {
        let target = self.sanitizer.validate_url(url)?;
        let page = self.fetcher.fetch(&target).await?;
        let result = build_scrape_result(&target, &page, &self.content)?;

        tracing::info!(
            "Scraped {}: {} chars, {} links, {} images",
            target,
            result.content.chars().count(),
            result.links.len(),
            result.images.len()
        );
        Ok(result)
    }
}

pub fn build_scrape_result(
    requested_url: &str,
    page: &FetchedPage,
    content_config: &ContentConfig,
) -> Result<ScrapeResult, AppError> {
    let base = Url::parse(&page.final_url)
        .or_else(|_| Url::parse(requested_url))
        .map_err(|e| AppError::InvalidUrl(e.to_string()))?;
    let tree = HtmlPage::parse(&page.html, base);

    let metadata = PageMetadata {
        description: tree.meta_content("meta[name='description']"),
        keywords: tree.meta_content("meta[name='keywords']"),
        author: tree.meta_content("meta[name='author']"),
        og_title: tree.meta_content("meta[property='og:title']"),
        og_description: tree.meta_content("meta[property='og:description']"),
        og_image: tree
            .meta_content("meta[property='og:image']")
            .map(|src| normalize_url(&src, tree.url().as_str())),
        canonical_url: tree
            .root()
            .query("link[rel='canonical']")
            .and_then(|link| link.attribute("href"))
            .map(|href| normalize_url(&href, tree.url().as_str())),
        final_url: page.final_url.clone(),
        status_code: page.status_code,
        content_length: page.html.len(),
        truncated: page.truncated,
        scraped_at: Some(Utc::now()),
    };

    let title = tree
        .title()
        .or_else(|| metadata.og_title.clone())
        .unwrap_or_default();
    let content = extract_main_content(&tree, content_config).text;

    Ok(ScrapeResult {
        url: requested_url.to_string(),
        title,
        content,
        links: collect_links(&tree),
        images: collect_images(&tree),
        metadata,
    })
}

fn collect_links<T: DomTree>(tree: &T) -> Vec<ScrapedLink> {
    let base = tree.url().as_str();
    let mut seen = HashSet::new();

    tree.query_all("a[href]")
        .into_iter()
        .filter_map(|anchor| {
            let href = anchor.attribute("href")?;
            if is_skippable_href(&href) {
                return None;
            }
            let url = normalize_url(&href, base);
            seen.insert(url.clone()).then(|| ScrapedLink {
                url,
                text: anchor.text_content(),
            })
        })
        .take(MAX_SCRAPED_LINKS)
        .collect()
}

fn collect_images<T: DomTree>(tree: &T) -> Vec<ScrapedImage> {
    let base = tree.url().as_str();
    let mut seen = HashSet::new();

    tree.query_all("img")
        .into_iter()
        .filter_map(|img| {
            let src = img
                .attribute("src")
                .filter(|src| !src.trim().is_empty() && !src.starts_with("data:"))
                .or_else(|| img.attribute("data-src"))?;
            let src = normalize_url(&src, base);
            seen.insert(src.clone()).then(|| ScrapedImage {
                src,
                alt: img.attribute("alt").unwrap_or_default(),
            })
        })
        .take(MAX_SCRAPED_IMAGES)
        .collect()
}
