//! Keyword sets, stoplists and selector lists used by the analyzer, the link
//! classifier and the company extractor.
//!
//! Defaults carry the healthcare-directory tuning. Any field may be replaced
//! from a JSON file; omitted fields keep their defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tetika_errors::AppError;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    pub content: ContentConfig,
    pub analyzer: AnalyzerConfig,
    pub links: LinkConfig,
    pub extractor: ExtractorConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum HeuristicsError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<HeuristicsError> for AppError {
    fn from(error: HeuristicsError) -> Self {
        AppError::Internal(error.to_string())
    }
}

impl HeuristicsConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, HeuristicsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| HeuristicsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| HeuristicsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub content_selectors: Vec<String>,
    pub noise_selectors: Vec<String>,
    pub min_content_chars: usize,
    pub max_content_chars: usize,
    pub truncation_marker: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            content_selectors: strings(&[
                "main",
                "article",
                "[role='main']",
                ".content",
                "#content",
                ".main-content",
                ".post-content",
                ".entry-content",
                ".article-body",
                "body",
            ]),
            noise_selectors: strings(&[
                "script",
                "style",
                "noscript",
                "nav",
                "header",
                "footer",
                "aside",
                "iframe",
                "svg",
                "[class*='menu']",
                "[class*='sidebar']",
                "[class*='cookie']",
            ]),
            min_content_chars: 100,
            max_content_chars: 5000,
            truncation_marker: "... [content truncated]".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub company_keywords: Vec<String>,
    pub list_selectors: Vec<String>,
    pub pagination_selectors: Vec<String>,
    pub loading_selectors: Vec<String>,
    pub card_selectors: Vec<String>,
    pub anti_bot_body_markers: Vec<String>,
    pub anti_bot_title_markers: Vec<String>,
    pub many_links_threshold: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            company_keywords: strings(&[
                "company",
                "startup",
                "partner",
                "exhibitor",
                "enterprise",
                "business",
                "corporation",
                "firm",
                "organization",
                "vendor",
            ]),
            list_selectors: strings(&[
                "ul li",
                "ol li",
                "table tr",
                ".list",
                ".grid",
                "[class*='list']",
                "[class*='grid']",
            ]),
            pagination_selectors: strings(&[
                ".pagination",
                ".pager",
                "[class*='pagination']",
                "a[rel='next']",
                ".next",
                "[class*='load-more']",
            ]),
            loading_selectors: strings(&[
                ".loading",
                ".spinner",
                ".loader",
                "[class*='loading']",
                "[class*='spinner']",
                "[class*='skeleton']",
                "[class*='lazy']",
                "img[data-src]",
            ]),
            card_selectors: strings(&[
                ".partner-card",
                ".company-card",
                ".exhibitor-card",
                ".card",
                ".item",
                ".listing",
                "[class*='company']",
                "[class*='partner']",
                "[class*='exhibitor']",
            ]),
            anti_bot_body_markers: strings(&["cloudflare", "please wait", "checking your browser"]),
            anti_bot_title_markers: strings(&["just a moment"]),
            many_links_threshold: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub company_patterns: Vec<String>,
    pub detail_patterns: Vec<String>,
    pub navigation_patterns: Vec<String>,
    pub boost_keywords: Vec<String>,
    pub chrome_terms: Vec<String>,
    pub boost: u8,
    pub penalty: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            company_patterns: strings(&[
                "company",
                "companies",
                "partner",
                "exhibitor",
                "startup",
                "sponsor",
                "member",
                "vendor",
            ]),
            detail_patterns: strings(&["detail", "profile", "/view", "/show", "/p/", "/org/"]),
            navigation_patterns: strings(&["next", "more", "page", "pagination", "load-more"]),
            boost_keywords: strings(&[
                "health",
                "medical",
                "medic",
                "pharma",
                "biotech",
                "medtech",
                "clinic",
                "hospital",
                "wellness",
                "life science",
            ]),
            chrome_terms: strings(&["home", "about", "contact", "login", "menu", "search"]),
            boost: 2,
            penalty: 3,
        }
    }
}

/// Keyword rule for tag inference. Sub-rules are only evaluated when the
/// parent rule matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRule {
    pub keywords: Vec<String>,
    pub tag: String,
    #[serde(default)]
    pub subcategories: Vec<TagRule>,
}

impl TagRule {
    fn new(keywords: &[&str], tag: &str) -> Self {
        Self {
            keywords: strings(keywords),
            tag: tag.to_string(),
            subcategories: Vec::new(),
        }
    }

    fn with_subcategories(mut self, subcategories: Vec<TagRule>) -> Self {
        self.subcategories = subcategories;
        self
    }
}

/// A known entity added when scraping a page whose host contains
/// `host_pattern` and the page itself did not yield it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedEntry {
    pub host_pattern: String,
    pub name: String,
    pub website: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub container_selectors: Vec<String>,
    pub name_selectors: Vec<String>,
    pub description_selectors: Vec<String>,
    pub location_selectors: Vec<String>,
    pub list_link_selectors: Vec<String>,
    pub name_stoplist: Vec<String>,
    pub legal_phrases: Vec<String>,
    pub company_suffixes: Vec<String>,
    pub social_domains: Vec<String>,
    pub tag_rules: Vec<TagRule>,
    pub knowledge_base: BTreeMap<String, String>,
    pub seeds: Vec<SeedEntry>,
    pub max_companies: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        let knowledge_base = [
            ("Sanofi", "https://www.sanofi.com"),
            ("Novartis", "https://www.novartis.com"),
            ("Roche", "https://www.roche.com"),
            ("Pfizer", "https://www.pfizer.com"),
            ("Servier", "https://servier.com"),
            ("Ipsen", "https://www.ipsen.com"),
            ("Doctolib", "https://www.doctolib.fr"),
            ("Withings", "https://www.withings.com"),
            ("Owkin", "https://www.owkin.com"),
            ("Philips", "https://www.philips.com"),
            ("Siemens Healthineers", "https://www.siemens-healthineers.com"),
            ("Alan", "https://alan.com"),
        ]
        .into_iter()
        .map(|(name, site)| (name.to_string(), site.to_string()))
        .collect();

        let seeds = [
            ("Sanofi", "https://www.sanofi.com"),
            ("Doctolib", "https://www.doctolib.fr"),
            ("Withings", "https://www.withings.com"),
            ("Owkin", "https://www.owkin.com"),
        ]
        .into_iter()
        .map(|(name, site)| SeedEntry {
            host_pattern: "vivatechnology.com".to_string(),
            name: name.to_string(),
            website: Some(site.to_string()),
            tags: vec!["#Healthcare & Wellness".to_string()],
        })
        .collect();

        Self {
            container_selectors: strings(&[
                ".company",
                ".partner",
                ".exhibitor",
                ".startup",
                ".company-card",
                ".partner-card",
                "[class*='company']",
                "[class*='partner']",
                "[class*='exhibitor']",
            ]),
            name_selectors: strings(&[
                "h1",
                "h2",
                "h3",
                "h4",
                "h5",
                ".name",
                ".title",
                "[class*='name']",
                "[class*='title']",
                "strong",
            ]),
            description_selectors: strings(&[".description", "[class*='desc']", "p"]),
            location_selectors: strings(&[".location", "[class*='location']", "[class*='country']"]),
            list_link_selectors: strings(&["li a[href]", "td a[href]", "dd a[href]"]),
            name_stoplist: strings(&[
                "the",
                "a",
                "an",
                "and",
                "or",
                "of",
                "home",
                "about",
                "about us",
                "contact",
                "contact us",
                "menu",
                "search",
                "login",
                "log in",
                "sign in",
                "sign up",
                "register",
                "more",
                "next",
                "previous",
                "back",
                "close",
                "view all",
                "see all",
                "see more",
                "read more",
                "learn more",
                "load more",
                "partners",
                "our partners",
                "sponsors",
                "our sponsors",
                "exhibitors",
                "our exhibitors",
                "members",
                "website",
                "visit website",
                "companies",
                "startups",
                "news",
                "blog",
                "events",
                "careers",
                "english",
                "français",
            ]),
            legal_phrases: strings(&[
                "privacy policy",
                "terms of use",
                "terms and conditions",
                "terms of service",
                "cookie policy",
                "cookie settings",
                "all rights reserved",
                "copyright",
                "legal notice",
            ]),
            company_suffixes: strings(&["inc", "ltd", "llc", "corp", "gmbh", "sas", "sa", "ag", "co"]),
            social_domains: strings(&[
                "linkedin.com",
                "twitter.com",
                "x.com",
                "facebook.com",
                "instagram.com",
                "youtube.com",
                "tiktok.com",
                "github.com",
                "medium.com",
                "wa.me",
            ]),
            tag_rules: vec![
                TagRule::new(
                    &["health", "medical", "medic", "clinic", "hospital", "patient", " care "],
                    "#Healthcare & Wellness",
                )
                .with_subcategories(vec![
                    TagRule::new(&["pharma", "drug", "therapeut"], "#Pharmaceuticals"),
                    TagRule::new(&["biotech", "genomic", "life science"], "#Biotech"),
                    TagRule::new(&["device", "medtech", "imaging", "diagnostic"], "#MedTech"),
                    TagRule::new(&["telemedicine", "e-health", "ehealth", "digital health"], "#Digital Health"),
                ]),
                TagRule::new(&["pharma"], "#Pharmaceuticals"),
                TagRule::new(&["fintech", "payment", "banking", "insurance"], "#Fintech"),
                TagRule::new(&["artificial intelligence", " ai ", "machine learning"], "#AI"),
                TagRule::new(&["mobility", "automotive", "transport"], "#Mobility"),
                TagRule::new(&["energy", "climate", "sustainab", "green"], "#Climate & Energy"),
                TagRule::new(&["retail", "e-commerce", "ecommerce"], "#Retail"),
                TagRule::new(&["cyber", "security"], "#Cybersecurity"),
            ],
            knowledge_base,
            seeds,
            max_companies: 200,
        }
    }
}
