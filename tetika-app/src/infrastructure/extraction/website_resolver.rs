use crate::config::ExtractorConfig;
use crate::infrastructure::content::{host_of, is_same_site};
use std::sync::Arc;
use url::Url;

const MIN_SLUG_CHARS: usize = 3;
const PREFIX_CHARS: usize = 3;

/// Finds a company's website when the page did not link it directly.
pub struct WebsiteResolver {
    config: Arc<ExtractorConfig>,
}

impl WebsiteResolver {
    pub fn new(config: Arc<ExtractorConfig>) -> Self {
        Self { config }
    }

    pub fn is_social(&self, url: &str) -> bool {
        host_of(url).is_some_and(|host| {
            self.config
                .social_domains
                .iter()
                .any(|domain| is_same_site(&host, domain))
        })
    }

    /// Knowledge base first, then the page's outbound links by domain
    /// similarity.
    pub fn resolve(&self, name: &str, page_links: &[String], page_host: Option<&str>) -> Option<String> {
        self.from_knowledge_base(name)
            .or_else(|| self.by_domain_similarity(name, page_links, page_host))
    }

    pub fn from_knowledge_base(&self, name: &str) -> Option<String> {
        let wanted = name.trim().to_lowercase();
        self.config
            .knowledge_base
            .iter()
            .find(|(known, _)| known.to_lowercase() == wanted)
            .map(|(_, website)| website.clone())
    }

    pub fn by_domain_similarity(
        &self,
        name: &str,
        page_links: &[String],
        page_host: Option<&str>,
    ) -> Option<String> {
        let variants = self.slug_variants(name);
        let initials = self.initials(name);
        if variants.is_empty() && initials.is_none() {
            return None;
        }

        let candidates: Vec<(String, String)> = page_links
            .iter()
            .filter(|link| !self.is_social(link))
            .filter_map(|link| {
                let host = host_of(link)?;
                if page_host.is_some_and(|page| is_same_site(&host, page)) {
                    return None;
                }
                let label = domain_label(&host);
                if label.is_empty() {
                    return None;
                }
                Some((label, origin_of(link)?))
            })
            .collect();

        let contained = candidates.iter().find(|(label, _)| {
            label.len() >= MIN_SLUG_CHARS
                && variants
                    .iter()
                    .any(|slug| label.contains(slug.as_str()) || slug.contains(label.as_str()))
        });
        if let Some((_, origin)) = contained {
            return Some(origin.clone());
        }

        if let Some(initials) = &initials {
            if let Some((_, origin)) = candidates.iter().find(|(label, _)| label == initials) {
                return Some(origin.clone());
            }
        }

        candidates
            .iter()
            .find(|(label, _)| {
                label.len() >= PREFIX_CHARS
                    && variants
                        .iter()
                        .any(|slug| slug.len() >= PREFIX_CHARS && slug[..PREFIX_CHARS] == label[..PREFIX_CHARS])
            })
            .map(|(_, origin)| origin.clone())
    }

    /// Normalized forms of a name that a company's domain might use. Each is
    /// at least `MIN_SLUG_CHARS` long.
    pub fn slug_variants(&self, name: &str) -> Vec<String> {
        let lower = name.to_lowercase();
        let mut variants = Vec::new();
        let candidates = [
            alphanumeric(&lower.replace('&', " and ")),
            alphanumeric(&lower),
            self.significant_words(&lower).concat(),
        ];
        for slug in candidates {
            if slug.len() >= MIN_SLUG_CHARS && !variants.contains(&slug) {
                variants.push(slug);
            }
        }
        variants
    }

    /// First letters of a multi-word name. Only ever compared against a
    /// whole domain label.
    pub fn initials(&self, name: &str) -> Option<String> {
        let words = self.significant_words(&name.to_lowercase());
        (words.len() >= 2).then(|| words.iter().filter_map(|w| w.chars().next()).collect())
    }

    // Words of a lowercased name with trailing legal suffixes removed.
    fn significant_words(&self, lower: &str) -> Vec<String> {
        let mut words: Vec<String> = lower
            .split(|c: char| !c.is_ascii_alphanumeric() && c != '&')
            .filter(|w| !w.is_empty() && *w != "&")
            .map(str::to_string)
            .collect();
        while words.len() > 1
            && words
                .last()
                .is_some_and(|w| self.config.company_suffixes.iter().any(|s| s == w))
        {
            words.pop();
        }
        words
    }
}

fn alphanumeric(text: &str) -> String {
    text.chars().filter(char::is_ascii_alphanumeric).collect()
}

// Registrable label of a host: "www.acme-bio.co.uk" -> "acmebio".
fn domain_label(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    let label = match labels.len() {
        0 | 1 => host,
        n if n >= 3 && labels[n - 2].len() <= 3 && labels[n - 1].len() == 2 => labels[n - 3],
        n => labels[n - 2],
    };
    alphanumeric(label)
}

fn origin_of(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    Some(format!("{}://{}", url.scheme(), url.host_str()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> WebsiteResolver {
        WebsiteResolver::new(Arc::new(ExtractorConfig::default()))
    }

    fn links(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_slug_variants() {
        let variants = resolver().slug_variants("Johnson & Johnson Inc");
        assert!(variants.contains(&"johnsonandjohnsoninc".to_string()));
        assert!(variants.contains(&"johnsonjohnson".to_string()));
        assert!(!variants.contains(&"jj".to_string()));
        assert_eq!(resolver().initials("Johnson & Johnson Inc").as_deref(), Some("jj"));
        assert!(resolver().initials("Acme Inc").is_none());
    }

    #[test]
    fn test_initials_need_the_whole_domain_label() {
        let unrelated = links(&["https://www.grabhealth.com/"]);
        assert!(resolver()
            .by_domain_similarity("Acme Biotech", &unrelated, Some("site.com"))
            .is_none());

        let exact = links(&["https://www.grabhealth.com/", "https://ab.com/en"]);
        assert_eq!(
            resolver()
                .by_domain_similarity("Acme Biotech", &exact, Some("site.com"))
                .as_deref(),
            Some("https://ab.com")
        );
    }

    #[test]
    fn test_knowledge_base_is_case_insensitive() {
        assert_eq!(
            resolver().from_knowledge_base("sanofi").as_deref(),
            Some("https://www.sanofi.com")
        );
        assert!(resolver().from_knowledge_base("Sanofi Labs").is_none());
    }

    #[test]
    fn test_similarity_prefers_containment() {
        let page_links = links(&[
            "https://www.acmarket.com/",
            "https://www.acmebiotech.com/about",
            "https://site.com/partner/acme",
        ]);
        let found = resolver().by_domain_similarity("Acme Biotech Inc", &page_links, Some("site.com"));
        assert_eq!(found.as_deref(), Some("https://www.acmebiotech.com"));
    }

    #[test]
    fn test_similarity_ignores_social_and_same_site() {
        let page_links = links(&["https://linkedin.com/company/acme", "https://acme.site.com/x"]);
        assert!(resolver()
            .by_domain_similarity("Acme", &page_links, Some("site.com"))
            .is_none());
    }

    #[test]
    fn test_domain_label_handles_country_suffixes() {
        assert_eq!(domain_label("www.acme-bio.co.uk"), "acmebio");
        assert_eq!(domain_label("shop.acme.com"), "acme");
        assert_eq!(domain_label("localhost"), "localhost");
    }
}
