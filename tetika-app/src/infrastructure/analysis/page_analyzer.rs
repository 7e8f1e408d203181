use crate::config::AnalyzerConfig;
use crate::domain::PageAnalysis;
use crate::infrastructure::content::DomTree;

pub struct PageAnalyzer {
    config: AnalyzerConfig,
}

impl PageAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Inspects a loaded page. Never fails; an empty document yields an
    /// all-false analysis with a recommendation to try other strategies.
    pub fn analyze<T: DomTree>(&self, tree: &T) -> PageAnalysis {
        let body_lower = tree.body_text().to_lowercase();
        let title_lower = tree.title().unwrap_or_default().to_lowercase();

        let total_elements = tree.count("*");
        let total_links = tree.count("a[href]");

        let has_company_indicators = self
            .config
            .company_keywords
            .iter()
            .any(|kw| body_lower.contains(kw.as_str()));

        let has_list_structure = self.any_match(tree, &self.config.list_selectors);
        let has_pagination = self.any_match(tree, &self.config.pagination_selectors);
        let loading_indicators = self.any_match(tree, &self.config.loading_selectors);

        let anti_bot_detection = self
            .config
            .anti_bot_body_markers
            .iter()
            .any(|marker| body_lower.contains(marker.as_str()))
            || self
                .config
                .anti_bot_title_markers
                .iter()
                .any(|marker| title_lower.contains(marker.as_str()));

        let estimated_company_count = self
            .config
            .card_selectors
            .iter()
            .map(|selector| tree.count(selector))
            .max()
            .unwrap_or(0);

        let mut analysis = PageAnalysis {
            total_elements,
            total_links,
            has_company_indicators,
            has_list_structure,
            has_pagination,
            anti_bot_detection,
            loading_indicators,
            estimated_company_count,
            recommended_next_steps: Vec::new(),
        };
        analysis.recommended_next_steps = self.recommend(&analysis);

        tracing::debug!(
            "Analyzed {}: {} elements, {} links, ~{} companies, anti-bot={}",
            tree.url(),
            total_elements,
            total_links,
            estimated_company_count,
            anti_bot_detection
        );

        analysis
    }

    fn any_match<T: DomTree>(&self, tree: &T, selectors: &[String]) -> bool {
        selectors.iter().any(|selector| tree.count(selector) > 0)
    }

    fn recommend(&self, analysis: &PageAnalysis) -> Vec<String> {
        let mut steps = Vec::new();

        if analysis.anti_bot_detection {
            steps.push(
                "Anti-bot challenge detected: slow down, retry later or use a browser-based fetch; results may be incomplete"
                    .to_string(),
            );
        }

        if analysis.loading_indicators {
            steps.push(
                "Loading indicators found: content is loaded dynamically, scroll or wait before extracting"
                    .to_string(),
            );
        }

        if analysis.has_pagination {
            steps.push("Pagination detected: follow next-page links to collect every entry".to_string());
        }

        if analysis.estimated_company_count == 0 {
            steps.push(
                "No company cards detected: try list links, text patterns or a detail page instead"
                    .to_string(),
            );
        } else {
            steps.push(format!(
                "About {} company-like cards detected: proceed with card extraction",
                analysis.estimated_company_count
            ));
        }

        if analysis.total_links > self.config.many_links_threshold {
            steps.push(format!(
                "{} links on the page: filter by priority to focus on company and detail links",
                analysis.total_links
            ));
        }

        if !analysis.has_company_indicators {
            steps.push("No company-related keywords found: confirm this page lists companies".to_string());
        }

        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::content::HtmlPage;
    use url::Url;

    fn analyze(html: &str) -> PageAnalysis {
        let page = HtmlPage::parse(html, Url::parse("https://site.com/partners").unwrap());
        PageAnalyzer::new(AnalyzerConfig::default()).analyze(&page)
    }

    #[test]
    fn test_directory_page_signals() {
        let analysis = analyze(
            r#"<html><head><title>Our partners</title></head><body>
            <ul class="directory">
              <li class="partner-card"><a href="/partner/acme">Acme</a></li>
              <li class="partner-card"><a href="/partner/globex">Globex</a></li>
              <li class="partner-card"><a href="/partner/initech">Initech</a></li>
            </ul>
            <div class="pagination"><a rel="next" href="?page=2">Next</a></div>
            <p>Meet every exhibitor and partner company.</p>
            </body></html>"#,
        );

        assert!(analysis.has_company_indicators);
        assert!(analysis.has_list_structure);
        assert!(analysis.has_pagination);
        assert!(!analysis.anti_bot_detection);
        assert!(!analysis.loading_indicators);
        assert_eq!(analysis.total_links, 4);
        assert_eq!(analysis.estimated_company_count, 3);
        assert!(analysis.recommended_next_steps[0].starts_with("Pagination detected"));
    }

    #[test]
    fn test_challenge_page_is_flagged_first() {
        let analysis = analyze(
            r#"<html><head><title>Just a moment...</title></head>
            <body><div class="spinner"></div><p>Checking your browser before accessing.</p></body></html>"#,
        );

        assert!(analysis.anti_bot_detection);
        assert!(analysis.loading_indicators);
        assert!(analysis.recommended_next_steps[0].starts_with("Anti-bot"));
        assert!(analysis.recommended_next_steps[1].starts_with("Loading indicators"));
    }

    #[test]
    fn test_empty_document_is_conservative() {
        let analysis = analyze("");
        assert_eq!(analysis.total_links, 0);
        assert_eq!(analysis.estimated_company_count, 0);
        assert!(!analysis.has_company_indicators);
        assert!(analysis
            .recommended_next_steps
            .iter()
            .any(|s| s.starts_with("No company cards")));
    }

    #[test]
    fn test_many_links_recommend_filtering() {
        let links: String = (0..120).map(|i| format!("<a href='/l{}'>l{}</a>", i, i)).collect();
        let analysis = analyze(&format!("<html><body>{}</body></html>", links));
        assert_eq!(analysis.total_links, 120);
        assert!(analysis
            .recommended_next_steps
            .iter()
            .any(|s| s.starts_with("120 links")));
    }
}
