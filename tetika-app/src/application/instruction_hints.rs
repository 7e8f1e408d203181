use crate::config::TagRule;
use crate::domain::CompanyData;
use crate::infrastructure::extraction::infer_tags;

/// What an extraction step can act on from free-text operator instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructionHints {
    pub follow_url: Option<String>,
    pub focus_tags: Vec<String>,
}

impl InstructionHints {
    pub fn parse(instructions: &str, tag_rules: &[TagRule]) -> Self {
        if instructions.trim().is_empty() {
            return Self::default();
        }

        Self {
            follow_url: follow_url(instructions),
            focus_tags: infer_tags(instructions, tag_rules),
        }
    }

    /// Moves companies carrying a focus tag to the front, keeping the
    /// extraction order inside both groups.
    pub fn rank(&self, companies: &mut [CompanyData]) {
        if self.focus_tags.is_empty() {
            return;
        }
        companies.sort_by_key(|company| !company.tags.iter().any(|tag| self.focus_tags.contains(tag)));
    }
}

fn follow_url(instructions: &str) -> Option<String> {
    let re = regex_lite::Regex::new(r"(?i)\b(?:follow|open|visit|go to)\s+(https?://\S+)").ok()?;
    re.captures(instructions)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .trim_end_matches(['.', ',', ';', ')', '"', '\''])
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;

    fn rules() -> Vec<TagRule> {
        ExtractorConfig::default().tag_rules
    }

    #[test]
    fn test_parse_follow_url() {
        let hints = InstructionHints::parse(
            "Next, follow https://site.com/partners?page=2. Then stop.",
            &rules(),
        );
        assert_eq!(hints.follow_url.as_deref(), Some("https://site.com/partners?page=2"));

        let hints = InstructionHints::parse("mention https://site.com without a verb", &rules());
        assert!(hints.follow_url.is_none());
    }

    #[test]
    fn test_empty_instructions() {
        assert_eq!(InstructionHints::parse("   ", &rules()), InstructionHints::default());
    }

    #[test]
    fn test_rank_is_stable_partition() {
        let hints = InstructionHints {
            follow_url: None,
            focus_tags: vec!["#MedTech".to_string()],
        };
        let mut a = CompanyData::new("Alpha", "card", 0.8);
        a.add_tag("#FinTech");
        let mut b = CompanyData::new("Beta", "card", 0.8);
        b.add_tag("#MedTech");
        let c = CompanyData::new("Gamma", "card", 0.8);
        let mut d = CompanyData::new("Delta", "card", 0.8);
        d.add_tag("#MedTech");

        let mut companies = vec![a, b, c, d];
        hints.rank(&mut companies);
        let names: Vec<&str> = companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Delta", "Alpha", "Gamma"]);
    }

    #[test]
    fn test_focus_tags_come_from_tag_rules() {
        let hints = InstructionHints::parse("focus on medical imaging companies", &rules());
        assert!(hints.focus_tags.contains(&"#MedTech".to_string()));
    }
}
