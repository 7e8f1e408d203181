use crate::config::TagRule;

/// Tags whose keywords appear in `text`, in rule order. Sub-rules are only
/// consulted once their parent matched.
pub fn infer_tags(text: &str, rules: &[TagRule]) -> Vec<String> {
    let haystack = padded_words(text);
    let mut tags = Vec::new();
    collect_tags(&haystack, rules, &mut tags);
    tags
}

fn collect_tags(haystack: &str, rules: &[TagRule], tags: &mut Vec<String>) {
    for rule in rules {
        let matched = rule
            .keywords
            .iter()
            .any(|keyword| haystack.contains(keyword.to_lowercase().as_str()));
        if !matched {
            continue;
        }

        if !tags.contains(&rule.tag) {
            tags.push(rule.tag.clone());
        }
        collect_tags(haystack, &rule.subcategories, tags);
    }
}

// Lowercased, punctuation turned into spaces and padded, so keywords such
// as " ai " only match whole words.
fn padded_words(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { ' ' })
        .collect();
    format!(" {} ", lowered.split_whitespace().collect::<Vec<_>>().join(" "))
}
