use crate::config::ExtractorConfig;

pub const MIN_NAME_CHARS: usize = 3;
pub const MAX_NAME_CHARS: usize = 100;

/// Screens out strings that are page chrome rather than an entity name:
/// navigation words, legal boilerplate, bare numbers or punctuation.
pub fn is_valid_company_name(name: &str, config: &ExtractorConfig) -> bool {
    let name = name.trim();
    let length = name.chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&length) {
        return false;
    }

    if name.starts_with('©') || !name.chars().any(char::is_alphabetic) {
        return false;
    }

    let lower = name.to_lowercase();
    if config.name_stoplist.iter().any(|stop| *stop == lower) {
        return false;
    }

    !config
        .legal_phrases
        .iter()
        .any(|phrase| lower.contains(phrase.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_names() {
        let config = ExtractorConfig::default();
        for name in ["the", "123", "Privacy Policy", "  ", "ab", "--- ---", "© 2024 Acme", "Read More"] {
            assert!(!is_valid_company_name(name, &config), "{:?} accepted", name);
        }
    }

    #[test]
    fn test_accepts_company_names() {
        let config = ExtractorConfig::default();
        for name in ["Acme Biotech Inc", "Doctolib", "BioNTech", "L'Oréal", "  Owkin  "] {
            assert!(is_valid_company_name(name, &config), "{:?} rejected", name);
        }
    }

    #[test]
    fn test_length_bounds() {
        let config = ExtractorConfig::default();
        assert!(is_valid_company_name(&"a".repeat(100), &config));
        assert!(!is_valid_company_name(&"a".repeat(101), &config));
    }
}
