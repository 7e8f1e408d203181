use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyData {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_detail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub extraction_confidence: f32,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_data: BTreeMap<String, String>,
}

impl CompanyData {
    pub fn new(name: impl Into<String>, source: &str, confidence: f32) -> Self {
        Self {
            name: name.into(),
            source: source.to_string(),
            extraction_confidence: confidence.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn name_key(&self) -> String {
        self.name.trim().to_lowercase()
    }

    pub fn with_website(mut self, website: Option<String>) -> Self {
        self.website = website;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn bump_confidence(&mut self, amount: f32) {
        self.extraction_confidence = (self.extraction_confidence + amount).clamp(0.0, 1.0);
    }

    /// Flattens the record into string columns for tabular export.
    pub fn to_record(&self) -> BTreeMap<String, String> {
        let mut record = BTreeMap::new();
        record.insert("name".to_string(), self.name.clone());

        let optional = [
            ("website", &self.website),
            ("description", &self.description),
            ("logo", &self.logo),
            ("industry", &self.industry),
            ("location", &self.location),
            ("employees", &self.employees),
            ("linkedDetailUrl", &self.linked_detail_url),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                record.insert(key.to_string(), value.clone());
            }
        }

        if !self.tags.is_empty() {
            record.insert("tags".to_string(), self.tags.join("; "));
        }
        record.insert(
            "extractionConfidence".to_string(),
            format!("{:.2}", self.extraction_confidence),
        );
        for (key, value) in &self.additional_data {
            record.entry(key.clone()).or_insert_with(|| value.clone());
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_flat() {
        let mut company = CompanyData::new("Acme Biotech Inc", "card", 0.8)
            .with_website(Some("https://acmebio.com".to_string()));
        company.add_tag("#Healthcare & Wellness");
        company.add_tag("#Biotech");
        company.add_tag("#Biotech");

        let record = company.to_record();
        assert_eq!(record["name"], "Acme Biotech Inc");
        assert_eq!(record["website"], "https://acmebio.com");
        assert_eq!(record["tags"], "#Healthcare & Wellness; #Biotech");
        assert_eq!(record["extractionConfidence"], "0.80");
        assert!(!record.contains_key("logo"));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let mut company = CompanyData::new("Acme", "card", 0.95);
        company.bump_confidence(0.1);
        assert_eq!(company.extraction_confidence, 1.0);
    }
}
