mod link_classifier;
mod page_analyzer;

pub use link_classifier::LinkClassifier;
pub use page_analyzer::PageAnalyzer;
