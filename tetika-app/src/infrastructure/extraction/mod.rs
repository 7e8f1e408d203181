mod company_extractor;
mod name_validation;
mod strategies;
mod tags;
mod website_resolver;

pub use company_extractor::CompanyExtractor;
pub use name_validation::is_valid_company_name;
pub use strategies::{
    CardSelectorStrategy, ExtractionStrategy, ListLinkStrategy, TextPatternStrategy,
};
pub use tags::infer_tags;
pub use website_resolver::WebsiteResolver;
