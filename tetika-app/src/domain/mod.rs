mod company_data;
mod extraction_step;
mod link_data;
mod page_analysis;
mod scrape_result;
mod session;

pub use company_data::CompanyData;
pub use extraction_step::{ExtractionStep, NewExtractionStep, StepResult};
pub use link_data::{LinkData, LinkType};
pub use page_analysis::PageAnalysis;
pub use scrape_result::{PageMetadata, ScrapeResult, ScrapedImage, ScrapedLink};
pub use session::{
    CreateSessionOptions, ExtractionMode, PageSnapshot, ScrapingSession, SessionStatus,
    SessionStatusView, SessionUpdate,
};
