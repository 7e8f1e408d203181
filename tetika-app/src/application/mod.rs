mod advise_instructions;
mod instruction_hints;
mod interactive_scrape;
mod scrape_page;

pub use advise_instructions::InstructionAdvisor;
pub use instruction_hints::InstructionHints;
pub use interactive_scrape::{
    AdviceOutcome, AnalysisOutcome, ExtractRequest, ExtractionOutcome, InteractiveScraper,
    StartedSession,
};
pub use scrape_page::{build_scrape_result, ScrapePage};
