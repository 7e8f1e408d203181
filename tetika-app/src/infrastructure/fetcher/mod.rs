mod page_fetcher;

pub use page_fetcher::{parse_target, FetchConfig, FetchedPage, PageFetcher};
