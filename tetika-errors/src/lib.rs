mod app_error;
mod fetch_error;

pub use app_error::{AppError, ErrorBody};
pub use fetch_error::FetchError;
