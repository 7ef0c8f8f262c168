pub mod crawler;
pub mod error;
pub mod fetch;
pub mod links;
pub mod result;

pub use crawler::{FrontierEntry, ProgressCallback, SiteCrawler};
pub use error::ScanError;
pub use fetch::{FetchStrategy, Fetcher};
pub use links::LinkHint;
pub use result::{PageCapture, SiteCrawl};
