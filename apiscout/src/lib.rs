// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{load_urls_from_file, load_urls_from_source, parse_url_line};

// Re-export discovery functionality from apiscout-core
pub use apiscout_core::discover::{
    execute_discovery, DiscoveryOptions, DiscoveryOutcome, DiscoveryProgressCallback,
    DiscoveryReport,
};
