//! Site discovery: breadth-first link crawling from a seed URL

mod discoverer;
mod extractor;
mod parser;

pub use discoverer::{
    compile_patterns, DiscoveredUrl, DiscoveryConfig, DiscoveryResult, Discoverer,
    DEFAULT_FETCH_TIMEOUT,
};
pub use extractor::{build_http_client, ExtractError, HttpLinkExtractor, LinkExtractor};
pub use parser::extract_links;
