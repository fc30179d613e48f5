pub mod helloworld;
pub mod traits;
pub mod types;

pub use helloworld::HelloWorldScraper;
pub use traits::SiteScraper;
pub use types::ScrapeTimeouts;
