pub mod error;
pub mod fetcher;
pub mod memory;
pub mod result;

pub use error::FetchError;
pub use fetcher::{PageFetcher, WikiFetcher};
pub use memory::MemoryFetcher;
pub use result::{PageId, PageRecord};
