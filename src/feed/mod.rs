//! Market data sources.

pub mod cache;
pub mod provider;

pub use cache::CachedFeed;
pub use provider::{
    resample_last, CsvDirectoryFeed, FallbackFeed, InMemoryFeed, Interval, PriceFeed, RateFeed,
    SeriesRequest,
};
