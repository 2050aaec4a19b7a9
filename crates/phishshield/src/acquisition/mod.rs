//! Page acquisition: a single bounded fetch of the URL under analysis.

pub mod fetcher;

pub use fetcher::{ContentFetcher, FetchConfig, FetchOutcome, FetchedPage, RedirectState};
