pub mod line_fetcher;

pub use line_fetcher::StdinFetcher;
