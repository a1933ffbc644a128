pub mod http;

pub use http::HttpTitleSource;
