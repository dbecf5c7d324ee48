pub mod api;
pub mod error;
pub mod http;

pub use api::Backend;
pub use error::ApiError;
pub use http::HttpBackend;
