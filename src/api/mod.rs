pub mod booking_api;
pub mod http_client;

pub use booking_api::*;
pub use http_client::*;
