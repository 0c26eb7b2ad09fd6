pub mod meter_http;
pub mod meter_poll;

pub use meter_http::{Fetch, FetchError, MeterClient};
pub use meter_poll::MeterPollSource;
