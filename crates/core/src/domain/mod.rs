pub mod carrier;
pub mod quote;
pub mod rates;
pub mod request;
pub mod vertical;
