pub mod http;
pub mod quote;
