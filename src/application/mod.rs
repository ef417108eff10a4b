pub mod cache_store;
pub mod pipeline;
pub mod run;
pub mod subject;
pub mod wizard;
