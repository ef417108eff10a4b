pub mod cache;
pub mod error;
pub mod model;
pub mod stage;
pub mod traits;
