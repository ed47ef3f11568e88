pub mod config;
pub mod dto;
pub mod error;
pub mod exclusions;
pub mod feeds;
pub mod mutation;
pub mod normalize;
pub mod query;
pub mod reconcile;
pub mod report;

pub use mutation::*;
pub use query::*;

pub use sea_orm;
