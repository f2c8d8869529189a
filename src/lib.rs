pub mod auction;
pub mod bidding;
pub mod config;
pub mod database;
pub mod handlers;
pub mod notifier;
pub mod query;
pub mod scheduler;
