pub mod bot;
pub mod catalog;
pub mod config;
pub mod load;
