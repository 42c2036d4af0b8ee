pub mod catalog;
pub mod config;
pub mod input;
pub mod menu;
pub mod topology;
