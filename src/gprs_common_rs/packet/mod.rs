pub mod core;
pub mod debug;
pub mod models;
