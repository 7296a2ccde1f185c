pub mod decoder;
pub mod flatten;
pub mod packet;
pub mod service;
pub mod utils;
