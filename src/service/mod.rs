pub mod config;
pub mod email;
pub mod smtp;
