pub mod config;
pub mod debug;
pub mod generate;
pub mod image;
pub mod prompts;
pub mod stats;
