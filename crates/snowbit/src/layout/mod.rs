mod config;
mod parts;

pub use config::*;
pub use parts::*;
