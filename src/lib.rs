pub mod config;
pub mod decode;
pub mod error;
pub mod formats;
pub mod gather;
pub mod handlers;
pub mod pipeline;
pub mod progress;
pub mod sketch;
pub mod sniff;
pub mod source;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
