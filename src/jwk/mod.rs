mod cache;
mod config;
mod error;
mod fetcher;
mod key;
mod verifier;

pub use error::*;

pub use cache::*;
pub use config::*;
pub use fetcher::*;
pub use key::*;
pub use verifier::*;
