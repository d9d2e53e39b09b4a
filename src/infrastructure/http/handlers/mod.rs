//! HTTP Handlers

mod book;
mod generate;
mod ping;

pub use book::*;
pub use generate::*;
pub use ping::*;
