// Library interface for newsbrief modules
// This allows tests and other binaries to import modules

pub mod app;
pub mod digest;
pub mod error;
pub mod llm;
pub mod news;
pub mod repl;

pub use error::BriefError;
