pub mod artifacts;
pub mod config;
pub mod depdb;
pub mod depgraph;
pub mod errors;
pub mod hashes;
pub mod pipeline;
pub mod template;
pub mod tracker;
pub mod variants;
