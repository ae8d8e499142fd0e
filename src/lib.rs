pub mod cli;
pub mod config;
pub mod describe;
pub mod embed;
mod metrics;
pub mod openai;
pub mod pipeline;
pub mod server;
pub mod session;
pub mod store;
pub mod utils;

pub use config::Opts;
pub use pipeline::Pipeline;
pub use store::VectorStore;
