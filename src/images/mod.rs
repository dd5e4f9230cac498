pub mod services;

pub use services::ingest;
