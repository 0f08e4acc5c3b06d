mod client;
mod ops;
mod reports;

pub use client::PostgresClient;
