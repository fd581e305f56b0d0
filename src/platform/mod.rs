pub mod client;

pub use client::{Database, PlatformClient};
