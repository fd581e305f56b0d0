pub mod eviction;
