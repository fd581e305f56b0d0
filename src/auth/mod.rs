pub mod cache;
pub mod issuer;

pub use cache::TokenCache;
pub use issuer::TokenIssuer;
