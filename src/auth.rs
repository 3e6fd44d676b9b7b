//! Credential material, session token storage, JWT client assertions, and token endpoint exchange.

pub mod authenticator;
pub mod credentials;
pub mod jwt;
pub mod secret;

mod metrics;

pub use authenticator::*;
pub use credentials::*;
pub use jwt::{JwtSigner, SigningAlgorithm};
pub use metrics::AuthMetrics;
pub use secret::*;
