//! Credential issuance and lifecycle engine: client authentication,
//! authorization grants, token minting, rotation and expiry enforcement.

pub mod credentials;
pub mod gateway;
pub mod grants;
pub mod memory;
pub mod provider;
pub mod store;
pub mod tokens;
pub mod types;
