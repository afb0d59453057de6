//! Auth-domain identifiers, scopes, secrets, token models, and token-exchange failures.

pub mod failure;
pub mod id;
pub mod scope;
pub mod secret;
pub mod token;

pub use failure::*;
pub use id::*;
pub use scope::*;
pub use secret::*;
pub use token::{owner::*, record::*};
