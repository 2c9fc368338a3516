//! Contract bindings for the vault and its token

pub mod abi;
pub mod bindings;

pub use abi::MethodShape;
pub use bindings::{BindingResolver, ContractBindings, TokenBinding, VaultBinding};
