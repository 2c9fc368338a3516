//! Method shapes for the vault and token contracts
//!
//! Signatures come from configuration (`withdraw(uint256)`) and are parsed
//! into `alloy_json_abi::Function`s; calldata goes through `alloy_dyn_abi`.

use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt};
use alloy_json_abi::Function;
use alloy_primitives::{Bytes, Selector, U256};

use crate::error::{Error, Result};

/// Parsed method signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodShape {
    function: Function,
    inputs: Vec<DynSolType>,
}

impl MethodShape {
    /// Parse a signature such as `withdraw(uint256)`
    ///
    /// Type aliases (`uint`) are normalized so the selector is computed over
    /// the canonical form.
    pub fn parse(signature: &str) -> Result<Self> {
        let mut function = Function::parse(signature.trim()).map_err(|e| {
            Error::Config(format!("Malformed method signature '{}': {}", signature, e))
        })?;

        if function.name.is_empty() {
            return Err(Error::Config(format!(
                "Method signature '{}' has no name",
                signature
            )));
        }

        let mut inputs = Vec::with_capacity(function.inputs.len());
        for param in &mut function.inputs {
            let ty = DynSolType::parse(&param.ty).map_err(|e| {
                Error::Config(format!("Unsupported parameter type '{}': {}", param.ty, e))
            })?;
            param.ty = ty.sol_type_name().into_owned();
            inputs.push(ty);
        }

        Ok(Self { function, inputs })
    }

    /// Canonical signature, e.g. `withdraw(uint256)`
    pub fn signature(&self) -> String {
        self.function.signature()
    }

    pub fn selector(&self) -> Selector {
        self.function.selector()
    }

    /// Encode calldata for this method
    pub fn encode(&self, args: &[DynSolValue]) -> Result<Bytes> {
        self.function
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| {
                Error::Internal(format!("Arguments do not match {}: {}", self.signature(), e))
            })
    }

    /// Check that the method takes exactly these parameters
    pub fn expect_inputs(&self, expected: &[DynSolType]) -> Result<()> {
        if self.inputs != expected {
            return Err(Error::Config(format!(
                "{} must take ({}), got ({})",
                self.signature(),
                type_list(expected),
                type_list(&self.inputs)
            )));
        }
        Ok(())
    }
}

fn type_list(types: &[DynSolType]) -> String {
    types
        .iter()
        .map(|ty| ty.sol_type_name().into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a single `uint256` return value
pub fn decode_uint(data: &[u8]) -> Result<U256> {
    match DynSolType::Uint(256).abi_decode(data) {
        Ok(DynSolValue::Uint(value, _)) => Ok(value),
        Ok(other) => Err(Error::Deserialization(format!(
            "Expected uint256 return, got {:?}",
            other
        ))),
        Err(e) => Err(Error::Deserialization(format!(
            "Bad uint256 return ({} bytes): {}",
            data.len(),
            e
        ))),
    }
}
