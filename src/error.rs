//! Error types for the vault client

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classes of failure, used by the UI boundary to decide what to show
/// and whether re-invoking an action makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No wallet handle in the environment
    UnavailableProvider,
    /// User rejected, or the provider returned no accounts
    Authorization,
    /// An operation of the same class is already in flight
    ReEntrancy,
    /// Malformed or non-positive input
    Validation,
    /// A required piece of session state is missing
    NotInitialized,
    /// Broadcast or confirmation rejected by the network
    Remote,
    /// Bad static configuration
    Config,
    /// Anything else
    Internal,
}

/// Main error type for the vault client
#[derive(Error, Debug)]
pub enum Error {
    // Session errors
    #[error("No wallet provider available: {0}")]
    ProviderUnavailable(String),

    #[error("Provider not initialized")]
    ProviderNotInitialized,

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not initialized: {0}")]
    NotInitialized(String),

    // Re-entrancy errors
    #[error("A wallet connection is already in progress")]
    AlreadyConnecting,

    #[error("A transaction is already being submitted")]
    AlreadySubmitting,

    // Validation errors
    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: String, reason: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC error {code}: {message}")]
    RpcResponse { code: i64, message: String },

    // Transaction errors
    #[error("Transaction send failed: {0}")]
    TransactionSend(String),

    #[error("Transaction confirmation failed: {0}")]
    TransactionConfirmation(String),

    #[error("Transaction {0} reverted")]
    TransactionReverted(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// JSON-RPC code wallets use for "user rejected the request" (EIP-1193)
pub const USER_REJECTED_CODE: i64 = 4001;

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ProviderUnavailable(_) => ErrorKind::UnavailableProvider,
            Error::Authorization(_) => ErrorKind::Authorization,
            Error::RpcResponse { code, .. } if *code == USER_REJECTED_CODE => {
                ErrorKind::Authorization
            }
            Error::AlreadyConnecting | Error::AlreadySubmitting => ErrorKind::ReEntrancy,
            Error::InvalidAmount { .. } | Error::InvalidAddress(_) => ErrorKind::Validation,
            Error::ProviderNotInitialized | Error::NotInitialized(_) => ErrorKind::NotInitialized,
            Error::Rpc(_)
            | Error::RpcResponse { .. }
            | Error::TransactionSend(_)
            | Error::TransactionConfirmation(_)
            | Error::TransactionReverted(_) => ErrorKind::Remote,
            Error::Config(_) => ErrorKind::Config,
            Error::Serialization(_)
            | Error::Deserialization(_)
            | Error::Io(_)
            | Error::Internal(_)
            | Error::Anyhow(_) => ErrorKind::Internal,
        }
    }

    /// Check if the user may sensibly re-invoke the failed action
    ///
    /// Nothing in this crate retries on its own; this only informs the
    /// operator.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::UnavailableProvider | ErrorKind::Config
        )
    }
}

// Conversion from alloy transport errors; keeps the node's error code
impl From<alloy_transport::TransportError> for Error {
    fn from(e: alloy_transport::TransportError) -> Self {
        match e.as_error_resp() {
            Some(payload) => Error::RpcResponse {
                code: payload.code,
                message: payload.message.to_string(),
            },
            None => Error::Rpc(e.to_string()),
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::AlreadySubmitting.kind(), ErrorKind::ReEntrancy);
        assert_eq!(Error::AlreadyConnecting.kind(), ErrorKind::ReEntrancy);
        assert_eq!(
            Error::TransactionReverted("0xabc".to_string()).kind(),
            ErrorKind::Remote
        );
        assert_eq!(
            Error::RpcResponse {
                code: USER_REJECTED_CODE,
                message: "User rejected the request.".to_string()
            }
            .kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            Error::RpcResponse {
                code: -32000,
                message: "insufficient funds".to_string()
            }
            .kind(),
            ErrorKind::Remote
        );
    }

    #[test]
    fn test_unavailable_provider_is_terminal() {
        assert!(!Error::ProviderUnavailable("none".to_string()).is_recoverable());
        assert!(Error::Authorization("no accounts".to_string()).is_recoverable());
        assert!(Error::InvalidAmount {
            amount: "-1".to_string(),
            reason: "negative".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_transport_error_keeps_wallet_code() {
        let payload: alloy_json_rpc::ErrorPayload =
            serde_json::from_str(r#"{"code":4001,"message":"User rejected the request."}"#).unwrap();
        let err = Error::from(alloy_transport::TransportError::ErrorResp(payload));

        assert!(matches!(err, Error::RpcResponse { code: USER_REJECTED_CODE, .. }));
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = Error::from(alloy_transport::TransportErrorKind::backend_gone());
        assert_eq!(err.kind(), ErrorKind::Remote);
    }
}
