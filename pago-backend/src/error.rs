use std::fmt;

/// Everything that can go wrong inside one conversation turn.
///
/// All variants are caught at the dispatcher boundary: the user gets a
/// friendly fallback message, the detail below goes to the log only.
#[derive(Debug)]
pub enum DispatchError {
    /// Missing or malformed tool arguments. Raised before any side effect.
    Validation(String),
    /// A referenced profile or wallet does not exist.
    NotFound(String),
    /// Sender balance below the requested transfer amount.
    InsufficientFunds { balance: f64, requested: f64 },
    /// The on-chain transfer failed after validation passed.
    TransferFailed(String),
    /// Structured completion output did not match the expected schema.
    SchemaViolation(String),
    /// Completion provider unreachable or returned garbage.
    Resolution(String),
    /// Storage or collaborator failure outside the cases above.
    Internal(String),
}

impl DispatchError {
    pub fn internal(err: impl fmt::Display) -> Self {
        DispatchError::Internal(err.to_string())
    }

    /// Short tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "validation",
            DispatchError::NotFound(_) => "not_found",
            DispatchError::InsufficientFunds { .. } => "insufficient_funds",
            DispatchError::TransferFailed(_) => "transfer_failed",
            DispatchError::SchemaViolation(_) => "schema_violation",
            DispatchError::Resolution(_) => "resolution",
            DispatchError::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Validation(msg) => write!(f, "invalid arguments: {}", msg),
            DispatchError::NotFound(msg) => write!(f, "not found: {}", msg),
            DispatchError::InsufficientFunds { balance, requested } => {
                write!(f, "insufficient funds: balance {} < requested {}", balance, requested)
            }
            DispatchError::TransferFailed(msg) => write!(f, "transfer failed: {}", msg),
            DispatchError::SchemaViolation(msg) => write!(f, "schema violation: {}", msg),
            DispatchError::Resolution(msg) => write!(f, "resolution failed: {}", msg),
            DispatchError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for DispatchError {}
