//! Error types for dream-flow.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Purchase error: {0}")]
    Purchase(#[from] PurchaseError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Guided-flow state machine errors.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A step index outside the sequence. Indicates a programming error in
    /// the caller, never a user mistake.
    #[error("Step index {index} out of range (flow has {count} steps)")]
    OutOfRange { index: usize, count: usize },

    /// An intent arrived in a phase that does not accept it. The intent is
    /// ignored and the flow state is left untouched.
    #[error("Cannot {intent} while flow is {phase}")]
    InvalidState { intent: String, phase: String },

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Invalid answer for step {step_id}: {reason}")]
    InvalidAnswer { step_id: String, reason: String },

    #[error("Invalid flow definition: {0}")]
    Definition(String),

    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),
}

/// Scoring engine errors.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// The clamped score had no narrative entry. The table and range are
    /// out of sync; this is a logic defect, not bad input.
    #[error("Internal invariant violated: no narrative for score {score}")]
    InternalInvariant { score: i32 },

    #[error("Missing birth date answer for step {step_id}")]
    MissingBirthDate { step_id: String },
}

/// Key-value persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Purchase capability errors. Always surfaced to the user as a retryable
/// message, never fatal to a flow.
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("Product {product_id} is not available")]
    ProductUnavailable { product_id: String },

    #[error("Purchase of {product_id} was cancelled")]
    Cancelled { product_id: String },

    #[error("Store unreachable: {0}")]
    Network(String),

    #[error("Store rejected the purchase: {0}")]
    Store(String),
}

impl PurchaseError {
    /// Message suitable for showing on the paywall.
    pub fn user_message(&self) -> String {
        match self {
            Self::ProductUnavailable { .. } => {
                "This plan is not available right now. Please try again later.".to_string()
            }
            Self::Cancelled { .. } => "Purchase cancelled. You can try again anytime.".to_string(),
            Self::Network(_) => {
                "We couldn't reach the store. Check your connection and try again.".to_string()
            }
            Self::Store(_) => "The purchase didn't go through. Please try again.".to_string(),
        }
    }

    /// Whether the paywall should offer a retry action.
    pub fn is_retryable(&self) -> bool {
        // A cancellation is the user's own choice; the button stays but we
        // don't nag with a retry prompt.
        !matches!(self, Self::Cancelled { .. })
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
