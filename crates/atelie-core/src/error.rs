//! # Error Types
//!
//! Domain-specific error types for atelie-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atelie-core errors (this file)                                        │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  atelie-db errors (separate crate)                                     │
//! │  └── DbError          - Database / transaction failures                │
//! │                                                                         │
//! │  App errors                                                            │
//! │  └── ApiError         - What the front-end sees (serialized)           │
//! │                                                                         │
//! │  Advisory warnings and the below-cost gate are NOT errors: they are    │
//! │  returned as `Outcome::NeedsConfirmation` (see outcome.rs).            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Operation requires a quote but got an order (or the reverse).
    #[error("Order {order_id} is a {actual}, expected a {expected}")]
    WrongOrderKind {
        order_id: String,
        expected: String,
        actual: String,
    },

    /// Production status cannot move from `from` to `to`.
    ///
    /// ## User Workflow
    /// ```text
    /// Pedido 0007/2024 is Entregue
    ///      │
    ///      ▼
    /// update_status(EmProducao)
    ///      │
    ///      ▼
    /// InvalidStatusTransition { from: "entregue", to: "em_producao" }
    /// ```
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        order_id: String,
        from: String,
        to: String,
    },

    /// Cost, salary and margin add up to more than the sale price.
    #[error("Cost, salary and margin ({components}) exceed the price {price}")]
    ComponentsExceedPrice { components: Money, price: Money },

    /// The deposit exceeds what the customer is being charged.
    #[error("Deposit {entrada} exceeds order total {total}")]
    DepositExceedsTotal { entrada: Money, total: Money },

    /// Record would be created without an owning account.
    #[error("No acting account: records cannot be created without an owner")]
    MissingOwner,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, surfaced before any operation is attempted.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DepositExceedsTotal {
            entrada: Money::from_cents(9000),
            total: Money::from_cents(6000),
        };
        assert_eq!(
            err.to_string(),
            "Deposit R$ 90,00 exceeds order total R$ 60,00"
        );

        let err = CoreError::InvalidStatusTransition {
            order_id: "abc".to_string(),
            from: "entregue".to_string(),
            to: "pendente".to_string(),
        };
        assert_eq!(err.to_string(), "Order abc cannot move from entregue to pendente");

        let err = CoreError::ComponentsExceedPrice {
            components: Money::from_cents(17000),
            price: Money::from_cents(10000),
        };
        assert_eq!(
            err.to_string(),
            "Cost, salary and margin (R$ 170,00) exceed the price R$ 100,00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "produto".to_string(),
        };
        assert_eq!(err.to_string(), "produto is required");

        let err = ValidationError::MustBePositive {
            field: "valor_venda".to_string(),
        };
        assert_eq!(err.to_string(), "valor_venda must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "produto".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
