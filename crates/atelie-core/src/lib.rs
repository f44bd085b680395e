//! # atelie-core: Pure Business Logic for Atelie
//!
//! This crate holds every rule of the workshop back office as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Atelie Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                         Front-end                               │   │
//! │  │   Orçamentos ──► Pedidos ──► Precificação ──► Estoque          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON lines                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  atelie-app (command handlers)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ atelie-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌────────────┐  ┌──────────┐    │   │
//! │  │   │  money   │  │ pricing  │  │ projection │  │   sale   │    │   │
//! │  │   │  format  │  │  drift   │  │  cascade   │  │ planning │    │   │
//! │  │   └──────────┘  └──────────┘  └────────────┘  └──────────┘    │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌────────────┐                  │   │
//! │  │   │  types   │  │numbering │  │ validation │                  │   │
//! │  │   └──────────┘  └──────────┘  └────────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  atelie-db (Database Layer)                     │   │
//! │  │        SQLite repositories, atomic sale and conversion          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] / [`format`] - Money/Format utility: parsing and display
//! - [`pricing`] - Pricing engine: breakdown, suggested price, cost drift
//! - [`projection`] - Order financial projection: discount cascade, below-cost gate
//! - [`sale`] - Stock sale planning
//! - [`numbering`] - `NNNN/YYYY` order numbers
//! - [`outcome`] - Ok / NeedsConfirmation / Blocked results
//! - [`types`] - Domain types
//! - [`error`] / [`validation`] - Typed errors and input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use atelie_core::money::Money;
//! use atelie_core::outcome::Outcome;
//! use atelie_core::projection::{project_order, FinancialSnapshot};
//!
//! let snapshot = FinancialSnapshot {
//!     custos_totais: Money::from_cents(4000),
//!     custo_mao_de_obra: Money::from_cents(8000),
//!     margem_lucro: Money::from_cents(5000),
//!     caixa_empresa: Money::zero(),
//! };
//!
//! // R$ 100,00 off: profit absorbs 50, salary absorbs the other 50
//! let outcome = project_order(&snapshot, Money::from_cents(10000), Money::zero(), false).unwrap();
//! match outcome {
//!     Outcome::Ok { value } => assert_eq!(value.total.cents(), 7000),
//!     _ => unreachable!(),
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod format;
pub mod money;
pub mod numbering;
pub mod outcome;
pub mod pricing;
pub mod projection;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, RawAmount};
pub use numbering::OrderNumber;
pub use outcome::{Confirmation, Outcome};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of product, customer and material names.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum units in one stock registration, sale or order line.
///
/// With `money::MAX_AMOUNT` as the unit price this still fits in i64.
pub const MAX_ITEM_QUANTITY: i64 = 99_999;

/// Default page size for list commands.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound for a list page.
pub const MAX_PAGE_SIZE: i64 = 100;
