//! # Atelie Host Entry Point
//!
//! ```text
//! front-end ──stdin (JSON lines)──► atelie ──stdout (JSON lines)──► front-end
//!                                     │
//!                                     └── stderr: logs
//! ```
//!
//! Usage: `atelie [CONFIG_PATH]`. Setup lives in `lib.rs` for testability.

use std::process::ExitCode;

fn main() -> ExitCode {
    atelie_app::run()
}
