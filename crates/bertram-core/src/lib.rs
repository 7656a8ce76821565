//! # bertram-core
//!
//! Offline analysis of Luma3DS crash dumps.
//!
//! This crate provides the pieces a crash report is built from:
//! - Decoding the binary dump format ([`dump`])
//! - Classifying the fault the way the Luma3DS crash screen does ([`classify`])
//! - Resolving addresses against a symbol table and scanning the stack ([`symbols`], [`unwind`])
//! - Matching against crashes that were already diagnosed ([`solve`])
//!
//! Every operation after decoding is pure and total. Registers the dump did
//! not save are reported as absent rather than zero, and a dump whose
//! declared sizes do not fit its buffer is rejected outright.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bertram_core::prelude::*;
//!
//! let bytes = std::fs::read("crash_dump_00000000.dmp")?;
//! let dump = decode(&bytes)?;
//! println!("{}", classify(&dump).description());
//! for hit in solve(&dump) {
//!     println!("{hit}");
//! }
//! # Ok::<(), bertram_core::error::BertramError>(())
//! ```

pub mod classify;
pub mod disasm;
pub mod dump;
pub mod error;
pub mod prelude;
pub mod solve;
pub mod symbols;
pub mod types;
pub mod unwind;

pub use classify::{classify, FaultClassification};
pub use dump::{decode, CrashDump};
pub use error::{BertramError, BertramResult, DecodeError, SymbolError};
pub use solve::solve;
pub use symbols::{CodeBounds, SymbolTable};
pub use unwind::{analyze, AnalysisResult};
