//! # Types
//!
//! Plain data types shared by the decoder, classifier and stack scanner.
//!
//! Everything here is immutable once built and cheap to share between
//! threads; none of these types hold on to the raw dump buffer.

pub mod exception;
pub mod registers;
pub mod stack;
pub mod symbols;
pub mod version;

// Re-export all public types
pub use exception::{ExceptionType, Processor};
pub use registers::{Register, RegisterFile};
pub use stack::StackEntry;
pub use symbols::{SymbolLanguage, SymbolName};
pub use version::DumpVersion;
