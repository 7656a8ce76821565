//! # Error Types
//!
//! Error handling for crash dump decoding and symbol table construction.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Only two operations in this crate can fail: decoding a dump
//! ([`DecodeError`]) and building a symbol table ([`SymbolError`]). Everything
//! downstream of a decoded dump (classification, stack scanning, solving)
//! reports missing information as explicit "unknown" values instead.

use thiserror::Error;

use crate::types::DumpVersion;

/// Why a byte buffer could not be decoded into a [`CrashDump`](crate::dump::CrashDump)
///
/// All of these are terminal for the buffer in question: decoding the same
/// bytes again cannot succeed, so callers should surface the variant to the
/// user rather than retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError
{
    /// The buffer does not start with the `0xDEADC0DE 0xDEADCAFE` sentinel pair
    ///
    /// `found` holds whatever was read instead. Buffers shorter than eight
    /// bytes report zeros for the missing words.
    #[error("Not a Luma3DS crash dump (magic {:08x} {:08x})", .found.0, .found.1)]
    BadMagic
    {
        /// The two words read at offsets 0 and 4.
        found: (u32, u32),
    },

    /// The dump was produced by a Luma3DS release older than we can parse
    #[error("Unsupported crash dump (version {found}, minimum supported {minimum})")]
    UnsupportedVersion
    {
        /// Version declared by the dump header.
        found: DumpVersion,
        /// Oldest version this decoder accepts.
        minimum: DumpVersion,
    },

    /// The exception type word is not one of FIQ, undefined instruction,
    /// prefetch abort or data abort
    #[error("Unknown exception type {0}")]
    BadExceptionType(u32),

    /// A declared section does not fit in the buffer
    ///
    /// The dump is rejected rather than returning a short section.
    #[error("Truncated crash dump: {section} needs {size} bytes at offset {offset:#x}, only {available} available")]
    TruncatedBuffer
    {
        /// Which part of the dump overran (`header`, `registers`, `code`, `stack`, `extra`).
        section: &'static str,
        /// Byte offset where the section starts.
        offset: usize,
        /// Declared size of the section in bytes.
        size: usize,
        /// Bytes actually left in the buffer at `offset`.
        available: usize,
    },
}

/// Why a symbol table could not be built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError
{
    /// The code segment bounds are inverted
    #[error("Invalid code bounds: start {start:#010x} is above end {end:#010x}")]
    InvalidBounds
    {
        /// Requested first code address.
        start: u32,
        /// Requested end of the code segment (exclusive).
        end: u32,
    },
}

/// Main error type for Bertram operations
///
/// Wraps the per-layer errors so front ends can use a single `?` chain.
#[derive(Error, Debug)]
pub enum BertramError
{
    /// The crash dump bytes could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The symbol table could not be built
    #[error(transparent)]
    Symbols(#[from] SymbolError),

    /// I/O error (reading dump files, symbol files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, BertramError>`
///
/// ```rust
/// use bertram_core::error::BertramResult;
/// fn foo() -> BertramResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type BertramResult<T> = std::result::Result<T, BertramError>;
