//! Symbol demangling utilities.
//!
//! Symbol tables exported from a disassembler project are normally already
//! human-readable, but tables extracted from plugin binaries keep linkage
//! names. This module turns those back into something printable:
//!
//! - **Rust**: legacy (`_ZN...17h<hash>E`) and v0 (`_R...`) via `rustc-demangle`
//! - **C++**: Itanium ABI (`_Z...`) via `cpp_demangle`
//! - Everything else is kept as-is

use cpp_demangle::DemangleOptions;
use rustc_demangle::try_demangle;

use crate::types::{SymbolLanguage, SymbolName};

/// Build a `SymbolName` from the name column of an export row.
///
/// Rust demangling is tried first because legacy Rust symbols are also valid
/// Itanium names; the hash suffix is dropped from the Rust form.
pub(crate) fn make_symbol_name(exported: String) -> SymbolName
{
    if let Ok(demangled) = try_demangle(&exported) {
        let readable = format!("{demangled:#}");
        return SymbolName::mangled(exported, readable, SymbolLanguage::Rust);
    }

    if exported.starts_with("_Z") {
        let readable = cpp_demangle::Symbol::new(exported.as_bytes())
            .ok()
            .and_then(|symbol| symbol.demangle(&DemangleOptions::default()).ok());
        if let Some(readable) = readable {
            return SymbolName::mangled(exported, readable, SymbolLanguage::Cpp);
        }
    }

    SymbolName::plain(exported)
}
