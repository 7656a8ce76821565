//! # Symbol Table
//!
//! Address-ordered index over the functions of the crashed program, plus the
//! bounds of its code segment.
//!
//! The table is built once from an external source (a CSV export, a plugin's
//! symbol section, ...) and never mutated afterwards, so a single instance can
//! be shared behind an `Arc` by any number of concurrent analyses.
//!
//! Lookups use the greatest lower bound: an address resolves to the last
//! symbol whose start address is `<=` it. Symbols carry no size, so an address
//! far past the end of the real function still resolves to it; callers decide
//! whether the address is plausible by checking [`CodeBounds`] first.

mod demangle;

use std::fmt;

use tracing::debug;

use self::demangle::make_symbol_name;
use crate::error::SymbolError;
use crate::types::SymbolName;

/// Scope label that symbol exports use for free functions
pub const GLOBAL_SCOPE: &str = "Global";

/// Half-open `[start, end)` range of the code segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeBounds
{
    start: u32,
    end: u32,
}

impl CodeBounds
{
    /// ## Errors
    ///
    /// [`SymbolError::InvalidBounds`] if `start > end`. An empty range is allowed
    /// and simply makes every address out of bounds.
    pub fn new(start: u32, end: u32) -> Result<Self, SymbolError>
    {
        if start > end {
            return Err(SymbolError::InvalidBounds { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn start(self) -> u32
    {
        self.start
    }

    pub const fn end(self) -> u32
    {
        self.end
    }

    pub const fn contains(self, address: u32) -> bool
    {
        address >= self.start && address < self.end
    }
}

impl fmt::Display for CodeBounds
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{:08x}..{:08x}", self.start, self.end)
    }
}

/// A function start address with its name and optional scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol
{
    address: u32,
    name: SymbolName,
    scope: Option<String>,
}

impl Symbol
{
    pub fn new(address: u32, name: impl Into<String>, scope: Option<String>) -> Self
    {
        Self {
            address,
            name: make_symbol_name(name.into()),
            scope,
        }
    }

    pub fn address(&self) -> u32
    {
        self.address
    }

    pub fn name(&self) -> &SymbolName
    {
        &self.name
    }

    pub fn scope(&self) -> Option<&str>
    {
        self.scope.as_deref()
    }

    /// `scope::name`, or just the name for unscoped and global symbols
    pub fn qualified_name(&self) -> String
    {
        match self.scope.as_deref() {
            Some(scope) if !scope.is_empty() && scope != GLOBAL_SCOPE => {
                format!("{scope}::{}", self.name.display_name())
            }
            _ => self.name.display_name().to_string(),
        }
    }
}

/// Result of resolving an address against the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol
{
    /// Qualified name of the enclosing symbol.
    pub name: String,
    /// Start address of the enclosing symbol.
    pub address: u32,
    /// Distance from the symbol start to the resolved address.
    pub offset: u32,
}

impl fmt::Display for ResolvedSymbol
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.offset == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}+0x{:x}", self.name, self.offset)
        }
    }
}

/// Immutable, address-sorted symbol index
#[derive(Debug, Clone)]
pub struct SymbolTable
{
    symbols: Vec<Symbol>,
    bounds: CodeBounds,
}

impl SymbolTable
{
    /// Build the table, sorting symbols by address
    ///
    /// The sort is stable: symbols sharing an address keep their input order,
    /// and lookups pick the last of them.
    pub fn new(symbols: impl IntoIterator<Item = Symbol>, bounds: CodeBounds) -> Self
    {
        let mut symbols: Vec<Symbol> = symbols.into_iter().collect();
        symbols.sort_by_key(Symbol::address);
        debug!(count = symbols.len(), bounds = %bounds, "built symbol table");
        Self { symbols, bounds }
    }

    /// Build a table from `(address, name, scope)` tuples.
    /// Useful for testing.
    pub fn from_entries(entries: Vec<(u32, &str, Option<&str>)>, bounds: CodeBounds) -> Self
    {
        Self::new(
            entries
                .into_iter()
                .map(|(address, name, scope)| Symbol::new(address, name, scope.map(str::to_string))),
            bounds,
        )
    }

    pub fn bounds(&self) -> CodeBounds
    {
        self.bounds
    }

    pub fn len(&self) -> usize
    {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.symbols.is_empty()
    }

    /// Symbols in address order
    pub fn iter(&self) -> impl Iterator<Item = &Symbol>
    {
        self.symbols.iter()
    }

    /// Whether `address` lies inside the code segment
    pub fn in_code(&self, address: u32) -> bool
    {
        self.bounds.contains(address)
    }

    /// Last symbol starting at or below `address`
    ///
    /// No bounds check is applied; see [`in_code`](Self::in_code).
    pub fn lookup(&self, address: u32) -> Option<&Symbol>
    {
        let idx = self.symbols.partition_point(|s| s.address <= address);
        idx.checked_sub(1).map(|i| &self.symbols[i])
    }

    /// Resolve `address` to its enclosing symbol name and offset
    pub fn resolve(&self, address: u32) -> Option<ResolvedSymbol>
    {
        self.lookup(address).map(|symbol| ResolvedSymbol {
            name: symbol.qualified_name(),
            address: symbol.address,
            offset: address - symbol.address,
        })
    }
}
