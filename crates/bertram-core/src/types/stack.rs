//! Stack scan result types.

use std::fmt;

/// One candidate return address found while scanning the stack section
///
/// Luma3DS dumps carry no frame pointers or unwind tables, so entries are
/// recovered by range membership alone: any stack word that falls inside the
/// code segment is reported. Stale values that happen to look like code
/// addresses are indistinguishable from real return addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry
{
    /// Byte offset of the word inside the stack section.
    pub offset: usize,
    /// The word itself.
    pub address: u32,
    /// Qualified name of the enclosing symbol, if any symbol precedes the address.
    pub symbol: Option<String>,
}

impl StackEntry
{
    pub fn is_resolved(&self) -> bool
    {
        self.symbol.is_some()
    }
}

impl fmt::Display for StackEntry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.symbol {
            Some(symbol) => write!(f, "{:08x} {symbol}", self.address),
            None => write!(f, "{:08x} ???", self.address),
        }
    }
}
