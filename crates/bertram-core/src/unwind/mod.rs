//! # Call-Stack Reconstructor
//!
//! Resolves the faulting `pc` and the link register against a
//! [`SymbolTable`] and rebuilds a best-effort call stack from the raw stack
//! snapshot.
//!
//! The dump carries no frame records, so the stack is scanned word by word:
//! every 4-byte word that points into the code segment is taken to be a
//! return address. This over-reports (data that happens to look like a code
//! pointer is included) but never misses a genuine return address that was
//! captured in the snapshot.
//!
//! ## Example
//!
//! ```rust
//! use bertram_core::dump::CrashDump;
//! use bertram_core::symbols::{CodeBounds, SymbolTable};
//! use bertram_core::types::{DumpVersion, ExceptionType, Processor, Register};
//! use bertram_core::unwind::analyze;
//!
//! let mut registers = vec![0; 23];
//! registers[Register::Pc.index()] = 0x150;
//! let dump = CrashDump::from_parts(
//!     DumpVersion::from_parts(13, 0, 0),
//!     Processor::Arm11(0),
//!     ExceptionType::DataAbort,
//!     registers,
//!     Vec::new(),
//!     0x150u32.to_le_bytes().to_vec(),
//!     Vec::new(),
//! );
//! let table = SymbolTable::from_entries(
//!     vec![(0x100, "f1", None), (0x200, "f2", None)],
//!     CodeBounds::new(0x100, 0x1000).unwrap(),
//! );
//!
//! let result = analyze(&dump, &table, 5);
//! assert_eq!(result.resolved_function.unwrap().name, "f1");
//! assert_eq!(result.call_stack[0].symbol.as_deref(), Some("f1"));
//! ```

use tracing::{debug, trace};

use crate::dump::CrashDump;
use crate::symbols::{ResolvedSymbol, SymbolTable};
use crate::types::{ExceptionType, StackEntry};

/// Depth used by the CLI when none is given
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Outcome of resolving a dump against a symbol table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult
{
    /// `pc` was absent, outside the code segment, or the fault was a prefetch
    /// abort (the `pc` itself is the bad address).
    pub out_of_bounds_pc: bool,
    pub resolved_function: Option<ResolvedSymbol>,
    /// Function containing `lr`, when `lr` lies in the code segment.
    pub caller: Option<ResolvedSymbol>,
    /// Candidate return addresses in ascending stack offset.
    pub call_stack: Vec<StackEntry>,
}

/// Stack scanner bound to one symbol table
pub struct StackUnwinder<'a>
{
    symbols: &'a SymbolTable,
    max_depth: u32,
}

impl<'a> StackUnwinder<'a>
{
    /// `max_depth == 0` means no limit.
    pub fn new(symbols: &'a SymbolTable, max_depth: u32) -> Self
    {
        Self { symbols, max_depth }
    }

    pub fn analyze(&self, dump: &CrashDump) -> AnalysisResult
    {
        let resolved_function = self.resolve_pc(dump);
        let out_of_bounds_pc = !self.pc_in_bounds(dump);
        let caller = dump.lr().and_then(|lr| self.resolve_in_bounds(lr));
        let call_stack = self.scan_stack(dump);

        debug!(
            out_of_bounds_pc,
            function = resolved_function.as_ref().map(ToString::to_string),
            frames = call_stack.len(),
            "analyzed crash dump"
        );

        AnalysisResult {
            out_of_bounds_pc,
            resolved_function,
            caller,
            call_stack,
        }
    }

    fn pc_in_bounds(&self, dump: &CrashDump) -> bool
    {
        dump.exception_type() != ExceptionType::PrefetchAbort
            && dump.pc().is_some_and(|pc| self.symbols.in_code(pc))
    }

    fn resolve_pc(&self, dump: &CrashDump) -> Option<ResolvedSymbol>
    {
        if !self.pc_in_bounds(dump) {
            return None;
        }
        dump.pc().and_then(|pc| self.symbols.resolve(pc))
    }

    fn resolve_in_bounds(&self, address: u32) -> Option<ResolvedSymbol>
    {
        if !self.symbols.in_code(address) {
            return None;
        }
        self.symbols.resolve(address)
    }

    fn scan_stack(&self, dump: &CrashDump) -> Vec<StackEntry>
    {
        let limit = usize::try_from(self.max_depth).unwrap_or(usize::MAX);
        let mut entries = Vec::new();

        for (offset, word) in dump.stack_words() {
            if self.max_depth != 0 && entries.len() >= limit {
                break;
            }
            if !self.symbols.in_code(word) {
                continue;
            }

            let symbol = self.symbols.lookup(word).map(|s| s.qualified_name());
            trace!(offset, address = format_args!("{word:08x}"), symbol = symbol.as_deref(), "stack candidate");
            entries.push(StackEntry {
                offset,
                address: word,
                symbol,
            });
        }

        entries
    }
}

/// Analyze `dump` against `symbols`, keeping at most `max_depth` stack entries (0 = all)
pub fn analyze(dump: &CrashDump, symbols: &SymbolTable, max_depth: u32) -> AnalysisResult
{
    StackUnwinder::new(symbols, max_depth).analyze(dump)
}
