//! Disassembly seam.
//!
//! The code section of a dump holds the instructions leading up to the
//! faulting one. This module does not decode ARM itself; it only fixes the
//! interface an external engine plugs into and works out where the code
//! window starts in the crashed program's address space.

use std::fmt;

use crate::dump::CrashDump;

/// Distance from the start of the code window to `pc` as saved by the handler
pub const CODE_WINDOW_PC_OFFSET: u32 = 0x34;

/// One decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction
{
    pub address: u32,
    pub mnemonic: String,
    pub operands: String,
}

impl fmt::Display for Instruction
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.operands.is_empty() {
            write!(f, "{:08x}: {}", self.address, self.mnemonic)
        } else {
            write!(f, "{:08x}: {} {}", self.address, self.mnemonic, self.operands)
        }
    }
}

/// An ARM/Thumb disassembler
pub trait Disassembler
{
    /// Decode `code`, whose first byte lives at `base`
    fn disassemble(&self, code: &[u8], base: u32) -> Vec<Instruction>;
}

impl CrashDump
{
    /// Address of the first byte of the code section, `None` without a `pc`
    pub fn code_base_address(&self) -> Option<u32>
    {
        let len = u32::try_from(self.code().len()).unwrap_or(u32::MAX);
        self.pc()
            .map(|pc| pc.wrapping_sub(len).wrapping_add(CODE_WINDOW_PC_OFFSET))
    }
}

/// Run `engine` over the dump's code section
///
/// Returns an empty listing when the dump has no `pc` to anchor the code at.
pub fn disassemble_code(dump: &CrashDump, engine: &dyn Disassembler) -> Vec<Instruction>
{
    match dump.code_base_address() {
        Some(base) => engine.disassemble(dump.code(), base),
        None => Vec::new(),
    }
}
