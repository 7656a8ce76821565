//! ARM register file captured in a crash dump.

use std::fmt;

/// Identifier for a register saved by the Luma3DS fault handler
///
/// The handler saves registers in a fixed order: the 13 general-purpose
/// registers, `sp`, `lr`, `pc`, `cpsr`, then the abort status registers and the
/// VFP exception registers. The discriminant order here matches the dump, so
/// [`Register::index`] is the word index inside the register block.
///
/// ## Example
///
/// ```rust
/// use bertram_core::types::Register;
///
/// assert_eq!(Register::Pc.index(), 15);
/// assert_eq!(Register::Fpinst2.index(), 22);
/// assert_eq!(Register::Ifsr.name(), "ifsr");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register
{
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    /// Stack pointer (r13)
    Sp,
    /// Link register (r14)
    Lr,
    /// Program counter (r15)
    Pc,
    /// Current program status register
    Cpsr,
    /// Data fault status register
    Dfsr,
    /// Instruction fault status register
    Ifsr,
    /// Fault address register
    Far,
    /// VFP exception register
    Fpexc,
    /// VFP exception instruction register
    Fpinst,
    /// Second VFP exception instruction register
    Fpinst2,
}

impl Register
{
    /// Every register the handler can save, in dump order
    pub const ALL: [Register; 23] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
        Register::R8,
        Register::R9,
        Register::R10,
        Register::R11,
        Register::R12,
        Register::Sp,
        Register::Lr,
        Register::Pc,
        Register::Cpsr,
        Register::Dfsr,
        Register::Ifsr,
        Register::Far,
        Register::Fpexc,
        Register::Fpinst,
        Register::Fpinst2,
    ];

    /// Word index inside the dump's register block
    pub const fn index(self) -> usize
    {
        self as usize
    }

    /// Lower-case name as printed in register dumps
    pub const fn name(self) -> &'static str
    {
        match self {
            Register::R0 => "r0",
            Register::R1 => "r1",
            Register::R2 => "r2",
            Register::R3 => "r3",
            Register::R4 => "r4",
            Register::R5 => "r5",
            Register::R6 => "r6",
            Register::R7 => "r7",
            Register::R8 => "r8",
            Register::R9 => "r9",
            Register::R10 => "r10",
            Register::R11 => "r11",
            Register::R12 => "r12",
            Register::Sp => "sp",
            Register::Lr => "lr",
            Register::Pc => "pc",
            Register::Cpsr => "cpsr",
            Register::Dfsr => "dfsr",
            Register::Ifsr => "ifsr",
            Register::Far => "far",
            Register::Fpexc => "fpexc",
            Register::Fpinst => "fpinst",
            Register::Fpinst2 => "fpinst2",
        }
    }
}

impl fmt::Display for Register
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// Register words exactly as declared by the dump
///
/// Older Luma3DS builds and the ARM9 handler save fewer than the full 23
/// registers. A register past the declared count is *absent*: [`get`](Self::get)
/// returns `None`, never zero, so callers cannot mistake "not saved" for a
/// real zero value (for instance a cleared VFP exception flag).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile
{
    words: Vec<u32>,
}

impl RegisterFile
{
    /// Number of registers with a name
    pub const CANONICAL_COUNT: usize = Register::ALL.len();

    pub fn new(words: Vec<u32>) -> Self
    {
        Self { words }
    }

    /// Value of `register`, or `None` if the dump did not save it
    pub fn get(&self, register: Register) -> Option<u32>
    {
        self.words.get(register.index()).copied()
    }

    /// Whether the dump saved `register`
    pub fn has(&self, register: Register) -> bool
    {
        register.index() < self.words.len()
    }

    /// Declared register count
    pub fn len(&self) -> usize
    {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.words.is_empty()
    }

    /// Raw words, including any unnamed words beyond the canonical set
    pub fn words(&self) -> &[u32]
    {
        &self.words
    }

    /// Canonical registers paired with their value (absent ones included)
    pub fn iter(&self) -> impl Iterator<Item = (Register, Option<u32>)> + '_
    {
        Register::ALL.iter().map(move |&reg| (reg, self.get(reg)))
    }
}
