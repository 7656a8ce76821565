//! Exception kinds and processor identification.

use std::fmt;

use crate::error::DecodeError;

/// CPU trap category recorded by the fault handler
///
/// The numeric codes are the ones Luma3DS writes at header offset 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionType
{
    /// Fast interrupt request (code 0)
    Fiq,
    /// Undefined instruction (code 1)
    UndefinedInstruction,
    /// Instruction fetch abort (code 2)
    PrefetchAbort,
    /// Data access abort (code 3)
    DataAbort,
}

impl ExceptionType
{
    /// Header encoding of this exception kind
    pub const fn code(self) -> u32
    {
        match self {
            ExceptionType::Fiq => 0,
            ExceptionType::UndefinedInstruction => 1,
            ExceptionType::PrefetchAbort => 2,
            ExceptionType::DataAbort => 3,
        }
    }

    /// Human-readable name, as Luma3DS prints it on the crash screen
    pub const fn name(self) -> &'static str
    {
        match self {
            ExceptionType::Fiq => "FIQ",
            ExceptionType::UndefinedInstruction => "undefined instruction",
            ExceptionType::PrefetchAbort => "prefetch abort",
            ExceptionType::DataAbort => "data abort",
        }
    }

    /// Prefetch and data aborts carry a fault status register.
    pub const fn is_abort(self) -> bool
    {
        matches!(self, ExceptionType::PrefetchAbort | ExceptionType::DataAbort)
    }
}

impl TryFrom<u32> for ExceptionType
{
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error>
    {
        match value {
            0 => Ok(ExceptionType::Fiq),
            1 => Ok(ExceptionType::UndefinedInstruction),
            2 => Ok(ExceptionType::PrefetchAbort),
            3 => Ok(ExceptionType::DataAbort),
            other => Err(DecodeError::BadExceptionType(other)),
        }
    }
}

impl fmt::Display for ExceptionType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// Which CPU took the exception
///
/// The header packs the processor id in the low 16 bits and the ARM11 core
/// number in the high 16 bits. Luma3DS only ever writes 9 (ARM9) or 11
/// (ARM11); anything that is not 9 is treated as an ARM11 dump, matching the
/// firmware's own crash screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Processor
{
    /// The security/IO processor. Its extra section is an opaque memory dump.
    Arm9,
    /// The application processor, with the core that faulted.
    Arm11(u8),
}

impl Processor
{
    /// Processor id Luma3DS writes for the ARM9
    pub const ARM9_ID: u16 = 9;
    /// Processor id Luma3DS writes for the ARM11
    pub const ARM11_ID: u16 = 11;

    /// Split the combined `processor | core << 16` header word
    pub fn from_word(word: u32) -> Self
    {
        let id = (word & 0xffff) as u16;
        if id == Self::ARM9_ID {
            return Processor::Arm9;
        }
        let core = u8::try_from(word >> 16).unwrap_or(u8::MAX);
        Processor::Arm11(core)
    }

    /// Canonical header word for this processor
    pub fn to_word(self) -> u32
    {
        match self {
            Processor::Arm9 => u32::from(Self::ARM9_ID),
            Processor::Arm11(core) => u32::from(Self::ARM11_ID) | (u32::from(core) << 16),
        }
    }

    pub const fn is_arm11(self) -> bool
    {
        matches!(self, Processor::Arm11(_))
    }
}

impl fmt::Display for Processor
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Processor::Arm9 => write!(f, "ARM9"),
            Processor::Arm11(core) => write!(f, "ARM11 (core {core})"),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_exception_codes()
    {
        for code in 0..4 {
            let kind = ExceptionType::try_from(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(ExceptionType::try_from(4), Err(DecodeError::BadExceptionType(4)));
        assert_eq!(ExceptionType::try_from(u32::MAX), Err(DecodeError::BadExceptionType(u32::MAX)));
    }

    #[test]
    fn test_exception_names()
    {
        assert_eq!(ExceptionType::Fiq.to_string(), "FIQ");
        assert_eq!(ExceptionType::DataAbort.to_string(), "data abort");
        assert!(ExceptionType::PrefetchAbort.is_abort());
        assert!(!ExceptionType::UndefinedInstruction.is_abort());
    }

    #[test]
    fn test_processor_from_word()
    {
        assert_eq!(Processor::from_word(9), Processor::Arm9);
        assert_eq!(Processor::from_word(11), Processor::Arm11(0));
        assert_eq!(Processor::from_word(11 | (1 << 16)), Processor::Arm11(1));
        assert_eq!(Processor::from_word(11 | (3 << 16)).to_word(), 11 | (3 << 16));
    }

    #[test]
    fn test_processor_display()
    {
        assert_eq!(Processor::Arm9.to_string(), "ARM9");
        assert_eq!(Processor::Arm11(1).to_string(), "ARM11 (core 1)");
    }
}
