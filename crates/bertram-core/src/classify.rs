//! # Fault Classifier
//!
//! Turns the raw exception fields of a [`CrashDump`] into the descriptors a
//! person reads on the Luma3DS crash screen: the exception name, special
//! causes recognised from the faulting instruction (kernel panic, `svcBreak`,
//! VFP exception), the abort fault status, and the process that crashed.
//!
//! Classification never fails. A register the dump did not save is treated
//! as unknown, so the corresponding check is skipped rather than run against
//! a made-up zero.

use std::fmt;

use tracing::trace;

use crate::dump::{CrashDump, TitleInfo};
use crate::types::{ExceptionType, Processor, Register};

/// `bkpt`-style coprocessor instruction the ARM11 kernel executes on panic
pub const KERNEL_PANIC_INSTRUCTION: u32 = 0xE12F_FF7E;

/// `svc 0x3C` (`svcBreak`), used by applications for panics and assertions
pub const SVC_BREAK_INSTRUCTION: u32 = 0xEF00_003C;

/// CPSR T bit
const CPSR_THUMB: u32 = 1 << 5;

/// FPEXC EX bit
const FPEXC_EXCEPTION: u32 = 1 << 31;

/// Why an application called `svcBreak`, taken from `r0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvcBreakReason
{
    Panic,
    AssertionFailed,
    UserRelated,
    /// `r0` above 2, or `r0` not saved.
    Other,
}

impl SvcBreakReason
{
    pub fn from_r0(r0: Option<u32>) -> Self
    {
        match r0 {
            Some(0) => SvcBreakReason::Panic,
            Some(1) => SvcBreakReason::AssertionFailed,
            Some(2) => SvcBreakReason::UserRelated,
            _ => SvcBreakReason::Other,
        }
    }
}

/// Extra cause appended to the exception name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAnnotation
{
    KernelPanic,
    SvcBreak(SvcBreakReason),
    VfpException,
}

impl fmt::Display for FaultAnnotation
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let text = match self {
            FaultAnnotation::KernelPanic => "(kernel panic)",
            FaultAnnotation::SvcBreak(SvcBreakReason::Panic) => "(svcBreak: panic)",
            FaultAnnotation::SvcBreak(SvcBreakReason::AssertionFailed) => "(svcBreak: assertion failed)",
            FaultAnnotation::SvcBreak(SvcBreakReason::UserRelated) => "(svcBreak: user-related)",
            FaultAnnotation::SvcBreak(SvcBreakReason::Other) => "(svcBreak)",
            FaultAnnotation::VfpException => "(VFP exception)",
        };
        f.write_str(text)
    }
}

/// Decoded low four bits of the ARM11 IFSR/DFSR
///
/// Code `0b0000` has no architectural meaning and comes back as
/// `Unknown(0)` instead of being guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStatus
{
    Alignment,
    DebugEvent,
    AccessBitSection,
    InstructionCacheMaintenance,
    TranslationSection,
    AccessBitPage,
    TranslationPage,
    PreciseExternalAbort,
    DomainSection,
    ImpreciseExternalAbort,
    DomainPage,
    ExternalAbortFirstLevel,
    PermissionSection,
    ExternalAbortSecondLevel,
    PermissionPage,
    Unknown(u8),
}

impl FaultStatus
{
    /// Map a status register value through the 16-entry table (low four bits)
    pub fn from_register(value: u32) -> Self
    {
        match (value & 0xf) as u8 {
            0b0001 => FaultStatus::Alignment,
            0b0010 => FaultStatus::DebugEvent,
            0b0011 => FaultStatus::AccessBitSection,
            0b0100 => FaultStatus::InstructionCacheMaintenance,
            0b0101 => FaultStatus::TranslationSection,
            0b0110 => FaultStatus::AccessBitPage,
            0b0111 => FaultStatus::TranslationPage,
            0b1000 => FaultStatus::PreciseExternalAbort,
            0b1001 => FaultStatus::DomainSection,
            0b1010 => FaultStatus::ImpreciseExternalAbort,
            0b1011 => FaultStatus::DomainPage,
            0b1100 => FaultStatus::ExternalAbortFirstLevel,
            0b1101 => FaultStatus::PermissionSection,
            0b1110 => FaultStatus::ExternalAbortSecondLevel,
            0b1111 => FaultStatus::PermissionPage,
            code => FaultStatus::Unknown(code),
        }
    }

    pub fn is_known(self) -> bool
    {
        !matches!(self, FaultStatus::Unknown(_))
    }

    /// Text shown on the crash screen; `None` for unmapped codes
    pub fn text(self) -> Option<&'static str>
    {
        let text = match self {
            FaultStatus::Alignment => "Alignment",
            FaultStatus::DebugEvent => "Debug event",
            FaultStatus::AccessBitSection => "Access bit – Section",
            FaultStatus::InstructionCacheMaintenance => "Instruction cache maintenance operation fault",
            FaultStatus::TranslationSection => "Translation – Section",
            FaultStatus::AccessBitPage => "Access bit – Page",
            FaultStatus::TranslationPage => "Translation – Page",
            FaultStatus::PreciseExternalAbort => "Precise External Abort",
            FaultStatus::DomainSection => "Domain – Section",
            FaultStatus::ImpreciseExternalAbort => "Imprecise External Abort",
            FaultStatus::DomainPage => "Domain – Page",
            FaultStatus::ExternalAbortFirstLevel => "External Abort on translation – First-level",
            FaultStatus::PermissionSection => "Permission – Section",
            FaultStatus::ExternalAbortSecondLevel => "External Abort on translation – Second-level",
            FaultStatus::PermissionPage => "Permission – Page",
            FaultStatus::Unknown(_) => return None,
        };
        Some(text)
    }
}

impl fmt::Display for FaultStatus
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match (self, self.text()) {
            (_, Some(text)) => f.write_str(text),
            (FaultStatus::Unknown(code), None) => write!(f, "Unknown ({code:#06b})"),
            _ => Ok(()),
        }
    }
}

/// Interpretation of the dump's extra section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraInfo
{
    /// The section is empty.
    None,
    /// ARM11: the crashed process.
    Process(TitleInfo),
    /// ARM9: an opaque memory dump of `len` bytes is embedded.
    Arm9Memory
    {
        len: usize,
    },
    /// ARM11 extra data too short to hold a process name and title id.
    Unrecognized
    {
        len: usize,
    },
}

/// Everything the classifier could say about a dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultClassification
{
    pub exception_type: ExceptionType,
    pub processor: Processor,
    pub annotation: Option<FaultAnnotation>,
    /// Only set for ARM11 aborts whose status register was saved.
    pub fault_status: Option<FaultStatus>,
    pub extra: ExtraInfo,
}

impl FaultClassification
{
    /// Exception name followed by the annotation, e.g. `prefetch abort (kernel panic)`
    pub fn description(&self) -> String
    {
        match self.annotation {
            Some(annotation) => format!("{} {annotation}", self.exception_type),
            None => self.exception_type.to_string(),
        }
    }
}

/// Classify the fault recorded in `dump`
pub fn classify(dump: &CrashDump) -> FaultClassification
{
    let exception_type = dump.exception_type();
    let processor = dump.processor();

    let annotation = match instruction_check(dump) {
        InstructionCheck::Skipped => vfp_annotation(dump),
        InstructionCheck::Unmatched => None,
        InstructionCheck::Matched(annotation) => Some(annotation),
    };
    let fault_status = fault_status(dump);
    let extra = extra_info(dump);

    trace!(?annotation, ?fault_status, "classified fault");

    FaultClassification {
        exception_type,
        processor,
        annotation,
        fault_status,
        extra,
    }
}

/// Outcome of looking at the last word of the code window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstructionCheck
{
    /// Not a Thumb prefetch abort with a full word of code; the VFP check applies.
    Skipped,
    /// The word was read but is not a recognised trap.
    Unmatched,
    Matched(FaultAnnotation),
}

/// Recognise the instruction at the end of the code window
fn instruction_check(dump: &CrashDump) -> InstructionCheck
{
    let thumb = dump.cpsr().is_some_and(|cpsr| cpsr & CPSR_THUMB != 0);
    if dump.exception_type() != ExceptionType::PrefetchAbort || !thumb {
        return InstructionCheck::Skipped;
    }

    let code = dump.code();
    let Some(tail) = code.len().checked_sub(4).and_then(|start| code.get(start..)) else {
        return InstructionCheck::Skipped;
    };
    let instruction = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);

    match instruction {
        KERNEL_PANIC_INSTRUCTION => InstructionCheck::Matched(FaultAnnotation::KernelPanic),
        SVC_BREAK_INSTRUCTION => {
            let reason = SvcBreakReason::from_r0(dump.register(Register::R0));
            InstructionCheck::Matched(FaultAnnotation::SvcBreak(reason))
        }
        _ => InstructionCheck::Unmatched,
    }
}

fn vfp_annotation(dump: &CrashDump) -> Option<FaultAnnotation>
{
    if !dump.processor().is_arm11() {
        return None;
    }
    let fpexc = dump.register(Register::Fpexc)?;
    (fpexc & FPEXC_EXCEPTION != 0).then_some(FaultAnnotation::VfpException)
}

fn fault_status(dump: &CrashDump) -> Option<FaultStatus>
{
    if !dump.processor().is_arm11() {
        return None;
    }
    let register = match dump.exception_type() {
        ExceptionType::PrefetchAbort => Register::Ifsr,
        ExceptionType::DataAbort => Register::Dfsr,
        ExceptionType::Fiq | ExceptionType::UndefinedInstruction => return None,
    };
    dump.register(register).map(FaultStatus::from_register)
}

fn extra_info(dump: &CrashDump) -> ExtraInfo
{
    let len = dump.extra().len();
    if len == 0 {
        return ExtraInfo::None;
    }
    match dump.processor() {
        Processor::Arm9 => ExtraInfo::Arm9Memory { len },
        Processor::Arm11(_) => dump
            .title_info()
            .map_or(ExtraInfo::Unrecognized { len }, ExtraInfo::Process),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::types::DumpVersion;

    fn dump_with(
        processor: Processor,
        exception: ExceptionType,
        registers: Vec<u32>,
        code: Vec<u8>,
        extra: Vec<u8>,
    ) -> CrashDump
    {
        CrashDump::from_parts(
            DumpVersion::from_parts(13, 0, 0),
            processor,
            exception,
            registers,
            code,
            Vec::new(),
            extra,
        )
    }

    fn registers_with(pairs: &[(Register, u32)]) -> Vec<u32>
    {
        let mut regs = vec![0; 23];
        for &(reg, value) in pairs {
            regs[reg.index()] = value;
        }
        regs
    }

    #[test]
    fn test_fault_status_table()
    {
        assert_eq!(FaultStatus::from_register(0x1), FaultStatus::Alignment);
        assert_eq!(FaultStatus::from_register(0x8), FaultStatus::PreciseExternalAbort);
        assert_eq!(FaultStatus::from_register(0x80f), FaultStatus::PermissionPage);
        assert_eq!(FaultStatus::from_register(0x10), FaultStatus::Unknown(0));
        assert_eq!(FaultStatus::Unknown(0).text(), None);
        assert_eq!(FaultStatus::Unknown(0).to_string(), "Unknown (0b0000)");
        for code in 1..16 {
            assert!(FaultStatus::from_register(code).is_known());
        }
    }

    #[test]
    fn test_kernel_panic()
    {
        let regs = registers_with(&[(Register::Cpsr, CPSR_THUMB)]);
        let code = [0u32, KERNEL_PANIC_INSTRUCTION]
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect();
        let dump = dump_with(Processor::Arm11(0), ExceptionType::PrefetchAbort, regs, code, Vec::new());
        let class = classify(&dump);
        assert_eq!(class.annotation, Some(FaultAnnotation::KernelPanic));
        assert_eq!(class.description(), "prefetch abort (kernel panic)");
    }

    #[test]
    fn test_unmatched_instruction_suppresses_vfp()
    {
        let regs = registers_with(&[(Register::Cpsr, CPSR_THUMB), (Register::Fpexc, 0x8000_0000)]);
        let code = vec![0x00, 0x00, 0xa0, 0xe1];
        let dump = dump_with(Processor::Arm11(0), ExceptionType::PrefetchAbort, regs, code, Vec::new());
        let class = classify(&dump);
        assert_eq!(class.annotation, None);
        assert_eq!(class.description(), "prefetch abort");
    }

    #[test]
    fn test_vfp_applies_when_instruction_check_skipped()
    {
        let regs = registers_with(&[(Register::Cpsr, 0x1f), (Register::Fpexc, 0x8000_0000)]);
        let code = KERNEL_PANIC_INSTRUCTION.to_le_bytes().to_vec();
        let dump = dump_with(Processor::Arm11(0), ExceptionType::PrefetchAbort, regs, code, Vec::new());
        assert_eq!(classify(&dump).annotation, Some(FaultAnnotation::VfpException));
    }

    #[test]
    fn test_svc_break_reasons()
    {
        let code: Vec<u8> = SVC_BREAK_INSTRUCTION.to_le_bytes().to_vec();
        for (r0, expected) in [
            (0, "(svcBreak: panic)"),
            (1, "(svcBreak: assertion failed)"),
            (2, "(svcBreak: user-related)"),
            (3, "(svcBreak)"),
        ] {
            let regs = registers_with(&[(Register::R0, r0), (Register::Cpsr, CPSR_THUMB)]);
            let dump = dump_with(Processor::Arm11(0), ExceptionType::PrefetchAbort, regs, code.clone(), Vec::new());
            assert_eq!(classify(&dump).annotation.unwrap().to_string(), expected);
        }
    }

    #[test]
    fn test_instruction_check_requires_thumb_bit()
    {
        let regs = registers_with(&[(Register::Cpsr, 0x1f)]);
        let code = KERNEL_PANIC_INSTRUCTION.to_le_bytes().to_vec();
        let dump = dump_with(Processor::Arm11(0), ExceptionType::PrefetchAbort, regs, code, Vec::new());
        assert_eq!(classify(&dump).annotation, None);
    }

    #[test]
    fn test_short_code_is_ignored()
    {
        let regs = registers_with(&[(Register::Cpsr, CPSR_THUMB)]);
        let dump = dump_with(Processor::Arm11(0), ExceptionType::PrefetchAbort, regs, vec![0x7e, 0xff, 0x2f], Vec::new());
        assert_eq!(classify(&dump).annotation, None);
    }

    #[test]
    fn test_vfp_exception()
    {
        let regs = registers_with(&[(Register::Fpexc, 0x8000_0000)]);
        let dump = dump_with(Processor::Arm11(1), ExceptionType::UndefinedInstruction, regs, Vec::new(), Vec::new());
        assert_eq!(classify(&dump).description(), "undefined instruction (VFP exception)");
    }

    #[test]
    fn test_vfp_needs_fpexc()
    {
        // r0..pc, cpsr only
        let dump = dump_with(Processor::Arm11(1), ExceptionType::UndefinedInstruction, vec![u32::MAX; 17], Vec::new(), Vec::new());
        let class = classify(&dump);
        assert_eq!(class.annotation, None);
        assert_eq!(class.fault_status, None);
    }

    #[test]
    fn test_arm9_has_no_fault_status()
    {
        let regs = registers_with(&[(Register::Dfsr, 0x1), (Register::Fpexc, 0x8000_0000)]);
        let dump = dump_with(Processor::Arm9, ExceptionType::DataAbort, regs, Vec::new(), Vec::new());
        let class = classify(&dump);
        assert_eq!(class.processor, Processor::Arm9);
        assert_eq!(class.fault_status, None);
        assert_eq!(class.annotation, None);
    }

    #[test]
    fn test_abort_status_registers()
    {
        let regs = registers_with(&[(Register::Dfsr, 0x5), (Register::Ifsr, 0xd)]);
        let data = dump_with(Processor::Arm11(0), ExceptionType::DataAbort, regs.clone(), Vec::new(), Vec::new());
        assert_eq!(classify(&data).fault_status, Some(FaultStatus::TranslationSection));

        let prefetch = dump_with(Processor::Arm11(0), ExceptionType::PrefetchAbort, regs, Vec::new(), Vec::new());
        assert_eq!(classify(&prefetch).fault_status, Some(FaultStatus::PermissionSection));
    }

    #[test]
    fn test_extra_info()
    {
        let mut extra = b"hmm\0\0\0\0\0".to_vec();
        extra.extend_from_slice(&0x0004_0000_0015_5A00u64.to_le_bytes());
        let dump = dump_with(Processor::Arm11(0), ExceptionType::Fiq, vec![0; 23], Vec::new(), extra);
        match classify(&dump).extra {
            ExtraInfo::Process(info) => {
                assert_eq!(info.process_name, "hmm");
                assert_eq!(info.title_id, 0x0004_0000_0015_5A00);
            }
            other => panic!("unexpected extra info {other:?}"),
        }

        let arm9 = dump_with(Processor::Arm9, ExceptionType::Fiq, vec![0; 17], Vec::new(), vec![0; 64]);
        assert_eq!(classify(&arm9).extra, ExtraInfo::Arm9Memory { len: 64 });

        let short = dump_with(Processor::Arm11(0), ExceptionType::Fiq, vec![0; 23], Vec::new(), vec![0; 4]);
        assert_eq!(classify(&short).extra, ExtraInfo::Unrecognized { len: 4 });

        let empty = dump_with(Processor::Arm11(0), ExceptionType::Fiq, vec![0; 23], Vec::new(), Vec::new());
        assert_eq!(classify(&empty).extra, ExtraInfo::None);
    }
}
