//! Plain-text rendering of decoded dumps and analysis results.

use bertram_core::classify::{ExtraInfo, FaultClassification};
use bertram_core::dump::CrashDump;
use bertram_core::solve::SolverMatch;
use bertram_core::symbols::ResolvedSymbol;
use bertram_core::unwind::AnalysisResult;

/// Lines shown by `stack` when `--lines` is not given
pub const DEFAULT_STACK_LINES: usize = 16;

const WORDS_PER_LINE: usize = 4;

/// Join lines with a trailing newline after each
fn lines<I>(lines: I) -> String
where
    I: IntoIterator<Item = String>,
{
    lines.into_iter().map(|line| line + "\n").collect()
}

/// Full crash screen style report for `luma`
pub fn luma_report(dump: &CrashDump, class: &FaultClassification) -> String
{
    let mut out = vec![
        format!("Luma3DS crash dump (version {})", dump.version()),
        format!("Processor:      {}", class.processor),
        format!("Exception type: {}", class.description()),
    ];
    if let Some(status) = class.fault_status {
        out.push(format!("Fault status:   {status}"));
    }
    match &class.extra {
        ExtraInfo::None => {}
        ExtraInfo::Process(info) => out.push(format!("Current process: {info}")),
        ExtraInfo::Arm9Memory { len } => out.push(format!("<ARM9 memory embedded in the crash ({len} bytes)>")),
        ExtraInfo::Unrecognized { len } => out.push(format!("<{len} bytes of unrecognized extra data>")),
    }

    let mut report = lines(out);
    report.push_str("\nRegister dump:\n");
    report.push_str(&register_table(dump));
    report
}

/// Saved registers two per row, registers the dump lacks are left out
fn register_table(dump: &CrashDump) -> String
{
    let cells: Vec<String> = dump
        .registers()
        .iter()
        .filter_map(|(reg, value)| value.map(|value| format!("{:<8}{value:08x}", reg.name())))
        .collect();

    lines(cells.chunks(2).map(|pair| pair.join("    ")))
}

/// Stack words for `stack`, four per line, at most `lines` lines
pub fn stack_dump(dump: &CrashDump, max_lines: usize) -> String
{
    let mut out = match dump.sp() {
        Some(sp) => format!("Stack dump (sp = {sp:08x}):\n"),
        None => "Stack dump (sp not saved):\n".to_string(),
    };

    let words: Vec<String> = dump
        .stack_words()
        .take(max_lines.saturating_mul(WORDS_PER_LINE))
        .map(|(_, word)| format!("{word:08x}"))
        .collect();
    out.push_str(&lines(words.chunks(WORDS_PER_LINE).map(|line| line.join(" "))));
    out
}

fn describe(symbol: Option<&ResolvedSymbol>, address: Option<u32>) -> String
{
    match (symbol, address) {
        (Some(symbol), Some(address)) => format!("{symbol} ({address:08x})"),
        (None, Some(address)) => format!("??? ({address:08x})"),
        (_, None) => "not saved".to_string(),
    }
}

/// Symbolicated summary for `analyze`
pub fn analysis_report(dump: &CrashDump, class: &FaultClassification, analysis: &AnalysisResult) -> String
{
    let crashed_at = if analysis.out_of_bounds_pc {
        let pc = dump.pc().map_or_else(|| "not saved".to_string(), |pc| format!("{pc:08x}"));
        format!("{pc} (outside the code segment)")
    } else {
        describe(analysis.resolved_function.as_ref(), dump.pc())
    };

    let mut out = vec![
        format!("Exception: {}", class.description()),
        format!("Crashed at: {crashed_at}"),
        format!("Called from: {}", describe(analysis.caller.as_ref(), dump.lr())),
    ];

    if analysis.call_stack.is_empty() {
        out.push("Call stack: (no code addresses on the stack)".to_string());
    } else {
        out.push("Call stack:".to_string());
        out.extend(
            analysis
                .call_stack
                .iter()
                .map(|entry| format!("  sp+{:#06x}  {entry}", entry.offset)),
        );
    }
    lines(out)
}

/// Output for `symbol`
pub fn symbol_lookup(address: u32, symbol: Option<&ResolvedSymbol>) -> String
{
    match symbol {
        Some(symbol) => format!("Symbol found: {} ({:08x})", symbol.name, symbol.address),
        None => format!("No symbol found for {address:08x}"),
    }
}

/// Output for `solve`
pub fn solver_report(matches: &[SolverMatch]) -> String
{
    if matches.is_empty() {
        return "No known cause matches this crash.\n".to_string();
    }
    lines(matches.iter().map(|hit| match hit.fault_address {
        Some(far) => format!("Possible cause: {hit}\n  fault address: {far:08x}"),
        None => format!("Possible cause: {hit}"),
    }))
}

#[cfg(test)]
mod tests
{
    use bertram_core::classify::classify;
    use bertram_core::solve::Confidence;
    use bertram_core::symbols::{CodeBounds, SymbolTable};
    use bertram_core::types::{DumpVersion, ExceptionType, Processor, Register};
    use bertram_core::unwind::analyze;

    use super::*;

    fn dump(registers: Vec<u32>, stack: &[u32]) -> CrashDump
    {
        CrashDump::from_parts(
            DumpVersion::from_parts(13, 0, 2),
            Processor::Arm11(1),
            ExceptionType::DataAbort,
            registers,
            Vec::new(),
            stack.iter().flat_map(|w| w.to_le_bytes()).collect(),
            Vec::new(),
        )
    }

    #[test]
    fn test_register_table_omits_missing()
    {
        let dump = dump((0..17).collect(), &[]);
        let table = register_table(&dump);
        assert!(table.starts_with("r0      00000000    r1      00000001\n"));
        assert!(table.contains("cpsr    00000010"));
        assert!(!table.contains("dfsr"));
        assert_eq!(table.lines().count(), 9);
    }

    #[test]
    fn test_luma_report_headline()
    {
        let mut registers = vec![0; 23];
        registers[Register::Dfsr.index()] = 0x5;
        let dump = dump(registers, &[]);
        let report = luma_report(&dump, &classify(&dump));
        assert!(report.contains("Processor:      ARM11 (core 1)"));
        assert!(report.contains("Exception type: data abort"));
        assert!(report.contains("Fault status:   Translation – Section"));
        assert!(!report.contains("Current process"));
    }

    #[test]
    fn test_stack_dump_limits_lines()
    {
        let stack: Vec<u32> = (0..10).collect();
        let mut registers = vec![0; 23];
        registers[Register::Sp.index()] = 0x0ffe_0000;
        let dump = dump(registers, &stack);

        let out = stack_dump(&dump, 2);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "Stack dump (sp = 0ffe0000):");
        assert_eq!(lines[1], "00000000 00000001 00000002 00000003");
        assert_eq!(lines.len(), 3);

        let full = stack_dump(&dump, DEFAULT_STACK_LINES);
        assert_eq!(full.lines().last(), Some("00000008 00000009"));
    }

    #[test]
    fn test_analysis_report()
    {
        let mut registers = vec![0; 23];
        registers[Register::Pc.index()] = 0x150;
        let dump = dump(registers, &[0x208]);
        let table = SymbolTable::from_entries(
            vec![(0x100, "f1", None), (0x200, "f2", None)],
            CodeBounds::new(0x100, 0x1000).unwrap(),
        );
        let report = analysis_report(&dump, &classify(&dump), &analyze(&dump, &table, 5));
        assert!(report.contains("Crashed at: f1+0x50 (00000150)"));
        assert!(report.contains("Called from: ??? (00000000)"));
        assert!(report.contains("sp+0x0000  00000208 f2"));
    }

    #[test]
    fn test_solver_report()
    {
        assert!(solver_report(&[]).starts_with("No known cause"));
        let hit = SolverMatch {
            description: "invalid Tickflow address (US build)",
            confidence: Confidence::High,
            fault_address: None,
        };
        assert_eq!(
            solver_report(&[hit]),
            "Possible cause: invalid Tickflow address (US build) (confidence: high)\n"
        );

        let hit = SolverMatch {
            fault_address: Some(0x0badf00d),
            ..hit
        };
        assert_eq!(
            solver_report(&[hit]),
            "Possible cause: invalid Tickflow address (US build) (confidence: high)\n  fault address: 0badf00d\n"
        );
    }
}
