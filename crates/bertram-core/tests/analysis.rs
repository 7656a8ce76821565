//! Classification, stack reconstruction and solving on decoded dumps

mod common;

use std::sync::Arc;
use std::thread;

use bertram_core::classify::{classify, ExtraInfo, FaultAnnotation, FaultStatus, SvcBreakReason};
use bertram_core::dump::{self, CrashDump};
use bertram_core::solve::{solve, Confidence};
use bertram_core::symbols::{CodeBounds, SymbolTable};
use bertram_core::types::Register;
use bertram_core::unwind::analyze;
use common::DumpBuilder;

const PREFETCH_ABORT: u32 = 2;
const THUMB: u32 = 0x20;

fn decode(builder: &DumpBuilder) -> CrashDump
{
    dump::decode(&builder.build()).unwrap()
}

fn table() -> SymbolTable
{
    SymbolTable::from_entries(
        vec![(0x100, "f1", None), (0x200, "f2", None)],
        CodeBounds::new(0x100, 0x1000).unwrap(),
    )
}

#[test]
fn test_greatest_lower_bound_resolution()
{
    let dump = decode(&DumpBuilder::new().register(Register::Pc.index(), 0x150));
    let result = analyze(&dump, &table(), 5);
    let function = result.resolved_function.unwrap();
    assert_eq!(function.name, "f1");
    assert_eq!(function.address, 0x100);
    assert!(!result.out_of_bounds_pc);
}

#[test]
fn test_pc_below_code_start()
{
    let dump = decode(&DumpBuilder::new().register(Register::Pc.index(), 0x50));
    let result = analyze(&dump, &table(), 5);
    assert!(result.out_of_bounds_pc);
    assert_eq!(result.resolved_function, None);
}

#[test]
fn test_stack_word_resolves()
{
    let dump = decode(&DumpBuilder::new().stack_words(&[0x150]));
    let result = analyze(&dump, &table(), 5);
    assert_eq!(result.call_stack.len(), 1);
    assert_eq!(result.call_stack[0].address, 0x150);
    assert_eq!(result.call_stack[0].symbol.as_deref(), Some("f1"));
}

#[test]
fn test_max_depth()
{
    let dump = decode(&DumpBuilder::new().stack_words(&[0x100, 0x150, 0x200, 0x250]));
    assert_eq!(analyze(&dump, &table(), 2).call_stack.len(), 2);
    assert_eq!(analyze(&dump, &table(), 0).call_stack.len(), 4);
}

#[test]
fn test_partial_stack_word_ignored()
{
    let dump = decode(&DumpBuilder::new().stack_bytes(&[0x50, 0x01, 0x00, 0x00, 0x50, 0x01]));
    let result = analyze(&dump, &table(), 0);
    assert_eq!(result.call_stack.len(), 1);
    assert_eq!(result.call_stack[0].offset, 0);
}

#[test]
fn test_arm9_has_no_fault_status()
{
    let dump = decode(&DumpBuilder::new().arm9().extra(&[0; 0x20]));
    let class = classify(&dump);
    assert_eq!(class.fault_status, None);
    assert_eq!(class.extra, ExtraInfo::Arm9Memory { len: 0x20 });
}

#[test]
fn test_short_register_block_makes_no_vfp_claim()
{
    let dump = decode(&DumpBuilder::new().exception(1).registers(vec![u32::MAX; 17]));
    let class = classify(&dump);
    assert_eq!(class.annotation, None);
    assert_eq!(class.description(), "undefined instruction");
}

#[test]
fn test_data_abort_fault_status()
{
    let dump = decode(&DumpBuilder::new().register(Register::Dfsr.index(), 0x0000_0807));
    assert_eq!(classify(&dump).fault_status, Some(FaultStatus::TranslationPage));

    let zero = decode(&DumpBuilder::new());
    assert_eq!(classify(&zero).fault_status, Some(FaultStatus::Unknown(0)));
}

#[test]
fn test_svc_break_panic()
{
    let dump = decode(
        &DumpBuilder::new()
            .exception(PREFETCH_ABORT)
            .register(Register::Cpsr.index(), 0x10 | THUMB)
            .register(Register::R0.index(), 0)
            .code(&[0, 0, 0, 0, 0x3c, 0x00, 0x00, 0xef]),
    );
    let class = classify(&dump);
    assert_eq!(class.annotation, Some(FaultAnnotation::SvcBreak(SvcBreakReason::Panic)));
    assert_eq!(class.description(), "prefetch abort (svcBreak: panic)");

    // A prefetch abort never resolves pc
    assert!(analyze(&dump, &table(), 5).out_of_bounds_pc);
}

#[test]
fn test_solver_known_crash()
{
    let dump = decode(&DumpBuilder::new().register(Register::Pc.index(), 0x0011_E764));
    let matches = solve(&dump);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].confidence, Confidence::High);

    let other = decode(&DumpBuilder::new().register(Register::Pc.index(), 0x0011_E760));
    assert!(solve(&other).is_empty());
}

#[test]
fn test_shared_table_across_threads()
{
    let table = Arc::new(table());
    let handles: Vec<_> = [0x150u32, 0x250, 0x50]
        .into_iter()
        .map(|pc| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let dump = decode(&DumpBuilder::new().register(Register::Pc.index(), pc));
                analyze(&dump, &table, 5).resolved_function.map(|f| f.name)
            })
        })
        .collect();

    let names: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(names, vec![Some("f1".to_string()), Some("f2".to_string()), None]);
}
