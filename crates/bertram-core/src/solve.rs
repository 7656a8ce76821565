//! # Heuristic Solver
//!
//! Matches a dump against a catalogue of crashes that have already been
//! diagnosed. A signature is an exact `(pc, exception type)` pair; the same
//! bug hit again faults on the same instruction in the same way.

use std::fmt;

use tracing::debug;

use crate::dump::CrashDump;
use crate::types::{ExceptionType, Register};

/// How sure a signature is that it names the real cause
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence
{
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        })
    }
}

/// A known crash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature
{
    pub pc: u32,
    pub exception: ExceptionType,
    pub description: &'static str,
    pub confidence: Confidence,
}

impl Signature
{
    pub fn matches(&self, dump: &CrashDump) -> bool
    {
        dump.exception_type() == self.exception && dump.pc() == Some(self.pc)
    }
}

/// A signature that matched a dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverMatch
{
    pub description: &'static str,
    pub confidence: Confidence,
    /// `far` from the dump; for a bad Tickflow address this is the address itself.
    pub fault_address: Option<u32>,
}

impl fmt::Display for SolverMatch
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} (confidence: {})", self.description, self.confidence)
    }
}

/// Built-in catalogue
pub static KNOWN_SIGNATURES: &[Signature] = &[Signature {
    pc: 0x0011_E764,
    exception: ExceptionType::DataAbort,
    description: "invalid Tickflow address (US build)",
    confidence: Confidence::High,
}];

/// Signature matcher over a fixed catalogue
#[derive(Debug, Clone, Copy)]
pub struct Solver
{
    signatures: &'static [Signature],
}

impl Default for Solver
{
    fn default() -> Self
    {
        Self::with_signatures(KNOWN_SIGNATURES)
    }
}

impl Solver
{
    pub const fn with_signatures(signatures: &'static [Signature]) -> Self
    {
        Self { signatures }
    }

    pub fn signatures(&self) -> &'static [Signature]
    {
        self.signatures
    }

    /// Every matching signature, in catalogue order
    pub fn solve(&self, dump: &CrashDump) -> Vec<SolverMatch>
    {
        let matches: Vec<SolverMatch> = self
            .signatures
            .iter()
            .filter(|signature| signature.matches(dump))
            .map(|signature| SolverMatch {
                description: signature.description,
                confidence: signature.confidence,
                fault_address: dump.register(Register::Far),
            })
            .collect();

        debug!(candidates = self.signatures.len(), matched = matches.len(), "ran solver");
        matches
    }
}

/// Match `dump` against [`KNOWN_SIGNATURES`]
pub fn solve(dump: &CrashDump) -> Vec<SolverMatch>
{
    Solver::default().solve(dump)
}
