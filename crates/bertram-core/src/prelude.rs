//! Common module for library exports

pub use crate::classify::{classify, ExtraInfo, FaultAnnotation, FaultClassification, FaultStatus, SvcBreakReason};
pub use crate::dump::{decode, CrashDump, TitleInfo};
pub use crate::error::{BertramError, BertramResult, DecodeError, SymbolError};
pub use crate::solve::{solve, Confidence, Solver, SolverMatch};
pub use crate::symbols::{CodeBounds, ResolvedSymbol, Symbol, SymbolTable};
pub use crate::types::{DumpVersion, ExceptionType, Processor, Register, RegisterFile, StackEntry};
pub use crate::unwind::{analyze, AnalysisResult};
