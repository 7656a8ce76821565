//! Loading symbol tables from CSV exports.
//!
//! Two files describe one build of the crashed program:
//!
//! - a symbol CSV, one `name,hexAddress[,scope]` row per function
//! - a bounds CSV, one `label,hexStart,hexEnd` row per region
//!
//! Blank lines and `#` comments are skipped in both. A first row whose first
//! field is `name` (symbols) or `label` (bounds) is taken as a header.

use std::fs;
use std::path::{Path, PathBuf};

use bertram_core::error::SymbolError;
use bertram_core::symbols::{CodeBounds, Symbol, SymbolTable};
use bertram_utils::{debug, info};
use thiserror::Error;

/// Problems reading or parsing a symbol source
#[derive(Error, Debug)]
pub enum SourceError
{
    /// The file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io
    {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A row did not have the expected shape
    #[error("{}:{line}: {reason}", .path.display())]
    MalformedRow
    {
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        reason: String,
    },

    /// No bounds row carries the requested label
    #[error("No code bounds for region '{region}' in {}", .path.display())]
    RegionNotFound
    {
        path: PathBuf,
        region: String,
    },

    /// The bounds row is inverted
    #[error(transparent)]
    Bounds(#[from] SymbolError),

    /// An address given on the command line is not hexadecimal
    #[error("Invalid address '{0}' (expected hexadecimal, e.g. 0011e764)")]
    InvalidAddress(String),
}

/// Parse a hexadecimal word, with or without a `0x` prefix
pub fn parse_hex(text: &str) -> Option<u32>
{
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Address argument for the `symbol` command
pub fn parse_address(text: &str) -> Result<u32, SourceError>
{
    parse_hex(text).ok_or_else(|| SourceError::InvalidAddress(text.to_string()))
}

/// Numbered, trimmed, non-comment rows split on commas
fn rows<'a>(text: &'a str, header: &'a str) -> impl Iterator<Item = (usize, Vec<&'a str>)> + 'a
{
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, row)| (line, row.split(',').map(str::trim).collect::<Vec<_>>()))
        .enumerate()
        .filter(move |(position, (_, fields))| !(*position == 0 && fields[0].eq_ignore_ascii_case(header)))
        .map(|(_, row)| row)
}

fn malformed(path: &Path, line: usize, reason: impl Into<String>) -> SourceError
{
    SourceError::MalformedRow {
        path: path.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

/// Parse the rows of a symbol CSV
///
/// `path` is only used in error messages.
pub fn parse_symbols(text: &str, path: &Path) -> Result<Vec<Symbol>, SourceError>
{
    rows(text, "name")
        .map(|(line, fields)| {
            let (name, address, scope) = match fields.as_slice() {
                [name, address] => (*name, *address, None),
                [name, address, scope] => (*name, *address, Some(*scope)),
                _ => return Err(malformed(path, line, format!("expected 2 or 3 fields, found {}", fields.len()))),
            };
            if name.is_empty() {
                return Err(malformed(path, line, "empty symbol name"));
            }
            let address = parse_hex(address).ok_or_else(|| malformed(path, line, format!("bad address '{address}'")))?;
            let scope = scope.filter(|s| !s.is_empty()).map(str::to_string);
            Ok(Symbol::new(address, name, scope))
        })
        .collect()
}

/// Find the bounds row labelled `region` (case-insensitive)
pub fn parse_bounds(text: &str, path: &Path, region: &str) -> Result<CodeBounds, SourceError>
{
    for (line, fields) in rows(text, "label") {
        let [label, start, end] = fields.as_slice() else {
            return Err(malformed(path, line, format!("expected 3 fields, found {}", fields.len())));
        };
        if !label.eq_ignore_ascii_case(region) {
            continue;
        }
        let start = parse_hex(start).ok_or_else(|| malformed(path, line, format!("bad start address '{start}'")))?;
        let end = parse_hex(end).ok_or_else(|| malformed(path, line, format!("bad end address '{end}'")))?;
        return Ok(CodeBounds::new(start, end)?);
    }

    Err(SourceError::RegionNotFound {
        path: path.to_path_buf(),
        region: region.to_string(),
    })
}

fn read(path: &Path) -> Result<String, SourceError>
{
    fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and index a symbol CSV under the bounds for `region`
pub fn load_symbol_table(symbols: &Path, bounds: &Path, region: &str) -> Result<SymbolTable, SourceError>
{
    let code_bounds = parse_bounds(&read(bounds)?, bounds, region)?;
    debug!(region, bounds = %code_bounds, "loaded code bounds");

    let entries = parse_symbols(&read(symbols)?, symbols)?;
    info!(path = %symbols.display(), count = entries.len(), "loaded symbols");

    Ok(SymbolTable::new(entries, code_bounds))
}
