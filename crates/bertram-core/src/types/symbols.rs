//! Symbol name types.

use std::fmt;

/// Mangling scheme detected on a symbol name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolLanguage
{
    /// Rust symbol (legacy `_ZN...17h<hash>E` or v0 `_R...` mangling).
    Rust,
    /// C++ symbol (Itanium mangling).
    Cpp,
    /// Unmangled name, either C or already demangled by the symbol source.
    Plain,
}

impl fmt::Display for SymbolLanguage
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            SymbolLanguage::Rust => "rust",
            SymbolLanguage::Cpp => "c++",
            SymbolLanguage::Plain => "plain",
        };
        write!(f, "{label}")
    }
}

/// Function name from one row of a symbol export.
///
/// Rows written by hand or by a disassembler project are already readable.
/// Rows lifted from a plugin's symbol table carry linkage names, so the
/// demangled text is stored next to the name exactly as it was exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolName
{
    exported: String,
    readable: Option<String>,
    language: SymbolLanguage,
}

impl SymbolName
{
    /// A name that needed no demangling
    pub fn plain(exported: String) -> Self
    {
        Self {
            exported,
            readable: None,
            language: SymbolLanguage::Plain,
        }
    }

    /// A linkage name together with its demangled form
    pub fn mangled(exported: String, readable: String, language: SymbolLanguage) -> Self
    {
        Self {
            exported,
            readable: Some(readable),
            language,
        }
    }

    /// The name as written in the export.
    pub fn exported(&self) -> &str
    {
        &self.exported
    }

    pub fn is_mangled(&self) -> bool
    {
        self.readable.is_some()
    }

    /// What reports print: the demangled form, or the exported name.
    pub fn display_name(&self) -> &str
    {
        self.readable.as_deref().unwrap_or(&self.exported)
    }

    pub fn language(&self) -> SymbolLanguage
    {
        self.language
    }
}

impl fmt::Display for SymbolName
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.display_name())
    }
}
