//! # Dump Decoder
//!
//! Parses the binary crash dump written by the Luma3DS exception handler.
//!
//! ## Layout
//!
//! All fields are little-endian `u32`:
//!
//! | offset | field                                  |
//! |--------|----------------------------------------|
//! | 0      | magic `0xDEADC0DE`                     |
//! | 4      | magic `0xDEADCAFE`                     |
//! | 8      | version (`major << 16 \| minor << 8 \| micro`) |
//! | 12     | processor id \| core id << 16          |
//! | 16     | exception type                         |
//! | 20     | reserved                               |
//! | 24     | register block size in bytes           |
//! | 28     | code size                              |
//! | 32     | stack size                             |
//! | 36     | extra size                             |
//! | 40     | register words, then code, stack, extra |
//!
//! The section sizes come straight from the file, so every section read is
//! bounds-checked and an overrun rejects the whole dump with
//! [`DecodeError::TruncatedBuffer`].
//!
//! ## Example
//!
//! ```rust
//! use bertram_core::dump::{self, CrashDump};
//! use bertram_core::types::{DumpVersion, ExceptionType, Processor, Register};
//!
//! let bytes = CrashDump::from_parts(
//!     DumpVersion::from_parts(13, 0, 0),
//!     Processor::Arm11(1),
//!     ExceptionType::DataAbort,
//!     vec![0; 23],
//!     Vec::new(),
//!     vec![0; 16],
//!     Vec::new(),
//! )
//! .to_bytes();
//!
//! let crash = dump::decode(&bytes)?;
//! assert_eq!(crash.exception_type(), ExceptionType::DataAbort);
//! assert_eq!(crash.register(Register::Pc), Some(0));
//! # Ok::<(), bertram_core::error::DecodeError>(())
//! ```

mod reader;

use std::fmt;

use tracing::{debug, warn};

use self::reader::{le_word, word_at, ByteReader};
use crate::error::DecodeError;
use crate::types::{DumpVersion, ExceptionType, Processor, Register, RegisterFile};

/// Sentinel pair at the start of every dump
pub const MAGIC: (u32, u32) = (0xDEAD_C0DE, 0xDEAD_CAFE);

/// Size of the fixed header preceding the register block
pub const HEADER_SIZE: usize = 40;

/// Bytes of extra data an ARM11 dump uses for process identification
const TITLE_INFO_SIZE: usize = 16;

/// Fixed-size header, kept verbatim so the structural fields re-encode exactly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpHeader
{
    pub version: DumpVersion,
    /// Processor id in the low half, ARM11 core in the high half.
    pub processor_word: u32,
    pub exception_code: u32,
    pub reserved: u32,
    /// Register block size in bytes; the register count is this divided by 4.
    pub register_block_size: u32,
    pub code_size: u32,
    pub stack_size: u32,
    pub extra_size: u32,
}

impl DumpHeader
{
    /// Check the magic and read the fixed header
    ///
    /// Only the magic and the header length are validated here; version and
    /// exception type are checked by [`CrashDump::decode`].
    pub fn parse(buffer: &[u8]) -> Result<Self, DecodeError>
    {
        let found = (word_at(buffer, 0).unwrap_or(0), word_at(buffer, 4).unwrap_or(0));
        if found != MAGIC {
            return Err(DecodeError::BadMagic { found });
        }

        let fields = ByteReader::new(buffer).take("header", HEADER_SIZE)?;
        let mut reader = ByteReader::at(fields, 8);

        Ok(Self {
            version: DumpVersion::new(reader.read_u32("header")?),
            processor_word: reader.read_u32("header")?,
            exception_code: reader.read_u32("header")?,
            reserved: reader.read_u32("header")?,
            register_block_size: reader.read_u32("header")?,
            code_size: reader.read_u32("header")?,
            stack_size: reader.read_u32("header")?,
            extra_size: reader.read_u32("header")?,
        })
    }

    /// Number of whole register words in the register block
    pub fn register_count(&self) -> usize
    {
        to_len(self.register_block_size / 4)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE]
    {
        let words = [
            MAGIC.0,
            MAGIC.1,
            self.version.raw(),
            self.processor_word,
            self.exception_code,
            self.reserved,
            self.register_block_size,
            self.code_size,
            self.stack_size,
            self.extra_size,
        ];

        let mut out = [0u8; HEADER_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}

/// Name and title id of the ARM11 process that crashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleInfo
{
    /// Up to eight ASCII characters, trailing NULs removed.
    pub process_name: String,
    pub title_id: u64,
}

impl fmt::Display for TitleInfo
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} ({:016X})", self.process_name, self.title_id)
    }
}

/// Fully decoded crash dump
///
/// Built once per buffer by [`CrashDump::decode`] and read-only afterwards.
/// The sections are copied out of the input so the buffer can be dropped
/// straight after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashDump
{
    header: DumpHeader,
    processor: Processor,
    exception_type: ExceptionType,
    registers: RegisterFile,
    code: Vec<u8>,
    stack: Vec<u8>,
    extra: Vec<u8>,
}

impl CrashDump
{
    /// Decode `buffer`, validating every structural invariant
    ///
    /// ## Errors
    ///
    /// - [`DecodeError::BadMagic`] if the sentinel pair is missing
    /// - [`DecodeError::TruncatedBuffer`] if the header or any section overruns the buffer
    /// - [`DecodeError::UnsupportedVersion`] for dumps older than 1.0.2
    /// - [`DecodeError::BadExceptionType`] for exception codes above 3
    pub fn decode(buffer: &[u8]) -> Result<Self, DecodeError>
    {
        let header = DumpHeader::parse(buffer)?;

        if !header.version.is_supported() {
            return Err(DecodeError::UnsupportedVersion {
                found: header.version,
                minimum: DumpVersion::MINIMUM_SUPPORTED,
            });
        }

        let exception_type = ExceptionType::try_from(header.exception_code)?;
        let processor = Processor::from_word(header.processor_word);

        let register_count = header.register_count();
        if register_count > RegisterFile::CANONICAL_COUNT {
            warn!(register_count, "dump declares more registers than the handler saves");
        }

        let mut reader = ByteReader::at(buffer, HEADER_SIZE);
        let register_bytes = reader.take("registers", register_count.saturating_mul(4))?;
        let registers = register_bytes.chunks_exact(4).map(le_word).collect();

        let code = reader.take("code", to_len(header.code_size))?.to_vec();
        let stack = reader.take("stack", to_len(header.stack_size))?.to_vec();
        let extra = reader.take("extra", to_len(header.extra_size))?.to_vec();

        if reader.remaining() > 0 {
            debug!(
                offset = reader.position(),
                trailing = reader.remaining(),
                "ignoring bytes after the extra section"
            );
        }

        debug!(
            version = %header.version,
            processor = %processor,
            exception = %exception_type,
            registers = register_count,
            code = code.len(),
            stack = stack.len(),
            extra = extra.len(),
            "decoded crash dump"
        );

        Ok(Self {
            header,
            processor,
            exception_type,
            registers: RegisterFile::new(registers),
            code,
            stack,
            extra,
        })
    }

    /// Assemble a dump from its parts, computing a canonical header
    ///
    /// This is the inverse of [`decode`](Self::decode) for well-formed input
    /// and is mostly useful for building fixtures. Section lengths above
    /// `u32::MAX` cannot be represented and saturate in the header.
    pub fn from_parts(
        version: DumpVersion,
        processor: Processor,
        exception_type: ExceptionType,
        registers: Vec<u32>,
        code: Vec<u8>,
        stack: Vec<u8>,
        extra: Vec<u8>,
    ) -> Self
    {
        let header = DumpHeader {
            version,
            processor_word: processor.to_word(),
            exception_code: exception_type.code(),
            reserved: 0,
            register_block_size: to_word(registers.len().saturating_mul(4)),
            code_size: to_word(code.len()),
            stack_size: to_word(stack.len()),
            extra_size: to_word(extra.len()),
        };

        Self {
            header,
            processor,
            exception_type,
            registers: RegisterFile::new(registers),
            code,
            stack,
            extra,
        }
    }

    /// Re-encode the dump in the on-disk layout
    pub fn to_bytes(&self) -> Vec<u8>
    {
        let mut out = Vec::with_capacity(
            HEADER_SIZE + self.registers.len() * 4 + self.code.len() + self.stack.len() + self.extra.len(),
        );
        out.extend_from_slice(&self.header.to_bytes());
        for word in self.registers.words() {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&self.code);
        out.extend_from_slice(&self.stack);
        out.extend_from_slice(&self.extra);
        out
    }

    pub fn header(&self) -> &DumpHeader
    {
        &self.header
    }

    pub fn version(&self) -> DumpVersion
    {
        self.header.version
    }

    pub fn processor(&self) -> Processor
    {
        self.processor
    }

    pub fn exception_type(&self) -> ExceptionType
    {
        self.exception_type
    }

    pub fn registers(&self) -> &RegisterFile
    {
        &self.registers
    }

    /// Value of `register`, `None` if the dump did not save it
    pub fn register(&self, register: Register) -> Option<u32>
    {
        self.registers.get(register)
    }

    pub fn pc(&self) -> Option<u32>
    {
        self.register(Register::Pc)
    }

    pub fn lr(&self) -> Option<u32>
    {
        self.register(Register::Lr)
    }

    pub fn sp(&self) -> Option<u32>
    {
        self.register(Register::Sp)
    }

    pub fn cpsr(&self) -> Option<u32>
    {
        self.register(Register::Cpsr)
    }

    /// Code bytes leading up to the faulting instruction
    pub fn code(&self) -> &[u8]
    {
        &self.code
    }

    /// Raw stack snapshot starting at `sp`
    pub fn stack(&self) -> &[u8]
    {
        &self.stack
    }

    pub fn extra(&self) -> &[u8]
    {
        &self.extra
    }

    /// Whole little-endian words of the stack section with their byte offset
    ///
    /// A trailing partial word is skipped.
    pub fn stack_words(&self) -> impl Iterator<Item = (usize, u32)> + '_
    {
        self.stack
            .chunks_exact(4)
            .enumerate()
            .map(|(index, chunk)| (index * 4, le_word(chunk)))
    }

    /// Process name and title id from an ARM11 extra section
    ///
    /// `None` on the ARM9 (its extra section is an opaque memory dump) and
    /// when the section is too short to hold both fields.
    pub fn title_info(&self) -> Option<TitleInfo>
    {
        if !self.processor.is_arm11() || self.extra.len() < TITLE_INFO_SIZE {
            return None;
        }

        let name = &self.extra[..8];
        let name_len = name.iter().position(|&b| b == 0).unwrap_or(name.len());
        let process_name = String::from_utf8_lossy(&name[..name_len]).into_owned();

        let mut id = [0u8; 8];
        id.copy_from_slice(&self.extra[8..TITLE_INFO_SIZE]);

        Some(TitleInfo {
            process_name,
            title_id: u64::from_le_bytes(id),
        })
    }
}

/// Decode a crash dump; see [`CrashDump::decode`]
pub fn decode(buffer: &[u8]) -> Result<CrashDump, DecodeError>
{
    CrashDump::decode(buffer)
}

fn to_len(size: u32) -> usize
{
    usize::try_from(size).unwrap_or(usize::MAX)
}

fn to_word(len: usize) -> u32
{
    u32::try_from(len).unwrap_or(u32::MAX)
}
