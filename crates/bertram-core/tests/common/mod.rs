//! Common test utilities: a byte-level crash dump builder

#![allow(dead_code)]

pub const MAGIC_1: u32 = 0xDEAD_C0DE;
pub const MAGIC_2: u32 = 0xDEAD_CAFE;

pub const fn version(major: u32, minor: u32, micro: u32) -> u32
{
    (major << 16) | (minor << 8) | micro
}

/// Lays out a dump exactly as the Luma3DS handler writes it
///
/// Section sizes in the header default to the real section lengths and can be
/// overridden to produce corrupt dumps.
#[derive(Debug, Clone)]
pub struct DumpBuilder
{
    pub version: u32,
    pub processor: u32,
    pub core: u32,
    pub exception: u32,
    pub registers: Vec<u32>,
    pub code: Vec<u8>,
    pub stack: Vec<u8>,
    pub extra: Vec<u8>,
    pub declared_code_size: Option<u32>,
    pub declared_stack_size: Option<u32>,
    pub declared_extra_size: Option<u32>,
    pub trailing: Vec<u8>,
}

impl DumpBuilder
{
    /// ARM11 core 0 data abort with 23 zeroed registers
    pub fn new() -> Self
    {
        Self {
            version: version(1, 2, 0),
            processor: 11,
            core: 0,
            exception: 3,
            registers: vec![0; 23],
            code: Vec::new(),
            stack: Vec::new(),
            extra: Vec::new(),
            declared_code_size: None,
            declared_stack_size: None,
            declared_extra_size: None,
            trailing: Vec::new(),
        }
    }

    pub fn arm9(mut self) -> Self
    {
        self.processor = 9;
        self.registers = vec![0; 17];
        self
    }

    pub fn exception(mut self, code: u32) -> Self
    {
        self.exception = code;
        self
    }

    pub fn version(mut self, raw: u32) -> Self
    {
        self.version = raw;
        self
    }

    pub fn register(mut self, index: usize, value: u32) -> Self
    {
        self.registers[index] = value;
        self
    }

    pub fn registers(mut self, registers: Vec<u32>) -> Self
    {
        self.registers = registers;
        self
    }

    pub fn code(mut self, code: &[u8]) -> Self
    {
        self.code = code.to_vec();
        self
    }

    pub fn stack_words(mut self, words: &[u32]) -> Self
    {
        self.stack = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self
    }

    pub fn stack_bytes(mut self, bytes: &[u8]) -> Self
    {
        self.stack = bytes.to_vec();
        self
    }

    pub fn extra(mut self, extra: &[u8]) -> Self
    {
        self.extra = extra.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8>
    {
        let header = [
            MAGIC_1,
            MAGIC_2,
            self.version,
            self.processor | (self.core << 16),
            self.exception,
            0,
            (self.registers.len() * 4) as u32,
            self.declared_code_size.unwrap_or(self.code.len() as u32),
            self.declared_stack_size.unwrap_or(self.stack.len() as u32),
            self.declared_extra_size.unwrap_or(self.extra.len() as u32),
        ];

        let mut out: Vec<u8> = header.iter().flat_map(|w| w.to_le_bytes()).collect();
        out.extend(self.registers.iter().flat_map(|w| w.to_le_bytes()));
        out.extend_from_slice(&self.code);
        out.extend_from_slice(&self.stack);
        out.extend_from_slice(&self.extra);
        out.extend_from_slice(&self.trailing);
        out
    }
}
