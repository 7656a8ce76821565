//! Tests for error handling

use bertram_core::error::{BertramError, BertramResult, DecodeError, SymbolError};
use bertram_core::symbols::CodeBounds;
use bertram_core::types::DumpVersion;

#[test]
fn test_bad_magic_message()
{
    let err = DecodeError::BadMagic {
        found: (0x1234_5678, 0),
    };
    let message = err.to_string();
    assert!(message.contains("Not a Luma3DS crash dump"));
    assert!(message.contains("12345678 00000000"));
}

#[test]
fn test_unsupported_version_message()
{
    let err = DecodeError::UnsupportedVersion {
        found: DumpVersion::from_parts(1, 0, 1),
        minimum: DumpVersion::MINIMUM_SUPPORTED,
    };
    let message = err.to_string();
    assert!(message.contains("1.0.1"));
    assert!(message.contains("1.0.2"));
}

#[test]
fn test_truncated_buffer_message()
{
    let err = DecodeError::TruncatedBuffer {
        section: "code",
        offset: 0x88,
        size: 512,
        available: 16,
    };
    let message = err.to_string();
    assert!(message.contains("code"));
    assert!(message.contains("0x88"));
    assert!(message.contains("512"));
    assert!(message.contains("16"));
}

#[test]
fn test_invalid_bounds()
{
    let err = CodeBounds::new(0x0020_0000, 0x0010_0000).unwrap_err();
    assert_eq!(
        err,
        SymbolError::InvalidBounds {
            start: 0x0020_0000,
            end: 0x0010_0000
        }
    );
    assert!(err.to_string().contains("0x00200000"));
}

#[test]
fn test_bertram_error_conversions()
{
    let err: BertramError = DecodeError::BadExceptionType(9).into();
    assert!(matches!(err, BertramError::Decode(DecodeError::BadExceptionType(9))));
    assert_eq!(err.to_string(), "Unknown exception type 9");

    let err: BertramError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert!(err.to_string().starts_with("IO error"));

    fn build_bounds() -> BertramResult<CodeBounds>
    {
        Ok(CodeBounds::new(1, 0)?)
    }
    assert!(matches!(build_bounds(), Err(BertramError::Symbols(_))));
}
