//! Luma3DS dump format version.

use std::fmt;

/// Packed Luma3DS crash dump version
///
/// The dump header stores the version of the Luma3DS build that wrote it as a
/// single `u32`: `major << 16 | minor << 8 | micro`. Ordering compares the
/// packed words.
///
/// ## Example
///
/// ```rust
/// use bertram_core::types::DumpVersion;
///
/// let version = DumpVersion::from_parts(1, 0, 2);
/// assert_eq!(version.raw(), 0x0001_0002);
/// assert_eq!(version.to_string(), "1.0.2");
/// assert!(version >= DumpVersion::MINIMUM_SUPPORTED);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DumpVersion(u32);

impl DumpVersion
{
    /// Oldest dump layout the decoder understands (1.0.2)
    pub const MINIMUM_SUPPORTED: Self = Self::from_parts(1, 0, 2);

    /// Wrap a packed version word exactly as it appears in the header
    pub const fn new(raw: u32) -> Self
    {
        DumpVersion(raw)
    }

    /// Pack a `major.minor.micro` triple
    pub const fn from_parts(major: u16, minor: u8, micro: u8) -> Self
    {
        DumpVersion(((major as u32) << 16) | ((minor as u32) << 8) | micro as u32)
    }

    /// Packed representation, as written in the dump header
    pub const fn raw(self) -> u32
    {
        self.0
    }

    pub const fn major(self) -> u16
    {
        (self.0 >> 16) as u16
    }

    pub const fn minor(self) -> u8
    {
        (self.0 >> 8) as u8
    }

    pub const fn micro(self) -> u8
    {
        self.0 as u8
    }

    /// Whether the decoder accepts dumps of this version
    pub const fn is_supported(self) -> bool
    {
        self.0 >= Self::MINIMUM_SUPPORTED.0
    }
}

impl From<u32> for DumpVersion
{
    fn from(raw: u32) -> Self
    {
        DumpVersion(raw)
    }
}

impl From<DumpVersion> for u32
{
    fn from(version: DumpVersion) -> Self
    {
        version.0
    }
}

impl fmt::Display for DumpVersion
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.micro())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parts_round_trip()
    {
        let version = DumpVersion::from_parts(10, 2, 1);
        assert_eq!(version.major(), 10);
        assert_eq!(version.minor(), 2);
        assert_eq!(version.micro(), 1);
        assert_eq!(DumpVersion::new(version.raw()), version);
    }

    #[test]
    fn test_minimum_is_inclusive()
    {
        assert!(!DumpVersion::from_parts(1, 0, 1).is_supported());
        assert!(DumpVersion::from_parts(1, 0, 2).is_supported());
        assert!(DumpVersion::from_parts(1, 1, 0).is_supported());
        assert!(DumpVersion::from_parts(13, 0, 0).is_supported());
    }

    #[test]
    fn test_ordering_is_numeric()
    {
        assert!(DumpVersion::from_parts(1, 0, 255) < DumpVersion::from_parts(1, 1, 0));
        assert!(DumpVersion::from_parts(1, 255, 255) < DumpVersion::from_parts(2, 0, 0));
    }

    #[test]
    fn test_display()
    {
        assert_eq!(DumpVersion::MINIMUM_SUPPORTED.to_string(), "1.0.2");
        assert_eq!(DumpVersion::from_parts(13, 1, 0).to_string(), "13.1.0");
    }
}
