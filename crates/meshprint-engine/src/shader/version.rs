//! GLSL dialect selection.
//!
//! Desktop GL reports its version as `major.minor…`. From 3.3 on the GLSL
//! version equals the GL version; below that the table is irregular:
//!
//! | GL  | GLSL |
//! |-----|------|
//! | 2.0 | 110  |
//! | 2.1 | 120  |
//! | 3.0 | 130  |
//! | 3.1 | 140  |
//! | 3.2 | 150  |
//!
//! Web targets always use GLSL ES 1.00.

use crate::device::ContextTarget;

use super::error::VersionError;

/// Numeric shading-language version, e.g. `330`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GlslVersion(u32);

impl GlslVersion {
    /// GLSL ES 1.00, used for every web context.
    pub const WEB: GlslVersion = GlslVersion(100);

    /// Dialects from here on use `in`/`out` qualifiers and `texture()`.
    pub const IN_OUT: GlslVersion = GlslVersion(130);

    /// Dialects from here on bind the fragment output with an explicit location.
    pub const EXPLICIT_LOCATION: GlslVersion = GlslVersion(330);

    #[inline]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    #[inline]
    pub const fn number(self) -> u32 {
        self.0
    }

    /// Picks the dialect for an API version.
    pub fn select(major: u32, minor: u32, target: ContextTarget) -> Result<Self, VersionError> {
        if target == ContextTarget::Web {
            return Ok(Self::WEB);
        }
        let gl = major * 100 + minor * 10;
        if gl >= 330 {
            return Ok(Self(gl));
        }
        match major {
            2 => Ok(Self(gl - 90)),
            3 => Ok(Self(gl - 170)),
            _ => Err(VersionError::Unsupported { major, minor }),
        }
    }

    /// Parses the driver's version string and picks the dialect.
    pub fn detect(version: &str, target: ContextTarget) -> Result<Self, VersionError> {
        let (major, minor) = parse_gl_version(version)?;
        Self::select(major, minor, target)
    }

    /// First line(s) of every shader of this dialect.
    pub fn header(self, target: ContextTarget) -> String {
        match target {
            ContextTarget::Desktop => format!("#version {}\n", self.0),
            ContextTarget::Web => "precision mediump float;\n".to_owned(),
        }
    }
}

/// Extracts `(major, minor)` from a GL version string.
///
/// Takes the first `digits.digit` occurrence, so vendor prefixes such as
/// `"OpenGL ES 3.0 (WebGL 2.0)"` and suffixes such as `"4.6.0 NVIDIA 535.54"`
/// are accepted. Only the first digit after the dot counts as the minor.
pub fn parse_gl_version(version: &str) -> Result<(u32, u32), VersionError> {
    let bytes = version.as_bytes();
    let unparseable = || VersionError::Unparseable(version.to_owned());

    let dot = (1..bytes.len().saturating_sub(1))
        .find(|&i| bytes[i] == b'.' && bytes[i - 1].is_ascii_digit() && bytes[i + 1].is_ascii_digit())
        .ok_or_else(unparseable)?;

    let start = bytes[..dot]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |p| p + 1);

    let major = version[start..dot].parse::<u32>().map_err(|_| unparseable())?;
    let minor = u32::from(bytes[dot + 1] - b'0');
    Ok((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop(major: u32, minor: u32) -> Result<u32, VersionError> {
        GlslVersion::select(major, minor, ContextTarget::Desktop).map(GlslVersion::number)
    }

    #[test]
    fn legacy_table() {
        assert_eq!(desktop(2, 0), Ok(110));
        assert_eq!(desktop(2, 1), Ok(120));
        assert_eq!(desktop(3, 0), Ok(130));
        assert_eq!(desktop(3, 1), Ok(140));
        assert_eq!(desktop(3, 2), Ok(150));
    }

    #[test]
    fn linear_from_3_3() {
        assert_eq!(desktop(3, 3), Ok(330));
        assert_eq!(desktop(4, 1), Ok(410));
        assert_eq!(desktop(4, 6), Ok(460));
    }

    #[test]
    fn too_old_is_unsupported() {
        assert_eq!(desktop(1, 5), Err(VersionError::Unsupported { major: 1, minor: 5 }));
    }

    #[test]
    fn web_is_always_minimal() {
        for (major, minor) in [(2, 0), (3, 0), (3, 1)] {
            assert_eq!(GlslVersion::select(major, minor, ContextTarget::Web), Ok(GlslVersion::WEB));
        }
    }

    #[test]
    fn parses_vendor_strings() {
        assert_eq!(parse_gl_version("4.6.0 NVIDIA 535.54.03"), Ok((4, 6)));
        assert_eq!(parse_gl_version("3.3 (Core Profile) Mesa 23.1"), Ok((3, 3)));
        assert_eq!(parse_gl_version("OpenGL ES 3.0 (WebGL 2.0)"), Ok((3, 0)));
        assert_eq!(parse_gl_version("2.1"), Ok((2, 1)));
    }

    #[test]
    fn garbage_is_an_error() {
        for s in ["", "OpenGL", "4.", ".5", "v4x6"] {
            assert!(matches!(parse_gl_version(s), Err(VersionError::Unparseable(_))), "{s:?}");
        }
    }

    #[test]
    fn headers_per_target() {
        assert_eq!(GlslVersion::new(330).header(ContextTarget::Desktop), "#version 330\n");
        assert_eq!(GlslVersion::WEB.header(ContextTarget::Web), "precision mediump float;\n");
    }
}
