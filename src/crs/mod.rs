//! Parsing of CRS identifiers: plain authority codes, compound
//! horizontal+vertical codes, and topocentric (ENU) frames.

use crate::Error;
use std::fmt;
use std::str::FromStr;

/// The authority assumed for bare numeric codes
pub const DEFAULT_AUTHORITY: &str = "EPSG";

/// A parsed CRS identifier, normalized to `AUTH:CODE` form throughout
#[derive(Debug, Clone, PartialEq)]
pub enum CrsDescriptor {
    /// A single catalog CRS, e.g. `EPSG:25830`
    Plain { code: String },
    /// A horizontal CRS combined with a vertical one, e.g. `EPSG:25830+5782`
    Compound { horizontal: String, vertical: String },
    /// A local east-north-up frame, with its origin given in the coordinates of `base`
    Enu { base: String, origin: [f64; 3] },
}

impl CrsDescriptor {
    /// Parse `identifier`. No catalog lookups are made, so a well formed but
    /// unknown code parses fine
    pub fn parse(identifier: &str) -> Result<CrsDescriptor, Error> {
        let invalid = || Error::InvalidFormat(identifier.to_string());
        let id = identifier.trim();
        if id.is_empty() {
            return Err(invalid());
        }

        if let Some(body) = id.strip_prefix("ENU:") {
            let parts: Vec<&str> = body.split(';').collect();
            if parts.len() != 4 {
                return Err(invalid());
            }
            let base = code_or_bare(parts[0], DEFAULT_AUTHORITY).ok_or_else(invalid)?;
            let mut origin = [0.; 3];
            for (i, part) in parts[1..].iter().enumerate() {
                let value = part.trim().parse::<f64>().map_err(|_| invalid())?;
                if !value.is_finite() {
                    return Err(invalid());
                }
                origin[i] = value;
            }
            return Ok(CrsDescriptor::Enu { base, origin });
        }

        let parts: Vec<&str> = id.split('+').collect();
        match parts.len() {
            1 => {
                let code = authority_code(parts[0]).ok_or_else(invalid)?;
                Ok(CrsDescriptor::Plain { code })
            }
            2 => {
                let horizontal = authority_code(parts[0]).ok_or_else(invalid)?;
                let (authority, _) = split_code(&horizontal);
                let vertical = code_or_bare(parts[1], authority).ok_or_else(invalid)?;
                Ok(CrsDescriptor::Compound {
                    horizontal,
                    vertical,
                })
            }
            _ => Err(invalid()),
        }
    }

    /// The horizontal CRS code: the code itself, the horizontal component
    /// of a compound, or the base of a topocentric frame
    pub fn horizontal(&self) -> &str {
        match self {
            CrsDescriptor::Plain { code } => code,
            CrsDescriptor::Compound { horizontal, .. } => horizontal,
            CrsDescriptor::Enu { base, .. } => base,
        }
    }

    pub fn vertical(&self) -> Option<&str> {
        match self {
            CrsDescriptor::Compound { vertical, .. } => Some(vertical),
            _ => None,
        }
    }

    pub fn is_enu(&self) -> bool {
        matches!(self, CrsDescriptor::Enu { .. })
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, CrsDescriptor::Compound { .. })
    }
}

impl FromStr for CrsDescriptor {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrsDescriptor::parse(s)
    }
}

impl fmt::Display for CrsDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsDescriptor::Plain { code } => write!(f, "{code}"),
            CrsDescriptor::Compound {
                horizontal,
                vertical,
            } => {
                // The vertical authority is elided when it equals the horizontal one
                let (h_auth, _) = split_code(horizontal);
                let (v_auth, v_code) = split_code(vertical);
                if h_auth == v_auth {
                    write!(f, "{horizontal}+{v_code}")
                } else {
                    write!(f, "{horizontal}+{vertical}")
                }
            }
            CrsDescriptor::Enu { base, origin } => {
                write!(f, "ENU:{base};{};{};{}", origin[0], origin[1], origin[2])
            }
        }
    }
}

// ----- A N C I L L A R Y   F U N C T I O N S -----------------------------------------

/// Normalize an `AUTH:CODE` identifier, or return `None` if malformed
pub fn authority_code(s: &str) -> Option<String> {
    let (authority, code) = s.trim().split_once(':')?;
    let authority = authority.trim();
    let code = code.trim();
    if authority.is_empty()
        || !authority
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }
    if code.is_empty() || code.chars().any(|c| c.is_whitespace() || "+;:".contains(c)) {
        return None;
    }
    Some(format!("{}:{code}", authority.to_uppercase()))
}

// Either a full `AUTH:CODE`, or a bare code inheriting `authority`
fn code_or_bare(s: &str, authority: &str) -> Option<String> {
    let s = s.trim();
    if s.contains(':') {
        return authority_code(s);
    }
    authority_code(&format!("{authority}:{s}"))
}

/// Split a normalized `AUTH:CODE` into its parts
pub fn split_code(code: &str) -> (&str, &str) {
    code.split_once(':').unwrap_or(("", code))
}

// ----- T E S T S ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain() -> Result<(), Error> {
        let crs = CrsDescriptor::parse("EPSG:25830")?;
        assert_eq!(
            crs,
            CrsDescriptor::Plain {
                code: "EPSG:25830".to_string()
            }
        );
        assert_eq!(crs.to_string(), "EPSG:25830");

        // Spelling variants normalize to the same thing
        assert_eq!(CrsDescriptor::parse(" epsg:25830 ")?, crs);
        assert_eq!("EPSG:25830".parse::<CrsDescriptor>()?, crs);
        assert_eq!(crs.horizontal(), "EPSG:25830");
        assert_eq!(crs.vertical(), None);
        Ok(())
    }

    #[test]
    fn compound() -> Result<(), Error> {
        let crs = CrsDescriptor::parse("EPSG:25830+5782")?;
        assert!(crs.is_compound());
        assert_eq!(crs.horizontal(), "EPSG:25830");
        assert_eq!(crs.vertical(), Some("EPSG:5782"));
        assert_eq!(crs.to_string(), "EPSG:25830+5782");

        // Fully qualified vertical part
        assert_eq!(CrsDescriptor::parse("EPSG:25830+EPSG:5782")?, crs);
        Ok(())
    }

    #[test]
    fn enu() -> Result<(), Error> {
        let crs = CrsDescriptor::parse("ENU:EPSG:4937;-4.495021180808;36.756413127079;142.1590")?;
        let CrsDescriptor::Enu { base, origin } = &crs else {
            panic!("Expected an ENU descriptor");
        };
        assert_eq!(base, "EPSG:4937");
        assert_eq!(origin, &[-4.495021180808, 36.756413127079, 142.159]);
        assert_eq!(
            crs.to_string(),
            "ENU:EPSG:4937;-4.495021180808;36.756413127079;142.159"
        );

        // The short form inherits the EPSG authority
        assert_eq!(
            CrsDescriptor::parse("ENU:4937;-4.495021180808;36.756413127079;142.1590")?,
            crs
        );
        assert!(crs.is_enu());
        Ok(())
    }

    #[test]
    fn malformed() {
        for id in [
            "",
            "   ",
            "25830",
            ":25830",
            "EPSG:",
            "EP SG:25830",
            "EPSG:25830+5782+3855",
            "EPSG:25830+",
            "ENU:EPSG:4937;1;2",
            "ENU:EPSG:4937;1;2;3;4",
            "ENU:EPSG:4937;a;2;3",
            "ENU:EPSG:4937;inf;2;3",
            "ENU:;1;2;3",
        ] {
            assert!(
                matches!(CrsDescriptor::parse(id), Err(Error::InvalidFormat(_))),
                "'{id}' should be rejected"
            );
        }
    }
}
