//! NOP (Nomor Objek Pajak)
//!
//! 18 digits made of seven location codes:
//! propinsi(2) dati2(2) kecamatan(3) kelurahan(3) blok(3) no_urut(4) jns_op(1).

use std::fmt;
use std::str::FromStr;

use crate::error::{OpError, OpResult};

const WIDTHS: [usize; 7] = [2, 2, 3, 3, 3, 4, 1];
/// Start of each code, plus the total length
const OFFSETS: [usize; 8] = [0, 2, 4, 7, 10, 13, 17, 18];
const NOP_LEN: usize = 18;

/// Validated NOP, stored as its 18 digits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nop(String);

/// Borrowed view of the seven codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NopParts<'a> {
    pub kd_propinsi: &'a str,
    pub kd_dati2: &'a str,
    pub kd_kecamatan: &'a str,
    pub kd_kelurahan: &'a str,
    pub kd_blok: &'a str,
    pub no_urut: &'a str,
    pub kd_jns_op: &'a str,
}

impl<'a> NopParts<'a> {
    /// Codes in key order
    pub fn codes(&self) -> [&'a str; 7] {
        [
            self.kd_propinsi,
            self.kd_dati2,
            self.kd_kecamatan,
            self.kd_kelurahan,
            self.kd_blok,
            self.no_urut,
            self.kd_jns_op,
        ]
    }
}

impl Nop {
    /// Parse user input; every non-digit character is ignored
    pub fn parse(raw: &str) -> OpResult<Self> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != NOP_LEN {
            return Err(OpError::InvalidNop);
        }
        Ok(Self(digits))
    }

    /// Build from the seven codes as stored in SPOP/SPPT rows
    pub fn from_parts(parts: [&str; 7]) -> OpResult<Self> {
        let valid = parts
            .iter()
            .zip(WIDTHS)
            .all(|(part, width)| part.len() == width && part.bytes().all(|b| b.is_ascii_digit()));
        if !valid {
            return Err(OpError::InvalidNop);
        }
        Ok(Self(parts.concat()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn code(&self, index: usize) -> &str {
        &self.0[OFFSETS[index]..OFFSETS[index + 1]]
    }

    pub fn parts(&self) -> NopParts<'_> {
        NopParts {
            kd_propinsi: self.code(0),
            kd_dati2: self.code(1),
            kd_kecamatan: self.code(2),
            kd_kelurahan: self.code(3),
            kd_blok: self.code(4),
            no_urut: self.code(5),
            kd_jns_op: self.code(6),
        }
    }
}

impl FromStr for Nop {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Dotted form, e.g. `51.02.030.001.024.0018.0`
impl fmt::Display for Nop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.parts();
        write!(
            f,
            "{}.{}.{}.{}.{}.{}.{}",
            p.kd_propinsi, p.kd_dati2, p.kd_kecamatan, p.kd_kelurahan, p.kd_blok, p.no_urut, p.kd_jns_op
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        let nop = Nop::parse("51.02.030.001.024-0018.0").unwrap();
        assert_eq!(nop.as_str(), "510203000102400180");

        let p = nop.parts();
        assert_eq!(p.kd_propinsi, "51");
        assert_eq!(p.kd_dati2, "02");
        assert_eq!(p.kd_kecamatan, "030");
        assert_eq!(p.kd_kelurahan, "001");
        assert_eq!(p.kd_blok, "024");
        assert_eq!(p.no_urut, "0018");
        assert_eq!(p.kd_jns_op, "0");
    }

    #[test]
    fn test_parse_requires_eighteen_digits() {
        assert!(matches!(Nop::parse("5102030001024001"), Err(OpError::InvalidNop)));
        assert!(matches!(Nop::parse("5102030001024001800"), Err(OpError::InvalidNop)));
        assert!(matches!(Nop::parse(""), Err(OpError::InvalidNop)));
        // Non-ASCII digits are not digits here
        assert!(Nop::parse("٥١٠٢٠٣٠٠٠١٠٢٤٠٠١٨٠").is_err());
    }

    #[test]
    fn test_from_parts_checks_widths() {
        let nop = Nop::from_parts(["51", "02", "030", "001", "024", "0018", "0"]).unwrap();
        assert_eq!(nop.to_string(), "51.02.030.001.024.0018.0");
        assert_eq!(nop, Nop::parse("510203000102400180").unwrap());

        assert!(Nop::from_parts(["5", "102", "030", "001", "024", "0018", "0"]).is_err());
        assert!(Nop::from_parts(["51", "02", "03a", "001", "024", "0018", "0"]).is_err());
    }
}
