//! Character encodings accepted by text reads and writes.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A character encoding for converting between text and bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Charset {
    /// UTF-8; invalid input is an error.
    #[default]
    Utf8,
    /// UTF-8; invalid sequences become U+FFFD.
    Utf8Lossy,
    /// ISO-8859-1, one byte per code point below U+0100.
    Latin1,
    /// 7-bit US-ASCII.
    Ascii,
    /// UTF-16, big-endian, no byte order mark.
    Utf16Be,
    /// UTF-16, little-endian, no byte order mark.
    Utf16Le,
}

impl Charset {
    /// Canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 | Charset::Utf8Lossy => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Ascii => "US-ASCII",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf16Le => "UTF-16LE",
        }
    }

    /// Encodes `text` into bytes.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            Charset::Utf8 | Charset::Utf8Lossy => Ok(text.as_bytes().to_vec()),
            Charset::Latin1 => narrow(text, 0xff, self),
            Charset::Ascii => narrow(text, 0x7f, self),
            Charset::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            Charset::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        }
    }

    /// Decodes `bytes` into text.
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            Charset::Utf8 => {
                String::from_utf8(bytes.to_vec()).map_err(|e| Error::Decode(e.to_string()))
            }
            Charset::Utf8Lossy => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Charset::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Charset::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(at) => Err(Error::Decode(format!(
                    "non-ASCII byte 0x{:02x} at offset {}",
                    bytes[at], at
                ))),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            Charset::Utf16Be => utf16(bytes, u16::from_be_bytes),
            Charset::Utf16Le => utf16(bytes, u16::from_le_bytes),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "utf8" => Ok(Charset::Utf8),
            "iso88591" | "latin1" => Ok(Charset::Latin1),
            "usascii" | "ascii" => Ok(Charset::Ascii),
            "utf16be" => Ok(Charset::Utf16Be),
            "utf16le" => Ok(Charset::Utf16Le),
            _ => Err(Error::invalid(format!("unsupported charset: {}", s))),
        }
    }
}

fn narrow(text: &str, max: u32, charset: &Charset) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| match u32::from(c) {
            v if v <= max => Ok(v as u8),
            _ => Err(Error::Encode(format!("{:?} is not representable in {}", c, charset))),
        })
        .collect()
}

fn utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(Error::Decode(format!("odd UTF-16 byte length: {}", bytes.len())));
    }
    let units: Vec<u16> = bytes.chunks_exact(2).map(|p| unit([p[0], p[1]])).collect();
    String::from_utf16(&units).map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_strict_and_lossy() {
        assert_eq!(Charset::Utf8.decode("héllo".as_bytes()).unwrap(), "héllo");
        assert!(matches!(Charset::Utf8.decode(&[0xff, 0x41]), Err(Error::Decode(_))));
        assert_eq!(Charset::Utf8Lossy.decode(&[0xff, 0x41]).unwrap(), "\u{fffd}A");
    }

    #[test]
    fn test_latin1() {
        assert_eq!(Charset::Latin1.encode("é").unwrap(), vec![0xe9]);
        assert_eq!(Charset::Latin1.decode(&[0xe9]).unwrap(), "é");
        assert!(matches!(Charset::Latin1.encode("€"), Err(Error::Encode(_))));
    }

    #[test]
    fn test_ascii() {
        assert_eq!(Charset::Ascii.encode("abc").unwrap(), b"abc".to_vec());
        assert!(Charset::Ascii.encode("é").is_err());
        assert!(Charset::Ascii.decode(&[0x41, 0x80]).is_err());
    }

    #[test]
    fn test_utf16() {
        assert_eq!(Charset::Utf16Be.encode("A").unwrap(), vec![0x00, 0x41]);
        assert_eq!(Charset::Utf16Le.encode("A").unwrap(), vec![0x41, 0x00]);
        assert_eq!(Charset::Utf16Be.decode(&[0xd8, 0x3d, 0xde, 0x00]).unwrap(), "😀");
        assert!(Charset::Utf16Le.decode(&[0x41]).is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("UTF-8".parse::<Charset>().unwrap(), Charset::Utf8);
        assert_eq!("iso-8859-1".parse::<Charset>().unwrap(), Charset::Latin1);
        assert_eq!("US-ASCII".parse::<Charset>().unwrap(), Charset::Ascii);
        assert_eq!("utf_16le".parse::<Charset>().unwrap(), Charset::Utf16Le);
        assert!("GBK".parse::<Charset>().is_err());
        assert_eq!(Charset::default().to_string(), "UTF-8");
    }
}
