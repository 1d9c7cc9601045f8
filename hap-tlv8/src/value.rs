//! Fixed-width little-endian field readers.

use bytes::Buf;
use shared::error::{Error, Result};

fn check_len(name: &'static str, raw: &[u8], expected: usize) -> Result<()> {
    if raw.len() != expected {
        return Err(Error::ErrInvalidFieldLength {
            name,
            expected,
            actual: raw.len(),
        });
    }
    Ok(())
}

pub fn read_u8(name: &'static str, raw: &[u8]) -> Result<u8> {
    check_len(name, raw, 1)?;
    Ok(raw[0])
}

pub fn read_u16_le(name: &'static str, raw: &[u8]) -> Result<u16> {
    check_len(name, raw, 2)?;
    Ok((&raw[..]).get_u16_le())
}

pub fn read_u32_le(name: &'static str, raw: &[u8]) -> Result<u32> {
    check_len(name, raw, 4)?;
    Ok((&raw[..]).get_u32_le())
}

pub fn read_f32_le(name: &'static str, raw: &[u8]) -> Result<f32> {
    check_len(name, raw, 4)?;
    Ok((&raw[..]).get_f32_le())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_read_le_values() {
        assert_eq!(read_u8("fps", &[30]).unwrap(), 30);
        assert_eq!(read_u16_le("width", &[0x00, 0x05]).unwrap(), 1280);
        assert_eq!(read_u32_le("ssrc", &[0x01, 0x00, 0x00, 0x80]).unwrap(), 0x8000_0001);
        assert_eq!(read_f32_le("interval", &0.5f32.to_le_bytes()).unwrap(), 0.5);
    }

    #[test]
    fn test_read_rejects_trailing_bytes() {
        assert_eq!(
            read_u32_le("ssrc", &[0x01, 0x00, 0x00, 0x80, 0x00]),
            Err(Error::ErrInvalidFieldLength {
                name: "ssrc",
                expected: 4,
                actual: 5,
            })
        );
        assert_eq!(read_f32_le("interval", &[0x00, 0x00, 0x80, 0x3f]).unwrap(), 1.0);
    }

    #[test]
    fn test_read_wrong_width() {
        assert_eq!(
            read_u16_le("width", &[0x00]),
            Err(Error::ErrInvalidFieldLength {
                name: "width",
                expected: 2,
                actual: 1,
            })
        );
    }
}
