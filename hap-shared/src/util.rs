use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::{Rng, rng};

/// to_base64 encodes raw bytes the way characteristic values travel on the wire.
pub fn to_base64(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

/// from_base64 decodes a characteristic value back to raw bytes.
pub fn from_base64(value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value.trim())
        .map_err(|err| Error::Base64(err.to_string()))
}

/// to_hex renders opaque identifiers for logs and error messages.
pub fn to_hex(raw: &[u8]) -> String {
    hex::encode(raw)
}

/// random_ssrc returns a non-zero synchronization source that is not rejected by `in_use`.
pub fn random_ssrc<F>(in_use: F) -> u32
where
    F: Fn(u32) -> bool,
{
    let mut rng = rng();
    loop {
        let ssrc: u32 = rng.random();
        if ssrc != 0 && !in_use(ssrc) {
            return ssrc;
        }
    }
}
