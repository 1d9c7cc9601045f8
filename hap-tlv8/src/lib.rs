//! # hap-tlv8
//!
//! Encoder and decoder for the TLV8 format carried, base64 encoded, by every
//! camera stream management characteristic.
//!
//! Each item is `[type: u8][length: u8][value: length bytes]`. Values longer
//! than 255 bytes are split into consecutive items of the same type, every one
//! but the last holding exactly 255 bytes. A decoder merges an item into the
//! previous one when both share a type and the previous one was 255 bytes long.
//!
//! Decoding keeps every item in wire order, so lists of same-typed siblings
//! (several audio codec blocks, several resolutions) survive a round trip:
//!
//! ```rust
//! use hap_tlv8::Tlv8;
//!
//! let attrs = Tlv8::new()
//!     .with(0x03, [0x01])
//!     .with(0x03, [0x02])
//!     .with(0x04, [0xff]);
//!
//! let decoded = Tlv8::decode(&attrs.encode()).unwrap();
//! assert_eq!(decoded.get_all(0x03).count(), 2);
//! assert_eq!(decoded.get_u8(0x04, "flag").unwrap(), 0xff);
//! ```

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub(crate) mod codec;
pub mod value;

pub use codec::{Item, MAX_FRAGMENT_LEN, Tlv8};
