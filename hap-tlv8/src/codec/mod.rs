#[cfg(test)]
mod codec_test;

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};

use crate::value::{read_u8, read_u16_le, read_u32_le};

/// Longest value a single item can carry; longer values are fragmented.
pub const MAX_FRAGMENT_LEN: usize = 255;

const ITEM_HEADER_LEN: usize = 2;

/// A logical TLV8 item with its fragments already reassembled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub typ: u8,
    pub value: Bytes,
}

impl Item {
    pub fn new(typ: u8, value: impl AsRef<[u8]>) -> Self {
        Item {
            typ,
            value: Bytes::copy_from_slice(value.as_ref()),
        }
    }
}

/// An ordered sequence of TLV8 items at one nesting level.
///
/// Nested blocks stay as raw bytes until [`Tlv8::nested`] is asked for them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tlv8 {
    items: Vec<Item>,
}

impl Tlv8 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item, builder style.
    pub fn with(mut self, typ: u8, value: impl AsRef<[u8]>) -> Self {
        self.push(typ, value);
        self
    }

    /// Appends an item holding another encoded level.
    pub fn with_nested(self, typ: u8, inner: &Tlv8) -> Self {
        self.with(typ, inner.encode())
    }

    pub fn push(&mut self, typ: u8, value: impl AsRef<[u8]>) {
        self.items.push(Item::new(typ, value));
    }

    /// Appends every item of `other` after the items already present.
    pub fn extend(&mut self, other: Tlv8) {
        self.items.extend(other.items);
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.marshal_size());
        self.marshal_to(&mut buf);
        buf.freeze()
    }

    /// Number of bytes [`Tlv8::encode`] produces.
    pub fn marshal_size(&self) -> usize {
        let mut size = 0;
        for (i, item) in self.items.iter().enumerate() {
            let len = item.value.len();
            let chunks = if len == 0 {
                1
            } else {
                len.div_ceil(MAX_FRAGMENT_LEN)
            };
            size += chunks * ITEM_HEADER_LEN + len;
            if self.needs_terminator(i) {
                size += ITEM_HEADER_LEN;
            }
        }
        size
    }

    pub fn marshal_to(&self, buf: &mut BytesMut) {
        for (i, item) in self.items.iter().enumerate() {
            let mut rest = &item.value[..];
            loop {
                let n = rest.len().min(MAX_FRAGMENT_LEN);
                buf.put_u8(item.typ);
                buf.put_u8(n as u8);
                buf.put_slice(&rest[..n]);
                rest = &rest[n..];
                if rest.is_empty() {
                    break;
                }
            }
            if self.needs_terminator(i) {
                buf.put_u8(item.typ);
                buf.put_u8(0);
            }
        }
    }

    // A final chunk of exactly 255 bytes would swallow the next item of the
    // same type, so it is closed with an empty chunk. Fragmented values are
    // always closed this way.
    fn needs_terminator(&self, index: usize) -> bool {
        let item = &self.items[index];
        let len = item.value.len();
        if len == 0 || len % MAX_FRAGMENT_LEN != 0 {
            return false;
        }
        len > MAX_FRAGMENT_LEN
            || self
                .items
                .get(index + 1)
                .is_some_and(|next| next.typ == item.typ)
    }

    /// Decodes one nesting level, merging fragments.
    ///
    /// Fails without returning any partial result when an item header or
    /// value runs past the end of `raw`.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let mut entries: Vec<(u8, Vec<u8>)> = Vec::new();
        let mut prev: Option<(u8, usize)> = None;
        let mut offset = 0;

        while offset < raw.len() {
            let remaining = raw.len() - offset;
            if remaining < ITEM_HEADER_LEN {
                return Err(Error::ErrMalformedTlv {
                    offset,
                    expected: ITEM_HEADER_LEN,
                    actual: remaining,
                });
            }

            let typ = raw[offset];
            let len = raw[offset + 1] as usize;
            let start = offset + ITEM_HEADER_LEN;
            if len > raw.len() - start {
                return Err(Error::ErrMalformedTlv {
                    offset,
                    expected: len,
                    actual: raw.len() - start,
                });
            }
            let chunk = &raw[start..start + len];

            if let Some((prev_typ, prev_len)) = prev
                && prev_typ == typ
                && prev_len == MAX_FRAGMENT_LEN
                && let Some((_, open)) = entries.last_mut()
            {
                open.extend_from_slice(chunk);
            } else {
                entries.push((typ, chunk.to_vec()));
            }

            prev = Some((typ, len));
            offset = start + len;
        }

        Ok(Tlv8 {
            items: entries
                .into_iter()
                .map(|(typ, value)| Item {
                    typ,
                    value: Bytes::from(value),
                })
                .collect(),
        })
    }

    /// All values of `typ`, in wire order.
    pub fn get_all(&self, typ: u8) -> impl Iterator<Item = &Bytes> + '_ {
        self.items
            .iter()
            .filter(move |item| item.typ == typ)
            .map(|item| &item.value)
    }

    /// The single value of `typ`, or `None` when absent.
    ///
    /// More than one occurrence is an error.
    pub fn find(&self, typ: u8) -> Result<Option<&Bytes>> {
        let mut values = self.get_all(typ);
        let first = values.next();
        let extra = values.count();
        if extra > 0 {
            return Err(Error::ErrDuplicateField {
                typ,
                count: extra + 1,
            });
        }
        Ok(first)
    }

    /// The single value of `typ`; absence and repetition are both errors.
    pub fn get(&self, typ: u8, name: &'static str) -> Result<&Bytes> {
        self.find(typ)?
            .ok_or(Error::ErrMissingRequiredField { name, typ })
    }

    pub fn nested(&self, typ: u8, name: &'static str) -> Result<Tlv8> {
        Tlv8::decode(self.get(typ, name)?)
    }

    pub fn find_nested(&self, typ: u8) -> Result<Option<Tlv8>> {
        self.find(typ)?.map(|raw| Tlv8::decode(raw)).transpose()
    }

    pub fn get_u8(&self, typ: u8, name: &'static str) -> Result<u8> {
        read_u8(name, self.get(typ, name)?)
    }

    pub fn find_u8(&self, typ: u8, name: &'static str) -> Result<Option<u8>> {
        self.find(typ)?.map(|raw| read_u8(name, raw)).transpose()
    }

    pub fn get_u16_le(&self, typ: u8, name: &'static str) -> Result<u16> {
        read_u16_le(name, self.get(typ, name)?)
    }

    pub fn find_u16_le(&self, typ: u8, name: &'static str) -> Result<Option<u16>> {
        self.find(typ)?.map(|raw| read_u16_le(name, raw)).transpose()
    }

    pub fn find_u32_le(&self, typ: u8, name: &'static str) -> Result<Option<u32>> {
        self.find(typ)?.map(|raw| read_u32_le(name, raw)).transpose()
    }
}

impl fmt::Display for Tlv8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:#04x}:{}", item.typ, item.value.len())?;
        }
        write!(f, "]")
    }
}
