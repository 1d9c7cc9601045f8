use super::*;

fn value_of(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn test_encode_short_item() {
    let raw = Tlv8::new().with(0x01, [0xaa, 0xbb]).encode();
    assert_eq!(&raw[..], &[0x01, 0x02, 0xaa, 0xbb]);
}

#[test]
fn test_encode_empty_value() {
    let raw = Tlv8::new().with(0x07, b"").with(0x08, [0x01]).encode();
    assert_eq!(&raw[..], &[0x07, 0x00, 0x08, 0x01, 0x01]);
}

#[test]
fn test_round_trip_lengths() {
    let lengths = [0usize, 1, 255, 256, 600];
    let mut tlv = Tlv8::new();
    for (i, len) in lengths.iter().enumerate() {
        tlv.push(i as u8 + 1, value_of(*len));
    }

    let decoded = Tlv8::decode(&tlv.encode()).unwrap();
    assert_eq!(decoded.len(), lengths.len());
    for (i, len) in lengths.iter().enumerate() {
        let value = decoded.get(i as u8 + 1, "value").unwrap();
        assert_eq!(&value[..], &value_of(*len)[..], "length {len}");
    }
}

#[test]
fn test_fragment_510_bytes() {
    let value = value_of(510);
    let raw = Tlv8::new().with(0x05, &value).encode();

    assert_eq!(raw.len(), 2 + 255 + 2 + 255 + 2);
    assert_eq!(&raw[0..2], &[0x05, 0xff]);
    assert_eq!(&raw[257..259], &[0x05, 0xff]);
    assert_eq!(&raw[514..516], &[0x05, 0x00]);

    let decoded = Tlv8::decode(&raw).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(&decoded.get(0x05, "value").unwrap()[..], &value[..]);
}

#[test]
fn test_fragment_256_bytes() {
    let value = value_of(256);
    let raw = Tlv8::new().with(0x05, &value).encode();

    assert_eq!(raw.len(), 2 + 255 + 2 + 1);
    assert_eq!(&raw[0..2], &[0x05, 0xff]);
    assert_eq!(&raw[257..259], &[0x05, 0x01]);
    assert_eq!(raw[259], value[255]);

    let decoded = Tlv8::decode(&raw).unwrap();
    assert_eq!(&decoded.get(0x05, "value").unwrap()[..], &value[..]);
}

#[test]
fn test_marshal_size_matches_encode() {
    let tlv = Tlv8::new()
        .with(0x01, value_of(0))
        .with(0x02, value_of(255))
        .with(0x02, value_of(3))
        .with(0x03, value_of(510))
        .with(0x04, value_of(600));
    assert_eq!(tlv.marshal_size(), tlv.encode().len());
}

#[test]
fn test_different_type_after_full_chunk_not_merged() {
    let mut raw = vec![0x01, 0xff];
    raw.extend(value_of(255));
    raw.extend([0x02, 0x01, 0x09]);

    let decoded = Tlv8::decode(&raw).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded.get(0x01, "a").unwrap().len(), 255);
    assert_eq!(&decoded.get(0x02, "b").unwrap()[..], &[0x09]);
}

#[test]
fn test_same_type_after_short_chunk_is_sibling() {
    let raw = [0x03, 0x01, 0x0a, 0x03, 0x01, 0x0b];
    let decoded = Tlv8::decode(&raw).unwrap();

    let values: Vec<&[u8]> = decoded.get_all(0x03).map(|v| &v[..]).collect();
    assert_eq!(values, vec![&[0x0a][..], &[0x0b][..]]);
    assert_eq!(
        decoded.find(0x03),
        Err(Error::ErrDuplicateField { typ: 0x03, count: 2 })
    );
}

#[test]
fn test_full_chunk_sibling_kept_apart() {
    let first = value_of(255);
    let tlv = Tlv8::new().with(0x03, &first).with(0x03, [0x01]);
    let raw = tlv.encode();

    // 255-byte value, empty terminator, then the sibling
    assert_eq!(raw.len(), 2 + 255 + 2 + 3);

    let decoded = Tlv8::decode(&raw).unwrap();
    let values: Vec<&Bytes> = decoded.get_all(0x03).collect();
    assert_eq!(values.len(), 2);
    assert_eq!(&values[0][..], &first[..]);
    assert_eq!(&values[1][..], &[0x01]);
}

#[test]
fn test_decode_truncated_value() {
    let raw = [0x01, 0x05, 0x00, 0x01];
    assert_eq!(
        Tlv8::decode(&raw),
        Err(Error::ErrMalformedTlv {
            offset: 0,
            expected: 5,
            actual: 2,
        })
    );
}

#[test]
fn test_decode_truncated_header() {
    let raw = [0x01, 0x01, 0x00, 0x02];
    assert_eq!(
        Tlv8::decode(&raw),
        Err(Error::ErrMalformedTlv {
            offset: 3,
            expected: 2,
            actual: 1,
        })
    );
}

#[test]
fn test_decode_empty() {
    let decoded = Tlv8::decode(&[]).unwrap();
    assert!(decoded.is_empty());
}

#[test]
fn test_missing_field() {
    let decoded = Tlv8::decode(&[0x01, 0x01, 0x00]).unwrap();
    assert_eq!(
        decoded.get(0x02, "status"),
        Err(Error::ErrMissingRequiredField {
            name: "status",
            typ: 0x02,
        })
    );
    assert_eq!(decoded.find(0x02), Ok(None));
}

#[test]
fn test_nested_lazy_decode() {
    let inner = Tlv8::new().with(0x01, 1280u16.to_le_bytes()).with(0x03, [30]);
    let outer = Tlv8::new().with_nested(0x03, &inner).with(0x01, [0x00]);

    let decoded = Tlv8::decode(&outer.encode()).unwrap();
    let attrs = decoded.nested(0x03, "attributes").unwrap();
    assert_eq!(attrs.get_u16_le(0x01, "width").unwrap(), 1280);
    assert_eq!(attrs.find_u8(0x03, "fps").unwrap(), Some(30));
    assert_eq!(attrs.find_u16_le(0x02, "height").unwrap(), None);
    assert!(decoded.find_nested(0x09).unwrap().is_none());
}

#[test]
fn test_display() {
    let tlv = Tlv8::new().with(0x01, [0x00, 0x01]).with(0x02, b"");
    assert_eq!(tlv.to_string(), "[0x01:2, 0x02:0]");
}
