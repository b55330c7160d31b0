//! On-disk encode/decode for the KVF binary layout, grounded on
//! `original_source/Kvf.c`'s entry walk (size-prefixed, CRC-16-of-key,
//! type-tagged payload) and the format's own little-endian convention.
//! `crc16` is `kernel::crc`'s Dallas/Maxim CRC-16, reused rather than
//! introducing a second polynomial for the key hash.

use crate::schema::{SchemaEntry, ValueSpec, VarType};
use crate::value::KvfValue;
use kernel::errorcode::ErrorCode;

pub const FILE_TYPE_ID_KVF: u16 = 0x0100;
pub const MAJOR_REV: u8 = 1;
pub const MINOR_REV: u8 = 1;
pub const STRING_VALUE_LEN: usize = 64;

fn var_type_tag(t: VarType) -> u8 {
    match t {
        VarType::Bool => 0,
        VarType::Int8u => 1,
        VarType::Int8s => 2,
        VarType::Int16u => 3,
        VarType::Int16s => 4,
        VarType::Int32u => 5,
        VarType::Int32s => 6,
        VarType::Fp32 => 7,
        VarType::Str => 8,
        VarType::Enum => 9,
    }
}

fn var_type_from_tag(tag: u8) -> Option<VarType> {
    Some(match tag {
        0 => VarType::Bool,
        1 => VarType::Int8u,
        2 => VarType::Int8s,
        3 => VarType::Int16u,
        4 => VarType::Int16s,
        5 => VarType::Int32u,
        6 => VarType::Int32s,
        7 => VarType::Fp32,
        8 => VarType::Str,
        9 => VarType::Enum,
        _ => return None,
    })
}

/// A read-only walker over a decoded file's byte buffer.
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Cursor<'a> {
        Cursor { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], ErrorCode> {
        if self.remaining() < n {
            return Err(ErrorCode::FILESYSTEM);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ErrorCode> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ErrorCode> {
        Ok(u16::from_le_bytes(self.bytes(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32, ErrorCode> {
        Ok(u32::from_le_bytes(self.bytes(4)?.try_into().unwrap()))
    }

    fn string(&mut self, len: usize) -> Result<String, ErrorCode> {
        let raw = self.bytes(len)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

/// The file-level header and description, preceding the first entry.
pub struct FileHeader {
    pub description: String,
}

pub fn encode_header(description: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(FILE_TYPE_ID_KVF.to_le_bytes());
    out.push(MAJOR_REV);
    out.push(MINOR_REV);
    out.push(description.len() as u8);
    out.extend(description.as_bytes());
    out
}

pub fn decode_header(cursor: &mut Cursor) -> Result<FileHeader, ErrorCode> {
    let type_id = cursor.u16()?;
    if type_id != FILE_TYPE_ID_KVF {
        return Err(ErrorCode::FILESYSTEM);
    }
    let _major = cursor.u8()?;
    let _minor = cursor.u8()?;
    let desc_len = cursor.u8()? as usize;
    let description = cursor.string(desc_len)?;
    Ok(FileHeader { description })
}

/// A fully parsed entry, carrying everything `validate` and
/// `find_by_key` need: the declared shape (key/description/type),
/// the stored current value, and enough of the default/min/max/enum-item
/// record to compare against a schema entry.
pub struct DecodedEntry {
    pub key_crc: u16,
    pub key: String,
    pub description: String,
    pub var_type: VarType,
    pub current: KvfValue,
    pub default: KvfValue,
    pub min: Option<KvfValue>,
    pub max: Option<KvfValue>,
    pub enum_items: Vec<(String, u32)>,
}

/// Encodes one entry (size-prefixed) for `current`'s value against
/// `entry`'s schema-declared default/min/max.
pub fn encode_entry(entry: &SchemaEntry, current: &KvfValue) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend(kernel::crc::crc16(entry.key.as_bytes()).to_le_bytes());
    body.push(entry.key.len() as u8);
    body.extend(entry.key.as_bytes());
    body.push(entry.description.len() as u8);
    body.extend(entry.description.as_bytes());
    body.push(var_type_tag(entry.value.var_type()));
    encode_payload(&mut body, &entry.value, current);

    let mut out = Vec::with_capacity(body.len() + 2);
    out.extend((body.len() as u16).to_le_bytes());
    out.extend(body);
    out
}

fn encode_padded_string(out: &mut Vec<u8>, s: &str) {
    let mut buf = [0u8; STRING_VALUE_LEN];
    let bytes = s.as_bytes();
    let n = bytes.len().min(STRING_VALUE_LEN);
    buf[..n].copy_from_slice(&bytes[..n]);
    out.extend(buf);
}

fn encode_payload(out: &mut Vec<u8>, spec: &ValueSpec, current: &KvfValue) {
    match (spec, current) {
        (ValueSpec::Bool { default }, KvfValue::Bool(cur)) => {
            out.push(*cur as u8);
            out.push(*default as u8);
        }
        (ValueSpec::Int8u { default, min, max }, KvfValue::Int8u(cur)) => {
            out.extend([*cur, *default, *min, *max]);
        }
        (ValueSpec::Int8s { default, min, max }, KvfValue::Int8s(cur)) => {
            out.extend([*cur as u8, *default as u8, *min as u8, *max as u8]);
        }
        (ValueSpec::Int16u { default, min, max }, KvfValue::Int16u(cur)) => {
            out.extend(cur.to_le_bytes());
            out.extend(default.to_le_bytes());
            out.extend(min.to_le_bytes());
            out.extend(max.to_le_bytes());
        }
        (ValueSpec::Int16s { default, min, max }, KvfValue::Int16s(cur)) => {
            out.extend(cur.to_le_bytes());
            out.extend(default.to_le_bytes());
            out.extend(min.to_le_bytes());
            out.extend(max.to_le_bytes());
        }
        (ValueSpec::Int32u { default, min, max }, KvfValue::Int32u(cur)) => {
            out.extend(cur.to_le_bytes());
            out.extend(default.to_le_bytes());
            out.extend(min.to_le_bytes());
            out.extend(max.to_le_bytes());
        }
        (ValueSpec::Int32s { default, min, max }, KvfValue::Int32s(cur)) => {
            out.extend(cur.to_le_bytes());
            out.extend(default.to_le_bytes());
            out.extend(min.to_le_bytes());
            out.extend(max.to_le_bytes());
        }
        (ValueSpec::Fp32 { default, min, max }, KvfValue::Fp32(cur)) => {
            out.extend(cur.to_bits().to_le_bytes());
            out.extend(default.to_bits().to_le_bytes());
            out.extend(min.to_bits().to_le_bytes());
            out.extend(max.to_bits().to_le_bytes());
        }
        (ValueSpec::Str { default }, KvfValue::Str(cur)) => {
            encode_padded_string(out, cur);
            encode_padded_string(out, default);
        }
        (ValueSpec::Enum { default, items }, KvfValue::Enum(cur)) => {
            out.extend(cur.to_le_bytes());
            out.extend(default.to_le_bytes());
            out.push(items.len() as u8);
            for item in items.iter() {
                out.push(item.name.len() as u8);
                out.extend(item.name.as_bytes());
                out.extend(item.value.to_le_bytes());
            }
        }
        _ => panic!("current value type does not match schema entry type"),
    }
}

/// Decodes one entry from a cursor positioned at its size prefix.
pub fn decode_entry(cursor: &mut Cursor) -> Result<DecodedEntry, ErrorCode> {
    let size = cursor.u16()? as usize;
    if cursor.remaining() < size {
        return Err(ErrorCode::FILESYSTEM);
    }
    let body = cursor.bytes(size)?;
    let mut body_cursor = Cursor::new(body);

    let key_crc = body_cursor.u16()?;
    let key_len = body_cursor.u8()? as usize;
    let key = body_cursor.string(key_len)?;
    let desc_len = body_cursor.u8()? as usize;
    let description = body_cursor.string(desc_len)?;
    let var_type =
        var_type_from_tag(body_cursor.u8()?).ok_or(ErrorCode::KEYTYPEDOESNOTMATCH)?;

    let (current, default, min, max, enum_items) = decode_payload(&mut body_cursor, var_type)?;

    Ok(DecodedEntry {
        key_crc,
        key,
        description,
        var_type,
        current,
        default,
        min,
        max,
        enum_items,
    })
}

#[allow(clippy::type_complexity)]
fn decode_payload(
    cursor: &mut Cursor,
    var_type: VarType,
) -> Result<
    (
        KvfValue,
        KvfValue,
        Option<KvfValue>,
        Option<KvfValue>,
        Vec<(String, u32)>,
    ),
    ErrorCode,
> {
    Ok(match var_type {
        VarType::Bool => {
            let current = cursor.u8()? != 0;
            let default = cursor.u8()? != 0;
            (
                KvfValue::Bool(current),
                KvfValue::Bool(default),
                None,
                None,
                Vec::new(),
            )
        }
        VarType::Int8u => {
            let current = cursor.u8()?;
            let default = cursor.u8()?;
            let min = cursor.u8()?;
            let max = cursor.u8()?;
            (
                KvfValue::Int8u(current),
                KvfValue::Int8u(default),
                Some(KvfValue::Int8u(min)),
                Some(KvfValue::Int8u(max)),
                Vec::new(),
            )
        }
        VarType::Int8s => {
            let current = cursor.u8()? as i8;
            let default = cursor.u8()? as i8;
            let min = cursor.u8()? as i8;
            let max = cursor.u8()? as i8;
            (
                KvfValue::Int8s(current),
                KvfValue::Int8s(default),
                Some(KvfValue::Int8s(min)),
                Some(KvfValue::Int8s(max)),
                Vec::new(),
            )
        }
        VarType::Int16u => {
            let current = cursor.u16()?;
            let default = cursor.u16()?;
            let min = cursor.u16()?;
            let max = cursor.u16()?;
            (
                KvfValue::Int16u(current),
                KvfValue::Int16u(default),
                Some(KvfValue::Int16u(min)),
                Some(KvfValue::Int16u(max)),
                Vec::new(),
            )
        }
        VarType::Int16s => {
            let current = cursor.u16()? as i16;
            let default = cursor.u16()? as i16;
            let min = cursor.u16()? as i16;
            let max = cursor.u16()? as i16;
            (
                KvfValue::Int16s(current),
                KvfValue::Int16s(default),
                Some(KvfValue::Int16s(min)),
                Some(KvfValue::Int16s(max)),
                Vec::new(),
            )
        }
        VarType::Int32u => {
            let current = cursor.u32()?;
            let default = cursor.u32()?;
            let min = cursor.u32()?;
            let max = cursor.u32()?;
            (
                KvfValue::Int32u(current),
                KvfValue::Int32u(default),
                Some(KvfValue::Int32u(min)),
                Some(KvfValue::Int32u(max)),
                Vec::new(),
            )
        }
        VarType::Int32s => {
            let current = cursor.u32()? as i32;
            let default = cursor.u32()? as i32;
            let min = cursor.u32()? as i32;
            let max = cursor.u32()? as i32;
            (
                KvfValue::Int32s(current),
                KvfValue::Int32s(default),
                Some(KvfValue::Int32s(min)),
                Some(KvfValue::Int32s(max)),
                Vec::new(),
            )
        }
        VarType::Fp32 => {
            let current = f32::from_bits(cursor.u32()?);
            let default = f32::from_bits(cursor.u32()?);
            let min = f32::from_bits(cursor.u32()?);
            let max = f32::from_bits(cursor.u32()?);
            (
                KvfValue::Fp32(current),
                KvfValue::Fp32(default),
                Some(KvfValue::Fp32(min)),
                Some(KvfValue::Fp32(max)),
                Vec::new(),
            )
        }
        VarType::Str => {
            let current = cursor.string(STRING_VALUE_LEN)?;
            let default = cursor.string(STRING_VALUE_LEN)?;
            (
                KvfValue::Str(trim_nul(&current)),
                KvfValue::Str(trim_nul(&default)),
                None,
                None,
                Vec::new(),
            )
        }
        VarType::Enum => {
            let current = cursor.u32()?;
            let default = cursor.u32()?;
            let n_items = cursor.u8()? as usize;
            let mut items = Vec::with_capacity(n_items);
            for _ in 0..n_items {
                let name_len = cursor.u8()? as usize;
                let name = cursor.string(name_len)?;
                let value = cursor.u32()?;
                items.push((name, value));
            }
            (
                KvfValue::Enum(current),
                KvfValue::Enum(default),
                None,
                None,
                items,
            )
        }
    })
}

fn trim_nul(s: &str) -> String {
    s.split('\0').next().unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EnumItem;

    #[test]
    fn header_round_trips() {
        let encoded = encode_header("ver1");
        let mut cursor = Cursor::new(&encoded);
        let header = decode_header(&mut cursor).unwrap();
        assert_eq!(header.description, "ver1");
    }

    #[test]
    fn int16u_entry_round_trips() {
        let entry = SchemaEntry {
            key: "speed_limit",
            description: "max speed",
            value: ValueSpec::Int16u {
                default: 100,
                min: 0,
                max: 500,
            },
        };
        let encoded = encode_entry(&entry, &KvfValue::Int16u(250));
        let mut cursor = Cursor::new(&encoded);
        let decoded = decode_entry(&mut cursor).unwrap();
        assert_eq!(decoded.key, "speed_limit");
        assert_eq!(decoded.current, KvfValue::Int16u(250));
        assert_eq!(decoded.default, KvfValue::Int16u(100));
        assert_eq!(decoded.min, Some(KvfValue::Int16u(0)));
        assert_eq!(decoded.max, Some(KvfValue::Int16u(500)));
    }

    #[test]
    fn string_entry_round_trips_and_trims_padding() {
        let entry = SchemaEntry {
            key: "label",
            description: "device label",
            value: ValueSpec::Str { default: "handle" },
        };
        let encoded = encode_entry(&entry, &KvfValue::Str("clamshell".to_string()));
        let mut cursor = Cursor::new(&encoded);
        let decoded = decode_entry(&mut cursor).unwrap();
        assert_eq!(decoded.current, KvfValue::Str("clamshell".to_string()));
        assert_eq!(decoded.default, KvfValue::Str("handle".to_string()));
    }

    #[test]
    fn enum_entry_round_trips_its_item_table() {
        static ITEMS: [EnumItem; 2] = [
            EnumItem { name: "standard", value: 0 },
            EnumItem { name: "overdrive", value: 1 },
        ];
        let entry = SchemaEntry {
            key: "speed_mode",
            description: "bus speed",
            value: ValueSpec::Enum {
                default: 0,
                items: &ITEMS,
            },
        };
        let encoded = encode_entry(&entry, &KvfValue::Enum(1));
        let mut cursor = Cursor::new(&encoded);
        let decoded = decode_entry(&mut cursor).unwrap();
        assert_eq!(decoded.current, KvfValue::Enum(1));
        assert_eq!(
            decoded.enum_items,
            vec![("standard".to_string(), 0), ("overdrive".to_string(), 1)]
        );
    }

    #[test]
    fn size_prefix_lets_a_reader_skip_an_unknown_entry() {
        let entry = SchemaEntry {
            key: "k",
            description: "d",
            value: ValueSpec::Bool { default: true },
        };
        let mut buf = encode_entry(&entry, &KvfValue::Bool(false));
        buf.extend(encode_entry(&entry, &KvfValue::Bool(true)));
        let mut cursor = Cursor::new(&buf);
        let _ = decode_entry(&mut cursor).unwrap();
        let second = decode_entry(&mut cursor).unwrap();
        assert_eq!(second.current, KvfValue::Bool(true));
    }
}
