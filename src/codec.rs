//! Declarative fixed-layout record decoding.
//!
//! A [`StructCodec`] is an ordered list of [`Field`]s whose total width is
//! computed at compile time. Decoding a codec at an offset yields a
//! [`Record`]: the field values in declaration order, addressable by name.
//!
//! ```text
//! static HEADER: StructCodec = StructCodec::new("_STR", &[
//!     Field::new("magic", FieldKind::Magic(b"_STR")),
//!     Field::pad(4),
//!     Field::new("size", FieldKind::U32),
//!     ...
//! ]);
//! ```
//!
//! Offset-typed fields ([`FieldKind::Offset32`], [`FieldKind::Offset64`])
//! are returned as-is for the caller to follow. String-offset fields are
//! resolved immediately: the string lives elsewhere in the buffer and is
//! decoded as Shift-JIS.

use crate::reader::ByteReader;
use crate::{Error, Result};

/// Symbolic flag names and their masks.
pub type FlagTable = &'static [(&'static str, u32)];

/// The type of one field in a fixed-layout record.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    F32,
    /// Fixed bytes that must match exactly.
    Magic(&'static [u8]),
    /// Raw fixed-length byte string.
    Bytes(usize),
    /// Skipped bytes.
    Pad(usize),
    /// 32-bit offset of another structure, resolved by the caller.
    Offset32,
    /// 64-bit offset of another structure, resolved by the caller.
    Offset64,
    /// 32-bit offset of a null-terminated string.
    CStr32,
    /// 64-bit offset of a `u16`-length-prefixed string (0 = no string).
    Str64,
    /// 32-bit flag word matched against a name table.
    Flags32(FlagTable),
    /// `n` consecutive values of the inner kind.
    Repeat(&'static FieldKind, usize),
    /// An embedded record.
    Nested(&'static StructCodec),
}

impl FieldKind {
    /// Byte width of this field.
    pub const fn width(&self) -> usize {
        match self {
            FieldKind::U8 | FieldKind::I8 => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U32
            | FieldKind::I32
            | FieldKind::F32
            | FieldKind::Offset32
            | FieldKind::CStr32
            | FieldKind::Flags32(_) => 4,
            FieldKind::U64 | FieldKind::Offset64 | FieldKind::Str64 => 8,
            FieldKind::Magic(m) => m.len(),
            FieldKind::Bytes(n) | FieldKind::Pad(n) => *n,
            FieldKind::Repeat(inner, n) => inner.width() * *n,
            FieldKind::Nested(codec) => codec.size,
        }
    }
}

/// One named field.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }

    /// Anonymous padding.
    pub const fn pad(n: usize) -> Self {
        Self {
            name: "",
            kind: FieldKind::Pad(n),
        }
    }
}

/// A decoded flag word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSet {
    pub raw: u32,
    /// Names whose full mask is set in `raw`, in table order.
    pub names: Vec<&'static str>,
}

impl FlagSet {
    pub fn decode(raw: u32, table: FlagTable) -> Self {
        let names = table
            .iter()
            .filter(|(_, mask)| *mask != 0 && raw & mask == *mask)
            .map(|(name, _)| *name)
            .collect();
        Self { raw, names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name)
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    UInt(u64),
    SInt(i64),
    Float(f32),
    Bytes(Vec<u8>),
    Offset(u64),
    Text(String),
    Flags(FlagSet),
    List(Vec<Value>),
    Record(Record),
}

/// A fixed-layout record description with a precomputed size.
#[derive(Debug)]
pub struct StructCodec {
    pub name: &'static str,
    pub fields: &'static [Field],
    pub size: usize,
}

impl StructCodec {
    pub const fn new(name: &'static str, fields: &'static [Field]) -> Self {
        let mut size = 0;
        let mut i = 0;
        while i < fields.len() {
            size += fields[i].kind.width();
            i += 1;
        }
        Self { name, fields, size }
    }

    /// Decode one record starting at `offset`.
    pub fn decode(&'static self, r: &ByteReader<'_>, offset: u64) -> Result<Record> {
        // Bounds-check the whole record once so a truncated file reports the
        // record start rather than some field in the middle.
        r.bytes_at(offset, self.size)?;

        let mut values = Vec::with_capacity(self.fields.len());
        let mut pos = offset;
        for field in self.fields {
            let value = decode_kind(&field.kind, r, pos)?;
            pos += field.kind.width() as u64;
            if let Some(value) = value {
                values.push((field.name, value));
            }
        }
        Ok(Record {
            codec: self,
            offset,
            values,
        })
    }

    /// Decode `count` records laid out back to back from `offset`.
    pub fn decode_array(
        &'static self,
        r: &ByteReader<'_>,
        offset: u64,
        count: usize,
    ) -> Result<Vec<Record>> {
        (0..count)
            .map(|i| self.decode(r, offset + (i * self.size) as u64))
            .collect()
    }
}

fn decode_kind(kind: &FieldKind, r: &ByteReader<'_>, pos: u64) -> Result<Option<Value>> {
    let v = match kind {
        FieldKind::U8 => Value::UInt(r.read_at::<u8>(pos)? as u64),
        FieldKind::U16 => Value::UInt(r.read_at::<u16>(pos)? as u64),
        FieldKind::U32 => Value::UInt(r.read_at::<u32>(pos)? as u64),
        FieldKind::U64 => Value::UInt(r.read_at::<u64>(pos)?),
        FieldKind::I8 => Value::SInt(r.read_at::<i8>(pos)? as i64),
        FieldKind::I16 => Value::SInt(r.read_at::<i16>(pos)? as i64),
        FieldKind::I32 => Value::SInt(r.read_at::<i32>(pos)? as i64),
        FieldKind::F32 => Value::Float(r.read_at::<f32>(pos)?),
        FieldKind::Magic(expected) => {
            r.expect_magic(pos, expected)?;
            return Ok(None);
        }
        FieldKind::Bytes(n) => Value::Bytes(r.bytes_at(pos, *n)?.to_vec()),
        FieldKind::Pad(_) => return Ok(None),
        FieldKind::Offset32 => Value::Offset(r.read_at::<u32>(pos)? as u64),
        FieldKind::Offset64 => Value::Offset(r.read_at::<u64>(pos)?),
        FieldKind::CStr32 => {
            let at = r.read_at::<u32>(pos)? as u64;
            Value::Text(if at == 0 {
                String::new()
            } else {
                r.null_string_at(at)?
            })
        }
        FieldKind::Str64 => {
            let at = r.read_at::<u64>(pos)?;
            Value::Text(if at == 0 {
                String::new()
            } else {
                r.prefixed_string_at(at)?
            })
        }
        FieldKind::Flags32(table) => Value::Flags(FlagSet::decode(r.read_at::<u32>(pos)?, table)),
        FieldKind::Repeat(inner, n) => {
            let mut items = Vec::with_capacity(*n);
            let mut at = pos;
            for _ in 0..*n {
                if let Some(v) = decode_kind(inner, r, at)? {
                    items.push(v);
                }
                at += inner.width() as u64;
            }
            Value::List(items)
        }
        FieldKind::Nested(codec) => Value::Record(codec.decode(r, pos)?),
    };
    Ok(Some(v))
}

/// Decoded field values of one record, in declaration order.
#[derive(Debug, Clone)]
pub struct Record {
    codec: &'static StructCodec,
    /// Absolute offset the record was decoded from.
    pub offset: u64,
    values: Vec<(&'static str, Value)>,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.codec, other.codec)
            && self.offset == other.offset
            && self.values == other.values
    }
}

impl Record {
    pub fn codec(&self) -> &'static StructCodec {
        self.codec
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, v)| v)
    }

    /// Field names and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(n, v)| (*n, v))
    }

    fn missing(&self, field: &'static str) -> Error {
        Error::MissingField {
            codec: self.codec.name,
            field,
        }
    }

    pub fn uint(&self, field: &'static str) -> Result<u64> {
        match self.get(field) {
            Some(Value::UInt(v)) => Ok(*v),
            _ => Err(self.missing(field)),
        }
    }

    pub fn sint(&self, field: &'static str) -> Result<i64> {
        match self.get(field) {
            Some(Value::SInt(v)) => Ok(*v),
            _ => Err(self.missing(field)),
        }
    }

    pub fn float(&self, field: &'static str) -> Result<f32> {
        match self.get(field) {
            Some(Value::Float(v)) => Ok(*v),
            _ => Err(self.missing(field)),
        }
    }

    pub fn offset_of(&self, field: &'static str) -> Result<u64> {
        match self.get(field) {
            Some(Value::Offset(v)) => Ok(*v),
            _ => Err(self.missing(field)),
        }
    }

    pub fn text(&self, field: &'static str) -> Result<&str> {
        match self.get(field) {
            Some(Value::Text(v)) => Ok(v),
            _ => Err(self.missing(field)),
        }
    }

    pub fn bytes(&self, field: &'static str) -> Result<&[u8]> {
        match self.get(field) {
            Some(Value::Bytes(v)) => Ok(v),
            _ => Err(self.missing(field)),
        }
    }

    pub fn flags(&self, field: &'static str) -> Result<&FlagSet> {
        match self.get(field) {
            Some(Value::Flags(v)) => Ok(v),
            _ => Err(self.missing(field)),
        }
    }

    pub fn record(&self, field: &'static str) -> Result<&Record> {
        match self.get(field) {
            Some(Value::Record(v)) => Ok(v),
            _ => Err(self.missing(field)),
        }
    }

    pub fn list(&self, field: &'static str) -> Result<&[Value]> {
        match self.get(field) {
            Some(Value::List(v)) => Ok(v),
            _ => Err(self.missing(field)),
        }
    }

    /// A list of `N` floats.
    pub fn floats<const N: usize>(&self, field: &'static str) -> Result<[f32; N]> {
        let list = self.list(field)?;
        let mut out = [0f32; N];
        if list.len() != N {
            return Err(self.missing(field));
        }
        for (slot, v) in out.iter_mut().zip(list) {
            match v {
                Value::Float(f) => *slot = *f,
                _ => return Err(self.missing(field)),
            }
        }
        Ok(out)
    }
}
