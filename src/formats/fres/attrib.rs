//! Vertex attribute formats.
//!
//! A format code is `(layout << 8) | kind`. The layout gives the component
//! width and count; the kind says how to interpret the bits.
//!
//! | Layout | Components  | Layout | Components |
//! |--------|-------------|--------|------------|
//! | 0x02   | 8           | 0x14   | 32         |
//! | 0x09   | 8_8         | 0x17   | 32_32      |
//! | 0x0B   | 8_8_8_8     | 0x18   | 32_32_32   |
//! | 0x0A   | 16          | 0x19   | 32_32_32_32|
//! | 0x12   | 16_16       | 0x0E   | 10_10_10_2 |
//! | 0x15   | 16_16_16_16 |        |            |
//!
//! Kinds: 1 UNorm, 2 SNorm, 3 UInt, 4 SInt, 5 Float, 7 UInt as float,
//! 8 SInt as float.

use std::fmt;

use half::f16;

use crate::reader::{ByteOrder, Primitive};

/// Storage type of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F16,
    F32,
    /// Four components packed into one 32-bit word.
    Packed1010102,
}

impl Component {
    pub fn size(self) -> usize {
        match self {
            Component::U8 | Component::I8 => 1,
            Component::U16 | Component::I16 | Component::F16 => 2,
            Component::U32 | Component::I32 | Component::F32 | Component::Packed1010102 => 4,
        }
    }
}

/// How raw components become values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Keep the stored integers or floats.
    None,
    /// Divide by the type's maximum, giving 0.0..=1.0.
    UnitFloat,
    /// Divide by the type's maximum and clamp to -1.0..=1.0.
    SignedUnitFloat,
    /// Cast the integer to float.
    ToFloat,
    UnpackSnorm1010102,
    UnpackUnorm1010102,
}

/// A known attribute format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribFormat {
    pub code: u32,
    pub component: Component,
    pub arity: usize,
    pub conversion: Conversion,
}

impl AttribFormat {
    /// Look up a format code. `None` if the code is not in the table.
    pub fn from_code(code: u32) -> Option<Self> {
        if code > 0xFFFF {
            return None;
        }
        let layout = code >> 8;
        let kind = code & 0xFF;

        if layout == 0x0E {
            let conversion = match kind {
                1 => Conversion::UnpackUnorm1010102,
                2 => Conversion::UnpackSnorm1010102,
                _ => return None,
            };
            return Some(Self {
                code,
                component: Component::Packed1010102,
                arity: 4,
                conversion,
            });
        }

        let (bits, arity) = match layout {
            0x02 => (8, 1),
            0x09 => (8, 2),
            0x0B => (8, 4),
            0x0A => (16, 1),
            0x12 => (16, 2),
            0x15 => (16, 4),
            0x14 => (32, 1),
            0x17 => (32, 2),
            0x18 => (32, 3),
            0x19 => (32, 4),
            _ => return None,
        };
        use Component as C;
        use Conversion as V;
        let (component, conversion) = match (bits, kind) {
            (8, 1) => (C::U8, V::UnitFloat),
            (8, 2) => (C::I8, V::SignedUnitFloat),
            (8, 3) => (C::U8, V::None),
            (8, 4) => (C::I8, V::None),
            (8, 7) => (C::U8, V::ToFloat),
            (8, 8) => (C::I8, V::ToFloat),
            (16, 1) => (C::U16, V::UnitFloat),
            (16, 2) => (C::I16, V::SignedUnitFloat),
            (16, 3) => (C::U16, V::None),
            (16, 4) => (C::I16, V::None),
            (16, 5) => (C::F16, V::None),
            (16, 7) => (C::U16, V::ToFloat),
            (16, 8) => (C::I16, V::ToFloat),
            (32, 3) => (C::U32, V::None),
            (32, 4) => (C::I32, V::None),
            (32, 5) => (C::F32, V::None),
            (32, 7) => (C::U32, V::ToFloat),
            (32, 8) => (C::I32, V::ToFloat),
            _ => return None,
        };
        Some(Self {
            code,
            component,
            arity,
            conversion,
        })
    }

    /// Bytes one value occupies in its buffer.
    pub fn size(&self) -> usize {
        match self.component {
            Component::Packed1010102 => 4,
            c => c.size() * self.arity,
        }
    }

    /// Decode one value from exactly [`AttribFormat::size`] bytes.
    pub fn unpack(&self, bytes: &[u8], order: ByteOrder) -> AttribValue {
        match self.conversion {
            Conversion::UnpackUnorm1010102 => {
                let w = u32::from_bytes(bytes, order);
                let f = |shift: u32, bits: u32| {
                    let max = (1u32 << bits) - 1;
                    ((w >> shift) & max) as f32 / max as f32
                };
                AttribValue::Float(vec![f(0, 10), f(10, 10), f(20, 10), f(30, 2)])
            }
            Conversion::UnpackSnorm1010102 => {
                let w = u32::from_bytes(bytes, order);
                let f = |shift: u32, bits: u32| {
                    let raw = ((w >> shift) & ((1 << bits) - 1)) as i32;
                    // sign-extend the field
                    let v = (raw << (32 - bits)) >> (32 - bits);
                    let max = ((1i32 << (bits - 1)) - 1).max(1);
                    (v as f32 / max as f32).max(-1.0)
                };
                AttribValue::Float(vec![f(0, 10), f(10, 10), f(20, 10), f(30, 2)])
            }
            Conversion::None => self.raw(bytes, order),
            Conversion::ToFloat => AttribValue::Float(self.raw(bytes, order).as_f32()),
            Conversion::UnitFloat | Conversion::SignedUnitFloat => {
                let max = match self.component {
                    Component::U8 => u8::MAX as f32,
                    Component::I8 => i8::MAX as f32,
                    Component::U16 => u16::MAX as f32,
                    Component::I16 => i16::MAX as f32,
                    Component::U32 => u32::MAX as f32,
                    _ => i32::MAX as f32,
                };
                let signed = self.conversion == Conversion::SignedUnitFloat;
                let vals = self
                    .raw(bytes, order)
                    .as_f32()
                    .into_iter()
                    .map(|v| {
                        let v = v / max;
                        if signed { v.max(-1.0) } else { v }
                    })
                    .collect();
                AttribValue::Float(vals)
            }
        }
    }

    fn raw(&self, bytes: &[u8], order: ByteOrder) -> AttribValue {
        let size = self.component.size();
        let parts = bytes.chunks_exact(size).take(self.arity);
        match self.component {
            Component::U8 => AttribValue::UInt(parts.map(|b| b[0] as u32).collect()),
            Component::I8 => AttribValue::SInt(parts.map(|b| b[0] as i8 as i32).collect()),
            Component::U16 => {
                AttribValue::UInt(parts.map(|b| u16::from_bytes(b, order) as u32).collect())
            }
            Component::I16 => {
                AttribValue::SInt(parts.map(|b| i16::from_bytes(b, order) as i32).collect())
            }
            Component::U32 | Component::Packed1010102 => {
                AttribValue::UInt(parts.map(|b| u32::from_bytes(b, order)).collect())
            }
            Component::I32 => AttribValue::SInt(parts.map(|b| i32::from_bytes(b, order)).collect()),
            Component::F16 => AttribValue::Float(
                parts
                    .map(|b| f16::from_bits(u16::from_bytes(b, order)).to_f32())
                    .collect(),
            ),
            Component::F32 => AttribValue::Float(parts.map(|b| f32::from_bytes(b, order)).collect()),
        }
    }
}

impl fmt::Display for AttribFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = match self.component {
            Component::Packed1010102 => return write!(f, "10_10_10_2 {:?}", self.conversion),
            c => c.size() * 8,
        };
        let layout = vec![width.to_string(); self.arity].join("_");
        write!(f, "{layout} {:?} {:?}", self.component, self.conversion)
    }
}

/// One decoded attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttribValue {
    Float(Vec<f32>),
    UInt(Vec<u32>),
    SInt(Vec<i32>),
}

impl AttribValue {
    pub fn len(&self) -> usize {
        match self {
            AttribValue::Float(v) => v.len(),
            AttribValue::UInt(v) => v.len(),
            AttribValue::SInt(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Components as floats, casting integers.
    pub fn as_f32(&self) -> Vec<f32> {
        match self {
            AttribValue::Float(v) => v.clone(),
            AttribValue::UInt(v) => v.iter().map(|x| *x as f32).collect(),
            AttribValue::SInt(v) => v.iter().map(|x| *x as f32).collect(),
        }
    }
}
