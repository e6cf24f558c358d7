//! Types for decoding directory entries

use std::io::{Read, Seek};

use super::stream::EndianReader;
use super::Limits;
use crate::tags::Type;
use crate::{FormatError, RawError, RawResult, UnsupportedError};

use self::Value::{
    Ascii, Byte, Double, Float, List, Rational, SRational, Short, Signed, SignedByte, SignedShort,
    Undefined, Unsigned,
};

/// A decoded entry payload.
///
/// Scalar entries decode to the matching single variant, entries with a count
/// above one decode to a `List`. The typed `into_*` accessors convert with a
/// `FormatError` on mismatch, never silently.
#[allow(unused_qualifications)]
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    Byte(u8),
    SignedByte(i8),
    Short(u16),
    SignedShort(i16),
    Unsigned(u32),
    Signed(i32),
    Float(f32),
    Double(f64),
    Rational(u32, u32),
    SRational(i32, i32),
    Ascii(String),
    Undefined(u8),
    List(Vec<Value>),
}

impl Value {
    pub fn into_u16(self) -> RawResult<u16> {
        match self {
            Byte(val) => Ok(val.into()),
            Short(val) => Ok(val),
            Unsigned(val) => Ok(u16::try_from(val)?),
            val => Err(RawError::FormatError(
                FormatError::UnsignedIntegerExpected(val),
            )),
        }
    }

    pub fn into_u32(self) -> RawResult<u32> {
        match self {
            Byte(val) => Ok(val.into()),
            Short(val) => Ok(val.into()),
            Unsigned(val) => Ok(val),
            val => Err(RawError::FormatError(
                FormatError::UnsignedIntegerExpected(val),
            )),
        }
    }

    pub fn into_i32(self) -> RawResult<i32> {
        match self {
            SignedByte(val) => Ok(val.into()),
            SignedShort(val) => Ok(val.into()),
            Signed(val) => Ok(val),
            val => Err(RawError::FormatError(
                FormatError::SignedIntegerExpected(val),
            )),
        }
    }

    pub fn into_f64(self) -> RawResult<f64> {
        match self {
            Byte(val) => Ok(val.into()),
            SignedByte(val) => Ok(val.into()),
            Short(val) => Ok(val.into()),
            SignedShort(val) => Ok(val.into()),
            Unsigned(val) => Ok(val.into()),
            Signed(val) => Ok(val.into()),
            Float(val) => Ok(val.into()),
            Double(val) => Ok(val),
            Rational(num, den) => Ok(num as f64 / den as f64),
            SRational(num, den) => Ok(num as f64 / den as f64),
            val => Err(RawError::FormatError(
                FormatError::UnsignedIntegerExpected(val),
            )),
        }
    }

    pub fn into_string(self) -> RawResult<String> {
        match self {
            Ascii(val) => Ok(val),
            val => Err(RawError::FormatError(FormatError::AsciiExpected(val))),
        }
    }

    pub fn into_u8_vec(self) -> RawResult<Vec<u8>> {
        match self {
            List(vec) => {
                let mut new_vec = Vec::with_capacity(vec.len());
                for v in vec {
                    match v {
                        Byte(val) => new_vec.push(val),
                        Undefined(val) => new_vec.push(val),
                        val => {
                            return Err(RawError::FormatError(
                                FormatError::UnsignedIntegerExpected(val),
                            ))
                        }
                    }
                }
                Ok(new_vec)
            }
            Byte(val) => Ok(vec![val]),
            Undefined(val) => Ok(vec![val]),
            val => Err(RawError::FormatError(
                FormatError::UnsignedIntegerExpected(val),
            )),
        }
    }

    pub fn into_u16_vec(self) -> RawResult<Vec<u16>> {
        match self {
            List(vec) => {
                let mut new_vec = Vec::with_capacity(vec.len());
                for v in vec {
                    new_vec.push(v.into_u16()?)
                }
                Ok(new_vec)
            }
            val => Ok(vec![val.into_u16()?]),
        }
    }

    pub fn into_u32_vec(self) -> RawResult<Vec<u32>> {
        match self {
            List(vec) => {
                let mut new_vec = Vec::with_capacity(vec.len());
                for v in vec {
                    new_vec.push(v.into_u32()?)
                }
                Ok(new_vec)
            }
            val => Ok(vec![val.into_u32()?]),
        }
    }

    pub fn into_f64_vec(self) -> RawResult<Vec<f64>> {
        match self {
            List(vec) => {
                let mut new_vec = Vec::with_capacity(vec.len());
                for v in vec {
                    new_vec.push(v.into_f64()?)
                }
                Ok(new_vec)
            }
            val => Ok(vec![val.into_f64()?]),
        }
    }

    /// Numerator and denominator pairs in declared order.
    pub fn into_rational_vec(self) -> RawResult<Vec<(u32, u32)>> {
        match self {
            List(vec) => {
                let mut new_vec = Vec::with_capacity(vec.len());
                for v in vec {
                    match v {
                        Rational(num, den) => new_vec.push((num, den)),
                        val => {
                            return Err(RawError::FormatError(FormatError::RationalExpected(val)))
                        }
                    }
                }
                Ok(new_vec)
            }
            Rational(num, den) => Ok(vec![(num, den)]),
            val => Err(RawError::FormatError(FormatError::RationalExpected(val))),
        }
    }

    pub fn into_srational_vec(self) -> RawResult<Vec<(i32, i32)>> {
        match self {
            List(vec) => {
                let mut new_vec = Vec::with_capacity(vec.len());
                for v in vec {
                    match v {
                        SRational(num, den) => new_vec.push((num, den)),
                        val => {
                            return Err(RawError::FormatError(FormatError::RationalExpected(val)))
                        }
                    }
                }
                Ok(new_vec)
            }
            SRational(num, den) => Ok(vec![(num, den)]),
            val => Err(RawError::FormatError(FormatError::RationalExpected(val))),
        }
    }
}

/// A single directory entry.
///
/// The entry does not hold its payload; it records the declared element type,
/// the element count and the absolute file offset at which the payload bytes
/// reside. For entries whose payload fits into the four-byte value slot of the
/// directory record, `offset` is the position of that slot itself, so a typed
/// read is uniform over inline and indirect storage: seeking to `offset` and
/// reading `count * type_.size()` bytes always yields the payload.
#[derive(Clone)]
pub struct Entry {
    type_: Type,
    count: u32,
    offset: u64,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        fmt.write_str(&format!(
            "Entry {{ type_: {:?}, count: {:?}, offset: {:?} }}",
            self.type_, self.count, self.offset
        ))
    }
}

impl Entry {
    pub fn new(type_: Type, count: u32, offset: u64) -> Entry {
        Entry {
            type_,
            count,
            offset,
        }
    }

    /// The declared element type.
    pub fn kind(&self) -> Type {
        self.type_
    }

    /// The declared element count.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Absolute file offset of the payload bytes.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether the payload occupies the entry's own value slot.
    pub fn is_inline(&self) -> bool {
        self.type_.size() * u64::from(self.count) <= 4
    }

    /// Decodes the payload against the container byte order.
    ///
    /// Seeks to the recorded payload offset, so the reader position after the
    /// call is unspecified.
    pub fn val<R: Read + Seek>(
        &self,
        limits: &Limits,
        reader: &mut EndianReader<R>,
    ) -> RawResult<Value> {
        let count = usize::try_from(self.count)?;
        if count
            .checked_mul(usize::try_from(self.type_.size())?)
            .map_or(true, |size| size > limits.ifd_value_size)
        {
            return Err(RawError::LimitsExceeded);
        }

        reader.goto_offset(self.offset)?;

        if self.type_ == Type::ASCII {
            let mut out = vec![0; count];
            reader.read_exact(&mut out)?;
            // Strings are null-terminated, so we trim anything downstream of
            // the null byte
            if let Some(first) = out.iter().position(|&b| b == 0) {
                out.truncate(first);
            }
            return Ok(Ascii(String::from_utf8(out)?));
        }

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_element(reader)?);
        }

        if values.len() == 1 {
            Ok(values.remove(0))
        } else {
            Ok(List(values))
        }
    }

    fn read_element<R: Read + Seek>(&self, reader: &mut EndianReader<R>) -> RawResult<Value> {
        Ok(match self.type_ {
            Type::BYTE => Byte(reader.read_u8()?),
            Type::SBYTE => SignedByte(reader.read_i8()?),
            Type::UNDEFINED => Undefined(reader.read_u8()?),
            Type::SHORT => Short(reader.read_u16()?),
            Type::SSHORT => SignedShort(reader.read_i16()?),
            Type::LONG => Unsigned(reader.read_u32()?),
            Type::SLONG => Signed(reader.read_i32()?),
            Type::FLOAT => Float(reader.read_f32()?),
            Type::DOUBLE => Double(reader.read_f64()?),
            Type::RATIONAL => Rational(reader.read_u32()?, reader.read_u32()?),
            Type::SRATIONAL => SRational(reader.read_i32()?, reader.read_i32()?),
            Type::ASCII => {
                return Err(RawError::UnsupportedError(
                    UnsupportedError::UnsupportedDataType,
                ))
            }
        })
    }
}
