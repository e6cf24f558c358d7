//! In-memory TIFF synthesis for the decoder tests.
//!
//! Payloads larger than the four-byte value slot are appended before the
//! directory that references them; the header's root offset is patched in
//! `finish`, so directories can be emitted in any order.

#![allow(dead_code)]

pub const BYTE: u16 = 1;
pub const ASCII: u16 = 2;
pub const SHORT: u16 = 3;
pub const LONG: u16 = 4;
pub const RATIONAL: u16 = 5;
pub const SRATIONAL: u16 = 10;
pub const DOUBLE: u16 = 12;

pub struct RawEntry {
    tag: u16,
    type_: u16,
    count: u32,
    slot: [u8; 4],
}

pub struct TiffBuilder {
    big_endian: bool,
    bytes: Vec<u8>,
}

impl TiffBuilder {
    pub fn new(big_endian: bool) -> Self {
        let mut builder = TiffBuilder {
            big_endian,
            bytes: Vec::new(),
        };
        builder
            .bytes
            .extend_from_slice(if big_endian { b"MM" } else { b"II" });
        builder.push_u16(42);
        builder.push_u32(0); // root directory offset, patched by finish()
        builder
    }

    pub fn offset(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// Appends raw bytes and returns their offset.
    pub fn blob(&mut self, data: &[u8]) -> u32 {
        let offset = self.offset();
        self.bytes.extend_from_slice(data);
        offset
    }

    pub fn byte_entry(&mut self, tag: u16, values: &[u8]) -> RawEntry {
        let count = values.len() as u32;
        if count <= 4 {
            let mut slot = [0u8; 4];
            slot[..values.len()].copy_from_slice(values);
            RawEntry { tag, type_: BYTE, count, slot }
        } else {
            let offset = self.offset();
            self.bytes.extend_from_slice(values);
            self.entry_at(tag, BYTE, count, offset)
        }
    }

    pub fn ascii_entry(&mut self, tag: u16, text: &str) -> RawEntry {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        let count = data.len() as u32;
        if count <= 4 {
            let mut slot = [0u8; 4];
            slot[..data.len()].copy_from_slice(&data);
            RawEntry { tag, type_: ASCII, count, slot }
        } else {
            let offset = self.offset();
            self.bytes.extend_from_slice(&data);
            self.entry_at(tag, ASCII, count, offset)
        }
    }

    pub fn short_entry(&mut self, tag: u16, values: &[u16]) -> RawEntry {
        let count = values.len() as u32;
        if count * 2 <= 4 {
            let mut slot = [0u8; 4];
            for (i, v) in values.iter().enumerate() {
                slot[i * 2..i * 2 + 2].copy_from_slice(&self.endian_u16(*v));
            }
            RawEntry { tag, type_: SHORT, count, slot }
        } else {
            let offset = self.offset();
            for v in values {
                self.push_u16(*v);
            }
            self.entry_at(tag, SHORT, count, offset)
        }
    }

    pub fn long_entry(&mut self, tag: u16, values: &[u32]) -> RawEntry {
        let count = values.len() as u32;
        if count <= 1 {
            let mut slot = [0u8; 4];
            if let Some(v) = values.first() {
                slot.copy_from_slice(&self.endian_u32(*v));
            }
            RawEntry { tag, type_: LONG, count, slot }
        } else {
            let offset = self.offset();
            for v in values {
                self.push_u32(*v);
            }
            self.entry_at(tag, LONG, count, offset)
        }
    }

    pub fn rational_entry(&mut self, tag: u16, values: &[(u32, u32)]) -> RawEntry {
        let offset = self.offset();
        for (num, den) in values {
            self.push_u32(*num);
            self.push_u32(*den);
        }
        self.entry_at(tag, RATIONAL, values.len() as u32, offset)
    }

    pub fn srational_entry(&mut self, tag: u16, values: &[(i32, i32)]) -> RawEntry {
        let offset = self.offset();
        for (num, den) in values {
            self.push_u32(*num as u32);
            self.push_u32(*den as u32);
        }
        self.entry_at(tag, SRATIONAL, values.len() as u32, offset)
    }

    pub fn double_entry(&mut self, tag: u16, values: &[f64]) -> RawEntry {
        let offset = self.offset();
        for v in values {
            let bits = v.to_bits();
            let bytes = if self.big_endian {
                bits.to_be_bytes()
            } else {
                bits.to_le_bytes()
            };
            self.bytes.extend_from_slice(&bytes);
        }
        self.entry_at(tag, DOUBLE, values.len() as u32, offset)
    }

    /// Writes a directory from its entries, returning its offset. `next` is
    /// the offset of the next directory in the chain, zero for the end.
    pub fn ifd(&mut self, mut entries: Vec<RawEntry>, next: u32) -> u32 {
        entries.sort_by_key(|e| e.tag);
        let offset = self.offset();
        self.push_u16(entries.len() as u16);
        for entry in entries {
            self.push_u16(entry.tag);
            self.push_u16(entry.type_);
            self.push_u32(entry.count);
            self.bytes.extend_from_slice(&entry.slot);
        }
        self.push_u32(next);
        offset
    }

    pub fn finish(mut self, root: u32) -> Vec<u8> {
        let patched = self.endian_u32(root);
        self.bytes[4..8].copy_from_slice(&patched);
        self.bytes
    }

    fn entry_at(&self, tag: u16, type_: u16, count: u32, offset: u32) -> RawEntry {
        RawEntry {
            tag,
            type_,
            count,
            slot: self.endian_u32(offset),
        }
    }

    fn endian_u16(&self, v: u16) -> [u8; 2] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn endian_u32(&self, v: u32) -> [u8; 4] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn push_u16(&mut self, v: u16) {
        let bytes = self.endian_u16(v);
        self.bytes.extend_from_slice(&bytes);
    }

    fn push_u32(&mut self, v: u32) {
        let bytes = self.endian_u32(v);
        self.bytes.extend_from_slice(&bytes);
    }
}
