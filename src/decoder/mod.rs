//! TIFF container decoding
//!
//! The decoder parses the image file header and the root directory chain
//! eagerly; entries carry offsets only, and every typed read re-seeks into the
//! underlying stream. A caller may therefore parse once, keep the directories
//! around and come back for pixel data later, provided the backing bytes stay
//! identical.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::io::{Read, Seek};
use std::num::NonZeroU32;

use crate::tags::{Tag, Type};
use crate::{Directory, FormatError, RawError, RawResult};

use self::ifd::{Entry, Value};

pub mod ifd;
mod image;
mod stream;

pub use self::image::{ImageLayout, Raster, RasterData};
pub use self::stream::{ByteOrder, EndianReader};

/// Decoding limits
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Limits {
    /// The maximum size of any decoded pixel buffer in bytes, the default is
    /// 256MiB.
    pub decoding_buffer_size: usize,
    /// The maximum size of any ifd value in bytes, the default is 1MiB.
    pub ifd_value_size: usize,
    /// Maximum nesting depth when recursing through sub-IFD trees, the
    /// default is 32.
    pub sub_ifd_depth: usize,
}

impl Limits {
    /// A configuration that does not impose any limits.
    ///
    /// This is a good start if the caller only wants to impose selective
    /// limits, contrary to the default limits which allows selectively
    /// disabling limits.
    pub fn unlimited() -> Limits {
        Limits {
            decoding_buffer_size: usize::MAX,
            ifd_value_size: usize::MAX,
            sub_ifd_depth: usize::MAX,
        }
    }
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            decoding_buffer_size: 256 * 1024 * 1024,
            ifd_value_size: 1024 * 1024,
            sub_ifd_depth: 32,
        }
    }
}

/// The representation of a TIFF container decoder
///
/// Parses the header and the root IFD chain at construction. The raw frame of
/// a DNG is usually not the first directory of the chain but a sub-IFD; use
/// [`Decoder::find_by_subfile_type`] with value `0` to locate it.
#[derive(Debug)]
pub struct Decoder<R>
where
    R: Read + Seek,
{
    /// Grouped so that methods can borrow the stream access mutably while the
    /// parsed directories stay borrowed elsewhere.
    value_reader: ValueReader<R>,
    directories: Vec<Directory>,
}

/// All the information needed to read and interpret byte slices from the
/// underlying file, i.e. to turn an entry of a tag into an [`ifd::Value`] or
/// otherwise fetch arrays of similar types.
#[derive(Debug)]
pub(crate) struct ValueReader<R> {
    reader: EndianReader<R>,
    limits: Limits,
}

impl<R: Read + Seek> ValueReader<R> {
    pub(crate) fn entry_value(&mut self, entry: &Entry) -> RawResult<Value> {
        entry.val(&self.limits, &mut self.reader)
    }

    pub(crate) fn limits(&self) -> &Limits {
        &self.limits
    }

    pub(crate) fn reader(&mut self) -> &mut EndianReader<R> {
        &mut self.reader
    }

    /// Read a tag-entry map from a known offset.
    ///
    /// A directory is encoded as a 2-byte entry count, that many 12-byte
    /// entries and a 4-byte offset of the next directory in the chain, all in
    /// container byte order. Entries with an unrecognized data type are
    /// skipped so a single exotic tag does not poison the whole directory.
    fn read_directory(&mut self, offset: u32) -> RawResult<Directory> {
        self.reader.goto_offset(offset.into())?;
        let num_tags = self.reader.read_u16()?;
        let mut entries = BTreeMap::new();
        for _ in 0..num_tags {
            let tag = self.reader.read_u16()?;
            let type_ = self.reader.read_u16()?;
            let count = self.reader.read_u32()?;
            let value_slot = self.reader.position()?;
            let value_offset = self.reader.read_u32()?;

            let type_ = match Type::from_u16(type_) {
                Some(type_) => type_,
                None => {
                    log::warn!("tag {:#06x}: skipping unknown entry type {}", tag, type_);
                    continue;
                }
            };

            // An entry whose payload fits into four bytes stores it in the
            // value slot itself; record the slot position so later typed
            // reads are uniform over inline and indirect payloads.
            let offset = if type_.size() * u64::from(count) <= 4 {
                value_slot
            } else {
                u64::from(value_offset)
            };
            entries.insert(tag, Entry::new(type_, count, offset));
        }
        let next_ifd = NonZeroU32::new(self.reader.read_u32()?);
        Ok(Directory { entries, next_ifd })
    }

    /// Walks a directory chain starting at `offset` until a zero next-offset.
    fn read_directory_chain(&mut self, offset: u32) -> RawResult<Vec<Directory>> {
        let mut seen = HashSet::new();
        let mut chain = Vec::new();
        let mut offset = offset;
        while offset != 0 {
            if !seen.insert(offset) {
                return Err(RawError::FormatError(FormatError::CycleInOffsets));
            }
            let dir = self.read_directory(offset)?;
            offset = dir.next().unwrap_or(0);
            chain.push(dir);
        }
        Ok(chain)
    }
}

impl<R: Read + Seek> Decoder<R> {
    pub fn new(mut r: R) -> RawResult<Decoder<R>> {
        let mut signature = [0u8; 2];
        r.read_exact(&mut signature)?;
        let byte_order = match &signature {
            b"II" => ByteOrder::LittleEndian,
            b"MM" => ByteOrder::BigEndian,
            _ => {
                return Err(RawError::FormatError(FormatError::SignatureNotFound));
            }
        };
        let mut reader = EndianReader::new(r, byte_order);

        // A permissive parse: files in the wild carry version words other
        // than 42, which still decode fine.
        let version = reader.read_u16()?;
        if version != 42 {
            log::warn!("expected TIFF version 42, found {}", version);
        }

        let root_offset = reader.read_u32()?;

        let mut value_reader = ValueReader {
            reader,
            limits: Default::default(),
        };
        let directories = value_reader.read_directory_chain(root_offset)?;
        if directories.is_empty() {
            return Err(RawError::FormatError(FormatError::DirectoryNotFound));
        }

        Ok(Decoder {
            value_reader,
            directories,
        })
    }

    pub fn with_limits(mut self, limits: Limits) -> Decoder<R> {
        self.value_reader.limits = limits;
        self
    }

    /// Returns the byte order of the file.
    pub fn byte_order(&self) -> ByteOrder {
        self.value_reader.reader.byte_order
    }

    /// The root directory chain, in file order.
    pub fn directories(&self) -> &[Directory] {
        &self.directories
    }

    /// Returns a mutable reference to the stream being decoded.
    pub fn inner(&mut self) -> &mut R {
        self.value_reader.reader.inner()
    }

    /// Decodes the payload of an entry of `dir`, if the tag is present.
    pub fn get_tag(&mut self, dir: &Directory, tag: Tag) -> RawResult<Option<Value>> {
        match dir.get(tag) {
            Some(entry) => Ok(Some(self.value_reader.entry_value(entry)?)),
            None => Ok(None),
        }
    }

    /// Decodes the payload of a required entry of `dir`.
    pub fn require_tag(&mut self, dir: &Directory, tag: Tag) -> RawResult<Value> {
        self.get_tag(dir, tag)?
            .ok_or_else(|| RawError::FormatError(FormatError::RequiredTagNotFound(tag)))
    }

    /// The directory chains referenced by the [`Tag::SubIfds`] entry of `dir`.
    ///
    /// Each element of the entry's LONG payload is the offset of one chain.
    pub fn sub_directories(&mut self, dir: &Directory) -> RawResult<Vec<Directory>> {
        let offsets = match self.get_tag(dir, Tag::SubIfds)? {
            Some(value) => value.into_u32_vec()?,
            None => return Ok(Vec::new()),
        };
        let mut subs = Vec::new();
        for offset in offsets {
            subs.extend(self.value_reader.read_directory_chain(offset)?);
        }
        Ok(subs)
    }

    /// Depth-first search over the directory forest for the first directory
    /// whose [`Tag::NewSubfileType`] equals `value`.
    ///
    /// The raw frame of a DNG is conventionally found with `value == 0`.
    /// Recursion depth is capped by [`Limits::sub_ifd_depth`] so a malformed
    /// file cannot loop a sub-IFD back at an ancestor unboundedly.
    pub fn find_by_subfile_type(&mut self, value: u32) -> RawResult<Option<Directory>> {
        let roots = self.directories.clone();
        for dir in &roots {
            if let Some(found) = self.find_in_tree(dir, value, 0)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn find_in_tree(
        &mut self,
        dir: &Directory,
        value: u32,
        depth: usize,
    ) -> RawResult<Option<Directory>> {
        if depth >= self.value_reader.limits.sub_ifd_depth {
            return Err(RawError::LimitsExceeded);
        }
        if let Some(subfile_type) = self.get_tag(dir, Tag::NewSubfileType)? {
            if subfile_type.into_u32()? == value {
                return Ok(Some(dir.clone()));
            }
        }
        for sub in self.sub_directories(dir)? {
            if let Some(found) = self.find_in_tree(&sub, value, depth + 1)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Resolves the pixel storage geometry of `dir`.
    pub fn image_layout(&mut self, dir: &Directory) -> RawResult<ImageLayout> {
        ImageLayout::from_directory(self, dir)
    }

    /// Reads the uncompressed pixel raster described by `dir`.
    ///
    /// Returns the realized buffer dimensions together with the samples; see
    /// [`Raster`] for the padding and plane layout rules.
    pub fn read_image(&mut self, dir: &Directory) -> RawResult<Raster> {
        let layout = self.image_layout(dir)?;
        image::read_raster(&mut self.value_reader, &layout)
    }
}
