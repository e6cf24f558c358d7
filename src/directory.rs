use core::fmt;
use std::{collections::BTreeMap, num::NonZeroU32};

use crate::{
    decoder::ifd::Entry,
    tags::Tag,
};

/// An Image File Directory (IFD).
///
/// Directories form a forest: the root chain is linked through each
/// directory's next-offset word, and any entry tagged [`Tag::SubIfds`] points
/// at further chains of arbitrary depth.
#[doc(alias = "IFD")]
#[derive(Clone)]
pub struct Directory {
    /// There are at most `u16::MAX` entries in any single directory, the count
    /// is stored as a 2-byte value. Duplicate tags are not expected within one
    /// directory; the last occurrence wins if they appear anyway.
    pub(crate) entries: BTreeMap<u16, Entry>,
    pub(crate) next_ifd: Option<NonZeroU32>,
}

impl Directory {
    /// Retrieve the entry associated with a tag.
    pub fn get(&self, tag: Tag) -> Option<&Entry> {
        self.entries.get(&tag.to_u16())
    }

    /// Check if the directory contains a specified tag.
    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.contains_key(&tag.to_u16())
    }

    /// Iterate over all known and unknown tags in this directory.
    pub fn iter(&self) -> impl Iterator<Item = (Tag, &Entry)> + '_ {
        self.entries
            .iter()
            .map(|(k, v)| (Tag::from_u16_exhaustive(*k), v))
    }

    /// Number of entries in the directory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the offset of the next IFD, if the chain continues.
    pub fn next(&self) -> Option<u32> {
        self.next_ifd.map(NonZeroU32::get)
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field(
                "entries",
                &self.entries.iter().map(|(k, v)| (Tag::from_u16(*k), v)),
            )
            .field("next_ifd", &self.next_ifd)
            .finish()
    }
}
