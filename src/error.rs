use std::error::Error;
use std::fmt;
use std::io;
use std::str;
use std::string;

use crate::decoder::ifd::Value;
use crate::tags::Tag;

/// Raw decoding error kinds.
#[derive(Debug)]
pub enum RawError {
    /// The container is not formatted properly.
    FormatError(FormatError),

    /// The decoder does not support features required by the image.
    UnsupportedError(UnsupportedError),

    /// An I/O error occurred while decoding.
    IoError(io::Error),

    /// The limits of the decoder were exceeded.
    LimitsExceeded,

    /// An integer conversion to or from a platform size failed, either due to
    /// limits of the platform size or limits of the format.
    IntSizeError,
}

/// The container is not formatted properly.
///
/// This indicates that the encoder producing the file might behave incorrectly
/// or that the input has been corrupted.
///
/// The list of variants may grow to incorporate errors of future features.
/// Matching against this exhaustively is not covered by interface stability
/// guarantees.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FormatError {
    SignatureNotFound,
    DirectoryNotFound,
    InvalidTag,
    InvalidTagValueType(Tag),
    RequiredTagNotFound(Tag),
    RequiredTagEmpty(Tag),
    UnknownPlanarConfiguration(u16),
    UnknownFillOrder(u16),
    InconsistentSizesEncountered,
    UnsignedIntegerExpected(Value),
    SignedIntegerExpected(Value),
    AsciiExpected(Value),
    RationalExpected(Value),
    CycleInOffsets,
    SamplesPerPixelIsZero,
    /// A numeric step of the color pipeline could not be carried out, e.g.
    /// a singular color matrix or a non-converging white balance solve.
    NumericDomain(&'static str),
}

impl fmt::Display for FormatError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use self::FormatError::*;
        match *self {
            SignatureNotFound => write!(fmt, "TIFF signature not found."),
            DirectoryNotFound => write!(fmt, "Image file directory not found."),
            InvalidTag => write!(fmt, "Image contains invalid tag."),
            InvalidTagValueType(ref tag) => {
                write!(fmt, "Tag `{:?}` did not have the expected value type.", tag)
            }
            RequiredTagNotFound(ref tag) => write!(fmt, "Required tag `{:?}` not found.", tag),
            RequiredTagEmpty(ref tag) => write!(fmt, "Required tag `{:?}` was empty.", tag),
            UnknownPlanarConfiguration(config) => {
                write!(fmt, "Unknown planar configuration “{}” encountered", config)
            }
            UnknownFillOrder(order) => write!(fmt, "Unknown fill order “{}” encountered", order),
            InconsistentSizesEncountered => write!(fmt, "Inconsistent sizes encountered."),
            UnsignedIntegerExpected(ref val) => {
                write!(fmt, "Expected unsigned integer, {:?} found.", val)
            }
            SignedIntegerExpected(ref val) => {
                write!(fmt, "Expected signed integer, {:?} found.", val)
            }
            AsciiExpected(ref val) => write!(fmt, "Expected ascii sequence, {:?} found.", val),
            RationalExpected(ref val) => write!(fmt, "Expected rational, {:?} found.", val),
            CycleInOffsets => write!(fmt, "File contained a cycle in the list of IFDs"),
            SamplesPerPixelIsZero => write!(fmt, "Samples per pixel is zero"),
            NumericDomain(msg) => write!(fmt, "Numeric domain error: {}", msg),
        }
    }
}

/// The decoder does not support features required by the image.
///
/// This only captures known failures for which support is out of scope for
/// this crate. Entropy-coded pixel storage notably falls into this category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum UnsupportedError {
    /// The image stores its pixels compressed; only uncompressed storage
    /// (compression code 1) is readable. Recoverable: the caller may fall
    /// back to another decoder for the pixel data while still using the
    /// parsed metadata.
    UnsupportedCompression(u16),
    UnsupportedBitsPerSample(u16),
    UnsupportedDataType,
}

impl fmt::Display for UnsupportedError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use self::UnsupportedError::*;
        match *self {
            UnsupportedCompression(code) => {
                write!(fmt, "Compression method {} is unsupported", code)
            }
            UnsupportedBitsPerSample(bits) => {
                write!(fmt, "{} bits per sample not supported", bits)
            }
            UnsupportedDataType => write!(fmt, "Unsupported data type."),
        }
    }
}

impl fmt::Display for RawError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            RawError::FormatError(ref e) => write!(fmt, "Format error: {}", e),
            RawError::UnsupportedError(ref f) => write!(
                fmt,
                "The decoder does not support the \
                 image format `{}`",
                f
            ),
            RawError::IoError(ref e) => e.fmt(fmt),
            RawError::LimitsExceeded => write!(fmt, "The decoder limits are exceeded"),
            RawError::IntSizeError => write!(fmt, "Platform or format size limits exceeded"),
        }
    }
}

impl Error for RawError {
    fn cause(&self) -> Option<&dyn Error> {
        match *self {
            RawError::IoError(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RawError {
    fn from(err: io::Error) -> RawError {
        RawError::IoError(err)
    }
}

impl From<str::Utf8Error> for RawError {
    fn from(_err: str::Utf8Error) -> RawError {
        RawError::FormatError(FormatError::InvalidTag)
    }
}

impl From<string::FromUtf8Error> for RawError {
    fn from(_err: string::FromUtf8Error) -> RawError {
        RawError::FormatError(FormatError::InvalidTag)
    }
}

impl From<FormatError> for RawError {
    fn from(err: FormatError) -> RawError {
        RawError::FormatError(err)
    }
}

impl From<UnsupportedError> for RawError {
    fn from(err: UnsupportedError) -> RawError {
        RawError::UnsupportedError(err)
    }
}

impl From<std::num::TryFromIntError> for RawError {
    fn from(_err: std::num::TryFromIntError) -> RawError {
        RawError::IntSizeError
    }
}

/// Result of a decoding process
pub type RawResult<T> = Result<T, RawError>;
