//! Decoding of raw digital negatives
//!
//! DNG (Digital Negative) is Adobe's raw camera format layered atop TIFF
//! (Tag Image File Format). This crate parses the tagged container, extracts
//! uncompressed sensor rasters, and derives the color transform that carries
//! camera-native sensor values into the ProPhoto RGB working space under a
//! D50 white point.
//!
//! # Related Links
//! * <https://web.archive.org/web/20210108073850/https://www.adobe.io/open/standards/TIFF.html> - The TIFF specification
//! * <https://helpx.adobe.com/camera-raw/digital-negative.html> - The DNG specification
//!
//! # Overview
//!
//! [`decoder::Decoder`] parses the container and exposes the directory
//! forest; [`dng::DngFrame`] projects a directory onto the typed DNG fields;
//! [`color`] holds the color science, ending in
//! [`color::pipeline::matrix_camera_to_prophoto`].

pub mod color;
pub mod decoder;
mod directory;
pub mod dng;
mod error;
pub mod tags;

pub use self::directory::Directory;
pub use self::error::{FormatError, RawError, RawResult, UnsupportedError};
