macro_rules! tags {
    {
        // Permit arbitrary meta items, which include documentation.
        $( #[$enum_attr:meta] )*
        $vis:vis enum $name:ident($ty:tt) $(unknown(#[$unknown_meta:meta] $unknown_doc:ident))* {
            // Each of the `Name = Val,` permitting documentation.
            $($(#[$ident_attr:meta])* $tag:ident = $val:expr,)*
        }
    } => {
        $( #[$enum_attr] )*
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
        #[non_exhaustive]
        pub enum $name {
            $($(#[$ident_attr])* $tag,)*
            $(
                #[$unknown_meta]
                Unknown($ty),
            )*
        }

        impl $name {
            #[inline(always)]
            fn __from_inner_type(n: $ty) -> Result<Self, $ty> {
                match n {
                    $( $val => Ok($name::$tag), )*
                    n => Err(n),
                }
            }

            #[inline(always)]
            fn __to_inner_type(&self) -> $ty {
                match *self {
                    $( $name::$tag => $val, )*
                    $( $name::Unknown($unknown_doc) => { $unknown_doc }, )*
                }
            }
        }

        tags!($name, $ty, $($unknown_doc)*);
    };
    // For u16 tags, provide direct inherent primitive conversion methods.
    ($name:tt, u16, $($unknown_doc:ident)*) => {
        impl $name {
            #[inline(always)]
            pub fn from_u16(val: u16) -> Option<Self> {
                Self::__from_inner_type(val).ok()
            }

            $(
            #[inline(always)]
            pub fn from_u16_exhaustive($unknown_doc: u16) -> Self {
                Self::__from_inner_type($unknown_doc).unwrap_or_else(|_| $name::Unknown($unknown_doc))
            }
            )*

            #[inline(always)]
            pub fn to_u16(&self) -> u16 {
                Self::__to_inner_type(self)
            }
        }
    };
    // For other tag types, do nothing for now. With concat_idents one could
    // provide inherent conversion methods for all types.
    ($name:tt, $ty:tt, $($unknown_doc:literal)*) => {};
}

// Note: the baseline and TIFF-EP tags appear in the order they are mentioned
// in the TIFF reference; the DNG tags follow the DNG 1.4 specification order.
tags! {
/// TIFF and DNG tags
pub enum Tag(u16) unknown(
    /// A private or extension tag
    unknown
) {
    // Baseline tags:
    NewSubfileType = 254,
    ImageWidth = 256,
    ImageLength = 257,
    BitsPerSample = 258,
    Compression = 259,
    PhotometricInterpretation = 262,
    FillOrder = 266,
    StripOffsets = 273,
    SamplesPerPixel = 277,
    RowsPerStrip = 278,
    StripByteCounts = 279,
    PlanarConfiguration = 284,
    // Advanced tags
    TileWidth = 322,
    TileLength = 323,
    TileOffsets = 324,
    TileByteCounts = 325,
    SubIfds = 0x14A,
    // TIFF-EP
    CfaRepeatPatternDim = 0x828D,
    CfaPattern = 0x828E,
    // DNG 1.4
    DngVersion = 0xC612,
    DngBackwardVersion = 0xC613,
    UniqueCameraModel = 0xC614,
    LocalizedCameraModel = 0xC615,
    CfaPlaneColor = 0xC616,
    CfaLayout = 0xC617,
    LinearizationTable = 0xC618,
    BlackLevelRepeatDim = 0xC619,
    BlackLevel = 0xC61A,
    BlackLevelDeltaH = 0xC61B,
    BlackLevelDeltaV = 0xC61C,
    WhiteLevel = 0xC61D,
    DefaultScale = 0xC61E,
    DefaultCropOrigin = 0xC61F,
    DefaultCropSize = 0xC620,
    ColorMatrix1 = 0xC621,
    ColorMatrix2 = 0xC622,
    CameraCalibration1 = 0xC623,
    CameraCalibration2 = 0xC624,
    ReductionMatrix1 = 0xC625,
    ReductionMatrix2 = 0xC626,
    AnalogBalance = 0xC627,
    AsShotNeutral = 0xC628,
    AsShotWhiteXy = 0xC629,
    BaselineExposure = 0xC62A,
    BaselineNoise = 0xC62B,
    BaselineSharpness = 0xC62C,
    BayerGreenSplit = 0xC62D,
    LinearResponseLimit = 0xC62E,
    CameraSerialNumber = 0xC62F,
    LensInfo = 0xC630,
    ChromaBlurRadius = 0xC631,
    AntiAliasStrength = 0xC632,
    ShadowScale = 0xC633,
    DngPrivateData = 0xC634,
    MakerNoteSafety = 0xC635,
    CalibrationIlluminant1 = 0xC65A,
    CalibrationIlluminant2 = 0xC65B,
    BestQualityScale = 0xC65C,
    RawDataUniqueId = 0xC65D,
    OriginalRawFileName = 0xC68B,
    OriginalRawFileData = 0xC68C,
    ActiveArea = 0xC68D,
    MaskedAreas = 0xC68E,
    AsShotIccProfile = 0xC68F,
    AsShotPreProfileMatrix = 0xC690,
    CurrentIccProfile = 0xC691,
    CurrentPreProfileMatrix = 0xC692,
    ColorimetricReference = 0xC6BF,
    CameraCalibrationSignature = 0xC6F3,
    ProfileCalibrationSignature = 0xC6F4,
    ExtraCameraProfiles = 0xC6F5,
    AsShotProfileName = 0xC6F6,
    NoiseReductionApplied = 0xC6F7,
    ProfileName = 0xC6F8,
    ProfileHueSatMapDims = 0xC6F9,
    ProfileHueSatMapData1 = 0xC6FA,
    ProfileHueSatMapData2 = 0xC6FB,
    ProfileToneCurve = 0xC6FC,
    ProfileEmbedPolicy = 0xC6FD,
    ProfileCopyright = 0xC6FE,
    ForwardMatrix1 = 0xC714,
    ForwardMatrix2 = 0xC715,
    PreviewApplicationName = 0xC716,
    PreviewApplicationVersion = 0xC717,
    PreviewSettingsName = 0xC718,
    PreviewSettingsDigest = 0xC719,
    PreviewColorSpace = 0xC71A,
    PreviewDateTime = 0xC71B,
    RawImageDigest = 0xC71C,
    OriginalRawFileDigest = 0xC71D,
    SubTileBlockSize = 0xC71E,
    RowInterleaveFactor = 0xC71F,
    ProfileLookTableDims = 0xC725,
    ProfileLookTableData = 0xC726,
    OpcodeList1 = 0xC740,
    OpcodeList2 = 0xC741,
    OpcodeList3 = 0xC74E,
    NoiseProfile = 0xC761,
}
}

tags! {
/// The type of an IFD entry (a 2 byte field).
pub enum Type(u16) {
    /// 8-bit unsigned integer
    BYTE = 1,
    /// 8-bit byte that contains a 7-bit ASCII code; the last byte must be zero
    ASCII = 2,
    /// 16-bit unsigned integer
    SHORT = 3,
    /// 32-bit unsigned integer
    LONG = 4,
    /// Fraction stored as two 32-bit unsigned integers
    RATIONAL = 5,
    /// 8-bit signed integer
    SBYTE = 6,
    /// 8-bit byte that may contain anything, depending on the field
    UNDEFINED = 7,
    /// 16-bit signed integer
    SSHORT = 8,
    /// 32-bit signed integer
    SLONG = 9,
    /// Fraction stored as two 32-bit signed integers
    SRATIONAL = 10,
    /// 32-bit IEEE floating point
    FLOAT = 11,
    /// 64-bit IEEE floating point
    DOUBLE = 12,
}
}

impl Type {
    /// Byte size of a single element of this type.
    pub fn size(&self) -> u64 {
        match *self {
            Type::BYTE | Type::ASCII | Type::SBYTE | Type::UNDEFINED => 1,
            Type::SHORT | Type::SSHORT => 2,
            Type::LONG | Type::SLONG | Type::FLOAT => 4,
            Type::RATIONAL | Type::SRATIONAL | Type::DOUBLE => 8,
        }
    }
}

tags! {
/// See [TIFF compression tags](https://www.awaresystems.be/imaging/tiff/tifftags/compression.html)
/// for reference. Only `None` is readable; the others are recognized so that
/// the unsupported-compression error can name them.
pub enum CompressionMethod(u16) unknown(
    /// A custom compression method
    unknown
) {
    None = 1,
    Huffman = 2,
    LZW = 5,
    JPEG = 6,
    // "Extended JPEG" or "new JPEG" style; DNG lossless JPEG uses this code.
    ModernJPEG = 7,
    Deflate = 8,
    PackBits = 0x8005,
    // DNG 1.4 lossy JPEG
    LossyJPEG = 34892,
}
}

tags! {
pub enum PhotometricInterpretation(u16) {
    WhiteIsZero = 0,
    BlackIsZero = 1,
    RGB = 2,
    RGBPalette = 3,
    TransparencyMask = 4,
    // DNG / TIFF-EP raw sensor data
    CFA = 32803,
    LinearRaw = 34892,
}
}

tags! {
pub enum PlanarConfiguration(u16) {
    Chunky = 1,
    Planar = 2,
}
}

tags! {
/// Bit ordering within a byte for sample widths that are not multiples of
/// eight. `LsbFirst` is only honored for 8, 16 and 32 bit samples; all other
/// widths unpack most significant bit first.
pub enum FillOrder(u16) {
    MsbFirst = 1,
    LsbFirst = 2,
}
}
