//! Header-only FITS access for SkySift
//!
//! This crate reads the keyword records of a FITS primary header and exposes
//! them as a typed key/value map. It deliberately stops at the header: pixel
//! data, scaling, and structural validation of the data unit are out of its
//! scope. That makes it cheap enough to run over every file in a night's
//! acquisition tree.

mod header;

pub use header::{
    read_header, read_header_from, FitsError, FitsHeader, FitsValue, KeywordError, BLOCK_SIZE,
    CARDS_PER_BLOCK, CARD_SIZE,
};

/// Conventional header keywords written by acquisition software.
pub mod keywords {
    /// Primary HDU conformity flag
    pub const SIMPLE: &str = "SIMPLE";
    /// Extension type (alternative leading keyword)
    pub const XTENSION: &str = "XTENSION";
    /// Bits per pixel
    pub const BITPIX: &str = "BITPIX";
    /// Number of data axes
    pub const NAXIS: &str = "NAXIS";
    /// Exposure duration in seconds
    pub const EXPTIME: &str = "EXPTIME";
    /// Frame type label (vendor free text)
    pub const IMAGETYP: &str = "IMAGETYP";
    /// Observation timestamp
    pub const DATE_OBS: &str = "DATE-OBS";
    /// Target name
    pub const OBJECT: &str = "OBJECT";
    /// Filter name
    pub const FILTER: &str = "FILTER";
    /// Camera or instrument name
    pub const INSTRUME: &str = "INSTRUME";
    /// Telescope name
    pub const TELESCOP: &str = "TELESCOP";
    /// Sensor temperature in degrees C
    pub const CCD_TEMP: &str = "CCD-TEMP";
    /// Horizontal binning factor
    pub const XBINNING: &str = "XBINNING";
    /// Vertical binning factor
    pub const YBINNING: &str = "YBINNING";
}
