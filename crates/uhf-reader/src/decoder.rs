//! Raw frame decoding.
//!
//! Turns one [`RawFrame`] from the module buffer into a [`TagReading`], or
//! rejects it. Decoding is pure: no I/O, no shared state, no panics.

use thiserror::Error;
use uhf_core::TagReading;
use uhf_core::constants::RSSI_HEX_LEN;
use uhf_hardware::RawFrame;

/// Why a frame produced no reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("frame has no EPC")]
    MissingEpc,
}

/// Decode a raw frame into a tag reading.
///
/// The EPC is mandatory; the TID is kept only when present and non-empty;
/// a missing or malformed RSSI decodes as 0.
///
/// # Examples
///
/// ```
/// use uhf_hardware::RawFrame;
/// use uhf_reader::decoder::{Rejection, decode};
///
/// let reading = decode(&RawFrame::new("e2801160").with_rssi("C820")).unwrap();
/// assert_eq!(reading.epc, "E2801160");
/// assert_eq!(reading.rssi, -1430);
///
/// assert_eq!(decode(&RawFrame::new("  ")), Err(Rejection::MissingEpc));
/// ```
pub fn decode(frame: &RawFrame) -> Result<TagReading, Rejection> {
    let epc = frame
        .epc
        .as_deref()
        .map(str::trim)
        .filter(|epc| !epc.is_empty())
        .ok_or(Rejection::MissingEpc)?;

    let reading =
        TagReading::new(epc, parse_rssi(frame.rssi.as_deref())).map_err(|_| Rejection::MissingEpc)?;

    Ok(match frame.tid.as_deref() {
        Some(tid) => reading.with_tid(tid),
        None => reading,
    })
}

/// Convert the vendor's four-hex-digit RSSI field into signal strength.
///
/// The first two characters are the high byte, the next two the low byte.
/// Each pair is parsed as a signed hex integer, so `"+8"` reads as 8 and
/// `"-8"` as -8. Anything shorter than four characters, or a pair that does
/// not parse, yields 0. Truncating integer division.
///
/// ```
/// use uhf_reader::decoder::parse_rssi;
///
/// assert_eq!(parse_rssi(Some("C820")), -1430);
/// assert_eq!(parse_rssi(Some("C8")), 0);
/// assert_eq!(parse_rssi(None), 0);
/// ```
pub fn parse_rssi(field: Option<&str>) -> i32 {
    let Some(field) = field else {
        return 0;
    };
    if field.len() < RSSI_HEX_LEN {
        return 0;
    }

    match (hex_byte(field.get(0..2)), hex_byte(field.get(2..4))) {
        (Some(hb), Some(lb)) => ((hb - 256 + 1) * 256 + (lb - 256)) / 10,
        _ => 0,
    }
}

fn hex_byte(digits: Option<&str>) -> Option<i32> {
    i32::from_str_radix(digits?, 16).ok()
}
