//! Data exchanged with the vendor library.

use serde::{Deserialize, Serialize};
use uhf_core::ModuleType;
use uhf_core::constants::{DEFAULT_BAUD_RATE, HIGH_BAUD_RATE};

/// One unparsed tag record from the module's buffer.
///
/// The vendor returns positional strings: `[tid, epc, rssi]`. Any of them
/// may be missing or empty; interpretation belongs to the frame decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFrame {
    /// TID hex string, when the read mode includes it.
    pub tid: Option<String>,

    /// EPC hex string.
    pub epc: Option<String>,

    /// Signal strength as four hex digits (high byte, low byte).
    pub rssi: Option<String>,
}

impl RawFrame {
    /// Frame with only an EPC.
    pub fn new(epc: impl Into<String>) -> Self {
        Self {
            epc: Some(epc.into()),
            ..Self::default()
        }
    }

    pub fn with_tid(mut self, tid: impl Into<String>) -> Self {
        self.tid = Some(tid.into());
        self
    }

    pub fn with_rssi(mut self, rssi: impl Into<String>) -> Self {
        self.rssi = Some(rssi.into());
        self
    }

    /// Build a frame from the vendor's positional array.
    ///
    /// Arrays with fewer than two entries carry no EPC slot and yield `None`.
    ///
    /// ```
    /// use uhf_hardware::RawFrame;
    ///
    /// let frame = RawFrame::from_fields(vec![None, Some("E200".into()), Some("C820".into())]).unwrap();
    /// assert_eq!(frame.epc.as_deref(), Some("E200"));
    /// assert!(RawFrame::from_fields(vec![Some("E200".into())]).is_none());
    /// ```
    pub fn from_fields(fields: Vec<Option<String>>) -> Option<Self> {
        if fields.len() < 2 {
            return None;
        }
        let mut fields = fields.into_iter();
        Some(Self {
            tid: fields.next().flatten(),
            epc: fields.next().flatten(),
            rssi: fields.next().flatten(),
        })
    }
}

/// Parameters handed to a [`ModuleFactory`](crate::traits::ModuleFactory)
/// when a handle is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub module_type: ModuleType,

    /// Serial link speed in bits per second.
    pub baud_rate: u32,
}

impl ModuleConfig {
    pub fn new(module_type: ModuleType, high_baud: bool) -> Self {
        Self {
            module_type,
            baud_rate: if high_baud {
                HIGH_BAUD_RATE
            } else {
                DEFAULT_BAUD_RATE
            },
        }
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self::new(ModuleType::default(), false)
    }
}
