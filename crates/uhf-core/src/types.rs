use crate::{Result, error::Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Supported UHF module families.
///
/// The family decides which vendor primitive configures the inventory mode;
/// see [`ModuleType::has_dedicated_inventory_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleType {
    Um,
    #[default]
    Slr,
    Gx,
}

impl ModuleType {
    /// Vendor identifier, e.g. `"SLR_MODULE"`.
    pub fn vendor_name(&self) -> &'static str {
        match self {
            Self::Um => "UM_MODULE",
            Self::Slr => "SLR_MODULE",
            Self::Gx => "GX_MODULE",
        }
    }

    /// Whether this family sets its inventory mode through its own primitive
    /// instead of the generic one.
    pub fn has_dedicated_inventory_mode(&self) -> bool {
        matches!(self, Self::Slr)
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vendor_name())
    }
}

impl std::str::FromStr for ModuleType {
    type Err = Error;

    /// Accepts vendor names (`SLR_MODULE`) and short names (`slr`), case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        let short = normalized.strip_suffix("_MODULE").unwrap_or(&normalized);
        match short {
            "UM" => Ok(Self::Um),
            "SLR" => Ok(Self::Slr),
            "GX" => Ok(Self::Gx),
            _ => Err(Error::UnknownModuleType(s.to_string())),
        }
    }
}

/// Power lifecycle of the reader module.
///
/// `Error` is terminal for the current handle; a new power-on starts from it
/// exactly as from `Off`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    #[default]
    Off,
    PoweringOn,
    On,
    PoweringOff,
    Error(String),
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::PoweringOn => write!(f, "PoweringOn"),
            Self::On => write!(f, "On"),
            Self::PoweringOff => write!(f, "PoweringOff"),
            Self::Error(reason) => write!(f, "Error({reason})"),
        }
    }
}

impl PowerState {
    /// Check if transition to target state is valid from this state.
    ///
    /// ```
    /// use uhf_core::PowerState;
    ///
    /// assert!(PowerState::Off.can_transition_to(&PowerState::PoweringOn));
    /// assert!(!PowerState::Off.can_transition_to(&PowerState::On));
    /// assert!(PowerState::On.can_transition_to(&PowerState::Error("lost".into())));
    /// ```
    pub fn can_transition_to(&self, target: &PowerState) -> bool {
        matches!(
            (self, target),
            (PowerState::Off | PowerState::Error(_), PowerState::PoweringOn)
                | (PowerState::PoweringOn, PowerState::On)
                | (PowerState::On, PowerState::PoweringOff)
                | (PowerState::PoweringOff, PowerState::Off)
                // Error clears to Off once nothing is left to release
                | (PowerState::Error(_), PowerState::Off)
                | (_, PowerState::Error(_))
        )
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }

    /// Off or Error: nothing powered, a fresh power-on is allowed.
    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off | Self::Error(_))
    }
}

/// Inventory session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Scanning,
    Stopping,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "Idle",
            Self::Starting => "Starting",
            Self::Scanning => "Scanning",
            Self::Stopping => "Stopping",
        };
        f.write_str(s)
    }
}

impl SessionState {
    /// Check if transition to target state is valid from this state.
    ///
    /// A failed start falls back from `Starting` straight to `Idle`.
    ///
    /// ```
    /// use uhf_core::SessionState;
    ///
    /// assert!(SessionState::Idle.can_transition_to(&SessionState::Starting));
    /// assert!(SessionState::Starting.can_transition_to(&SessionState::Idle));
    /// assert!(!SessionState::Idle.can_transition_to(&SessionState::Scanning));
    /// ```
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Idle, SessionState::Starting)
                | (
                    SessionState::Starting,
                    SessionState::Scanning | SessionState::Idle
                )
                | (SessionState::Scanning, SessionState::Stopping)
                | (SessionState::Stopping, SessionState::Idle)
        )
    }

    /// Any state other than `Idle` needs the module powered.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// A decoded tag observation.
///
/// The EPC is always present and non-empty; frames without one never
/// become a `TagReading`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReading {
    /// Electronic Product Code, upper-case hex.
    pub epc: String,

    /// Tag identifier, upper-case hex, when the read mode includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,

    /// Signal strength in the module's RSSI unit (usually negative).
    pub rssi: i32,

    /// Wall-clock time of decoding, serialized as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Monotonic time of decoding.
    ///
    /// Not serialized; set to the deserialization time when read back.
    #[serde(skip, default = "Instant::now")]
    pub observed_at: Instant,
}

impl TagReading {
    /// Create a reading stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if the EPC is empty.
    ///
    /// ```
    /// use uhf_core::TagReading;
    ///
    /// let reading = TagReading::new("e2801160", -60).unwrap();
    /// assert_eq!(reading.epc, "E2801160");
    /// assert!(TagReading::new("  ", -60).is_err());
    /// ```
    pub fn new(epc: &str, rssi: i32) -> Result<Self> {
        let epc = epc.trim();
        if epc.is_empty() {
            return Err(Error::InvalidArgument("EPC must not be empty".to_string()));
        }
        Ok(Self {
            epc: epc.to_ascii_uppercase(),
            tid: None,
            rssi,
            timestamp: Utc::now(),
            observed_at: Instant::now(),
        })
    }

    /// Attach a TID; blank values are ignored.
    pub fn with_tid(mut self, tid: &str) -> Self {
        let tid = tid.trim();
        self.tid = (!tid.is_empty()).then(|| tid.to_ascii_uppercase());
        self
    }

    /// EPC as bytes, if it is well-formed hex.
    pub fn epc_bytes(&self) -> Option<Vec<u8>> {
        hex_to_bytes(&self.epc)
    }

    /// TID as bytes, if present and well-formed hex.
    pub fn tid_bytes(&self) -> Option<Vec<u8>> {
        self.tid.as_deref().and_then(hex_to_bytes)
    }
}

fn hex_to_bytes(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}
