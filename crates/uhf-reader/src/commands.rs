//! Host command boundary.
//!
//! Hosts address the reader with a method name and a JSON argument object,
//! `{"method": "setPower", "args": {"level": 30}}`. [`Command`] is the typed
//! form of such a request; [`Command::execute`] runs it against a
//! [`UhfReader`] and yields a [`Reply`], or an error whose
//! [`code`](uhf_core::Error::code) the host reports.
//!
//! Argument names of older hosts are accepted as aliases (`power`,
//! `frequencyMode`, `sessionMode`, `wordCnt`, method `getModuleTemp`), and
//! missing integer arguments default to 0.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uhf_core::{Error, Result};
use uhf_hardware::ModuleFactory;

use crate::reader::UhfReader;

/// Method names understood by [`Command::parse`], aliases included.
pub const METHODS: &[&str] = &[
    "initialize",
    "powerOn",
    "powerOff",
    "startInventory",
    "stopInventory",
    "setPower",
    "getPower",
    "setFrequencyMode",
    "getFrequencyMode",
    "setSessionMode",
    "setInventoryMode",
    "setReadMode",
    "getHardwareVersion",
    "getFirmwareVersion",
    "getModuleTemperature",
    "getModuleTemp",
];

/// A typed host request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Initialize {
        #[serde(default)]
        module_type: Option<String>,
        #[serde(default)]
        high_baud: bool,
    },
    PowerOn,
    PowerOff,
    StartInventory {
        #[serde(default)]
        read_mode: i32,
    },
    StopInventory,
    SetPower {
        #[serde(default, alias = "power")]
        level: i32,
    },
    GetPower,
    SetFrequencyMode {
        #[serde(default, alias = "frequencyMode")]
        mode: i32,
    },
    GetFrequencyMode,
    SetSessionMode {
        #[serde(default, alias = "sessionMode")]
        mode: i32,
    },
    SetInventoryMode {
        #[serde(default)]
        mode: i32,
    },
    SetReadMode {
        #[serde(default)]
        mode: i32,
        #[serde(default)]
        start_addr: i32,
        #[serde(default, alias = "wordCnt")]
        word_count: i32,
    },
    GetHardwareVersion,
    GetFirmwareVersion,
    #[serde(alias = "getModuleTemp")]
    GetModuleTemperature,
}

/// Successful result of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Bool(bool),
    Int(i32),
    Text(String),
}

/// Failure as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReply {
    pub code: &'static str,
    pub message: String,
}

impl From<&Error> for ErrorReply {
    fn from(error: &Error) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

impl Command {
    /// Build a command from a method name and its argument object.
    ///
    /// `args` may be `null` for methods without arguments.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotImplemented` for an unknown method and
    /// `Error::InvalidArgument` if the arguments do not fit the method.
    ///
    /// ```
    /// use serde_json::json;
    /// use uhf_reader::commands::Command;
    ///
    /// let command = Command::parse("setPower", json!({"power": 30})).unwrap();
    /// assert_eq!(command, Command::SetPower { level: 30 });
    ///
    /// let err = Command::parse("reboot", json!(null)).unwrap_err();
    /// assert_eq!(err.code(), "NOT_IMPLEMENTED");
    /// ```
    pub fn parse(method: &str, args: Value) -> Result<Self> {
        if !METHODS.contains(&method) {
            return Err(Error::NotImplemented(method.to_string()));
        }

        let mut request = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "{method}: arguments must be an object, got {other}"
                )));
            }
        };
        request.insert("method".to_string(), Value::String(method.to_string()));

        serde_json::from_value(Value::Object(request))
            .map_err(|e| Error::InvalidArgument(format!("{method}: {e}")))
    }

    /// Build a command from a `{"method": ..., "args": {...}}` request.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse); a request without a method name is
    /// an `Error::InvalidArgument`.
    pub fn from_request(request: Value) -> Result<Self> {
        let Value::Object(mut request) = request else {
            return Err(Error::InvalidArgument("request must be an object".to_string()));
        };
        let method = match request.remove("method") {
            Some(Value::String(method)) => method,
            _ => return Err(Error::InvalidArgument("request has no method".to_string())),
        };
        let args = request.remove("args").unwrap_or(Value::Null);
        Self::parse(&method, args)
    }

    /// Canonical method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::PowerOn => "powerOn",
            Self::PowerOff => "powerOff",
            Self::StartInventory { .. } => "startInventory",
            Self::StopInventory => "stopInventory",
            Self::SetPower { .. } => "setPower",
            Self::GetPower => "getPower",
            Self::SetFrequencyMode { .. } => "setFrequencyMode",
            Self::GetFrequencyMode => "getFrequencyMode",
            Self::SetSessionMode { .. } => "setSessionMode",
            Self::SetInventoryMode { .. } => "setInventoryMode",
            Self::SetReadMode { .. } => "setReadMode",
            Self::GetHardwareVersion => "getHardwareVersion",
            Self::GetFirmwareVersion => "getFirmwareVersion",
            Self::GetModuleTemperature => "getModuleTemperature",
        }
    }

    /// Run the command against `reader`.
    pub async fn execute<F: ModuleFactory>(self, reader: &UhfReader<F>) -> Result<Reply> {
        debug!(method = self.method(), "Dispatching command");
        match self {
            Self::Initialize {
                module_type,
                high_baud,
            } => {
                reader.initialize(module_type.as_deref(), high_baud).await?;
                Ok(Reply::Bool(true))
            }
            Self::PowerOn => reader.power_on().await.map(Reply::Bool),
            Self::PowerOff => reader.power_off().await.map(Reply::Bool),
            Self::StartInventory { read_mode } => {
                reader.start_inventory(read_mode).await.map(Reply::Bool)
            }
            Self::StopInventory => reader.stop_inventory().await.map(Reply::Bool),
            Self::SetPower { level } => reader.set_power(level).await.map(Reply::Bool),
            Self::GetPower => reader.power().await.map(Reply::Int),
            Self::SetFrequencyMode { mode } => {
                reader.set_frequency_mode(mode).await.map(Reply::Bool)
            }
            Self::GetFrequencyMode => reader.frequency_mode().await.map(Reply::Int),
            Self::SetSessionMode { mode } => reader.set_session_mode(mode).await.map(Reply::Bool),
            Self::SetInventoryMode { mode } => {
                reader.set_inventory_mode(mode).await.map(Reply::Bool)
            }
            Self::SetReadMode {
                mode,
                start_addr,
                word_count,
            } => reader
                .set_read_mode(mode, start_addr, word_count)
                .await
                .map(Reply::Bool),
            Self::GetHardwareVersion => reader.hardware_version().await.map(Reply::Text),
            Self::GetFirmwareVersion => reader.firmware_version().await.map(Reply::Text),
            Self::GetModuleTemperature => reader.module_temperature().await.map(Reply::Text),
        }
    }
}
