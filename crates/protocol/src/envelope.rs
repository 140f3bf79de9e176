use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{CODE_LOGIN_OK, CODE_OK};

/// Response envelope shared by every JSON endpoint.
///
/// `data` is kept as a raw value so each caller decodes only the shape it
/// expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default = "missing_code")]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

fn missing_code() -> i32 {
    -1
}

impl Envelope {
    /// Whether the server reported success.
    ///
    /// Sign-in and sign-out answer `200`; everything else answers `0`.
    pub fn is_success(&self) -> bool {
        self.code == CODE_OK || self.code == CODE_LOGIN_OK
    }

    /// Decodes `data` into `T`. A missing `data` field decodes as JSON `null`.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.data {
            Some(v) => T::deserialize(v),
            None => T::deserialize(serde_json::Value::Null),
        }
    }
}
