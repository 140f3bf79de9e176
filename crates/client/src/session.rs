//! Session state: credentials, authorization and device identity.
//!
//! [`Session::headers`] is a pure function of this state, so there is no
//! cached header map to fall out of sync after sign-in or a protocol switch.

use std::fmt;
use std::str::FromStr;

use pan123_protocol::constants::API_BASE_URL;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Android device models the client can present as.
pub const DEVICE_TYPES: &[&str] = &[
    "24075RP89G", "24076RP19G", "24076RP19I", "M1805E10A", "M2004J11G",
    "M2012K11AG", "M2104K10I", "22021211RG", "22021211RI", "21121210G",
    "23049PCD8G", "23049PCD8I", "23013PC75G", "24069PC21G", "24069PC21I",
    "23113RKC6G", "M1912G7BI", "M2007J20CI", "M2007J20CG", "M2007J20CT",
    "M2102J20SG", "M2102J20SI", "21061110AG", "2201116PG", "2201116PI",
    "22041216G", "22041216UG", "22111317PG", "22111317PI", "22101320G",
    "22101320I", "23122PCD1G", "23122PCD1I", "2311DRK48G", "2311DRK48I",
    "2312FRAFDI", "M2004J19PI",
];

pub const OS_VERSIONS: &[&str] = &[
    "Android_7.1.2", "Android_8.0.0", "Android_8.1.0", "Android_9.0",
    "Android_10", "Android_11", "Android_12", "Android_13",
    "Android_6.0.1", "Android_5.1.1", "Android_4.4.4", "Android_4.3",
    "Android_4.2.2", "Android_4.1.2",
];

const ANDROID_APP_VERSION: &str = "61";
const ANDROID_X_APP_VERSION: &str = "2.4.0";
const ANDROID_DEVICE_BRAND: &str = "Xiaomi";

const WEB_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) \
    Chrome/119.0.0.0 Safari/537.36 Edg/119.0.0.0";
const WEB_APP_VERSION: &str = "3";

/// Client flavour the requests imitate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Android,
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "web" => Ok(Self::Web),
            other => Err(ApiError::Precondition(format!(
                "unsupported protocol: {other} (expected android or web)"
            ))),
        }
    }
}

/// Device identity presented on the Android protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub device_type: String,
    pub os_version: String,
    /// Fresh per process; never persisted.
    pub login_uuid: String,
}

impl DeviceProfile {
    /// Uses the given model and OS version, picking random ones for blanks.
    pub fn new(device_type: &str, os_version: &str) -> Self {
        let mut rng = rand::thread_rng();
        let pick = |value: &str, pool: &[&str], rng: &mut rand::rngs::ThreadRng| {
            if value.is_empty() {
                pool.choose(rng).copied().unwrap_or_default().to_string()
            } else {
                value.to_string()
            }
        };
        Self {
            device_type: pick(device_type, DEVICE_TYPES, &mut rng),
            os_version: pick(os_version, OS_VERSIONS, &mut rng),
            login_uuid: uuid::Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn random() -> Self {
        Self::new("", "")
    }
}

/// Authorization state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    /// `header` is the full `Authorization` value, `Bearer <token>`.
    Authenticated { header: String },
}

impl AuthState {
    pub fn header_value(&self) -> &str {
        match self {
            Self::Anonymous => "",
            Self::Authenticated { header } => header,
        }
    }

    fn from_header(value: &str) -> Self {
        if value.is_empty() {
            Self::Anonymous
        } else {
            Self::Authenticated {
                header: value.to_string(),
            }
        }
    }
}

/// Persistable session fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user_name: String,
    pub password: String,
    pub authorization: String,
    pub device_type: String,
    pub os_version: String,
    pub protocol: Platform,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_name: String,
    pub password: String,
    pub auth: AuthState,
    pub platform: Platform,
    pub device: DeviceProfile,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Platform::default(), DeviceProfile::random())
    }
}

impl Session {
    pub fn new(platform: Platform, device: DeviceProfile) -> Self {
        Self {
            user_name: String::new(),
            password: String::new(),
            auth: AuthState::Anonymous,
            platform,
            device,
        }
    }

    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            user_name: cfg.user_name.clone(),
            password: cfg.password.clone(),
            auth: AuthState::from_header(&cfg.authorization),
            platform: cfg.protocol,
            device: DeviceProfile::new(&cfg.device_type, &cfg.os_version),
        }
    }

    pub fn to_config(&self) -> SessionConfig {
        SessionConfig {
            user_name: self.user_name.clone(),
            password: self.password.clone(),
            authorization: self.auth.header_value().to_string(),
            device_type: self.device.device_type.clone(),
            os_version: self.device.os_version.clone(),
            protocol: self.platform,
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.user_name.is_empty() && !self.password.is_empty()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated { .. })
    }

    /// Records a sign-in token.
    pub fn sign_in(&mut self, token: &str) {
        self.auth = AuthState::Authenticated {
            header: format!("Bearer {token}"),
        };
    }

    pub fn sign_out(&mut self) {
        self.auth = AuthState::Anonymous;
    }

    /// Drops the token and the stored credentials.
    pub fn clear_account(&mut self) {
        self.sign_out();
        self.user_name.clear();
        self.password.clear();
    }

    /// Request headers for the current state.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("content-type", "application/json".to_string()),
            ("authorization", self.auth.header_value().to_string()),
            ("LoginUuid", self.device.login_uuid.clone()),
        ];

        match self.platform {
            Platform::Android => headers.extend([
                (
                    "user-agent",
                    format!(
                        "123pan/v{ANDROID_X_APP_VERSION}({};{ANDROID_DEVICE_BRAND})",
                        self.device.os_version
                    ),
                ),
                ("osversion", self.device.os_version.clone()),
                ("platform", "android".to_string()),
                ("devicetype", self.device.device_type.clone()),
                ("devicename", ANDROID_DEVICE_BRAND.to_string()),
                ("app-version", ANDROID_APP_VERSION.to_string()),
                ("x-app-version", ANDROID_X_APP_VERSION.to_string()),
            ]),
            Platform::Web => headers.extend([
                ("Accept", "*/*".to_string()),
                ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8".to_string()),
                ("App-Version", WEB_APP_VERSION.to_string()),
                ("Cache-Control", "no-cache".to_string()),
                ("Pragma", "no-cache".to_string()),
                ("Referer", format!("{API_BASE_URL}/")),
                ("Sec-Fetch-Dest", "empty".to_string()),
                ("Sec-Fetch-Mode", "cors".to_string()),
                ("Sec-Fetch-Site", "same-origin".to_string()),
                ("User-Agent", WEB_USER_AGENT.to_string()),
                ("platform", "web".to_string()),
                ("sec-ch-ua", "Microsoft".to_string()),
                ("sec-ch-ua-mobile", "?0".to_string()),
                ("sec-ch-ua-platform", "Windows".to_string()),
            ]),
        }

        headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}
