//! Account, folder, recycle bin and share endpoints.

use pan123_protocol::constants::{
    TIMEOUT_DEFAULT, TIMEOUT_TRASH, URL_FILE_TRASH, URL_FOLDER_DETAILS, URL_LOGIN, URL_MKDIR,
    URL_SHARE_CREATE, URL_USER_INFO, share_url,
};
use pan123_protocol::messages::{
    FolderDetailsRequest, LoginRequest, LoginResponse, MkdirRequest, ShareCreated, ShareRequest,
    TrashRequest,
};
use pan123_protocol::{RemoteEntry, UserInfo};
use serde::Serialize;
use tracing::{info, warn};

use crate::client::Client;
use crate::error::ApiError;
use crate::session::Platform;
use crate::transport::ApiRequest;

/// Far-future expiry used for new shares.
pub const DEFAULT_SHARE_EXPIRATION: &str = "2099-12-12T08:00:00+08:00";

const SHARE_NAME: &str = "分享文件";

/// How [`Client::init_login_state`] ended up authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// The stored token still works.
    TokenValid,
    /// The token was rejected and a fresh sign-in succeeded.
    Relogged,
}

/// A created share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLink {
    pub url: String,
    pub password: String,
}

impl Client {
    pub async fn user_info(&self) -> Result<UserInfo, ApiError> {
        let env = self.call(ApiRequest::get(URL_USER_INFO)).await?;
        Ok(env.parse_data()?)
    }

    /// Signs in with the stored credentials and records the token.
    pub async fn login(&self) -> Result<(), ApiError> {
        let (user_name, password) = {
            let state = self.state();
            if !state.session.has_credentials() {
                return Err(ApiError::Precondition(
                    "user name and password are required".into(),
                ));
            }
            (state.session.user_name.clone(), state.session.password.clone())
        };

        let req = LoginRequest {
            login_type: 1,
            passport: user_name.clone(),
            password,
        };
        let env = self.post_json(URL_LOGIN, &req, TIMEOUT_DEFAULT).await?;
        let resp: LoginResponse = env.parse_data()?;
        self.update_session(|s| s.sign_in(&resp.token));
        info!(user = %user_name, "signed in");
        Ok(())
    }

    pub fn logout(&self) {
        self.update_session(|s| s.sign_out());
    }

    pub fn clear_account(&self) {
        self.update_session(|s| s.clear_account());
    }

    /// Whether the current token is accepted, probed through the user info
    /// endpoint.
    pub async fn check_login(&self) -> Result<UserInfo, ApiError> {
        self.user_info().await
    }

    /// Validates the stored token and signs in again when it was rejected.
    pub async fn init_login_state(&self) -> Result<LoginState, ApiError> {
        match self.check_login().await {
            Ok(_) => Ok(LoginState::TokenValid),
            Err(e) => {
                warn!(error = %e, "stored token rejected");
                if !self.session().has_credentials() {
                    return Err(ApiError::Precondition(format!(
                        "session invalid and no credentials to sign in again: {e}"
                    )));
                }
                self.login().await?;
                Ok(LoginState::Relogged)
            }
        }
    }

    /// Raw details of a folder. The endpoint only answers for one id.
    pub async fn folder_details(&self, folder_id: i64) -> Result<serde_json::Value, ApiError> {
        let req = FolderDetailsRequest {
            file_ids: vec![folder_id],
        };
        let env = self
            .post_json(URL_FOLDER_DETAILS, &req, TIMEOUT_DEFAULT)
            .await?;
        match env.data {
            Some(v) if !is_empty_value(&v) => Ok(v),
            _ => Err(ApiError::Decode("folder details are empty".into())),
        }
    }

    /// Creates `name` inside `parent_id` and returns the raw response data.
    pub async fn mkdir_in(
        &self,
        parent_id: i64,
        name: &str,
    ) -> Result<serde_json::Value, ApiError> {
        if name.is_empty() {
            return Err(ApiError::Precondition("folder name is empty".into()));
        }
        let env = self
            .post_json(URL_MKDIR, &MkdirRequest::new(name, parent_id), TIMEOUT_DEFAULT)
            .await?;
        info!(parent = parent_id, name, "folder created");
        Ok(env.data.unwrap_or_default())
    }

    /// Moves `entry` to the recycle bin.
    pub async fn trash(&self, entry: &RemoteEntry) -> Result<(), ApiError> {
        self.trash_operation(serde_json::to_value(entry)?, true)
            .await
    }

    /// Restores an entry from the recycle bin.
    pub async fn restore(&self, file_id: i64) -> Result<(), ApiError> {
        self.trash_operation(serde_json::json!({ "FileId": file_id }), false)
            .await
    }

    async fn trash_operation(
        &self,
        target: serde_json::Value,
        delete: bool,
    ) -> Result<(), ApiError> {
        let req = TrashRequest {
            drive_id: 0,
            file_trash_info_list: target,
            operation: delete,
        };
        self.post_json(URL_FILE_TRASH, &req, TIMEOUT_TRASH).await?;
        Ok(())
    }

    /// Creates a share link for `file_ids`. An empty `password` makes the
    /// share public.
    pub async fn share(
        &self,
        file_ids: &[i64],
        password: &str,
        expiration: &str,
    ) -> Result<ShareLink, ApiError> {
        if file_ids.is_empty() {
            return Err(ApiError::Precondition("no files selected".into()));
        }
        let req = ShareRequest {
            drive_id: 0,
            expiration: expiration.to_string(),
            file_id_list: file_ids
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(","),
            share_name: SHARE_NAME.to_string(),
            share_pwd: password.to_string(),
            event: "shareCreate".to_string(),
        };
        let env = self
            .post_json(URL_SHARE_CREATE, &req, TIMEOUT_DEFAULT)
            .await?;
        let created: ShareCreated = env.parse_data()?;
        Ok(ShareLink {
            url: share_url(&created.share_key),
            password: password.to_string(),
        })
    }

    /// Switches the protocol the requests imitate.
    pub fn set_protocol(&self, protocol: &str) -> Result<Platform, ApiError> {
        let platform: Platform = protocol.parse()?;
        self.update_session(|s| s.platform = platform);
        info!(protocol = %platform, "protocol switched");
        Ok(platform)
    }
}

fn is_empty_value(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => true,
        serde_json::Value::Object(m) => m.is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        _ => false,
    }
}
