//! The shared client handle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pan123_protocol::Envelope;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::nav::Navigator;
use crate::session::Session;
use crate::transport::{ApiRequest, Transport};

/// Mutable state behind the client's lock.
#[derive(Debug, Default)]
pub(crate) struct State {
    pub session: Session,
    pub nav: Navigator,
}

/// An API client bound to one account session.
///
/// All state sits behind a single lock that is never held across an await,
/// so a `Client` can be shared between tasks.
pub struct Client {
    transport: Arc<dyn Transport>,
    state: Mutex<State>,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self {
            transport,
            state: Mutex::new(State {
                session,
                nav: Navigator::default(),
            }),
        }
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Snapshot of the session.
    pub fn session(&self) -> Session {
        self.state().session.clone()
    }

    /// Mutates the session in place.
    pub fn update_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.state().session)
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends a request with the current session headers and normalizes the
    /// envelope: codes other than `0` and `200` become [`ApiError::Rejected`].
    pub async fn call(&self, req: ApiRequest) -> Result<Envelope, ApiError> {
        let headers = self.state().session.headers();
        let path = req.path.clone();
        let env = self.transport.send(req.with_headers(headers)).await?;
        if env.is_success() {
            return Ok(env);
        }
        debug!(path = %path, code = env.code, message = %env.message, "request rejected");
        Err(ApiError::Rejected {
            code: env.code,
            message: if env.message.is_empty() {
                "unknown error".to_string()
            } else {
                env.message
            },
        })
    }

    pub async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<Envelope, ApiError> {
        let body = serde_json::to_value(body)?;
        self.call(ApiRequest::post(path, body).with_timeout(timeout))
            .await
    }

    pub async fn get_json(
        &self,
        path: &str,
        query: Vec<(String, String)>,
        timeout: Duration,
    ) -> Result<Envelope, ApiError> {
        self.call(ApiRequest::get(path).with_query(query).with_timeout(timeout))
            .await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}
