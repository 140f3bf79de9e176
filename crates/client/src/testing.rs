//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use pan123_protocol::Envelope;

use crate::client::Client;
use crate::error::ApiError;
use crate::session::{DeviceProfile, Platform, Session};
use crate::transport::{ApiRequest, BoxFuture, Download, Probe, Transport};

/// Answers JSON calls from per-path queues and records every request.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<Envelope, ApiError>>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, env: Envelope) {
        self.push(path, Ok(env));
    }

    pub fn fail(&self, path: &str, err: ApiError) {
        self.push(path, Err(err));
    }

    fn push(&self, path: &str, result: Result<Envelope, ApiError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for StubTransport {
    fn send(&self, req: ApiRequest) -> BoxFuture<'_, Result<Envelope, ApiError>> {
        let result = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&req.path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ApiError::Transport(format!("no response for {}", req.path))));
        self.requests.lock().unwrap().push(req);
        Box::pin(async move { result })
    }

    fn put_part(&self, _url: &str, _data: Vec<u8>) -> BoxFuture<'_, Result<u16, ApiError>> {
        Box::pin(async { Err(ApiError::Transport("not scripted".into())) })
    }

    fn probe(&self, _url: &str) -> BoxFuture<'_, Result<Probe, ApiError>> {
        Box::pin(async { Err(ApiError::Transport("not scripted".into())) })
    }

    fn fetch(&self, _url: &str) -> BoxFuture<'_, Result<Download, ApiError>> {
        Box::pin(async { Err(ApiError::Transport("not scripted".into())) })
    }
}

pub fn client_with(stub: &Arc<StubTransport>) -> Client {
    let transport: Arc<dyn Transport> = stub.clone();
    Client::new(
        transport,
        Session::new(Platform::Android, DeviceProfile::new("M2004J11G", "Android_11")),
    )
}

pub fn envelope(code: i32, data: serde_json::Value) -> Envelope {
    Envelope {
        code,
        message: "ok".into(),
        data: Some(data),
    }
}

pub fn rejected(code: i32, message: &str) -> Envelope {
    Envelope {
        code,
        message: message.into(),
        data: None,
    }
}

/// A listing page holding files `start..start + count` of `total`.
pub fn page_of(start: u64, count: u64, total: u64) -> Envelope {
    let items: Vec<serde_json::Value> = (start..start + count)
        .map(|i| serde_json::json!({"FileId": i + 1, "FileName": format!("f{i}"), "Type": 0, "Size": i}))
        .collect();
    envelope(0, serde_json::json!({"InfoList": items, "Total": total}))
}
