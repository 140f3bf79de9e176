//! Scripted transport for engine tests.
//!
//! JSON calls are answered from per-path queues; when a queue is empty the
//! transfer endpoints fall back to plausible defaults so tests only script
//! what they assert on.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use pan123_client::{
    ApiError, ApiRequest, BoxFuture, Client, DeviceProfile, Download, Platform, Probe, Session,
    Transport,
};
use pan123_protocol::constants::{URL_DOWNLOAD_INFO, URL_UPLOAD_PARTS};
use pan123_protocol::{Envelope, RemoteEntry};

/// Streamed body of a scripted download.
#[derive(Clone)]
pub enum Body {
    Chunks(Vec<Vec<u8>>),
    /// Yields the chunks, then a transport error.
    FailAfter(Vec<Vec<u8>>),
    /// Waits `every` before yielding each chunk.
    Paced(Vec<Vec<u8>>, Duration),
}

#[derive(Default)]
pub struct StubTransport {
    json: Mutex<HashMap<String, VecDeque<Envelope>>>,
    requests: Mutex<Vec<ApiRequest>>,
    put_status: Mutex<Option<u16>>,
    puts: Mutex<Vec<(String, usize)>>,
    probes: Mutex<HashMap<String, Probe>>,
    bodies: Mutex<HashMap<String, Body>>,
    fetches: Mutex<Vec<String>>,
    hooks: Mutex<HashMap<String, Hook>>,
    fetch_delay: Mutex<Option<Duration>>,
}

type Hook = Box<dyn FnOnce() + Send>;

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, env: Envelope) {
        self.json
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(env);
    }

    /// Status every part PUT answers with (200 by default).
    pub fn put_status(&self, status: u16) {
        *self.put_status.lock().unwrap() = Some(status);
    }

    /// Runs `hook` once, when the next JSON call to `path` arrives.
    pub fn before(&self, path: &str, hook: impl FnOnce() + Send + 'static) {
        self.hooks
            .lock()
            .unwrap()
            .insert(path.to_string(), Box::new(hook));
    }

    /// Delay before every download response arrives.
    pub fn fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn probe_answer(&self, url: &str, probe: Probe) {
        self.probes.lock().unwrap().insert(url.to_string(), probe);
    }

    pub fn serve(&self, url: &str, body: Body) {
        self.bodies.lock().unwrap().insert(url.to_string(), body);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `(url, length)` of every part PUT.
    pub fn puts(&self) -> Vec<(String, usize)> {
        self.puts.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    fn default_answer(req: &ApiRequest) -> Result<Envelope, ApiError> {
        let body = req.body.clone().unwrap_or_default();
        match req.path.as_str() {
            URL_UPLOAD_PARTS => {
                let part = body["partNumberStart"].as_u64().unwrap_or(0);
                let mut urls = serde_json::Map::new();
                urls.insert(
                    part.to_string(),
                    format!("https://s3.stub/part/{part}").into(),
                );
                Ok(envelope(0, serde_json::json!({ "presignedUrls": urls })))
            }
            URL_DOWNLOAD_INFO => {
                let id = body["fileId"].as_i64().unwrap_or(0);
                Ok(descriptor(&format!("https://stub/descriptor/{id}")))
            }
            p if p.starts_with("/b/api/file/") => Ok(envelope(0, serde_json::Value::Null)),
            p => Err(ApiError::Transport(format!("no response scripted for {p}"))),
        }
    }
}

impl Transport for StubTransport {
    fn send(&self, req: ApiRequest) -> BoxFuture<'_, Result<Envelope, ApiError>> {
        let hook = self.hooks.lock().unwrap().remove(&req.path);
        if let Some(hook) = hook {
            hook();
        }
        let queued = self
            .json
            .lock()
            .unwrap()
            .get_mut(&req.path)
            .and_then(VecDeque::pop_front);
        let result = match queued {
            Some(env) => Ok(env),
            None => Self::default_answer(&req),
        };
        self.requests.lock().unwrap().push(req);
        Box::pin(async move { result })
    }

    fn put_part(&self, url: &str, data: Vec<u8>) -> BoxFuture<'_, Result<u16, ApiError>> {
        self.puts.lock().unwrap().push((url.to_string(), data.len()));
        let status = self.put_status.lock().unwrap().unwrap_or(200);
        Box::pin(async move { Ok(status) })
    }

    fn probe(&self, url: &str) -> BoxFuture<'_, Result<Probe, ApiError>> {
        let probe = self
            .probes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Probe {
                status: 302,
                location: Some(format!("{url}/direct")),
                body: String::new(),
            });
        Box::pin(async move { Ok(probe) })
    }

    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<Download, ApiError>> {
        self.fetches.lock().unwrap().push(url.to_string());
        let body = self.bodies.lock().unwrap().get(url).cloned();
        let delay = *self.fetch_delay.lock().unwrap();
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let (chunks, fail, pace) = match body {
                Some(Body::Chunks(c)) => (c, false, None),
                Some(Body::FailAfter(c)) => (c, true, None),
                Some(Body::Paced(c, every)) => (c, false, Some(every)),
                None => return Err(ApiError::Status(404)),
            };
            let content_length = if fail {
                None
            } else {
                Some(chunks.iter().map(|c| c.len() as u64).sum())
            };
            let mut items: Vec<Result<Vec<u8>, ApiError>> = chunks.into_iter().map(Ok).collect();
            if fail {
                items.push(Err(ApiError::Transport("connection reset".into())));
            }
            Ok(Download {
                content_length,
                body: Box::pin(futures_util::stream::iter(items).then(move |item| async move {
                    if let Some(every) = pace {
                        tokio::time::sleep(every).await;
                    }
                    item
                })),
            })
        })
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

pub fn descriptor(url: &str) -> Envelope {
    envelope(0, serde_json::json!({ "DownloadUrl": url }))
}

/// Upload negotiation answer.
pub fn ticket(reuse: bool, file_id: i64) -> Envelope {
    envelope(
        0,
        serde_json::json!({
            "Reuse": reuse,
            "Bucket": "bucket",
            "StorageNode": "node-1",
            "Key": "objects/key",
            "UploadId": "upload-1",
            "FileId": file_id,
        }),
    )
}

/// Single-page listing of `entries`.
pub fn listing(entries: &[RemoteEntry]) -> Envelope {
    envelope(
        0,
        serde_json::json!({ "InfoList": entries, "Total": entries.len() }),
    )
}
