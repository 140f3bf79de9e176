//! Deduplicating multipart upload.

use std::path::Path;

use pan123_client::ApiError;
use pan123_protocol::constants::{
    CODE_DUPLICATE_FILE, CODE_OK, MERGE_DELAY, TIMEOUT_DEFAULT, TIMEOUT_TRASH, UPLOAD_CHUNK_SIZE,
    URL_UPLOAD_COMPLETE, URL_UPLOAD_MERGE, URL_UPLOAD_PARTS, URL_UPLOAD_REQUEST,
};
use pan123_protocol::messages::{
    MergeRequest, PartUrls, PartUrlsRequest, UploadCompleteRequest, UploadRequest, UploadTicket,
};
use pan123_protocol::{DuplicatePolicy, Report};
use pan123_transfer::{
    Chunk, ChunkReader, ProgressFn, TransferError, TransferEvent, UploadSession, digest_file, emit,
    validate_entry_name,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::Drive;
use crate::error::DriveError;

/// How an upload finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The server already held the content; nothing was transferred.
    Reused { file_id: i64 },
    /// All parts were sent, merged and confirmed.
    Completed { file_id: i64 },
    /// The name is taken and the policy was [`DuplicatePolicy::Reject`].
    /// Retry with another policy.
    Duplicate { name: String },
}

impl Report for UploadOutcome {
    fn code(&self) -> i32 {
        match self {
            Self::Duplicate { .. } => CODE_DUPLICATE_FILE,
            _ => CODE_OK,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Reused { .. } => "instant upload (content already on server)".into(),
            Self::Completed { .. } => "upload complete".into(),
            Self::Duplicate { name } => {
                format!("{name} already exists; choose overwrite or keep both")
            }
        }
    }
}

impl Drive<'_> {
    /// Uploads a local file into `parent_id`.
    ///
    /// `desired_name` defaults to the local file name. Fails before any
    /// request when the path is missing or not a regular file.
    pub async fn upload(
        &self,
        local_path: &Path,
        desired_name: Option<&str>,
        parent_id: i64,
        policy: DuplicatePolicy,
        progress: Option<&ProgressFn>,
    ) -> Result<UploadOutcome, DriveError> {
        let meta = match tokio::fs::metadata(local_path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DriveError::Precondition(format!(
                    "file not found: {}",
                    local_path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        if meta.is_dir() {
            return Err(DriveError::Precondition(format!(
                "folder upload is not supported: {}",
                local_path.display()
            )));
        }
        if !meta.is_file() {
            return Err(TransferError::NotAFile(local_path.display().to_string()).into());
        }

        let name = match desired_name {
            Some(n) => n.to_string(),
            None => local_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        validate_entry_name(&name)?;

        let digest = tokio::task::spawn_blocking({
            let path = local_path.to_path_buf();
            move || digest_file(&path)
        })
        .await
        .map_err(|e| DriveError::Upload(format!("task join error: {e}")))??;
        let size = meta.len();
        debug!(name = %name, size, digest = %digest, "negotiating upload");

        let req = UploadRequest {
            drive_id: 0,
            etag: digest.clone(),
            file_name: name.clone(),
            parent_file_id: parent_id,
            size,
            entry_type: 0,
            duplicate: policy,
        };
        let env = match self
            .client
            .post_json(URL_UPLOAD_REQUEST, &req, TIMEOUT_DEFAULT)
            .await
        {
            Ok(env) => env,
            Err(ApiError::Rejected { code, .. })
                if code == CODE_DUPLICATE_FILE && policy == DuplicatePolicy::Reject =>
            {
                info!(name = %name, parent = parent_id, "name already taken");
                return Ok(UploadOutcome::Duplicate { name });
            }
            Err(e) => return Err(e.into()),
        };
        let ticket: UploadTicket = env.parse_data().map_err(ApiError::from)?;

        if ticket.reuse {
            info!(name = %name, file_id = ticket.file_id, "content reused, nothing to send");
            return Ok(UploadOutcome::Reused {
                file_id: ticket.file_id,
            });
        }

        let mut session = UploadSession::new(
            local_path.to_path_buf(),
            size,
            digest,
            ticket.bucket,
            ticket.storage_node,
            ticket.key,
            ticket.upload_id,
            ticket.file_id,
        );
        self.send_parts(&mut session, progress).await?;
        self.finish_upload(&session).await?;

        info!(
            name = %name,
            file_id = session.remote_file_id,
            parts = session.part_number() - 1,
            "upload complete"
        );
        Ok(UploadOutcome::Completed {
            file_id: session.remote_file_id,
        })
    }

    /// Sends the file in fixed-size parts, strictly in order.
    async fn send_parts(
        &self,
        session: &mut UploadSession,
        progress: Option<&ProgressFn>,
    ) -> Result<(), DriveError> {
        let mut reader = tokio::task::spawn_blocking({
            let path = session.local_path.clone();
            move || ChunkReader::new(&path, UPLOAD_CHUNK_SIZE)
        })
        .await
        .map_err(|e| DriveError::Upload(format!("task join error: {e}")))??;

        loop {
            let (returned, next) = tokio::task::spawn_blocking(move || {
                let chunk = reader.next_chunk();
                (reader, chunk)
            })
            .await
            .map_err(|e| DriveError::Upload(format!("task join error: {e}")))?;
            reader = returned;

            let Some(chunk) = next? else {
                if session.remaining() > 0 {
                    return Err(DriveError::Upload(format!(
                        "{} shrank during upload: {} of {} bytes sent",
                        session.local_path.display(),
                        session.bytes_sent(),
                        session.total_bytes
                    )));
                }
                return Ok(());
            };
            self.send_part(session, chunk).await?;

            emit(
                progress,
                TransferEvent::UploadProgress {
                    uploaded: session.bytes_sent(),
                    total: session.total_bytes,
                },
            );
        }
    }

    async fn send_part(&self, session: &mut UploadSession, chunk: Chunk) -> Result<(), DriveError> {
        let part = chunk.part_number;
        let len = chunk.len();
        if len as u64 > session.remaining() {
            return Err(DriveError::Upload(format!(
                "{} grew during upload: part {part} exceeds the declared {} bytes",
                session.local_path.display(),
                session.total_bytes
            )));
        }
        let url = self.part_url(session, part).await?;

        let status = self.client.transport().put_part(&url, chunk.data).await?;
        if !(200..300).contains(&status) {
            return Err(DriveError::Upload(format!(
                "part {part} rejected with HTTP {status}"
            )));
        }

        session.record_part(len);
        debug!(part, len, sent = session.bytes_sent(), "part uploaded");
        Ok(())
    }

    /// Presigned URL for exactly one part.
    async fn part_url(&self, session: &UploadSession, part: u32) -> Result<String, DriveError> {
        let req = PartUrlsRequest {
            bucket: session.bucket.clone(),
            key: session.object_key.clone(),
            part_number_start: part,
            part_number_end: part + 1,
            upload_id: session.upload_id.clone(),
            storage_node: session.storage_node.clone(),
        };
        let env = self
            .client
            .post_json(URL_UPLOAD_PARTS, &req, TIMEOUT_DEFAULT)
            .await?;
        let mut urls: PartUrls = env.parse_data().map_err(ApiError::from)?;
        urls.presigned_urls
            .remove(&part.to_string())
            .ok_or_else(|| DriveError::Upload(format!("no upload URL for part {part}")))
    }

    /// Merges the parts, waits for the storage layer, then confirms.
    async fn finish_upload(&self, session: &UploadSession) -> Result<(), DriveError> {
        let merge = MergeRequest {
            bucket: session.bucket.clone(),
            key: session.object_key.clone(),
            upload_id: session.upload_id.clone(),
            storage_node: session.storage_node.clone(),
        };
        self.client
            .post_json(URL_UPLOAD_MERGE, &merge, TIMEOUT_TRASH)
            .await?;

        tokio::time::sleep(MERGE_DELAY).await;

        let complete = UploadCompleteRequest {
            file_id: session.remote_file_id,
        };
        self.client
            .post_json(URL_UPLOAD_COMPLETE, &complete, TIMEOUT_DEFAULT)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubTransport, client_with, envelope, rejected, ticket};
    use pan123_protocol::Outcome;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn write_file(dir: &Path, name: &str, len: usize) -> PathBuf {
        let path = dir.join(name);
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test(start_paused = true)]
    async fn second_upload_of_same_content_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 10);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(false, 77));
        stub.respond(URL_UPLOAD_REQUEST, ticket(true, 77));
        let client = client_with(&stub);
        let drive = Drive::new(&client);

        let first = drive
            .upload(&path, None, 0, DuplicatePolicy::Overwrite, None)
            .await
            .unwrap();
        assert_eq!(first, UploadOutcome::Completed { file_id: 77 });
        assert_eq!(stub.puts().len(), 1);

        let second = drive
            .upload(&path, None, 0, DuplicatePolicy::Overwrite, None)
            .await
            .unwrap();
        assert_eq!(second, UploadOutcome::Reused { file_id: 77 });
        assert_eq!(stub.puts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn parts_follow_chunking_law() {
        let dir = tempfile::tempdir().unwrap();
        let size = 2 * UPLOAD_CHUNK_SIZE + 123;
        let path = write_file(dir.path(), "big.bin", size);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(false, 5));
        let client = client_with(&stub);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let cb: &ProgressFn = &move |e: TransferEvent| s.lock().unwrap().push(e);

        Drive::new(&client)
            .upload(&path, None, 0, DuplicatePolicy::Reject, Some(cb))
            .await
            .unwrap();

        let puts = stub.puts();
        assert_eq!(puts.len(), 3);
        assert_eq!(puts[0], ("https://s3.stub/part/1".to_string(), UPLOAD_CHUNK_SIZE));
        assert_eq!(puts[1].1, UPLOAD_CHUNK_SIZE);
        assert_eq!(puts[2], ("https://s3.stub/part/3".to_string(), 123));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen[2],
            TransferEvent::UploadProgress {
                uploaded: size as u64,
                total: size as u64
            }
        );

        let paths: Vec<String> = stub.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths.last().map(String::as_str), Some(URL_UPLOAD_COMPLETE));
        assert!(paths.contains(&URL_UPLOAD_MERGE.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn exact_multiple_has_full_last_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "even.bin", 2 * UPLOAD_CHUNK_SIZE);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(false, 5));
        let client = client_with(&stub);

        Drive::new(&client)
            .upload(&path, None, 0, DuplicatePolicy::Reject, None)
            .await
            .unwrap();
        let puts = stub.puts();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[1].1, UPLOAD_CHUNK_SIZE);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_file_sends_no_parts_but_confirms() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "empty.txt", 0);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(false, 8));
        let client = client_with(&stub);

        let outcome = Drive::new(&client)
            .upload(&path, None, 0, DuplicatePolicy::Reject, None)
            .await
            .unwrap();
        assert_eq!(outcome, UploadOutcome::Completed { file_id: 8 });
        assert!(stub.puts().is_empty());
        let paths: Vec<String> = stub.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, [URL_UPLOAD_REQUEST, URL_UPLOAD_MERGE, URL_UPLOAD_COMPLETE]);
    }

    #[tokio::test]
    async fn name_collision_with_reject_is_advisory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "dup.txt", 4);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, rejected(CODE_DUPLICATE_FILE, "file exists"));
        let client = client_with(&stub);

        let result = Drive::new(&client)
            .upload(&path, None, 0, DuplicatePolicy::Reject, None)
            .await;
        let outcome = Outcome::from_result(result);
        assert_eq!(outcome.code, 5060);
        assert!(outcome.is_advisory());
        assert!(stub.puts().is_empty());
        assert_eq!(stub.requests().len(), 1);
    }

    #[tokio::test]
    async fn negotiation_carries_digest_name_and_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello world").unwrap();
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(true, 1));
        let client = client_with(&stub);

        Drive::new(&client)
            .upload(&path, Some("greeting.txt"), 42, DuplicatePolicy::KeepBoth, None)
            .await
            .unwrap();

        let body = stub.requests()[0].body.clone().unwrap();
        assert_eq!(body["etag"], "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(body["fileName"], "greeting.txt");
        assert_eq!(body["parentFileId"], 42);
        assert_eq!(body["size"], 11);
        assert_eq!(body["duplicate"], 2);
    }

    #[tokio::test]
    async fn folder_and_missing_paths_fail_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubTransport::new();
        let client = client_with(&stub);
        let drive = Drive::new(&client);

        let err = drive
            .upload(dir.path(), None, 0, DuplicatePolicy::Reject, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::Precondition(_)));

        let err = drive
            .upload(&dir.path().join("nope"), None, 0, DuplicatePolicy::Reject, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("file not found"));
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn failed_part_aborts_without_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 100);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(false, 3));
        stub.put_status(403);
        let client = client_with(&stub);

        let err = Drive::new(&client)
            .upload(&path, None, 0, DuplicatePolicy::Reject, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 403"));
        assert!(stub.requests().iter().all(|r| r.path != URL_UPLOAD_MERGE));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_merge_is_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 100);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(false, 3));
        stub.respond(URL_UPLOAD_MERGE, rejected(1, "merge failed"));
        let client = client_with(&stub);

        let err = Drive::new(&client)
            .upload(&path, None, 0, DuplicatePolicy::Reject, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "merge failed");
        assert!(stub.requests().iter().all(|r| r.path != URL_UPLOAD_COMPLETE));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_confirmation_fails_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 100);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(false, 3));
        stub.respond(URL_UPLOAD_COMPLETE, rejected(2, "not merged"));
        let client = client_with(&stub);

        let result = Drive::new(&client)
            .upload(&path, None, 0, DuplicatePolicy::Reject, None)
            .await;
        assert!(Outcome::from_result(result).is_failure());
    }

    #[tokio::test]
    async fn file_growing_after_negotiation_fails_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "grow.bin", 10);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(false, 5));
        let grow = path.clone();
        stub.before(URL_UPLOAD_REQUEST, move || {
            use std::io::Write;
            let mut f = std::fs::OpenOptions::new().append(true).open(&grow).unwrap();
            f.write_all(&[9u8; 50]).unwrap();
        });
        let client = client_with(&stub);

        let err = Drive::new(&client)
            .upload(&path, None, 0, DuplicatePolicy::Reject, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::Upload(_)));
        assert!(err.to_string().contains("grew during upload"));
        assert!(stub.puts().is_empty());
        assert!(stub.requests().iter().all(|r| r.path != URL_UPLOAD_MERGE));
    }

    #[tokio::test]
    async fn file_shrinking_after_negotiation_fails_without_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "shrink.bin", 100);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(false, 5));
        let shrink = path.clone();
        stub.before(URL_UPLOAD_REQUEST, move || {
            std::fs::OpenOptions::new()
                .write(true)
                .open(&shrink)
                .unwrap()
                .set_len(40)
                .unwrap();
        });
        let client = client_with(&stub);

        let err = Drive::new(&client)
            .upload(&path, None, 0, DuplicatePolicy::Reject, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("shrank during upload: 40 of 100 bytes sent"));
        assert_eq!(stub.puts().len(), 1);
        assert!(stub.requests().iter().all(|r| r.path != URL_UPLOAD_MERGE));
    }

    #[tokio::test]
    async fn missing_part_url_is_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 100);
        let stub = StubTransport::new();
        stub.respond(URL_UPLOAD_REQUEST, ticket(false, 3));
        stub.respond(URL_UPLOAD_PARTS, envelope(0, serde_json::json!({"presignedUrls": {}})));
        let client = client_with(&stub);

        let err = Drive::new(&client)
            .upload(&path, None, 0, DuplicatePolicy::Reject, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no upload URL for part 1"));
    }
}
