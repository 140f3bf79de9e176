//! Current-directory cursor and its loaded page cache.

use pan123_protocol::RemoteEntry;
use pan123_protocol::constants::FILE_LIST_PAGE_LIMIT;
use serde::Serialize;
use tracing::debug;

use crate::api::{DEFAULT_SHARE_EXPIRATION, ShareLink};
use crate::client::Client;
use crate::error::ApiError;

/// Directory stack plus the pages of the current directory loaded so far.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    /// `(id, name)` of each folder entered below the root.
    stack: Vec<(i64, String)>,
    items: Vec<RemoteEntry>,
    total: u64,
    page: u32,
    all_loaded: bool,
}

impl Navigator {
    pub fn cwd_id(&self) -> i64 {
        self.stack.last().map(|(id, _)| *id).unwrap_or(0)
    }

    /// `/` at the root, otherwise `/a/b`.
    pub fn cwd_path(&self) -> String {
        let names: Vec<&str> = self.stack.iter().map(|(_, n)| n.as_str()).collect();
        format!("/{}", names.join("/"))
    }

    fn reset_page_cache(&mut self) {
        self.items.clear();
        self.total = 0;
        self.page = 0;
        self.all_loaded = false;
    }

    fn view(&self) -> DirectoryView {
        DirectoryView {
            items: self.items.clone(),
            total: self.total,
            all_loaded: self.all_loaded,
        }
    }

    fn entry(&self, index: usize) -> Result<&RemoteEntry, ApiError> {
        self.items
            .get(index)
            .ok_or_else(|| ApiError::Precondition(format!("invalid index: {index}")))
    }
}

/// Loaded entries of the current directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectoryView {
    pub items: Vec<RemoteEntry>,
    pub total: u64,
    pub all_loaded: bool,
}

impl Client {
    pub fn cwd_id(&self) -> i64 {
        self.state().nav.cwd_id()
    }

    pub fn cwd_path(&self) -> String {
        self.state().nav.cwd_path()
    }

    /// Entries loaded so far in the current directory.
    pub fn file_list(&self) -> DirectoryView {
        self.state().nav.view()
    }

    pub fn entry_at(&self, index: usize) -> Result<RemoteEntry, ApiError> {
        self.state().nav.entry(index).cloned()
    }

    /// Drops the page cache and loads the first page again.
    pub async fn refresh(&self) -> Result<DirectoryView, ApiError> {
        self.state().nav.reset_page_cache();
        self.load_more().await
    }

    /// Appends the next page of the current directory to the cache.
    pub async fn load_more(&self) -> Result<DirectoryView, ApiError> {
        let (cwd, page) = {
            let state = self.state();
            (state.nav.cwd_id(), state.nav.page + 1)
        };

        let batch = self.list_page(cwd, page, FILE_LIST_PAGE_LIMIT).await?;

        let mut state = self.state();
        let nav = &mut state.nav;
        if nav.cwd_id() != cwd {
            return Err(ApiError::Precondition(
                "directory changed while loading".into(),
            ));
        }
        nav.page = page;
        nav.items.extend(batch.items);
        nav.total = batch.total;
        nav.all_loaded = nav.items.len() as u64 >= nav.total;
        debug!(cwd, page, loaded = nav.items.len(), total = nav.total, "page loaded");
        Ok(nav.view())
    }

    /// Enters the folder at `index` and loads its first page.
    pub async fn cd(&self, index: usize) -> Result<DirectoryView, ApiError> {
        {
            let mut state = self.state();
            let entry = state.nav.entry(index)?;
            if !entry.is_folder() {
                return Err(ApiError::Precondition(format!(
                    "not a folder: {}",
                    entry.name
                )));
            }
            let frame = (entry.id, entry.name.clone());
            state.nav.stack.push(frame);
        }
        self.refresh().await
    }

    pub async fn cd_up(&self) -> Result<DirectoryView, ApiError> {
        if self.state().nav.stack.pop().is_none() {
            return Err(ApiError::Precondition("already at the root".into()));
        }
        self.refresh().await
    }

    pub async fn cd_root(&self) -> Result<DirectoryView, ApiError> {
        self.state().nav.stack.clear();
        self.refresh().await
    }

    /// Creates a folder in the current directory.
    pub async fn mkdir(&self, name: &str) -> Result<serde_json::Value, ApiError> {
        let cwd = self.cwd_id();
        self.mkdir_in(cwd, name).await
    }

    pub async fn trash_by_index(&self, index: usize) -> Result<RemoteEntry, ApiError> {
        let entry = self.entry_at(index)?;
        self.trash(&entry).await?;
        Ok(entry)
    }

    /// Shares the loaded entries at `indices`. Every index is checked before
    /// anything is sent.
    pub async fn share_by_indices(
        &self,
        indices: &[usize],
        password: &str,
    ) -> Result<ShareLink, ApiError> {
        let ids = {
            let state = self.state();
            indices
                .iter()
                .map(|&i| state.nav.entry(i).map(|e| e.id))
                .collect::<Result<Vec<_>, _>>()?
        };
        self.share(&ids, password, DEFAULT_SHARE_EXPIRATION).await
    }
}
