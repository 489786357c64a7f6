//! Yandex Disk storage backend
//!
//! Thin client over the Yandex Disk REST API (`/v1/disk`), authenticated with
//! an OAuth token.

use super::search::{depth_first_search, DirectoryLister};
use super::{RemoteEntry, Retrieved, StorageBackend, StorageError, StorageKind};
use crate::config::{RelaySettings, CLOUD_LIST_PAGE_SIZE};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(rename = "_embedded")]
    embedded: Option<ResourceList>,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    items: Vec<ResourceItem>,
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ResourceItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    item_type: String,
}

impl From<ResourceItem> for RemoteEntry {
    fn from(item: ResourceItem) -> Self {
        if item.item_type == "dir" {
            Self::directory(item.name, item.path)
        } else {
            Self::file(item.name, item.path)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    description: Option<String>,
    message: Option<String>,
}

/// Yandex Disk client
pub struct YandexDisk {
    client: Client,
    api_url: String,
    token: String,
}

impl YandexDisk {
    /// Create a client from relay settings
    #[must_use]
    pub fn new(settings: &RelaySettings) -> Self {
        Self::with_endpoint(&settings.yandex_api_url, &settings.yandex_token)
    }

    /// Create a client for an explicit API endpoint
    #[must_use]
    pub fn with_endpoint(api_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{endpoint}", self.api_url))
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
    }

    /// Validate the OAuth token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API cannot be reached or answers unexpectedly.
    pub async fn check_token(&self) -> Result<bool, StorageError> {
        let response = self.request(reqwest::Method::GET, "").send().await?;
        match response.status() {
            status if status.is_success() => {
                info!("Yandex Disk token accepted.");
                Ok(true)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            _ => Err(StorageError::Config(api_error(response).await)),
        }
    }

    /// Check whether a resource exists.
    ///
    /// # Errors
    ///
    /// Returns an error on any response other than found / not found.
    pub async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let response = self
            .request(reqwest::Method::GET, "/resources")
            .query(&[("path", disk_path(path).as_str()), ("fields", "path")])
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(StorageError::Transfer(api_error(response).await)),
        }
    }

    /// Create a folder. The parent must already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request.
    pub async fn mkdir(&self, path: &str) -> Result<(), StorageError> {
        let response = self
            .request(reqwest::Method::PUT, "/resources")
            .query(&[("path", disk_path(path).as_str())])
            .send()
            .await?;
        if response.status().is_success() {
            info!("Created cloud folder '{path}'.");
            Ok(())
        } else {
            Err(StorageError::Transfer(api_error(response).await))
        }
    }

    /// Resolve a direct download URL for a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request.
    pub async fn download_link(&self, path: &str) -> Result<String, StorageError> {
        let response = self
            .request(reqwest::Method::GET, "/resources/download")
            .query(&[("path", disk_path(path).as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StorageError::Transfer(api_error(response).await));
        }
        Ok(response.json::<Link>().await?.href)
    }

    async fn list_page(
        &self,
        path: &str,
        offset: u64,
    ) -> Result<(Vec<RemoteEntry>, Option<u64>), StorageError> {
        let response = self
            .request(reqwest::Method::GET, "/resources")
            .query(&[
                ("path", disk_path(path)),
                ("limit", CLOUD_LIST_PAGE_SIZE.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StorageError::Listing(api_error(response).await));
        }
        let resource: Resource = response.json().await?;
        let list = resource.embedded.ok_or_else(|| {
            StorageError::Listing(format!("'{path}' is not a folder"))
        })?;
        Ok((
            list.items.into_iter().map(RemoteEntry::from).collect(),
            list.total,
        ))
    }
}

#[async_trait]
impl DirectoryLister for YandexDisk {
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, StorageError> {
        let mut entries = Vec::new();
        loop {
            let (page, total) = self.list_page(path, entries.len() as u64).await?;
            let received = page.len();
            entries.extend(page);
            let done = match total {
                Some(total) => entries.len() as u64 >= total,
                None => received < CLOUD_LIST_PAGE_SIZE as usize,
            };
            if done || received == 0 {
                break;
            }
        }
        debug!("Listed {} entries in cloud folder '{path}'", entries.len());
        Ok(entries)
    }
}

#[async_trait]
impl StorageBackend for YandexDisk {
    fn kind(&self) -> StorageKind {
        StorageKind::CloudDisk
    }

    async fn ensure_folder(&self, folder: &str) -> Result<(), StorageError> {
        if is_root(folder) || self.exists(folder).await? {
            return Ok(());
        }
        self.mkdir(folder).await
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let response = self
            .request(reqwest::Method::GET, "/resources/upload")
            .query(&[("path", disk_path(path).as_str()), ("overwrite", "false")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StorageError::Transfer(api_error(response).await));
        }
        let target: Link = response.json().await?;

        let size = bytes.len();
        let response = self.client.put(&target.href).body(bytes).send().await?;
        if !response.status().is_success() {
            return Err(StorageError::Transfer(api_error(response).await));
        }
        info!("Uploaded {size} bytes to cloud path '{path}'.");
        Ok(())
    }

    async fn list_top_level_folders(&self) -> Result<Vec<RemoteEntry>, StorageError> {
        Ok(self
            .list_dir("")
            .await?
            .into_iter()
            .filter(RemoteEntry::is_dir)
            .collect())
    }

    async fn recursive_search(
        &self,
        root: &str,
        query: &str,
    ) -> Result<Vec<RemoteEntry>, StorageError> {
        depth_first_search(self, root, query)
            .await
            .map_err(|e| match e {
                StorageError::Listing(msg) => StorageError::Search(msg),
                other => other,
            })
    }

    async fn retrieve(&self, entry: &RemoteEntry) -> Result<Retrieved, StorageError> {
        self.download_link(&entry.path).await.map(Retrieved::Link)
    }
}

fn is_root(folder: &str) -> bool {
    folder.trim_matches('/').is_empty()
}

/// Map a root-relative path to an API path. Paths already returned by the
/// API (`disk:/...`, `/...`) pass through unchanged.
fn disk_path(path: &str) -> String {
    if path.starts_with("disk:") || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

async fn api_error(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiError>(&body)
        .ok()
        .and_then(|e| e.description.or(e.message))
        .unwrap_or(body);
    format!("{status}: {detail}")
}
