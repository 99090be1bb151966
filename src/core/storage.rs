// src/core/storage.rs
//! Blob storage for company logos: upload, then address by public URL

use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{error, info};

use crate::environment::StorageConfig;
use crate::error::{JobBoardError, Result};
use crate::types::{Credential, LogoUpload};
use crate::utils;

#[async_trait]
pub trait LogoStorage: Send + Sync {
    /// Store `logo` under `file_name` in the logo bucket
    async fn upload(&self, credential: &Credential, file_name: &str, logo: &LogoUpload)
        -> Result<()>;

    /// Public URL for an uploaded object
    fn public_url(&self, file_name: &str) -> String;
}

// ===== HTTP object storage =====

pub struct HttpLogoStorage {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: Option<String>,
}

impl HttpLogoStorage {
    pub fn new(config: &StorageConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn upload_url(&self, file_name: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, file_name
        )
    }
}

#[async_trait]
impl LogoStorage for HttpLogoStorage {
    async fn upload(
        &self,
        credential: &Credential,
        file_name: &str,
        logo: &LogoUpload,
    ) -> Result<()> {
        let url = self.upload_url(file_name);
        let storage_error = |message: String| JobBoardError::Storage {
            file_name: file_name.to_string(),
            message,
        };

        info!("Uploading logo to: {}", url);

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(credential.expose())
            .header("Content-Type", utils::image_content_type(&logo.file_name))
            .body(logo.bytes.clone());

        if let Some(api_key) = &self.api_key {
            request = request.header("apikey", api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| storage_error(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            error!("Storage error response {}: {}", status, error_text);
            Err(storage_error(format!(
                "Storage returned error status {}: {}",
                status, error_text
            )))
        }
    }

    fn public_url(&self, file_name: &str) -> String {
        utils::public_object_url(&self.base_url, &self.bucket, file_name)
    }
}

// ===== In-memory storage =====

/// Process-local bucket, used for tests and offline runs
pub struct MemoryLogoStorage {
    base_url: String,
    bucket: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    reject_uploads: AtomicBool,
}

impl MemoryLogoStorage {
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bucket: bucket.into(),
            objects: Mutex::new(HashMap::new()),
            reject_uploads: AtomicBool::new(false),
        }
    }

    /// Make every following upload fail
    pub fn reject_uploads(&self, reject: bool) {
        self.reject_uploads.store(reject, Ordering::SeqCst);
    }

    pub fn object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn get(&self, file_name: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file_name)
            .cloned()
    }
}

#[async_trait]
impl LogoStorage for MemoryLogoStorage {
    async fn upload(
        &self,
        _credential: &Credential,
        file_name: &str,
        logo: &LogoUpload,
    ) -> Result<()> {
        if self.reject_uploads.load(Ordering::SeqCst) {
            return Err(JobBoardError::Storage {
                file_name: file_name.to_string(),
                message: "upload rejected".to_string(),
            });
        }

        let mut objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
        if objects.contains_key(file_name) {
            return Err(JobBoardError::Storage {
                file_name: file_name.to_string(),
                message: "object already exists".to_string(),
            });
        }
        objects.insert(file_name.to_string(), logo.bytes.clone());
        Ok(())
    }

    fn public_url(&self, file_name: &str) -> String {
        utils::public_object_url(&self.base_url, &self.bucket, file_name)
    }
}
