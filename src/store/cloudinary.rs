//! Cloudinary asset store over its signed REST API.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{error, info};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use super::{AssetHandle, AssetStore};
use crate::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// REST endpoint root, without the cloud name.
    pub api_base: String,
}

impl CloudinaryConfig {
    /// Parse `cloudinary://<api_key>:<api_secret>@<cloud_name>`.
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| Error::ConfigError(format!("invalid CLOUDINARY_URL: {}", e)))?;
        if url.scheme() != "cloudinary" {
            return Err(Error::ConfigError(format!(
                "CLOUDINARY_URL must use the cloudinary:// scheme, got {}://",
                url.scheme()
            )));
        }
        let cloud_name = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::ConfigError("CLOUDINARY_URL has no cloud name".into()))?;
        let api_secret = url
            .password()
            .ok_or_else(|| Error::ConfigError("CLOUDINARY_URL has no API secret".into()))?;
        if url.username().is_empty() {
            return Err(Error::ConfigError("CLOUDINARY_URL has no API key".into()));
        }
        Ok(Self {
            cloud_name: cloud_name.to_string(),
            api_key: url.username().to_string(),
            api_secret: api_secret.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("CLOUDINARY_URL")
            .map_err(|_| Error::ConfigError("CLOUDINARY_URL is not set".into()))?;
        Self::from_url(&raw)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.api_base.trim_end_matches('/'), self.cloud_name, path)
    }
}

/// Sign request parameters: `k=v` pairs sorted by key, joined with `&`,
/// followed by the API secret, hashed with SHA-256.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Sha256::digest(format!("{}{}", joined, api_secret).as_bytes()))
}

fn timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string()
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct Resource {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct ResourcesResponse {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Turn a non-success response into a readable message.
async fn failure_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(e) => format!("HTTP {}: {}", status, e.error.message),
        Err(_) => format!("HTTP {}", status),
    }
}

#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Signed form: the signed params plus `api_key`, `signature` and the
    /// unsigned `extra` fields.
    fn signed_form(&self, signed: Vec<(&'static str, String)>, extra: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = sign(&signed, &self.config.api_secret);
        let mut form = signed;
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));
        form.extend(extra);
        form
    }

    async fn post(&self, path: &str, form: &[(&'static str, String)]) -> std::result::Result<reqwest::Response, String> {
        let resp = self
            .client
            .post(self.config.endpoint(path))
            .form(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(failure_message(resp).await)
        }
    }
}

impl AssetStore for CloudinaryStore {
    async fn upload(&self, png: Vec<u8>, folder: &str) -> Result<AssetHandle> {
        let data_uri = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        let form = self.signed_form(
            vec![("folder", folder.to_string()), ("timestamp", timestamp())],
            vec![("file", data_uri)],
        );
        let resp = self.post("image/upload", &form).await.map_err(|e| {
            error!("Cloudinary rejected upload to {}: {}", folder, e);
            Error::UploadError(e)
        })?;
        let body: UploadResponse = resp
            .json()
            .await
            .map_err(|e| Error::UploadError(format!("unexpected upload response: {}", e)))?;
        info!("uploaded card to Cloudinary as {}", body.public_id);
        Ok(AssetHandle {
            public_id: body.public_id,
            url: body.secure_url,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<bool> {
        let form = self.signed_form(
            vec![("public_id", public_id.to_string()), ("timestamp", timestamp())],
            Vec::new(),
        );
        let resp = self
            .post("image/destroy", &form)
            .await
            .map_err(|e| Error::AssetStoreError(format!("destroy {}: {}", public_id, e)))?;
        let body: DestroyResponse = resp
            .json()
            .await
            .map_err(|e| Error::AssetStoreError(format!("unexpected destroy response: {}", e)))?;
        Ok(body.result == "ok")
    }

    async fn rename(&self, public_id: &str, new_public_id: &str) -> Result<()> {
        let form = self.signed_form(
            vec![
                ("from_public_id", public_id.to_string()),
                ("timestamp", timestamp()),
                ("to_public_id", new_public_id.to_string()),
            ],
            Vec::new(),
        );
        self.post("image/rename", &form)
            .await
            .map(|_| ())
            .map_err(|e| Error::AssetStoreError(format!("rename {} -> {}: {}", public_id, new_public_id, e)))
    }

    async fn list(&self, folder: &str, max_results: usize) -> Result<Vec<AssetHandle>> {
        let resp = self
            .client
            .get(self.config.endpoint("resources/image/upload"))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(&[("prefix", folder.to_string()), ("max_results", max_results.to_string())])
            .send()
            .await
            .map_err(|e| Error::AssetStoreError(format!("list {}: {}", folder, e)))?;
        if !resp.status().is_success() {
            return Err(Error::AssetStoreError(format!("list {}: {}", folder, failure_message(resp).await)));
        }
        let body: ResourcesResponse = resp
            .json()
            .await
            .map_err(|e| Error::AssetStoreError(format!("unexpected list response: {}", e)))?;
        Ok(body
            .resources
            .into_iter()
            .map(|r| AssetHandle { public_id: r.public_id, url: r.secure_url })
            .collect())
    }
}
