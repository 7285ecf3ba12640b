use async_trait::async_trait;
use reqwest::{Client as HttpClient, Url};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::providers::ImageStore,
};

/// Object store reached through the Firebase Storage REST API
#[derive(Clone)]
pub struct FirebaseStorage {
    http_client: HttpClient,
    api_url: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    pub fn new(api_url: String, bucket: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            bucket,
        }
    }

    /// `{api}/v0/b/{bucket}/o/{name}` with the object name as one encoded segment
    fn object_url(&self, name: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| AppError::Internal(format!("Invalid storage URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Storage URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v0", "b", self.bucket.as_str(), "o", name]);
        Ok(url)
    }

    fn upload_url(&self) -> AppResult<Url> {
        let mut url = self.object_url("")?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Storage URL cannot be a base".to_string()))?
            .pop();
        Ok(url)
    }

    fn download_url(&self, name: &str, token: Option<&str>) -> AppResult<String> {
        let mut url = self.object_url(name)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("alt", "media");
            if let Some(token) = token {
                query.append_pair("token", token);
            }
        }
        Ok(url.to_string())
    }
}

#[async_trait]
impl ImageStore for FirebaseStorage {
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
        auth_token: Option<String>,
    ) -> AppResult<String> {
        let size = bytes.len();
        let mut request = self
            .http_client
            .post(self.upload_url()?)
            .query(&[("uploadType", "media"), ("name", path)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);

        if let Some(token) = auth_token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Firebase {}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                "Image upload failed"
            );
            return Err(AppError::Storage(format!(
                "Upload returned status {}: {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response.json().await?;
        let token = uploaded
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next());

        tracing::info!(path = %uploaded.name, bytes = size, "Uploaded image");

        self.download_url(&uploaded.name, token)
    }
}
