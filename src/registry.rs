use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::error::AppError;
use crate::models::{Catalog, TagList};

const MANIFEST_MEDIA_TYPES: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json";
const DIGEST_HEADER: &str = "Docker-Content-Digest";

/// The registry operations the deletion workflow relies on.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn list_tags(&self, image: &str) -> Result<Vec<String>>;

    /// Look up the manifest digest of `image:tag` and delete that manifest.
    async fn resolve_digest_and_delete(&self, image: &str, tag: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str, insecure: bool, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /v2/: fails unless the registry answers with a 2xx status
    pub async fn version_check(&self) -> Result<()> {
        let url = format!("{}/v2/", self.base_url);
        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach registry at {}", self.base_url))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::VersionCheck { url, status }.into());
        }
        Ok(())
    }

    /// GET /v2/_catalog?n=<n>
    pub async fn list_repositories(&self, n: usize) -> Result<Vec<String>> {
        let url = format!("{}/v2/_catalog?n={}", self.base_url, n);
        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch catalog")?;

        let catalog: Catalog = Self::ensure_success(resp, "GET catalog")
            .await?
            .json()
            .await
            .context("Failed to parse catalog JSON")?;
        Ok(catalog.repositories)
    }

    /// GET /v2/<image>/tags/list
    pub async fn list_tags(&self, image: &str) -> Result<Vec<String>> {
        let url = format!("{}/v2/{}/tags/list", self.base_url, image);
        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch tags for {}", image))?;

        let tag_list: TagList = Self::ensure_success(resp, &format!("GET tags for {}", image))
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse tag list for {}", image))?;
        Ok(tag_list.tags.unwrap_or_default())
    }

    /// HEAD /v2/<image>/manifests/<tag>: extract Docker-Content-Digest header
    pub async fn get_digest(&self, image: &str, tag: &str) -> Result<String> {
        let url = format!("{}/v2/{}/manifests/{}", self.base_url, image, tag);
        debug!("HEAD {}", url);
        let resp = self
            .client
            .head(&url)
            .header(ACCEPT, MANIFEST_MEDIA_TYPES)
            .send()
            .await
            .with_context(|| format!("Failed to HEAD manifest for {}:{}", image, tag))?;

        let resp =
            Self::ensure_success(resp, &format!("HEAD manifest for {}:{}", image, tag)).await?;

        resp.headers()
            .get(DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::MissingDigest {
                    image: image.to_string(),
                    tag: tag.to_string(),
                }
                .into()
            })
    }

    /// DELETE /v2/<image>/manifests/<digest>: the registry answers 202 on success
    pub async fn delete_manifest(&self, image: &str, tag: &str, digest: &str) -> Result<()> {
        let url = format!("{}/v2/{}/manifests/{}", self.base_url, image, digest);
        debug!("DELETE {}", url);
        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .with_context(|| {
                format!("Failed to DELETE manifest {} for {}:{}", digest, image, tag)
            })?;

        let status = resp.status();
        if status != StatusCode::ACCEPTED {
            return Err(AppError::DeleteRejected {
                image: image.to_string(),
                tag: tag.to_string(),
                status,
            }
            .into());
        }
        Ok(())
    }

    async fn ensure_success(resp: Response, context: &str) -> Result<Response, AppError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(AppError::RegistryApi {
            context: context.to_string(),
            status,
            body: body.trim().to_string(),
        })
    }
}

#[async_trait]
impl Registry for RegistryClient {
    async fn list_tags(&self, image: &str) -> Result<Vec<String>> {
        RegistryClient::list_tags(self, image).await
    }

    async fn resolve_digest_and_delete(&self, image: &str, tag: &str) -> Result<()> {
        let digest = self.get_digest(image, tag).await?;
        debug!("Resolved {}:{} to {}", image, tag, digest);
        self.delete_manifest(image, tag, &digest).await
    }
}
