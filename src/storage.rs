use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tracing::debug;

use crate::config::StorageConfig;

/// Object storage for certificate photos.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// Unsigned URL under which the bucket serves `key`.
    fn public_url(&self, key: &str) -> String;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            public_base: cfg.public_base(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(size as i64)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("store certificate photo {}/{}", self.bucket, key))?;
        debug!(bucket = %self.bucket, key, size, content_type, "certificate photo stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("remove certificate photo {}/{}", self.bucket, key))?;
        debug!(bucket = %self.bucket, key, "certificate photo removed");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(public_base_url: Option<&str>) -> StorageConfig {
        StorageConfig {
            endpoint: "http://minio:9000/".into(),
            bucket: "certificates".into(),
            access_key: "minio".into(),
            secret_key: "minio123".into(),
            region: "us-east-1".into(),
            public_base_url: public_base_url.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn photo_urls_are_path_style_under_bucket() {
        let storage = Storage::new(&config(None)).await.unwrap();
        assert_eq!(storage.bucket, "certificates");
        assert_eq!(
            storage.public_url("u/2024/6-a.jpg"),
            "http://minio:9000/certificates/u/2024/6-a.jpg"
        );

        let cdn = Storage::new(&config(Some("https://cdn.example.org/certs/")))
            .await
            .unwrap();
        assert_eq!(
            cdn.public_url("u/2024/6-a.jpg"),
            "https://cdn.example.org/certs/u/2024/6-a.jpg"
        );
    }
}
