//! Object storage staging for documents too large to analyze inline.

use async_trait::async_trait;

use super::CloudError;

/// Location of a staged object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    pub bucket: String,
    pub key: String,
}

/// Write-only object storage used to hand large documents to the analysis
/// service.
#[async_trait]
pub trait ObjectStaging: Send + Sync {
    async fn stage(&self, key: &str, bytes: &[u8]) -> Result<StagedObject, CloudError>;
}

/// Object key for a staged document: `{prefix}/{uuid}-{filename}`.
///
/// The filename is reduced to its last path component, and characters
/// outside `[A-Za-z0-9._-]` become `_`.
pub fn staging_key(prefix: &str, filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let prefix = prefix.trim_matches('/');
    let id = uuid::Uuid::new_v4();
    if prefix.is_empty() {
        format!("{}-{}", id, safe)
    } else {
        format!("{}/{}-{}", prefix, id, safe)
    }
}

#[cfg(feature = "textract")]
mod s3 {
    use async_trait::async_trait;
    use aws_sdk_s3::error::DisplayErrorContext;
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::Client;
    use tracing::debug;

    use super::{ObjectStaging, StagedObject};
    use crate::cloud::CloudError;

    /// S3 bucket staging.
    pub struct S3Staging {
        client: Client,
        bucket: String,
    }

    impl S3Staging {
        pub fn new(client: Client, bucket: impl Into<String>) -> Self {
            Self {
                client,
                bucket: bucket.into(),
            }
        }
    }

    #[async_trait]
    impl ObjectStaging for S3Staging {
        async fn stage(&self, key: &str, bytes: &[u8]) -> Result<StagedObject, CloudError> {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .content_type("application/pdf")
                .body(ByteStream::from(bytes.to_vec()))
                .send()
                .await
                .map_err(|e| CloudError::Staging(DisplayErrorContext(&e).to_string()))?;
            debug!("Staged {} bytes at s3://{}/{}", bytes.len(), self.bucket, key);
            Ok(StagedObject {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            })
        }
    }
}

#[cfg(feature = "textract")]
pub use s3::S3Staging;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_key_shape() {
        let key = staging_key("holerite-uploads/", "lote/Julho 2024.pdf");
        assert!(key.starts_with("holerite-uploads/"));
        assert!(key.ends_with("-Julho_2024.pdf"));
        // prefix + '/' + 36-char uuid + '-' + name
        assert_eq!(key.len(), "holerite-uploads/".len() + 36 + 1 + "Julho_2024.pdf".len());
    }

    #[test]
    fn test_staging_keys_are_unique() {
        assert_ne!(staging_key("p", "a.pdf"), staging_key("p", "a.pdf"));
        assert!(!staging_key("", "a.pdf").starts_with('/'));
    }
}
