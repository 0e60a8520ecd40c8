use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use lambda_runtime::tracing;

use crate::error::ThumbnailError;

/// Bucket/key addressed blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads the whole object. A missing object is [`ThumbnailError::NotFound`].
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ThumbnailError>;

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), ThumbnailError>;
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ThumbnailError> {
        tracing::debug!("Fetching {}/{}", bucket, key);
        let fetch_error = |message: String| ThumbnailError::Fetch {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        };

        let output = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    ThumbnailError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    fetch_error(DisplayErrorContext(&err).to_string())
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|err| fetch_error(DisplayErrorContext(&err).to_string()))?;
        Ok(body.into_bytes())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), ThumbnailError> {
        tracing::debug!("Storing {} bytes at {}/{}", body.len(), bucket, key);
        self.put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| ThumbnailError::Store {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::get_object::GetObjectOutput;
    use aws_sdk_s3::operation::put_object::{PutObjectError, PutObjectOutput};
    use aws_sdk_s3::types::error::NoSuchKey;
    use aws_smithy_mocks::{mock, mock_client};

    #[tokio::test]
    async fn test_get_returns_body() {
        let get_object_rule = mock!(aws_sdk_s3::Client::get_object)
            .match_requests(|req| req.bucket() == Some("imgs") && req.key() == Some("cat.png"))
            .then_output(|| {
                GetObjectOutput::builder()
                    .body(ByteStream::from_static(b"payload"))
                    .build()
            });
        let s3 = mock_client!(aws_sdk_s3, [&get_object_rule]);

        let body = ObjectStore::get(&s3, "imgs", "cat.png").await.unwrap();
        assert_eq!(body, Bytes::from_static(b"payload"));
        assert_eq!(get_object_rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let get_object_rule = mock!(aws_sdk_s3::Client::get_object).then_error(|| {
            GetObjectError::NoSuchKey(
                NoSuchKey::builder()
                    .message("The specified key does not exist.")
                    .build(),
            )
        });
        let s3 = mock_client!(aws_sdk_s3, [&get_object_rule]);

        let err = ObjectStore::get(&s3, "imgs", "missing.jpg").await.unwrap_err();
        assert!(matches!(err, ThumbnailError::NotFound { .. }));
        assert_eq!(err.to_string(), "object imgs/missing.jpg not found");
    }

    #[tokio::test]
    async fn test_put_sends_content_type() {
        let put_object_rule = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|req| {
                req.bucket() == Some("thumbs")
                    && req.key() == Some("thumb-cat.png")
                    && req.content_type() == Some("image/jpeg")
            })
            .then_output(|| PutObjectOutput::builder().build());
        let s3 = mock_client!(aws_sdk_s3, [&put_object_rule]);

        ObjectStore::put(
            &s3,
            "thumbs",
            "thumb-cat.png",
            Bytes::from_static(b"jpeg"),
            "image/jpeg",
        )
        .await
        .unwrap();
        assert_eq!(put_object_rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_put_failure_is_reported() {
        let put_object_rule = mock!(aws_sdk_s3::Client::put_object).then_error(|| {
            PutObjectError::generic(
                ErrorMetadata::builder()
                    .code("QuotaExceeded")
                    .message("bucket quota exceeded")
                    .build(),
            )
        });
        let s3 = mock_client!(aws_sdk_s3, [&put_object_rule]);

        let err = ObjectStore::put(&s3, "thumbs", "thumb-x", Bytes::new(), "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, ThumbnailError::Store { .. }));
        assert!(err.to_string().starts_with("failed to store thumbs/thumb-x"));
        assert!(err.to_string().contains("QuotaExceeded"));
    }
}
