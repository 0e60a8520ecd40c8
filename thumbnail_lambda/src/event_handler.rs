use lambda_runtime::tracing::{self, Instrument};
use lambda_runtime::{Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ThumbnailError;
use crate::store::ObjectStore;
use crate::thumbnail::{self, ThumbnailConfig, THUMBNAIL_CONTENT_TYPE};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ThumbnailRequest {
    pub source_bucket: String,
    pub destination_bucket: String,
    pub image_key: String,
}

/// What the invoker gets back, serialized as
/// `{"status": "success", "thumb_key": ..}` or `{"status": "fail", "error": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub(crate) enum ThumbnailResponse {
    Success { thumb_key: String },
    Fail { error: String },
}

fn parse_request(payload: Value) -> Result<ThumbnailRequest, ThumbnailError> {
    let request: ThumbnailRequest = serde_json::from_value(payload)
        .map_err(|e| ThumbnailError::InvalidRequest(e.to_string()))?;

    for (field, value) in [
        ("source_bucket", &request.source_bucket),
        ("destination_bucket", &request.destination_bucket),
        ("image_key", &request.image_key),
    ] {
        if value.is_empty() {
            return Err(ThumbnailError::InvalidRequest(format!(
                "{field} must not be empty"
            )));
        }
    }
    Ok(request)
}

async fn create_thumbnail<S: ObjectStore + ?Sized>(
    store: &S,
    request: &ThumbnailRequest,
    config: &ThumbnailConfig,
) -> Result<String, ThumbnailError> {
    let original = store
        .get(&request.source_bucket, &request.image_key)
        .await?;
    let thumb = thumbnail::generate_async(original, *config).await?;

    // nothing is written until the thumbnail is fully encoded
    let thumb_key = thumbnail::thumb_key(&request.image_key);
    tracing::info!(
        width = thumb.width,
        height = thumb.height,
        bytes = thumb.data.len(),
        "Uploading {}/{}",
        request.destination_bucket,
        thumb_key
    );
    store
        .put(
            &request.destination_bucket,
            &thumb_key,
            thumb.data,
            THUMBNAIL_CONTENT_TYPE,
        )
        .await?;
    Ok(thumb_key)
}

/// Runs one invocation. Failures are reported in the response body, so the
/// runtime only ever sees `Ok`.
pub(crate) async fn function_handler<S: ObjectStore + ?Sized>(
    event: LambdaEvent<Value>,
    store: &S,
    config: &ThumbnailConfig,
) -> Result<ThumbnailResponse, Error> {
    let outcome = match parse_request(event.payload) {
        Ok(request) => {
            let span = tracing::info_span!(
                "create_thumbnail",
                source_bucket = %request.source_bucket,
                destination_bucket = %request.destination_bucket,
                image_key = %request.image_key,
            );
            create_thumbnail(store, &request, config)
                .instrument(span)
                .await
        }
        Err(err) => Err(err),
    };

    let response = match outcome {
        Ok(thumb_key) => {
            tracing::info!("Created thumbnail {}", thumb_key);
            ThumbnailResponse::Success { thumb_key }
        }
        Err(err) => {
            tracing::error!("Thumbnail creation failed: {}", err);
            ThumbnailResponse::Fail {
                error: err.to_string(),
            }
        }
    };
    Ok(response)
}
