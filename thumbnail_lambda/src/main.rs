use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, tracing, Error};
mod error;
mod event_handler;
mod store;
mod thumbnail;
use event_handler::function_handler;
use thumbnail::ThumbnailConfig;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();
    let shared_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_client = S3Client::new(&shared_config);
    let thumbnail_config = ThumbnailConfig::default();
    run(service_fn(|event| {
        function_handler(event, &s3_client, &thumbnail_config)
    }))
    .await
}
