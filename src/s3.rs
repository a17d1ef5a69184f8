use object_store::aws::{AmazonS3, AmazonS3Builder};

pub const DEFAULT_REGION: &str = "us-west-2";

/// Connection settings for an S3 backed store. Credentials are always taken
/// from the environment.
#[derive(Debug, Clone)]
pub struct S3Options {
    pub region: String,
    /// directly set an endpoint such as http://localhost:9000
    /// for local development or another s3 compatible API
    pub endpoint: Option<String>,
}

impl Default for S3Options {
    fn default() -> Self {
        S3Options {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
        }
    }
}

pub fn s3_store(bucket: &str, options: &S3Options) -> Result<AmazonS3, object_store::Error> {
    let mut builder = AmazonS3Builder::from_env()
        .with_region(options.region.as_str())
        .with_bucket_name(bucket);

    if let Some(endpoint) = &options.endpoint {
        builder = builder.with_endpoint(endpoint.as_str()).with_allow_http(true);
    }

    builder.build()
}
