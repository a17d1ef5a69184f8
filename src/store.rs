use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use object_store::{
    gcp::GoogleCloudStorageBuilder, local::LocalFileSystem, path::Path, ObjectStore,
};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::s3::{s3_store, S3Options};

pub const DEFAULT_STORE_URL: &str = "s3://acm-logging";

/// An object body, chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes, StoreError>>;

/// Read access to the log objects.
#[async_trait]
pub trait LogSource {
    /// Keys starting with `prefix`, in lexicographic order. Empty if none match.
    ///
    /// For [`Store`] this lists everything below the directory enclosing
    /// `prefix`: a day lookup reads the whole month and a year lookup the
    /// whole `logs/` tree, which is slow on large buckets.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Body of the object at `key`, as a stream of chunks.
    async fn fetch(&self, key: &str) -> Result<ByteStream, StoreError>;
}

pub fn new<S: AsRef<str>>(store_url: S, s3_options: &S3Options) -> Result<Store, anyhow::Error> {
    let store_url = store_url.as_ref();
    let url = match Url::parse(store_url) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let absolute_path = std::fs::canonicalize(store_url)
                .map_err(|e| anyhow::anyhow!("Invalid store URL: {}: {}", store_url, e))?;

            Url::parse(&format!("file://{}", absolute_path.to_string_lossy()))
                .with_context(|| format!("Invalid store URL: {}", store_url))?
        }
        Err(e) => Err(e).with_context(|| format!("Invalid store URL: {}", store_url))?,
    };

    match url.scheme() {
        "s3" => {
            let bucket = url.host_str().ok_or_else(|| anyhow::anyhow!("No bucket"))?;
            let store = s3_store(bucket, s3_options).context("new s3 store")?;

            Ok(Store::from_object_store(Arc::new(store), url.path()))
        }
        "gs" => {
            let bucket = url.host_str().ok_or_else(|| anyhow::anyhow!("No bucket"))?;

            let store = GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket.to_string())
                .build()
                .context("new gcs store")?;

            Ok(Store::from_object_store(Arc::new(store), url.path()))
        }
        "file" => {
            let store = LocalFileSystem::new_with_prefix(url.path()).context("new local store")?;

            Ok(Store::from_object_store(Arc::new(store), ""))
        }
        _ => Err(anyhow::anyhow!("Unsupported scheme: {}", url.scheme()))?,
    }
}

pub struct Store {
    store: Arc<dyn ObjectStore>,
    base: String,
}

impl Store {
    /// Wraps an already built store. Keys are resolved below `base`.
    pub fn from_object_store<B: AsRef<str>>(store: Arc<dyn ObjectStore>, base: B) -> Self {
        Store {
            store,
            base: base.as_ref().trim_matches('/').to_string(),
        }
    }

    fn join_key(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        match self.base.is_empty() {
            true => key.to_string(),
            false => format!("{}/{}", self.base, key),
        }
    }

    fn strip_base<'a>(&self, location: &'a str) -> &'a str {
        match self.base.is_empty() {
            true => location,
            false => location
                .strip_prefix(self.base.as_str())
                .map(|rest| rest.trim_start_matches('/'))
                .unwrap_or(location),
        }
    }
}

#[async_trait]
impl LogSource for Store {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        // object_store lists by path segment, S3 by plain string prefix: list the
        // enclosing directory and filter to keep the S3 behaviour on every backend.
        let full = self.join_key(prefix);
        let parent = full.rsplit_once('/').map(|(parent, _)| Path::from(parent));

        let mut keys = Vec::new();
        let mut list_stream = self.store.list(parent.as_ref());
        while let Some(meta) = list_stream.try_next().await? {
            let location = meta.location.as_ref();
            if location.starts_with(full.as_str()) {
                keys.push(self.strip_base(location).to_string());
            }
        }
        keys.sort();

        Ok(keys)
    }

    async fn fetch(&self, key: &str) -> Result<ByteStream, StoreError> {
        let content = self.store.get(&Path::from(self.join_key(key))).await?;

        Ok(content.into_stream().map_err(StoreError::from).boxed())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;

    use super::*;

    async fn memory_store(base: &str, keys: &[(&str, &'static str)]) -> Store {
        let memory = InMemory::new();
        for &(key, body) in keys {
            memory
                .put(&Path::from(key), Bytes::from_static(body.as_bytes()))
                .await
                .unwrap();
        }
        Store::from_object_store(Arc::new(memory), base)
    }

    async fn read_all(store: &Store, key: &str) -> Vec<u8> {
        let chunks: Vec<Bytes> = store.fetch(key).await.unwrap().try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn lists_by_string_prefix() {
        let store = memory_store(
            "",
            &[
                ("logs/2016/6/log_2016-06-13/part2", "b"),
                ("logs/2016/6/log_2016-06-13/part1", "a"),
                ("logs/2016/6/log_2016-06-13.txt", "c"),
                ("logs/2016/6/2016-06-13/raw", "d"),
                ("logs/2016/6/log_2016-06-14/part1", "e"),
            ],
        )
        .await;

        let keys = store.list_keys("logs/2016/6/log_2016-06-13").await.unwrap();
        assert_eq!(
            keys,
            vec![
                "logs/2016/6/log_2016-06-13.txt",
                "logs/2016/6/log_2016-06-13/part1",
                "logs/2016/6/log_2016-06-13/part2",
            ]
        );

        let month = store.list_keys("logs/2016/6").await.unwrap();
        assert_eq!(month.len(), 5);
        assert_eq!(store.list_keys("logs/2016").await.unwrap(), month);
    }

    #[tokio::test]
    async fn single_digit_month_also_matches_later_months() {
        let store = memory_store(
            "",
            &[
                ("logs/2016/1/log_2016-01-05/part1", "january"),
                ("logs/2016/10/log_2016-10-05/part1", "october"),
                ("logs/2016/2/log_2016-02-05/part1", "february"),
            ],
        )
        .await;

        // plain string prefix, as S3 matches it: logs/2016/1 covers 10, 11 and 12
        assert_eq!(
            store.list_keys("logs/2016/1").await.unwrap(),
            vec![
                "logs/2016/1/log_2016-01-05/part1",
                "logs/2016/10/log_2016-10-05/part1",
            ]
        );
    }

    #[tokio::test]
    async fn missing_prefix_lists_nothing() {
        let store = memory_store("", &[("logs/2016/6/log_2016-06-13/part1", "a")]).await;

        assert!(store.list_keys("logs/2017").await.unwrap().is_empty());
        assert!(store.list_keys("logs/2016/6/2016-06-13").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keys_are_relative_to_base() {
        let store = memory_store(
            "/archive/",
            &[
                ("archive/logs/2016/6/log_2016-06-13/part1", "first part"),
                ("other/logs/2016/6/log_2016-06-13/part1", "elsewhere"),
            ],
        )
        .await;

        let keys = store.list_keys("logs/2016").await.unwrap();
        assert_eq!(keys, vec!["logs/2016/6/log_2016-06-13/part1"]);
        assert_eq!(read_all(&store, &keys[0]).await, b"first part");
    }

    #[tokio::test]
    async fn fetching_a_missing_key_fails() {
        let store = memory_store("", &[]).await;

        let err = store.fetch("logs/2016/6/nope").await.err().unwrap();
        assert!(matches!(
            err,
            StoreError::Storage(object_store::Error::NotFound { .. })
        ));
    }

    #[test]
    fn rejects_unsupported_schemes() {
        let err = new("ftp://acm-logging", &S3Options::default()).err().unwrap();
        assert!(err.to_string().contains("Unsupported scheme: ftp"));

        assert!(new("./no/such/log/directory", &S3Options::default()).is_err());
    }
}
