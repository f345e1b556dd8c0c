use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Storage, join_key};
use crate::error::{Result, StorageError};
use crate::object::Object;

/// Region DigitalOcean Spaces expects regardless of the datacenter.
pub const DIGITAL_OCEAN_REGION: &str = "us-east-1";

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Options {
    /// Service URL. Empty means the AWS endpoint for `region`.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub path_prefix: String,
}

impl S3Options {
    /// Check the settings without touching the network.
    pub fn validate(&self) -> Result<()> {
        if self.region.is_empty() {
            return Err(StorageError::InvalidConfiguration("region is required".into()));
        }
        if self.key.is_empty() || self.secret.is_empty() {
            return Err(StorageError::InvalidConfiguration(
                "key and secret are required".into(),
            ));
        }
        if self.bucket.is_empty() {
            return Err(StorageError::InvalidConfiguration("bucket is required".into()));
        }
        Ok(())
    }
}

/// Storage backed by a single S3 bucket, every key rooted under a fixed
/// path prefix.
pub struct S3Storage {
    bucket: Box<Bucket>,
    /// Same bucket handle, but every request carries the `public-read` ACL.
    public_bucket: Box<Bucket>,
    prefix: String,
}

impl S3Storage {
    /// Build a client from validated options. No request is issued here.
    pub fn new(opts: &S3Options) -> Result<Self> {
        let endpoint = if opts.endpoint.is_empty() {
            format!("https://s3.{}.amazonaws.com", opts.region)
        } else {
            opts.endpoint.clone()
        };
        let region = Region::Custom {
            region: opts.region.clone(),
            endpoint,
        };
        let credentials = Credentials::new(
            Some(opts.key.as_str()),
            Some(opts.secret.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::InvalidConfiguration(format!("S3 credentials: {e}")))?;
        let bucket = Bucket::new(&opts.bucket, region, credentials)
            .map_err(|e| StorageError::InvalidConfiguration(format!("S3 bucket: {e}")))?
            .with_path_style();

        let mut public_bucket = bucket.clone();
        public_bucket.add_header("x-amz-acl", "public-read");

        let prefix = join_key(&opts.path_prefix, "")?;
        debug!(bucket = %opts.bucket, prefix = %prefix, "S3 storage ready");
        Ok(Self {
            bucket,
            public_bucket,
            prefix,
        })
    }

    fn full_path(&self, key: &str) -> Result<String> {
        let full = join_key(&self.prefix, key)?;
        if full.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(full)
    }

    /// Prefix sent to the bucket for a `list` call. With no call prefix the
    /// search ends in `/` so sibling prefixes such as `<prefix>-other` are not
    /// matched.
    fn list_search(&self, prefix: &str) -> Result<String> {
        let search = join_key(&self.prefix, prefix)?;
        if search == self.prefix && !self.prefix.is_empty() {
            return Ok(format!("{search}/"));
        }
        Ok(search)
    }

    /// Strip the configured prefix so listed keys can be fed back into
    /// `get`/`delete`. Keys outside the prefix yield `None`.
    fn relative_key(&self, full: &str) -> Option<String> {
        if self.prefix.is_empty() {
            return Some(full.to_string());
        }
        full.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    }
}

fn s3_error(op: &'static str, key: &str, source: S3Error) -> StorageError {
    match source {
        S3Error::HttpFailWithBody(404, _) => StorageError::NotFound(key.to_string()),
        source => StorageError::S3 {
            op,
            key: key.to_string(),
            source,
        },
    }
}

fn check_status(op: &'static str, key: &str, status: u16) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        status => Err(StorageError::S3Status {
            op,
            key: key.to_string(),
            status,
        }),
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let full = self.full_path(key)?;
        let response = self
            .public_bucket
            .put_object(&full, data)
            .await
            .map_err(|e| s3_error("PUT", &full, e))?;
        check_status("PUT", &full, response.status_code())?;
        debug!(key = %full, bytes = data.len(), "stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let full = self.full_path(key)?;
        let response = self
            .bucket
            .get_object(&full)
            .await
            .map_err(|e| s3_error("GET", &full, e))?;
        check_status("GET", &full, response.status_code())?;
        Ok(response.to_vec())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full = self.full_path(key)?;
        match self.bucket.head_object(&full).await {
            Ok((_, status)) => match check_status("HEAD", &full, status) {
                Ok(()) => Ok(true),
                Err(StorageError::NotFound(_)) => Ok(false),
                Err(e) => Err(e),
            },
            Err(e) => match s3_error("HEAD", &full, e) {
                StorageError::NotFound(_) => Ok(false),
                e => Err(e),
            },
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full = self.full_path(key)?;
        let response = self
            .bucket
            .delete_object(&full)
            .await
            .map_err(|e| s3_error("DELETE", &full, e))?;
        check_status("DELETE", &full, response.status_code())?;
        debug!(key = %full, "deleted");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Object>> {
        let search = self.list_search(prefix)?;
        let pages = self
            .bucket
            .list(search.clone(), None)
            .await
            .map_err(|e| s3_error("LIST", &search, e))?;
        let mut objects = Vec::new();
        for page in pages {
            for obj in page.contents {
                match self.relative_key(&obj.key) {
                    Some(key) => objects.push(Object::with_size(key, obj.size)),
                    None => debug!(key = %obj.key, "skipping key outside prefix"),
                }
            }
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    /// Deletes the single object named by the configured prefix. Objects
    /// stored below the prefix are left in place.
    async fn purge(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(StorageError::InvalidKey(self.prefix.clone()));
        }
        let response = self
            .bucket
            .delete_object(&self.prefix)
            .await
            .map_err(|e| s3_error("DELETE", &self.prefix, e))?;
        check_status("DELETE", &self.prefix, response.status_code())?;
        info!(prefix = %self.prefix, "purged S3 storage prefix");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> S3Options {
        S3Options {
            endpoint: "http://localhost:9000".into(),
            region: DIGITAL_OCEAN_REGION.into(),
            key: "access".into(),
            secret: "secret".into(),
            bucket: "bucket".into(),
            path_prefix: "/tests/s3-storage".into(),
        }
    }

    #[test]
    fn validate_requires_every_credential() {
        assert!(options().validate().is_ok());

        for mutate in [
            (|o: &mut S3Options| o.region.clear()) as fn(&mut S3Options),
            |o| o.key.clear(),
            |o| o.secret.clear(),
            |o| o.bucket.clear(),
        ] {
            let mut opts = options();
            mutate(&mut opts);
            assert!(matches!(
                opts.validate(),
                Err(StorageError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn keys_are_rooted_under_prefix() {
        let storage = S3Storage::new(&options()).unwrap();

        assert_eq!(storage.full_path("a/b.json").unwrap(), "tests/s3-storage/a/b.json");
        assert_eq!(
            storage.full_path("/abra/cadabra/non-existent.txt").unwrap(),
            "tests/s3-storage/abra/cadabra/non-existent.txt"
        );
        assert!(matches!(
            storage.full_path(""),
            Err(StorageError::InvalidKey(_))
        ));
        assert_eq!(
            storage.relative_key("tests/s3-storage/a/b.json").as_deref(),
            Some("a/b.json")
        );
        assert_eq!(storage.relative_key("elsewhere/x"), None);
    }

    #[test]
    fn list_stays_inside_prefix() {
        let storage = S3Storage::new(&options()).unwrap();

        assert_eq!(storage.list_search("").unwrap(), "tests/s3-storage/");
        assert_eq!(storage.list_search("/").unwrap(), "tests/s3-storage/");
        assert_eq!(storage.list_search("abra").unwrap(), "tests/s3-storage/abra");

        assert_eq!(storage.relative_key("tests/s3-storage-other/x"), None);
        assert_eq!(storage.relative_key("tests/s3-storage"), None);
        assert_eq!(storage.relative_key("tests/s3-storage/"), None);

        let bare = S3Storage::new(&S3Options {
            path_prefix: String::new(),
            ..options()
        })
        .unwrap();
        assert_eq!(bare.list_search("").unwrap(), "");
        assert_eq!(bare.relative_key("any/key").as_deref(), Some("any/key"));
    }

    #[test]
    fn put_requests_carry_public_read_acl() {
        let storage = S3Storage::new(&options()).unwrap();

        let acl = |bucket: &Bucket| {
            bucket
                .extra_headers()
                .get("x-amz-acl")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        assert_eq!(acl(&storage.public_bucket).as_deref(), Some("public-read"));
        assert_eq!(acl(&storage.bucket), None);
    }

    #[test]
    fn status_codes_map_to_errors() {
        assert!(check_status("GET", "k", 200).is_ok());
        assert!(check_status("DELETE", "k", 204).is_ok());
        assert!(check_status("GET", "k", 404).unwrap_err().is_not_found());
        assert!(matches!(
            check_status("GET", "k", 403),
            Err(StorageError::S3Status { status: 403, .. })
        ));
        assert!(s3_error("GET", "k", S3Error::HttpFailWithBody(404, String::new())).is_not_found());
    }

    #[tokio::test]
    async fn purge_refuses_empty_prefix() {
        let storage = S3Storage::new(&S3Options {
            path_prefix: String::new(),
            ..options()
        })
        .unwrap();
        assert!(matches!(
            storage.purge().await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
