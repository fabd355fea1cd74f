//! S3-compatible object store.
//!
//! The SDK is async; each store drives it from a shared single-threaded
//! runtime with `block_on` so listing pages are fetched strictly one after
//! another.

use super::{ListingEntry, ListingPage, ObjectStore, StoreProvider};
use crate::error::{Error, Result};
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::error::CredentialsError;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::Client;
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Service error codes that mean the request reached the service but the
/// credentials were refused.
const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "ExpiredToken",
    "InvalidAccessKeyId",
    "InvalidToken",
    "SignatureDoesNotMatch",
];

/// Placeholder in the endpoint template replaced by the account name.
const ACCOUNT_PLACEHOLDER: &str = "{account}";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    /// Custom endpoint URL. May contain `{account}`.
    pub endpoint: Option<String>,
    pub region: Option<String>,
}

impl StoreSettings {
    pub fn endpoint_for(&self, account: &str) -> Option<String> {
        self.endpoint
            .as_ref()
            .filter(|endpoint| !endpoint.is_empty())
            .map(|endpoint| endpoint.replace(ACCOUNT_PLACEHOLDER, account))
    }
}

/// Opens [`S3Store`] handles that share one runtime.
pub struct S3Provider {
    settings: StoreSettings,
    runtime: Arc<Runtime>,
}

impl S3Provider {
    pub fn new(settings: StoreSettings) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            settings,
            runtime: Arc::new(runtime),
        })
    }
}

impl StoreProvider for S3Provider {
    fn open(&self, account: &str, container: &str) -> Result<Box<dyn ObjectStore>> {
        let endpoint = self.settings.endpoint_for(account);
        debug!(
            "Opening container {} of account {} (endpoint: {:?})",
            container, account, endpoint
        );

        let client = self
            .runtime
            .block_on(create_client(&self.settings, endpoint));

        Ok(Box::new(S3Store {
            client,
            bucket: container.to_string(),
            runtime: Arc::clone(&self.runtime),
        }))
    }
}

async fn create_client(settings: &StoreSettings, endpoint: Option<String>) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &settings.region {
        loader = loader.region(Region::new(region.clone()));
    }

    let custom_endpoint = endpoint.is_some();
    if let Some(endpoint) = endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    let shared_config = loader.load().await;
    let builder = aws_sdk_s3::config::Builder::from(&shared_config);

    // Custom endpoints are addressed path-style.
    let s3_config = if custom_endpoint {
        builder.force_path_style(true).build()
    } else {
        builder.build()
    };

    Client::from_conf(s3_config)
}

pub struct S3Store {
    client: Client,
    bucket: String,
    runtime: Arc<Runtime>,
}

impl S3Store {
    fn list_page(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<ListingPage> {
        let mut request = self.client.list_objects_v2().bucket(&self.bucket);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }
        if let Some(delimiter) = delimiter {
            request = request.delimiter(delimiter);
        }
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let output = self
            .runtime
            .block_on(request.send())
            .map_err(|err| store_error(&format!("list {}/{}", self.bucket, prefix), err))?;

        let mut entries: Vec<ListingEntry> = output
            .common_prefixes()
            .iter()
            .filter_map(|common| common.prefix())
            .map(|prefix| ListingEntry::Prefix(prefix.to_string()))
            .collect();

        entries.extend(output.contents().iter().filter_map(|object| {
            object.key().map(|key| ListingEntry::Blob {
                path: key.to_string(),
                content_length: object.size().unwrap_or(0),
            })
        }));

        let continuation = if output.is_truncated() == Some(true) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListingPage {
            entries,
            continuation,
        })
    }
}

impl ObjectStore for S3Store {
    fn list_hierarchy(
        &self,
        prefix: &str,
        delimiter: &str,
        continuation: Option<&str>,
    ) -> Result<ListingPage> {
        self.list_page(prefix, Some(delimiter), continuation)
    }

    fn list_flat(&self, prefix: &str, continuation: Option<&str>) -> Result<ListingPage> {
        self.list_page(prefix, None, continuation)
    }

    fn download(&self, path: &str) -> Result<Vec<u8>> {
        let request = self.client.get_object().bucket(&self.bucket).key(path);

        self.runtime.block_on(async {
            let output = request
                .send()
                .await
                .map_err(|err| store_error(&format!("get {}/{}", self.bucket, path), err))?;
            let body = output.body.collect().await.map_err(|err| {
                Error::Network(format!("read {}/{}: {}", self.bucket, path, err))
            })?;
            Ok::<_, Error>(body.into_bytes().to_vec())
        })
    }
}

fn store_error<E, R>(context: &str, err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug + 'static,
{
    let is_auth = err
        .code()
        .map(|code| AUTH_ERROR_CODES.contains(&code))
        .unwrap_or(false)
        || credentials_failed(&err);
    let message = format!("{}: {}", context, DisplayErrorContext(&err));

    if is_auth {
        Error::Auth(message)
    } else {
        Error::Network(message)
    }
}

/// Credential resolution fails before the request is sent, so the SDK
/// reports it as a dispatch failure without a service error code.
fn credentials_failed(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(current) = source {
        if current.is::<CredentialsError>() {
            return true;
        }
        source = current.source();
    }
    false
}
