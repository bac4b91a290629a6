//! Release catalog backed by the GitHub releases API.
//!
//! Listings are paged with `per_page=100&page=N` until an empty page comes
//! back. Payloads decode into typed structs so a missing field fails at the
//! boundary with [`CatalogError::Decode`].

use super::{Asset, CatalogError, ReleaseCatalog, ReleaseEntry, Result};
use crate::download::{HttpClient, HttpRequest};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct ReleasePayload {
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
    #[serde(default)]
    assets_url: Option<String>,
}

/// [`ReleaseCatalog`] reading `releases_url` through an [`HttpClient`].
///
/// # Examples
///
/// ```
/// use tvm_installer::catalog::GithubCatalog;
/// use tvm_installer::download::UreqClient;
///
/// let client = UreqClient::new(None);
/// let catalog = GithubCatalog::new(
///     &client,
///     "https://api.github.com/repos/opentofu/opentofu/releases",
///     None,
/// );
/// // Use catalog.list_releases() in production
/// # let _ = catalog;
/// ```
pub struct GithubCatalog<'a> {
    client: &'a dyn HttpClient,
    releases_url: String,
    token: Option<String>,
}

impl<'a> GithubCatalog<'a> {
    /// A catalog for the releases listed at `releases_url`, authenticating
    /// with `token` when given.
    #[must_use]
    pub fn new(client: &'a dyn HttpClient, releases_url: &str, token: Option<&str>) -> Self {
        Self {
            client,
            releases_url: releases_url.trim_end_matches('/').to_owned(),
            token: token.map(str::to_owned),
        }
    }

    fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let request = HttpRequest::new(url)
            .for_api()
            .with_bearer(self.token.as_deref());
        let body = self.client.get(&request)?;
        serde_json::from_slice(&body).map_err(|err| CatalogError::Decode {
            url: url.to_owned(),
            reason: err.to_string(),
        })
    }

    /// Fetch `base` page by page until an empty page, decoding each item.
    fn fetch_paged<T: DeserializeOwned>(&self, base: &str) -> Result<Vec<T>> {
        let separator = if base.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        for page in 1.. {
            let url = format!("{base}{separator}per_page={PAGE_SIZE}&page={page}");
            let batch: Vec<T> = self.fetch(&url)?;
            if batch.is_empty() {
                break;
            }
            log::trace!("page {page} of {base}: {} items", batch.len());
            items.extend(batch);
        }
        Ok(items)
    }

    fn entry_from(url: &str, payload: ReleasePayload) -> Result<ReleaseEntry> {
        if payload.tag_name.is_empty() {
            return Err(CatalogError::Decode {
                url: url.to_owned(),
                reason: "release has an empty tag_name".to_owned(),
            });
        }
        Ok(ReleaseEntry {
            tag: payload.tag_name,
            assets: payload.assets,
        })
    }
}

impl ReleaseCatalog for GithubCatalog<'_> {
    fn list_releases(&self) -> Result<Vec<ReleaseEntry>> {
        let payloads: Vec<ReleasePayload> = self.fetch_paged(&self.releases_url)?;
        log::debug!("{} releases listed at {}", payloads.len(), self.releases_url);
        payloads
            .into_iter()
            .map(|payload| Self::entry_from(&self.releases_url, payload))
            .collect()
    }

    fn latest_release(&self) -> Result<String> {
        let url = format!("{}/latest", self.releases_url);
        let payload: ReleasePayload = self.fetch(&url)?;
        Self::entry_from(&url, payload).map(|entry| entry.tag)
    }

    fn release(&self, tag: &str) -> Result<ReleaseEntry> {
        let url = format!("{}/tags/{tag}", self.releases_url);
        let mut payload: ReleasePayload = self.fetch(&url)?;
        if let Some(assets_url) = payload.assets_url.take() {
            payload.assets = self.fetch_paged(&assets_url)?;
        }
        Self::entry_from(&url, payload)
    }
}
