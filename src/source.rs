// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Release listing backends.
///
/// [`ReleaseSource`] is the seam between the pipeline and the network. The
/// production implementation, [`GithubReleases`], talks to the GitHub REST API
/// through Octocrab; tests substitute canned pages.
use std::future::Future;

use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{env::GithubToken, error::Error};

/// Single entry returned by the release listing endpoint.
///
/// Only the attributes the pipeline needs are decoded; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct ReleaseRecord
{
    /// Git tag the release was published under.
    pub tag_name:     String,
    /// Publication time as an RFC 3339 timestamp.
    pub published_at: String,
}

/// Downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize,)]
pub struct ReleaseAsset
{
    /// File name of the asset.
    pub name:                 String,
    /// Public URL serving the asset contents.
    pub browser_download_url: String,
    /// Size in bytes as reported by the API.
    #[serde(default)]
    pub size:                 u64,
}

/// Release metadata needed to pick a downloadable archive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize,)]
pub struct ReleaseDetails
{
    /// Git tag the release was published under.
    pub tag_name: String,
    /// Files attached to the release.
    #[serde(default)]
    pub assets:   Vec<ReleaseAsset,>,
}

/// Identifies a single release within a repository.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub enum ReleaseLookup
{
    /// The release GitHub marks as latest.
    Latest,
    /// The release published under the given tag.
    Tag(String,),
}

impl ReleaseLookup
{
    fn route(&self, repository: &str,) -> String
    {
        match self {
            Self::Latest => format!("/repos/{repository}/releases/latest"),
            Self::Tag(tag,) => format!("/repos/{repository}/releases/tags/{tag}"),
        }
    }
}

/// Capability to list and look up releases of a repository.
pub trait ReleaseSource
{
    /// Returns one page (1-indexed) of releases for `repository`.
    ///
    /// An empty vector signals that no further pages exist.
    fn list_releases(
        &self,
        repository: &str,
        page: u32,
    ) -> impl Future<Output = Result<Vec<ReleaseRecord,>, Error,>,> + Send;

    /// Fetches a single release together with its assets.
    fn release(
        &self,
        repository: &str,
        lookup: &ReleaseLookup,
    ) -> impl Future<Output = Result<ReleaseDetails, Error,>,> + Send;
}

#[derive(Debug, Serialize,)]
struct PageQuery
{
    page: u32,
}

/// [`ReleaseSource`] backed by the GitHub REST API.
#[derive(Debug, Clone,)]
pub struct GithubReleases
{
    client: Octocrab,
}

impl GithubReleases
{
    /// Builds an authenticated client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the client cannot be initialized.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use toolchain_matrix::{GithubReleases, GithubToken, ProcessEnvironment};
    ///
    /// # fn example() -> Result<(), toolchain_matrix::Error> {
    /// let token = GithubToken::from_environment(&ProcessEnvironment,)?;
    /// let releases = GithubReleases::new(&token,)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(token: &GithubToken,) -> Result<Self, Error,>
    {
        let client = Octocrab::builder().personal_token(token.expose(),).build().map_err(|e| {
            Error::configuration(format!("failed to initialize GitHub client: {e}"),)
        },)?;

        Ok(Self {
            client,
        },)
    }
}

impl ReleaseSource for GithubReleases
{
    async fn list_releases(
        &self,
        repository: &str,
        page: u32,
    ) -> Result<Vec<ReleaseRecord,>, Error,>
    {
        debug!("Requesting releases page {} of {}", page, repository);
        self.client
            .get(format!("/repos/{repository}/releases"), Some(&PageQuery {
                page,
            },),)
            .await
            .map_err(|e| Error::transport(repository, format!("page {page}: {e}"),),)
    }

    async fn release(
        &self,
        repository: &str,
        lookup: &ReleaseLookup,
    ) -> Result<ReleaseDetails, Error,>
    {
        let route = lookup.route(repository,);
        debug!("Requesting {}", route);
        self.client
            .get(route.as_str(), None::<&(),>,)
            .await
            .map_err(|e| Error::transport(repository, e.to_string(),),)
    }
}
