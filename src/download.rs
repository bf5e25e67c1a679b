// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Downloads the Linux archive of a single toolchain release.
///
/// Resolves a matrix entry (`stable`, `nightly`, a bare tag or a namespaced
/// `leanprover/lean4:<tag>`) to a release, picks the archive built for the
/// host architecture and streams it to disk.
use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, info};

use crate::{
    config::{NIGHTLY_REPOSITORY, STABLE_REPOSITORY, TOOLCHAIN_NAMESPACE},
    env::GithubToken,
    error::{Error, output_error},
    release::fetch_release_tags,
    source::{ReleaseAsset, ReleaseDetails, ReleaseLookup, ReleaseSource},
};

const ARCHIVE_EXTENSION: &str = r"\.tar\.\w+$";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Maps an operating system and architecture to the asset name suffix used
/// by toolchain releases.
///
/// Architecture names follow [`std::env::consts::ARCH`]; `x64` and `arm64`
/// are accepted as aliases.
///
/// # Errors
///
/// Returns [`Error::Validation`] for non-Linux systems and unsupported
/// architectures.
///
/// # Examples
///
/// ```
/// use toolchain_matrix::asset_suffix;
///
/// assert_eq!(asset_suffix("linux", "x86_64",)?, "linux");
/// assert_eq!(asset_suffix("linux", "aarch64",)?, "linux_aarch64");
/// assert!(asset_suffix("macos", "x86_64",).is_err());
/// # Ok::<(), toolchain_matrix::Error>(())
/// ```
pub fn asset_suffix(os: &str, arch: &str,) -> Result<&'static str, Error,>
{
    if os != "linux" {
        return Err(Error::validation(format!("only Linux is supported, got {os}"),),);
    }

    match arch {
        "x86" => Ok("linux_x86",),
        "x86_64" | "x64" => Ok("linux",),
        "aarch64" | "arm64" => Ok("linux_aarch64",),
        other => Err(Error::validation(format!("unsupported architecture: {other}"),),),
    }
}

/// Strips the toolchain namespace from a matrix entry.
pub fn normalize_tag(tag: &str,) -> &str
{
    let trimmed = tag.trim();
    trimmed.strip_prefix(TOOLCHAIN_NAMESPACE,).unwrap_or(trimmed,)
}

/// Returns the repository publishing `tag`.
pub fn repository_for(tag: &str,) -> &'static str
{
    if tag.starts_with("nightly",) { NIGHTLY_REPOSITORY } else { STABLE_REPOSITORY }
}

/// Resolves a toolchain tag to its release.
///
/// `stable` maps to the latest stable release and `nightly` to the most
/// recently published nightly; anything else is looked up by tag.
///
/// # Errors
///
/// Propagates API errors and returns [`Error::Validation`] when no nightly
/// release exists.
pub async fn resolve_release<S,>(source: &S, tag: &str,) -> Result<ReleaseDetails, Error,>
where
    S: ReleaseSource,
{
    let tag = normalize_tag(tag,);
    let repository = repository_for(tag,);

    let lookup = match tag {
        "stable" => ReleaseLookup::Latest,
        "nightly" => {
            let latest = fetch_release_tags(source, repository, Some(1,),).await?;
            let newest = latest
                .into_iter()
                .next()
                .ok_or_else(|| Error::validation(format!("no releases published in {repository}"),),)?;
            debug!("Resolved nightly to {}", newest);
            ReleaseLookup::Tag(newest,)
        }
        other => ReleaseLookup::Tag(other.to_owned(),),
    };

    source.release(repository, &lookup,).await
}

/// Picks the archive asset whose name ends in `<suffix>.tar.<ext>`.
///
/// The suffix must sit directly before the archive extension, so `linux`
/// does not match `linux_aarch64` archives.
///
/// # Errors
///
/// Returns [`Error::Validation`] when no asset matches.
pub fn select_asset<'a,>(
    release: &'a ReleaseDetails,
    suffix: &str,
) -> Result<&'a ReleaseAsset, Error,>
{
    let archive = Regex::new(&format!("{}{ARCHIVE_EXTENSION}", regex::escape(suffix)),)
        .map_err(|e| Error::validation(format!("invalid archive pattern: {e}"),),)?;

    release
        .assets
        .iter()
        .find(|asset| archive.is_match(&asset.name,),)
        .ok_or_else(|| {
            Error::validation(format!(
                "failed to find asset for {suffix} in {}",
                release.tag_name
            ),)
        },)
}

/// Streams `asset` into `output_dir`, returning the written path.
///
/// # Errors
///
/// Returns [`Error::Transport`] when the download fails and [`Error::Output`]
/// when the file cannot be written.
pub async fn download_asset(
    asset: &ReleaseAsset,
    output_dir: &Path,
    token: &GithubToken,
) -> Result<PathBuf, Error,>
{
    let url = asset.browser_download_url.as_str();
    let started = Instant::now();

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT,)
        .build()
        .map_err(|e| Error::configuration(format!("failed to initialize HTTP client: {e}"),),)?;

    let mut response = client
        .get(url,)
        .bearer_auth(token.expose(),)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status,)
        .map_err(|e| Error::transport(url, e.to_string(),),)?;

    let length = response.content_length().unwrap_or(asset.size,);
    let pb = ProgressBar::new(length,);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {bytes}/{total_bytes} {msg}",)
            .unwrap_or_else(|_| ProgressStyle::default_bar(),),
    );
    pb.set_message(asset.name.clone(),);

    let (path, mut file,) = create_destination(output_dir, &asset.name,).await?;

    let mut written = 0u64;
    while let Some(chunk,) =
        response.chunk().await.map_err(|e| Error::transport(url, e.to_string(),),)?
    {
        file.write_all(&chunk,).await.map_err(|source| output_error(&path, source,),)?;
        written += chunk.len() as u64;
        pb.inc(chunk.len() as u64,);
    }
    file.flush().await.map_err(|source| output_error(&path, source,),)?;
    pb.finish_and_clear();

    info!("Downloaded {} ({} bytes) in {}ms", url, written, started.elapsed().as_millis());

    Ok(path,)
}

async fn create_destination(output_dir: &Path, name: &str,) -> Result<(PathBuf, File,), Error,>
{
    let path = output_dir.join(name,);
    let file = File::create(&path,).await.map_err(|source| output_error(&path, source,),)?;
    Ok((path, file,),)
}

/// Resolves `tag`, selects the archive for `arch` and downloads it.
///
/// # Errors
///
/// Propagates resolution, selection and download errors.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use toolchain_matrix::{GithubReleases, GithubToken, ProcessEnvironment, download_toolchain};
///
/// # async fn example() -> Result<(), toolchain_matrix::Error> {
/// let token = GithubToken::from_environment(&ProcessEnvironment,)?;
/// let source = GithubReleases::new(&token,)?;
/// let path = download_toolchain(&source, &token, "stable", Path::new("."), None,).await?;
/// println!("{}", path.display());
/// # Ok(())
/// # }
/// ```
pub async fn download_toolchain<S,>(
    source: &S,
    token: &GithubToken,
    tag: &str,
    output_dir: &Path,
    arch: Option<&str,>,
) -> Result<PathBuf, Error,>
where
    S: ReleaseSource,
{
    let suffix = asset_suffix(std::env::consts::OS, arch.unwrap_or(std::env::consts::ARCH,),)?;
    let release = resolve_release(source, tag,).await?;
    let asset = select_asset(&release, suffix,)?;
    info!("Found asset {} for {} in {}", asset.name, suffix, release.tag_name);

    download_asset(asset, output_dir, token,).await
}
