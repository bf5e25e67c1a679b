//! Configuration describing which release streams feed the build matrix.
//!
//! [`MatrixConfig::default`] reproduces the curated values used by the CI
//! workflow. An optional YAML document can override any subset of them; the
//! raw document keeps every field optional and is normalized into a validated
//! [`MatrixConfig`] before the pipeline runs.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{Error, config_io_error};

/// Repository publishing stable toolchain releases.
pub const STABLE_REPOSITORY: &str = "leanprover/lean4";
/// Repository publishing nightly toolchain releases.
pub const NIGHTLY_REPOSITORY: &str = "leanprover/lean4-nightly";
/// Prefix prepended to every fetched tag in the emitted matrix.
pub const TOOLCHAIN_NAMESPACE: &str = "leanprover/lean4:";

const KEEP_RECENT_RELEASES: usize = 30;
const KEEP_RECENT_NIGHTLY_RELEASES: usize = 10;
const STABLE_PREFIX: &str = "v";
const NIGHTLY_PREFIX: &str = "nightly";
const EXTRA_RELEASES: &[&str] = &["stable", "nightly"];
const SKIPPED_RELEASES: &[&str] = &[];

/// Selection rules for a single release stream.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct StreamConfig
{
    /// Repository in `owner/name` form.
    pub repository: String,
    /// Tags not starting with this prefix are dropped after truncation.
    pub prefix:     String,
    /// Retention count: how many of the most recent releases are considered.
    pub keep:       usize,
}

impl StreamConfig
{
    /// Stable stream defaults: 30 most recent `v*` tags of `leanprover/lean4`.
    pub fn stable() -> Self
    {
        Self {
            repository: STABLE_REPOSITORY.to_owned(),
            prefix:     STABLE_PREFIX.to_owned(),
            keep:       KEEP_RECENT_RELEASES,
        }
    }

    /// Nightly stream defaults: 10 most recent `nightly*` tags of
    /// `leanprover/lean4-nightly`.
    pub fn nightly() -> Self
    {
        Self {
            repository: NIGHTLY_REPOSITORY.to_owned(),
            prefix:     NIGHTLY_PREFIX.to_owned(),
            keep:       KEEP_RECENT_NIGHTLY_RELEASES,
        }
    }

    /// Returns `true` when `tag` belongs to this stream.
    pub fn matches(&self, tag: &str,) -> bool
    {
        tag.starts_with(self.prefix.as_str(),)
    }
}

/// Complete configuration injected into the discovery pipeline.
///
/// # Examples
///
/// ```
/// use toolchain_matrix::MatrixConfig;
///
/// let config = MatrixConfig::default();
/// assert_eq!(config.stable.keep, 30);
/// assert_eq!(config.nightly.prefix, "nightly");
/// assert!(config.skip.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct MatrixConfig
{
    /// Stable release stream.
    pub stable:    StreamConfig,
    /// Nightly release stream.
    pub nightly:   StreamConfig,
    /// Prefix applied to fetched tags; extra and skip entries are used
    /// verbatim.
    pub namespace: String,
    /// Tags always included in the matrix unless skipped.
    pub extra:     Vec<String,>,
    /// Tags never included in the matrix.
    pub skip:      Vec<String,>,
}

impl Default for MatrixConfig
{
    fn default() -> Self
    {
        Self {
            stable:    StreamConfig::stable(),
            nightly:   StreamConfig::nightly(),
            namespace: TOOLCHAIN_NAMESPACE.to_owned(),
            extra:     EXTRA_RELEASES.iter().map(|tag| (*tag).to_owned(),).collect(),
            skip:      SKIPPED_RELEASES.iter().map(|tag| (*tag).to_owned(),).collect(),
        }
    }
}

impl MatrixConfig
{
    /// Prefixes a fetched tag with the configured namespace.
    pub fn qualify(&self, tag: &str,) -> String
    {
        format!("{}{tag}", self.namespace)
    }
}

/// Raw YAML document. Every field is optional and falls back to the defaults.
#[derive(Debug, Default, Deserialize,)]
#[serde(deny_unknown_fields)]
struct ConfigDocument
{
    #[serde(default)]
    stable:    Option<StreamDocument,>,
    #[serde(default)]
    nightly:   Option<StreamDocument,>,
    #[serde(default)]
    namespace: Option<String,>,
    #[serde(default, alias = "extra_releases")]
    extra:     Option<Vec<String,>,>,
    #[serde(default, alias = "skipped_releases")]
    skip:      Option<Vec<String,>,>,
}

#[derive(Debug, Default, Deserialize,)]
#[serde(deny_unknown_fields)]
struct StreamDocument
{
    #[serde(default, alias = "repo")]
    repository: Option<String,>,
    #[serde(default)]
    prefix:     Option<String,>,
    #[serde(default, alias = "keep_recent")]
    keep:       Option<usize,>,
}

/// Reads and normalizes a YAML configuration document from disk.
///
/// # Errors
///
/// Returns [`Error::ConfigIo`] when the file cannot be read, [`Error::Parse`]
/// for malformed YAML and [`Error::Configuration`] when a value is invalid.
pub fn load_config(path: &Path,) -> Result<MatrixConfig, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| config_io_error(path, source,),)?;
    parse_config(&contents,)
}

/// Parses a YAML configuration document and merges it over the defaults.
///
/// An empty document yields [`MatrixConfig::default`].
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed YAML or unknown fields and
/// [`Error::Configuration`] when a value violates an invariant.
///
/// # Examples
///
/// ```
/// use toolchain_matrix::parse_config;
///
/// let config = parse_config("nightly:\n  keep: 3\nskip: [stable]\n",)?;
/// assert_eq!(config.nightly.keep, 3);
/// assert_eq!(config.nightly.repository, "leanprover/lean4-nightly");
/// assert_eq!(config.skip, vec!["stable".to_owned()]);
/// # Ok::<(), toolchain_matrix::Error>(())
/// ```
pub fn parse_config(yaml: &str,) -> Result<MatrixConfig, Error,>
{
    let document: ConfigDocument =
        if yaml.trim().is_empty() { ConfigDocument::default() } else { serde_yaml::from_str(yaml,)? };

    let defaults = MatrixConfig::default();
    let stable = merge_stream("stable", document.stable, defaults.stable,)?;
    let nightly = merge_stream("nightly", document.nightly, defaults.nightly,)?;

    let namespace = match document.namespace {
        Some(value,) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(Error::configuration("namespace cannot be empty",),);
            }
            trimmed.to_owned()
        }
        None => defaults.namespace,
    };

    let extra = document.extra.map(|tags| normalize_tags("extra", tags,),).transpose()?;
    let skip = document.skip.map(|tags| normalize_tags("skip", tags,),).transpose()?;

    Ok(MatrixConfig {
        stable,
        nightly,
        namespace,
        extra: extra.unwrap_or(defaults.extra,),
        skip: skip.unwrap_or(defaults.skip,),
    },)
}

fn merge_stream(
    name: &str,
    document: Option<StreamDocument,>,
    defaults: StreamConfig,
) -> Result<StreamConfig, Error,>
{
    let Some(document,) = document else {
        return Ok(defaults,);
    };

    let repository = match document.repository {
        Some(value,) => {
            let trimmed = value.trim();
            let valid = trimmed
                .split_once('/',)
                .is_some_and(|(owner, repo,)| !owner.is_empty() && !repo.is_empty(),);
            if !valid {
                return Err(Error::configuration(format!(
                    "{name}.repository must use the owner/name form, got {value:?}"
                ),),);
            }
            trimmed.to_owned()
        }
        None => defaults.repository,
    };

    let prefix = match document.prefix {
        Some(value,) if value.is_empty() => {
            return Err(Error::configuration(format!("{name}.prefix cannot be empty"),),);
        }
        Some(value,) => value,
        None => defaults.prefix,
    };

    let keep = match document.keep {
        Some(0,) => {
            return Err(Error::configuration(format!("{name}.keep must be greater than zero"),),);
        }
        Some(value,) => value,
        None => defaults.keep,
    };

    Ok(StreamConfig {
        repository,
        prefix,
        keep,
    },)
}

fn normalize_tags(list: &str, tags: Vec<String,>,) -> Result<Vec<String,>, Error,>
{
    let mut normalized = Vec::with_capacity(tags.len(),);
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(Error::configuration(format!("{list} entries cannot be empty strings"),),);
        }
        normalized.push(trimmed.to_owned(),);
    }
    Ok(normalized,)
}
