//! Discovery of recent Lean 4 toolchain releases for CI build matrices.
//!
//! The library fetches the stable and nightly release streams from GitHub,
//! keeps a bounded window of the most recently published tags from each,
//! merges them with curated include and exclude lists and renders the result
//! as a GitHub Actions matrix. Network and environment access sit behind the
//! [`ReleaseSource`] and [`Environment`] traits so every stage can be driven
//! with synthetic inputs.

mod config;
mod download;
mod env;
mod error;
mod matrix;
mod pipeline;
mod release;
mod source;

pub use config::{
    MatrixConfig, NIGHTLY_REPOSITORY, STABLE_REPOSITORY, StreamConfig, TOOLCHAIN_NAMESPACE,
    load_config, parse_config,
};
pub use download::{
    asset_suffix, download_asset, download_toolchain, normalize_tag, repository_for,
    resolve_release, select_asset,
};
pub use env::{
    Environment, GithubToken, OUTPUT_VARIABLE, ProcessEnvironment, StaticEnvironment,
    TOKEN_VARIABLE, output_path,
};
pub use error::{Error, config_io_error, output_error};
pub use matrix::{BuildMatrix, MATRIX_OUTPUT_KEY, append_output, assemble_matrix};
pub use pipeline::{discover_matrix, run_discovery};
pub use release::{fetch_release_tags, filter_by_prefix, most_recent, published_at, select_stream};
pub use source::{
    GithubReleases, ReleaseAsset, ReleaseDetails, ReleaseLookup, ReleaseRecord, ReleaseSource,
};
