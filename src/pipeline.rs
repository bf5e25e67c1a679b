// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// End-to-end discovery: fetch both streams, assemble, publish.
use tracing::info;

use crate::{
    config::MatrixConfig,
    env::{Environment, output_path},
    error::Error,
    matrix::{BuildMatrix, append_output, assemble_matrix},
    release::select_stream,
    source::ReleaseSource,
};

/// Selects the stable and nightly windows and assembles the build matrix.
///
/// Streams are fetched one after the other; the nightly stream is only
/// requested once the stable stream completed.
///
/// # Errors
///
/// Propagates fetch errors from either stream.
pub async fn discover_matrix<S,>(source: &S, config: &MatrixConfig,) -> Result<BuildMatrix, Error,>
where
    S: ReleaseSource,
{
    let stable = select_stream(source, &config.stable,).await?;
    info!("Following toolchain releases will be used: {:?}", stable);

    let nightly = select_stream(source, &config.nightly,).await?;
    info!("Following nightly toolchain releases will be used: {:?}", nightly);

    Ok(assemble_matrix(config, &stable, &nightly,),)
}

/// Runs discovery and appends the result to the GitHub Actions output file.
///
/// The output path is resolved before any request is made, and the file is
/// only opened after every fetch succeeded, so a failed run never leaves a
/// partial `matrix=` line behind.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when `GITHUB_OUTPUT` is unset, and
/// propagates fetch and output errors.
///
/// # Example
///
/// ```no_run
/// use toolchain_matrix::{
///     GithubReleases, GithubToken, MatrixConfig, ProcessEnvironment, run_discovery,
/// };
///
/// # async fn example() -> Result<(), toolchain_matrix::Error> {
/// let env = ProcessEnvironment;
/// let source = GithubReleases::new(&GithubToken::from_environment(&env,)?,)?;
/// let matrix = run_discovery(&source, &env, &MatrixConfig::default(),).await?;
/// println!("{} toolchains", matrix.toolchain.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_discovery<S, E,>(
    source: &S,
    env: &E,
    config: &MatrixConfig,
) -> Result<BuildMatrix, Error,>
where
    S: ReleaseSource,
    E: Environment,
{
    let path = output_path(env,)?;
    let matrix = discover_matrix(source, config,).await?;

    append_output(&path, &matrix,)?;
    info!("Wrote {} toolchains to {}", matrix.toolchain.len(), path.display());

    Ok(matrix,)
}
