//! Assembly of the GitHub Actions build matrix.
//!
//! Selected stream tags are namespaced, merged with the curated extra list and
//! filtered through the skip list. The merge is computed as
//! `(qualified ∪ extra) − skip`: a skipped tag never reaches the output, no
//! matter which source contributed it. The result is sorted in descending
//! lexical order so identical inputs always serialize to identical bytes.

use std::{
    collections::BTreeSet,
    fs::OpenOptions,
    io::Write,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    config::MatrixConfig,
    error::{Error, output_error},
};

/// Output key under which GitHub Actions exposes the matrix.
pub const MATRIX_OUTPUT_KEY: &str = "matrix";

/// Build matrix consumed by `strategy.matrix` in a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct BuildMatrix
{
    /// Toolchains to spawn one job each for.
    pub toolchain: Vec<String,>,
}

impl BuildMatrix
{
    /// Encodes the matrix as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] when encoding fails.
    pub fn to_json(&self,) -> Result<String, Error,>
    {
        Ok(serde_json::to_string(self,)?,)
    }

    /// Renders the `matrix=<json>` line expected by the step output file,
    /// including the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] when encoding fails.
    pub fn output_line(&self,) -> Result<String, Error,>
    {
        Ok(format!("{MATRIX_OUTPUT_KEY}={}\n", self.to_json()?),)
    }
}

/// Merges the selected stream tags with the curated lists.
///
/// # Examples
///
/// ```
/// use toolchain_matrix::{MatrixConfig, assemble_matrix};
///
/// let config = MatrixConfig {
///     extra: vec!["stable".to_owned()],
///     skip: vec!["leanprover/lean4:v4.0.0".to_owned()],
///     ..MatrixConfig::default()
/// };
/// let stable = vec!["v4.9.0".to_owned(), "v4.0.0".to_owned()];
/// let matrix = assemble_matrix(&config, &stable, &[],);
/// assert_eq!(matrix.toolchain, vec!["stable", "leanprover/lean4:v4.9.0"]);
/// ```
pub fn assemble_matrix(config: &MatrixConfig, stable: &[String], nightly: &[String],) -> BuildMatrix
{
    let mut toolchains: BTreeSet<String,> =
        stable.iter().chain(nightly,).map(|tag| config.qualify(tag,),).collect();
    toolchains.extend(config.extra.iter().cloned(),);

    for skipped in &config.skip {
        toolchains.remove(skipped,);
    }

    BuildMatrix {
        toolchain: toolchains.into_iter().rev().collect(),
    }
}

/// Appends the matrix line to the step output file at `path`.
///
/// The file is created when missing and never truncated.
///
/// # Errors
///
/// Returns [`Error::Output`] when the file cannot be opened or written, and
/// [`Error::Serialize`] when encoding fails.
pub fn append_output(path: &Path, matrix: &BuildMatrix,) -> Result<(), Error,>
{
    let line = matrix.output_line()?;

    let mut file = OpenOptions::new()
        .create(true,)
        .append(true,)
        .open(path,)
        .map_err(|source| output_error(path, source,),)?;

    file.write_all(line.as_bytes(),).map_err(|source| output_error(path, source,),)?;
    file.flush().map_err(|source| output_error(path, source,),)
}
