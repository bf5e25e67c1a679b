// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Access to process environment values consumed by the CLI.
///
/// The [`Environment`] trait lets the pipeline resolve the API token and the
/// GitHub Actions output path without touching global process state in tests.
use std::{collections::HashMap, fmt, path::PathBuf};

use crate::error::Error;

/// Variable holding the GitHub API token.
pub const TOKEN_VARIABLE: &str = "GITHUB_TOKEN";
/// Variable holding the path of the GitHub Actions step output file.
pub const OUTPUT_VARIABLE: &str = "GITHUB_OUTPUT";

/// Read-only view over environment variables.
pub trait Environment
{
    /// Returns the value of `key`, or `None` when it is unset.
    fn var(&self, key: &str,) -> Option<String,>;

    /// Returns the trimmed value of `key`, treating blank values as unset.
    fn non_empty(&self, key: &str,) -> Option<String,>
    {
        self.var(key,)
            .map(|value| value.trim().to_owned(),)
            .filter(|value| !value.is_empty(),)
    }

    /// Returns the value of `key` or a configuration error naming it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the variable is unset or blank.
    fn required(&self, key: &str,) -> Result<String, Error,>
    {
        self.non_empty(key,)
            .ok_or_else(|| Error::configuration(format!("environment variable {key} is not set"),),)
    }
}

/// [`Environment`] backed by the real process environment.
#[derive(Debug, Clone, Copy, Default,)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment
{
    fn var(&self, key: &str,) -> Option<String,>
    {
        std::env::var(key,).ok()
    }
}

/// [`Environment`] backed by a fixed map of values.
///
/// # Examples
///
/// ```
/// use toolchain_matrix::{Environment, StaticEnvironment};
///
/// let env = StaticEnvironment::from_iter([("GITHUB_TOKEN", "secret",)],);
/// assert_eq!(env.var("GITHUB_TOKEN").as_deref(), Some("secret"));
/// assert!(env.var("GITHUB_OUTPUT").is_none());
/// ```
#[derive(Debug, Clone, Default,)]
pub struct StaticEnvironment
{
    values: HashMap<String, String,>,
}

impl<K, V,> FromIterator<(K, V,),> for StaticEnvironment
where
    K: Into<String,>,
    V: Into<String,>,
{
    fn from_iter<I: IntoIterator<Item = (K, V,),>,>(iter: I,) -> Self
    {
        Self {
            values: iter.into_iter().map(|(key, value,)| (key.into(), value.into(),),).collect(),
        }
    }
}

impl Environment for StaticEnvironment
{
    fn var(&self, key: &str,) -> Option<String,>
    {
        self.values.get(key,).cloned()
    }
}

/// Bearer token used to authenticate release API requests.
///
/// The [`fmt::Debug`] implementation redacts the value so tokens never leak
/// into logs.
#[derive(Clone,)]
pub struct GithubToken(String,);

impl GithubToken
{
    /// Resolves the token from [`TOKEN_VARIABLE`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the variable is unset or blank.
    pub fn from_environment(env: &impl Environment,) -> Result<Self, Error,>
    {
        env.required(TOKEN_VARIABLE,).map(Self,)
    }

    /// Returns the raw token value.
    pub fn expose(&self,) -> &str
    {
        &self.0
    }
}

impl fmt::Debug for GithubToken
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str("GithubToken(***)",)
    }
}

/// Resolves the GitHub Actions output file from [`OUTPUT_VARIABLE`].
///
/// # Errors
///
/// Returns [`Error::Configuration`] when the variable is unset or blank.
pub fn output_path(env: &impl Environment,) -> Result<PathBuf, Error,>
{
    env.required(OUTPUT_VARIABLE,).map(PathBuf::from,)
}
