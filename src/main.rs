//! Command-line interface for the toolchain-matrix binary.
//!
//! Without a subcommand the CLI discovers recent toolchains and appends the
//! build matrix to the GitHub Actions output file. The `download` subcommand
//! fetches the Linux archive of a single toolchain.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

use clap::{Args, Parser, Subcommand};
use toolchain_matrix::{
    BuildMatrix, Error, GithubReleases, GithubToken, MatrixConfig, ProcessEnvironment,
    download_toolchain, load_config, output_error, run_discovery,
};
use tracing_subscriber::EnvFilter;

/// Command line interface for discovering toolchain build matrices.
#[derive(Debug, Parser,)]
#[command(name = "toolchain-matrix", version, about = "Emit recent Lean 4 toolchains as a CI matrix")]
struct Cli
{
    #[command(subcommand)]
    command: Option<Command,>,

    /// Discovery options used when no subcommand is given.
    #[command(flatten)]
    discover: DiscoverArgs,
}

#[derive(Debug, Subcommand,)]
/// Supported commands exposed by the CLI.
enum Command
{
    /// Discover recent toolchains and append the matrix to `GITHUB_OUTPUT`.
    Discover(DiscoverArgs,),
    /// Download the Linux archive of a toolchain release.
    Download(DownloadArgs,),
}

/// Arguments accepted by the `discover` subcommand.
#[derive(Debug, Args, Default,)]
struct DiscoverArgs
{
    /// Optional YAML document overriding the built-in stream configuration.
    #[arg(long = "config", value_name = "PATH", env = "TOOLCHAIN_MATRIX_CONFIG")]
    config: Option<PathBuf,>,
}

#[derive(Debug, Args,)]
struct DownloadArgs
{
    /// Toolchain to download: `stable`, `nightly` or a release tag.
    #[arg(value_name = "TAG")]
    tag: String,

    /// Directory receiving the archive.
    #[arg(value_name = "OUTPUT_DIR", default_value = ".")]
    output: PathBuf,

    /// Architecture override; defaults to the host architecture.
    #[arg(long = "arch", value_name = "ARCH")]
    arch: Option<String,>,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main(flavor = "current_thread")]
async fn main()
{
    init_tracing();

    if let Err(error,) = run(Cli::parse(),).await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),);
    tracing_subscriber::fmt().with_env_filter(filter,).with_writer(io::stderr,).init();
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates configuration, API and output errors.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    match cli.command {
        Some(Command::Discover(args,),) => run_discover(&args,).await,
        Some(Command::Download(args,),) => run_download(args,).await,
        None => run_discover(&cli.discover,).await,
    }
}

fn resolve_config(path: Option<&Path,>,) -> Result<MatrixConfig, Error,>
{
    match path {
        Some(path,) => load_config(path,),
        None => Ok(MatrixConfig::default(),),
    }
}

async fn run_discover(args: &DiscoverArgs,) -> Result<(), Error,>
{
    let config = resolve_config(args.config.as_deref(),)?;
    let env = ProcessEnvironment;
    let token = GithubToken::from_environment(&env,)?;
    let source = GithubReleases::new(&token,)?;

    let matrix = run_discovery(&source, &env, &config,).await?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_matrix(&mut handle, &matrix,)
}

fn write_matrix<W: Write,>(writer: &mut W, matrix: &BuildMatrix,) -> Result<(), Error,>
{
    serde_json::to_writer(&mut *writer, matrix,)?;
    writeln!(writer).map_err(|source| output_error(Path::new("<stdout>",), source,),)
}

async fn run_download(args: DownloadArgs,) -> Result<(), Error,>
{
    let token = GithubToken::from_environment(&ProcessEnvironment,)?;
    let source = GithubReleases::new(&token,)?;

    let path =
        download_toolchain(&source, &token, &args.tag, &args.output, args.arch.as_deref(),).await?;
    println!("{}", path.display());

    Ok((),)
}

#[cfg(test)]
mod tests
{
    use std::{fs, io::Cursor, path::Path};

    use clap::Parser;
    use tempfile::tempdir;
    use toolchain_matrix::BuildMatrix;

    use super::{Cli, Command, resolve_config, write_matrix};

    #[test]
    fn matrix_is_printed_as_complete_line()
    {
        let matrix = BuildMatrix {
            toolchain: vec!["stable".to_owned(), "leanprover/lean4:v4.9.0".to_owned()],
        };
        let mut buffer = Cursor::new(Vec::new(),);
        write_matrix(&mut buffer, &matrix,).expect("failed to write matrix",);

        let output = String::from_utf8(buffer.into_inner(),).expect("invalid UTF-8",);
        assert_eq!(output, "{\"toolchain\":[\"stable\",\"leanprover/lean4:v4.9.0\"]}\n");
    }

    #[test]
    fn cli_accepts_bare_invocation()
    {
        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME")],).expect("failed to parse CLI",);
        assert!(cli.command.is_none());
    }

    #[test]
    fn discover_subcommand_accepts_config()
    {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "discover",
            "--config",
            "matrix.yaml",
        ],)
        .expect("failed to parse CLI",);

        match cli.command.expect("missing command",) {
            Command::Discover(args,) => {
                assert_eq!(args.config.as_deref(), Some(Path::new("matrix.yaml")));
            }
            other => panic!("unexpected command variant: {other:?}"),
        }
    }

    #[test]
    fn download_defaults_to_current_directory()
    {
        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "download", "stable"],)
            .expect("failed to parse CLI",);

        match cli.command.expect("missing command",) {
            Command::Download(args,) => {
                assert_eq!(args.tag, "stable");
                assert_eq!(args.output, Path::new("."));
                assert!(args.arch.is_none());
            }
            other => panic!("unexpected command variant: {other:?}"),
        }
    }

    #[test]
    fn download_requires_tag()
    {
        assert!(Cli::try_parse_from([env!("CARGO_PKG_NAME"), "download"],).is_err());
    }

    #[test]
    fn resolve_config_falls_back_to_defaults()
    {
        let config = resolve_config(None,).expect("defaults",);
        assert_eq!(config.stable.keep, 30);
    }

    #[test]
    fn resolve_config_reads_file()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("matrix.yaml",);
        fs::write(&path, "stable:\n  keep: 12\n",).expect("failed to write config",);

        let config = resolve_config(Some(&path,),).expect("valid config",);
        assert_eq!(config.stable.keep, 12);
    }
}
