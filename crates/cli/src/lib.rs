//! CLI for uploading benchstat results.
//!
//! This crate provides the `upload_benchmarks` command: read benchstat JSON,
//! attach run metadata, and post it to a Codespeed-style results service.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use clap::Parser;
use codespeed_upload_benchmarks::result::{DEFAULT_BRANCH, DEFAULT_ENVIRONMENT};
use codespeed_upload_benchmarks::{
    prepare_payload, upload, InputSource, ResultServer, RunMetadata, UploadOutcome,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Munge and POST benchstat json to a codespeed server.
#[derive(Parser, Debug)]
#[command(name = "upload_benchmarks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file from benchstat; standard input is read when omitted.
    #[arg(value_name = "JSON_FILE")]
    pub json: Option<PathBuf>,

    /// Project name on the results service.
    #[arg(short, long)]
    pub project: String,

    /// Base URL of the results service, without a trailing slash.
    #[arg(short, long, value_name = "CODESPEED_BASEPATH")]
    pub server: String,

    /// Commit the results were measured at.
    #[arg(short, long, value_name = "SHA")]
    pub revision: String,

    /// Branch name.
    #[arg(short, long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Environment name.
    #[arg(short, long, default_value = DEFAULT_ENVIRONMENT)]
    pub env: String,

    /// Print the payload instead of posting it.
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Metadata merged into every record of this run.
    pub fn metadata(&self) -> RunMetadata {
        RunMetadata::new(&self.project, &self.revision)
            .with_branch(&self.branch)
            .with_environment(&self.env)
    }

    /// Where to read benchstat output from.
    pub fn input(&self) -> InputSource {
        InputSource::from_arg(self.json.clone())
    }
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, including when the server answers with an
/// HTTP error status, or an error if the input is unusable or the server
/// cannot be reached.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = std::io::stdout();
    execute(&cli, &mut stdout.lock())
}

/// Execute a parsed command, writing user-facing output to `out`.
pub fn execute(cli: &Cli, out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>> {
    let input = cli.input();
    let meta = cli.metadata();

    info!(%input, project = %meta.project, commit = %meta.commitid, "loading benchmark results");
    let records = input.load()?;

    if cli.dry_run {
        let payload = prepare_payload(records, &meta)?;
        writeln!(out, "{payload}")?;
        return Ok(());
    }

    let server = ResultServer::new(&cli.server)?;
    match upload(records, &meta, &server)? {
        UploadOutcome::Accepted { body } => {
            writeln!(out, "Server ({}) response: {}\n", server.base_url(), body)?;
        }
        UploadOutcome::Rejected { error, body } => {
            writeln!(out, "{error}")?;
            writeln!(out, "{body}")?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE: &str = r#"[{"mean": 12.5, "config": "/tmp/bench.exe", "units": "ns/op"}]"#;

    fn sample_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("upload_benchmarks").chain(args.iter().copied()))
    }

    fn execute_blocking(cli: Cli) -> (String, Result<(), String>) {
        let mut out = Vec::new();
        let result = execute(&cli, &mut out).map_err(|e| e.to_string());
        (String::from_utf8(out).unwrap(), result)
    }

    #[test]
    fn test_defaults_and_metadata() {
        let cli = parse(&["-p", "demo", "-s", "http://host", "-r", "abc123"]).unwrap();

        assert_eq!(cli.json, None);
        assert_eq!(cli.input(), InputSource::Stdin);
        assert_eq!(cli.metadata(), RunMetadata::new("demo", "abc123"));
    }

    #[test]
    fn test_long_flags_and_positional() {
        let cli = parse(&[
            "results.json",
            "--project",
            "demo",
            "--server",
            "http://host",
            "--revision",
            "abc123",
            "--branch",
            "main",
            "--env",
            "ci-box",
        ])
        .unwrap();

        assert_eq!(cli.input(), InputSource::File(PathBuf::from("results.json")));
        let meta = cli.metadata();
        assert_eq!(meta.branch, "main");
        assert_eq!(meta.environment, "ci-box");
    }

    #[test]
    fn test_missing_required_flag_is_a_usage_error() {
        let err = parse(&["-p", "demo", "-s", "http://host"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_flags_are_not_read_from_environment() {
        std::env::set_var("CODESPEED_REVISION", "from-env");
        std::env::set_var("CODESPEED_BRANCH", "from-env");

        let err = parse(&["-p", "demo", "-s", "http://host"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = parse(&["-p", "demo", "-s", "http://host", "-r", "abc123"]).unwrap();
        assert_eq!(cli.metadata().branch, DEFAULT_BRANCH);
    }

    #[test]
    fn test_dry_run_prints_payload() {
        let file = sample_file();
        let path = file.path().to_str().unwrap();
        let cli = parse(&[path, "-p", "demo", "-s", "http://127.0.0.1:1", "-r", "abc123", "--dry-run"])
            .unwrap();

        let (out, result) = execute_blocking(cli);
        result.unwrap();

        let payload: Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(payload[0]["units_title"], "Time");
        assert_eq!(payload[0]["environment"], "default");
    }

    #[test]
    fn test_missing_input_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let cli = parse(&[missing.to_str().unwrap(), "-p", "demo", "-s", "http://host", "-r", "abc123"])
            .unwrap();

        let (out, result) = execute_blocking(cli);
        assert!(out.is_empty());
        assert!(result.unwrap_err().contains("absent.json"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upload_prints_server_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/result/add/json/"))
            .respond_with(ResponseTemplate::new(202).set_body_string("saved"))
            .expect(1)
            .mount(&server)
            .await;

        let file = sample_file();
        let cli = parse(&[
            file.path().to_str().unwrap(),
            "-p",
            "demo",
            "-s",
            &server.uri(),
            "-r",
            "abc123",
        ])
        .unwrap();

        let (out, result) = tokio::task::spawn_blocking(move || execute_blocking(cli))
            .await
            .unwrap();
        result.unwrap();
        assert_eq!(out, format!("Server ({}) response: saved\n\n", server.uri()));

        let requests = server.received_requests().await.unwrap();
        let (field, payload) = url::form_urlencoded::parse(&requests[0].body)
            .into_owned()
            .next()
            .unwrap();
        assert_eq!(field, "json");
        let sent: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(
            sent,
            json!([{
                "result_value": 12.5,
                "executable": "bench.exe",
                "units": "ns/op",
                "units_title": "Time",
                "commitid": "abc123",
                "project": "demo",
                "branch": "default",
                "environment": "default",
            }])
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_http_error_is_printed_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database is locked"))
            .mount(&server)
            .await;

        let file = sample_file();
        let cli = parse(&[
            file.path().to_str().unwrap(),
            "-p",
            "demo",
            "-s",
            &server.uri(),
            "-r",
            "abc123",
        ])
        .unwrap();

        let (out, result) = tokio::task::spawn_blocking(move || execute_blocking(cli))
            .await
            .unwrap();
        result.unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("500"));
        assert_eq!(lines[1], "database is locked");
    }
}
