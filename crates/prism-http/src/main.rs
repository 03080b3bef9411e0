use clap::Parser;
use prism_core::ProblemDetail;
use prism_http::{create_instance, load_operations, load_request, HttpConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info_span, Instrument};
use tracing_subscriber::EnvFilter;

/// Run one request through the Prism pipeline and print the result.
#[derive(Parser, Debug)]
#[command(name = "prism-http", version)]
struct Args {
    /// YAML or JSON list of resolved operations
    #[arg(short, long)]
    operations: PathBuf,
    /// JSON or YAML request to process
    #[arg(short, long)]
    request: PathBuf,
    /// Optional HttpConfig file; defaults to static mocking
    #[arg(short, long, env = "PRISM_CONFIG")]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.json_logs);

    let config = match &args.config {
        Some(path) => HttpConfig::from_file(path)?,
        None => HttpConfig::default(),
    };
    let operations = load_operations(&args.operations)?;
    let request = load_request(&args.request)?;

    let span = info_span!(
        "request",
        method = %request.method.to_uppercase(),
        path = %request.url.path
    );
    let prism = create_instance(config);
    let rendered = prism
        .process(request, &operations, None)
        .instrument(span)
        .await
        .and_then(|output| {
            serde_json::to_string_pretty(&output).map_err(|error| ProblemDetail::unknown(&error))
        });
    match rendered {
        Ok(envelope) => {
            println!("{envelope}");
            Ok(ExitCode::SUCCESS)
        }
        Err(problem) => {
            println!("{}", serde_json::to_string_pretty(&problem.to_problem_json())?);
            Ok(ExitCode::FAILURE)
        }
    }
}
