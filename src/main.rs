//! Codestream command line
//!
//! Streams generated code for a prompt to stdout:
//!
//! ```text
//! codestream <vendor/model> <prompt...> [--sse] [--keep-fences]
//! ```

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use tokio::io::{AsyncWriteExt, Stdout};
use tracing::{error, info};

use codestream::streaming::{sse, strip_fence_stream};
use codestream::{ChatCompletionRequest, Config, Message, ProviderRegistry};

const USAGE: &str = "usage: codestream <vendor/model> <prompt...> [--sse] [--keep-fences]";

struct Args {
    model: String,
    prompt: String,
    sse: bool,
    keep_fences: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Args> {
    let mut positional = Vec::new();
    let mut sse = false;
    let mut keep_fences = false;

    for arg in args {
        match arg.as_str() {
            "--sse" => sse = true,
            "--keep-fences" => keep_fences = true,
            "-h" | "--help" => bail!(USAGE),
            flag if flag.starts_with("--") => bail!("unknown flag {}\n{}", flag, USAGE),
            _ => positional.push(arg),
        }
    }

    if positional.len() < 2 {
        bail!(USAGE);
    }
    let model = positional.remove(0);
    Ok(Args {
        model,
        prompt: positional.join(" "),
        sse,
        keep_fences,
    })
}

async fn write(stdout: &mut Stdout, bytes: &[u8]) -> Result<()> {
    stdout.write_all(bytes).await?;
    stdout.flush().await.context("Failed to flush stdout")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only generated code
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "codestream=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if std::env::var("CODESTREAM_LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }

    let args = parse_args(std::env::args().skip(1))?;

    let config = Config::from_env()?;
    codestream::metrics::describe_metrics();
    let registry = ProviderRegistry::new(config).context("Failed to build HTTP client")?;

    let request = ChatCompletionRequest::new(args.model.clone(), vec![Message::user(args.prompt)]);
    let resolved = registry.resolve(&args.model)?;
    info!(vendor = %resolved.vendor, model = %resolved.model, "Generating");

    let mut fragments = resolved.provider.submit(&request).await?;
    if !args.keep_fences {
        fragments = strip_fence_stream(fragments);
    }

    let mut stdout = tokio::io::stdout();
    while let Some(item) = fragments.next().await {
        match item {
            Ok(fragment) if args.sse => write(&mut stdout, &sse::format_fragment(&fragment)).await?,
            Ok(fragment) => write(&mut stdout, fragment.as_bytes()).await?,
            Err(e) => {
                error!(error = %e, "Generation failed");
                if args.sse {
                    write(&mut stdout, &sse::format_error_event(&e)).await?;
                }
                return Err(e.into());
            }
        }
    }

    if args.sse {
        write(&mut stdout, &sse::format_done()).await?;
    } else {
        write(&mut stdout, b"\n").await?;
    }
    Ok(())
}
