use std::env;

use clap::Parser;
use tmsource::args::Args;
use tmsource::logging::{ensure_core_log_level_matches, init_tracing};
use tmsource::{
    FsLoader, RegisteredSources, SourceLocation, SourcePipeline, TmSourceError, TmSourceResult,
};
use tmsource_core::catalog::BuiltinCatalog;
use tmsource_core::descriptor::MapnikXmlRenderer;
use tokio::io::AsyncWriteExt as _;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn start(args: Args) -> TmSourceResult<()> {
    info!("Starting tmsource v{VERSION}");

    let location = SourceLocation::parse(&args.source)?;
    info!("Loading {}", location.document_path().display());

    let mut pipeline = SourcePipeline::new(location, &FsLoader, &BuiltinCatalog, &MapnikXmlRenderer);
    let ready = if args.env {
        pipeline.run_with_env(&subst::Env).await?
    } else {
        pipeline.run().await?
    };
    for warning in &ready.warnings {
        info!("Recovered: {warning}");
    }

    let output = if args.normalized {
        serde_yaml::to_string(&ready.document).map_err(TmSourceError::Serialize)?
    } else {
        ready.xml.clone()
    };
    if let Some(path) = args.output {
        tokio::fs::write(&path, output)
            .await
            .map_err(|e| TmSourceError::Write(e, path.clone()))?;
        info!("Wrote {}", path.display());
    } else {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(output.as_bytes())
            .await
            .and(stdout.flush().await)
            .map_err(|e| TmSourceError::Write(e, "<stdout>".into()))?;
    }

    let mut sources = RegisteredSources::default();
    ready.register(&mut sources);
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = ensure_core_log_level_matches(env::var("RUST_LOG").ok());
    init_tracing(&filter, env::var("TMSOURCE_FORMAT").ok());

    let args = Args::parse();
    if let Err(e) = start(args).await {
        // Ensure the message is printed, even if the logging is disabled
        if log::log_enabled!(log::Level::Error) {
            error!("{e}");
        } else {
            eprintln!("{e}");
        }
        std::process::exit(1);
    }
}
