use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use podcurious_pipeline::Relay;
use podcurious_server::config::ServeArgs;
use podcurious_server::{app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "podcurious")]
#[command(about = "Podcast link analysis, chat and playlist relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[allow(clippy::large_enum_variant)]
enum Commands {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Diagnose configuration (json; no secrets).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    #[command(flatten)]
    serve: ServeArgs,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// `.env` is loaded unless `PODCURIOUS_DOTENV=0`; it never overrides the real environment.
fn load_dotenv() {
    let disabled = std::env::var("PODCURIOUS_DOTENV")
        .ok()
        .is_some_and(|v| matches!(v.trim(), "0" | "false"));
    if !disabled {
        dotenvy::dotenv().ok();
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = args.relay_config();
    if config.anthropic_api_key.is_none() {
        tracing::warn!("no ANTHROPIC_API_KEY set; model calls will fail");
    }
    if config.lookup_enabled() {
        tracing::info!("Listen Notes lookup enabled");
    } else {
        tracing::info!("no LISTEN_NOTES_KEY; Spotify lookup and playlist links disabled");
    }
    if !args.static_dir.is_dir() {
        tracing::warn!(static_dir = %args.static_dir.display(), "static directory not found");
    }

    let relay = Relay::from_config(config).context("building upstream clients")?;
    let router = app(AppState::new(relay, args.static_dir.clone()));

    let addr = args.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("podcurious listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}

fn doctor(args: DoctorCmd) {
    let t0 = std::time::Instant::now();
    let config = args.serve.relay_config();
    let static_ok = args.serve.static_dir.is_dir();
    let index_ok = args.serve.static_dir.join("index.html").is_file();
    let bind_ok = args.serve.bind_addr().is_ok();

    let checks = vec![
        serde_json::json!({
            "name": "anthropic_api_key",
            "ok": config.anthropic_api_key.is_some(),
            "hint": if config.anthropic_api_key.is_some() { "" } else { "set ANTHROPIC_API_KEY" },
        }),
        serde_json::json!({
            "name": "static_dir",
            "ok": static_ok,
            "hint": if static_ok { "" } else { "set PODCURIOUS_STATIC_DIR or --static-dir" },
        }),
        serde_json::json!({
            "name": "bind_addr",
            "ok": bind_ok,
            "hint": if bind_ok { "" } else { "check PODCURIOUS_HOST and PORT" },
        }),
    ];
    let ok = checks.iter().all(|c| c["ok"].as_bool().unwrap_or(false));
    let payload = serde_json::json!({
        "schema_version": 1,
        "kind": "doctor",
        "ok": ok,
        "name": "podcurious",
        "version": env!("CARGO_PKG_VERSION"),
        "elapsed_ms": t0.elapsed().as_millis(),
        "configured": {
            "anthropic": config.anthropic_api_key.is_some(),
            "listen_notes": config.lookup_enabled(),
            "model": config.model,
            "static_dir": args.serve.static_dir.to_string_lossy(),
            "static_index": index_ok,
            "enrich_concurrency": config.enrich_concurrency,
            "fetch_timeout_ms": config.fetch_timeout.as_millis(),
        },
        "checks": checks,
    });
    match args.output.to_ascii_lowercase().as_str() {
        "text" => {
            println!("podcurious {} (ok={})", env!("CARGO_PKG_VERSION"), ok);
            println!(
                "keys: anthropic={} listen_notes={}",
                config.anthropic_api_key.is_some(),
                config.lookup_enabled()
            );
            println!(
                "static_dir: {} (index.html={})",
                args.serve.static_dir.display(),
                index_ok
            );
            println!("checks:");
            for c in &checks {
                let name = c["name"].as_str().unwrap_or("?");
                let ok = c["ok"].as_bool().unwrap_or(false);
                println!("- {}: {}", name, if ok { "ok" } else { "fail" });
            }
        }
        _ => println!("{payload}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            init_tracing();
            serve(args).await?;
        }
        Commands::Doctor(args) => doctor(args),
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "podcurious",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("podcurious {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }
    Ok(())
}
