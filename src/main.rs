//! # Grid Availability Entry Point
//!
//! Three ways to run the renderer:
//! - `render`: one-shot PNG from a JSON file, stdin or the built-in sample day
//! - `serve`: HTTP server with the REST endpoints and `/mcp`
//! - `mcp`: JSON-RPC tool server on stdin/stdout
//!
//! Logs always go to stderr so stdout stays clean for the stdio protocol.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use grid_image_lib::{
    config::Config,
    mcp::{self, McpService},
    request::{example_grid_data, GenerateImageRequest, GridData},
    server::{self, AppState},
    GridRenderer,
};

#[derive(Parser, Debug)]
#[command(name = "grid-availability", version)]
#[command(about = "Render a day of hourly electricity grid availability as a PNG card")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = grid_image_lib::config::CONFIG_FILE)]
    config: PathBuf,

    /// Log filter, e.g. `info` or `grid_image_lib=debug`
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one image to a file.
    Render(RenderArgs),
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Run the JSON-RPC tool server on stdio.
    Mcp,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// JSON input (`grid_data` object or full request), `-` for stdin.
    /// Without it the built-in sample day is rendered.
    input: Option<PathBuf>,

    /// Output PNG path.
    #[arg(default_value = "grid_availability.png")]
    output: PathBuf,

    /// Render the vertical 250x1024 layout.
    #[arg(long)]
    vertical: bool,
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Listen address, overrides host and port
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Listen host
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Listen port
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = Config::load_from_path(&cli.config);
    match cli.cmd {
        Command::Render(args) => cmd_render(args, &config),
        Command::Serve(args) => cmd_serve(args, config),
        Command::Mcp => cmd_mcp(&config),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn read_input(path: &Path) -> anyhow::Result<Value> {
    if path == Path::new("-") {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("read JSON from stdin")?;
        return serde_json::from_str(&raw).context("parse JSON from stdin");
    }
    let file = File::open(path).with_context(|| format!("open input '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse JSON from '{}'", path.display()))
}

/// Accept either a full request or a bare `grid_data` object.
fn to_request(value: Value) -> anyhow::Result<GenerateImageRequest> {
    if value.get("grid_data").is_some() {
        return Ok(GenerateImageRequest::from_value(value)?);
    }
    let grid_data: GridData =
        serde_json::from_value(value).context("input must be a JSON object")?;
    Ok(GenerateImageRequest {
        grid_data,
        ..GenerateImageRequest::default()
    })
}

fn cmd_render(args: RenderArgs, config: &Config) -> anyhow::Result<()> {
    let mut request = match &args.input {
        Some(path) => to_request(read_input(path)?)?,
        None => {
            warn!("No input given, rendering the built-in sample day");
            GenerateImageRequest {
                grid_data: example_grid_data(),
                ..GenerateImageRequest::default()
            }
        }
    };
    request.vertical |= args.vertical;

    let record = request.record()?;
    let orientation = request.orientation();
    let renderer = GridRenderer::from_config(config);
    let png = renderer
        .render_to_file(&record, orientation, &args.output)
        .with_context(|| format!("render to '{}'", args.output.display()))?;

    info!(
        path = %args.output.display(),
        bytes = png.len(),
        size = %orientation.size_label(),
        "Image saved"
    );
    println!("Image saved to: {}", args.output.display());
    Ok(())
}

fn listen_addr(args: &ServeArgs, config: &Config) -> anyhow::Result<SocketAddr> {
    if let Some(addr) = args.listen {
        return Ok(addr);
    }
    let mut server = config.server.clone();
    if let Some(host) = &args.host {
        server.host = host.clone();
    }
    if let Some(port) = args.port {
        server.port = port;
    }
    server
        .addr()
        .parse()
        .with_context(|| format!("invalid listen address '{}'", server.addr()))
}

fn cmd_serve(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let addr = listen_addr(&args, &config)?;
    let state = Arc::new(AppState::new(GridRenderer::from_config(&config)));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(state, addr))
}

fn cmd_mcp(config: &Config) -> anyhow::Result<()> {
    let renderer = Arc::new(GridRenderer::from_config(config));
    let service = Arc::new(McpService::new(renderer));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::serve_stdio(service))?;
    Ok(())
}
