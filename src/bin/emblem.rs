use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use emblem_renderer::{
    CompositionEngine, DRAW_ROUTE, DrawRequest, EmblemConfiguration, EngineSettings, Orientation,
    encode_png, handle_draw,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "emblem", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a configuration JSON file to a PNG.
    Render(RenderArgs),
    /// Render an encoded `/api/draw/:object` request to a PNG.
    Draw(DrawArgs),
    /// Print the draw endpoint path for a configuration.
    Url(UrlArgs),
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Engine settings JSON (assets root, load timeout, glyph style).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Overrides the assets root from the settings.
    #[arg(long)]
    assets_root: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input configuration JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Target output.
    #[arg(long, default_value = "SQUARE")]
    orientation: Orientation,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Parser, Debug)]
struct DrawArgs {
    /// The `:object` segment, or a full `/api/draw/...` path.
    object: String,

    /// Output PNG path. Defaults to the request's download name.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Parser, Debug)]
struct UrlArgs {
    /// Input configuration JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long, default_value = "SQUARE")]
    orientation: Orientation,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Draw(args) => cmd_draw(args),
        Command::Url(args) => cmd_url(args),
    }
}

fn read_config_json(path: &Path) -> anyhow::Result<EmblemConfiguration> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read configuration '{}'", path.display()))?;
    EmblemConfiguration::from_json(&json).with_context(|| "parse configuration JSON")
}

fn load_settings(args: &EngineArgs) -> anyhow::Result<EngineSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read settings '{}'", path.display()))?;
            EngineSettings::from_json(&json)?
        }
        None => EngineSettings::default(),
    };
    if let Some(root) = &args.assets_root {
        settings.assets_root = root.clone();
    }
    Ok(settings)
}

fn write_png(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = read_config_json(&args.in_path)?;
    let engine = CompositionEngine::from_settings(&load_settings(&args.engine)?);

    let image = engine.render(&config, args.orientation)?;
    write_png(&args.out, &encode_png(&image)?)
}

fn cmd_draw(args: DrawArgs) -> anyhow::Result<()> {
    let object = args
        .object
        .strip_prefix(DRAW_ROUTE)
        .unwrap_or(&args.object);
    let engine = CompositionEngine::from_settings(&load_settings(&args.engine)?);

    let response = handle_draw(&engine, object)
        .map_err(|e| anyhow::anyhow!("draw failed (HTTP {}): {e}", e.http_status()))?;

    let out = match args.out {
        Some(out) => out,
        None => PathBuf::from(emblem_renderer::decode_draw_object(object)?.file_name()),
    };
    write_png(&out, &response.body)
}

fn cmd_url(args: UrlArgs) -> anyhow::Result<()> {
    let config = read_config_json(&args.in_path)?;
    let request = DrawRequest::from_configuration(&config, args.orientation);
    println!("{}", request.draw_path()?);
    Ok(())
}
