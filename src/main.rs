use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tikfree::cache::{DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS, ttl_from_secs};
use tikfree::server::{self, AppState};
use tikfree::utils::probe_version;
use tikfree::{Container, Extractor, Materializer, Preference, Resolver, TtlCache, YtDlp};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = git_version::git_version!(
    args = ["--always", "--dirty=-modified", "--tags"],
    fallback = "unknown"
);

#[derive(Parser)]
#[command(
    name = "tikfree",
    version = VERSION,
    about = "Resolve and download TikTok videos as MP4",
    long_about = "Small web service around yt-dlp: resolves a TikTok link to a direct\n\
    media URL or downloads it as an H.264 MP4.\n\n\
    Examples:\n\
      tikfree                                          # Serve on 0.0.0.0:8000\n\
      tikfree serve --port 9000                        # Serve on another port\n\
      tikfree info https://www.tiktok.com/@u/video/1    # Print metadata as JSON\n\
      tikfree download -d ./videos https://www.tiktok.com/@u/video/1"
)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Clone)]
struct Config {
    /// yt-dlp executable
    #[arg(long = "yt-dlp", env = "YTDLP_PATH", default_value = "yt-dlp", global = true)]
    ytdlp: PathBuf,

    /// ffmpeg binary or its directory, passed to yt-dlp for merging
    #[arg(long, env = "FFMPEG_LOCATION", global = true)]
    ffmpeg_location: Option<PathBuf>,

    /// Directory for per-request download folders (system temp dir by default)
    #[arg(long, env = "TIKFREE_TEMP_DIR", global = true)]
    temp_dir: Option<PathBuf>,

    /// Target container (mp4, webm, mkv, mov)
    #[arg(long, env = "TIKFREE_CONTAINER", default_value = "mp4", global = true)]
    container: Container,

    /// Codec marker preferred in a rendition's vcodec
    #[arg(long, env = "TIKFREE_CODEC", default_value = "avc", global = true)]
    codec: String,

    /// Address the server binds to
    #[arg(long, env = "HOST", default_value = "0.0.0.0", global = true)]
    host: IpAddr,

    #[arg(short, long, env = "PORT", default_value_t = 8000, global = true)]
    port: u16,

    /// Metadata cache lifetime in seconds
    #[arg(
        long,
        env = "TIKFREE_CACHE_TTL",
        default_value_t = DEFAULT_TTL_SECONDS,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TTL_SECONDS),
        global = true
    )]
    cache_ttl: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print resolved metadata for a URL as JSON
    Info { url: String },
    /// Download a URL into a directory
    Download {
        url: String,

        /// Output directory
        #[arg(short = 'd', long = "dir", default_value = ".")]
        output_dir: PathBuf,
    },
}

impl Config {
    fn preference(&self) -> Preference {
        Preference::new(self.container, self.codec.clone())
    }

    fn extractor(&self) -> Arc<dyn Extractor> {
        let mut ytdlp = YtDlp::new(&self.ytdlp);
        if let Some(location) = &self.ffmpeg_location {
            ytdlp = ytdlp.with_ffmpeg_location(location);
        }
        Arc::new(ytdlp)
    }

    fn build(&self) -> Result<(Resolver, Materializer)> {
        let ttl = ttl_from_secs(self.cache_ttl)
            .ok_or_else(|| anyhow!("cache ttl out of range: {}", self.cache_ttl))?;
        let extractor = self.extractor();
        let cache = TtlCache::with_system_clock(ttl);
        let resolver = Resolver::new(extractor.clone(), cache, self.preference());
        let mut materializer = Materializer::new(extractor, self.preference());
        if let Some(root) = &self.temp_dir {
            materializer = materializer.with_temp_root(root);
        }
        Ok((resolver, materializer))
    }
}

/// Warn early when the external tools are missing; downloads still fall back without ffmpeg
async fn check_tools(config: &Config) {
    match probe_version(&config.ytdlp, "--version").await {
        Some(version) => info!(version = %version, "found yt-dlp"),
        None => warn!(binary = %config.ytdlp.display(), "yt-dlp not found, every request will fail"),
    }
    let ffmpeg = match &config.ffmpeg_location {
        Some(location) if location.is_dir() => location.join("ffmpeg"),
        Some(location) => location.clone(),
        None => PathBuf::from("ffmpeg"),
    };
    match probe_version(&ffmpeg, "-version").await {
        Some(version) => info!(version = %version, "found ffmpeg"),
        None => warn!("ffmpeg not found, downloads will use single-stream formats only"),
    }
}

async fn serve(config: &Config) -> Result<()> {
    if let Some(root) = &config.temp_dir {
        tokio::fs::create_dir_all(root)
            .await
            .with_context(|| format!("cannot create temp dir {}", root.display()))?;
    }
    check_tools(config).await;

    let (resolver, materializer) = config.build()?;
    let state = AppState::new(resolver, materializer);
    server::serve(SocketAddr::new(config.host, config.port), state)
        .await
        .context("HTTP server failed")
}

async fn print_info(config: &Config, url: &str) -> Result<()> {
    let (resolver, _) = config.build()?;
    let info = resolver.fetch(url).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

async fn download(config: &Config, url: &str, output_dir: &Path) -> Result<()> {
    let (resolver, materializer) = config.build()?;
    let meta = resolver.fetch(url).await?;
    let download = materializer.materialize(url, meta.filename_hint()).await?;

    tokio::fs::create_dir_all(output_dir).await?;
    let target = output_dir.join(&download.filename);
    tokio::fs::copy(&download.path, &target)
        .await
        .with_context(|| format!("cannot write {}", target.display()))?;
    println!("✓ Saved to: {}", target.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tikfree=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        Command::Info { url } => print_info(&config, &url).await,
        Command::Download { url, output_dir } => download(&config, &url, &output_dir).await,
    }
}
