use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rebundle::{
    AudioExtractor, Combiner, DemuxSource, Downloader, FetchOptions, FfmpegDemuxer,
    FfmpegLogLevel, ProgressCallback, ProgressInfo, RemuxReport,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  rebundle mux video.mp4 audio.m4a --out combined.mp4\n  rebundle extract-audio movie.mp4 --out soundtrack.m4a\n  rebundle download https://example.com/clip.mp4 --out media/clip.mp4 --progress\n  rebundle tracks input.mkv --json\n  rebundle completions zsh > _rebundle";

#[derive(Debug, Parser)]
#[command(
    name = "rebundle",
    version,
    about = "Combine, extract, and download media streams without re-encoding",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    ffmpeg_log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Combine a video track and an audio track into one container.
    #[command(
        about = "Combine the first video track of one file with the first audio track of another",
        after_help = "Examples:\n  rebundle mux video.mp4 audio.m4a --out combined.mp4\n  rebundle mux cam.mkv voice.ogg --out talk.mp4 --progress"
    )]
    Mux {
        /// Source file providing the video track.
        video: PathBuf,
        /// Source file providing the audio track.
        audio: PathBuf,
        /// Output container path (format inferred from the extension).
        #[arg(long)]
        out: PathBuf,
    },

    /// Extract the first audio track into an audio-only container.
    #[command(
        about = "Extract the first audio track of a media file",
        after_help = "Examples:\n  rebundle extract-audio movie.mp4 --out soundtrack.m4a"
    )]
    ExtractAudio {
        /// Input media path.
        input: PathBuf,
        /// Output container path.
        #[arg(long)]
        out: PathBuf,
    },

    /// Download a remote resource to disk.
    #[command(
        about = "Stream a remote resource to a local file",
        after_help = "Examples:\n  rebundle download https://example.com/clip.mp4 --out media/clip.mp4\n  rebundle download https://example.com/clip.mp4 --out clip.mp4 --json"
    )]
    Download {
        /// Resource URL (http or https).
        url: String,
        /// Destination file path; parent directories are created.
        #[arg(long)]
        out: PathBuf,
        /// Print the result as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the tracks of a media file.
    #[command(
        about = "List track indices and media types",
        visible_alias = "probe",
        after_help = "Examples:\n  rebundle tracks input.mkv\n  rebundle tracks input.mkv --json"
    )]
    Tracks {
        /// Input media path.
        input: PathBuf,
        /// Print tracks as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

/// Progress callback driving an indicatif bar.
struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
    }
}

fn parse_ffmpeg_log_level(value: &str) -> Option<FfmpegLogLevel> {
    match value.to_lowercase().as_str() {
        "quiet" => Some(FfmpegLogLevel::Quiet),
        "panic" => Some(FfmpegLogLevel::Panic),
        "fatal" => Some(FfmpegLogLevel::Fatal),
        "error" => Some(FfmpegLogLevel::Error),
        "warning" => Some(FfmpegLogLevel::Warning),
        "info" => Some(FfmpegLogLevel::Info),
        "verbose" => Some(FfmpegLogLevel::Verbose),
        "debug" => Some(FfmpegLogLevel::Debug),
        "trace" => Some(FfmpegLogLevel::Trace),
        _ => None,
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !overwrite {
        return Err(format!(
            "output file {} already exists (use --overwrite to replace it)",
            path.display()
        )
        .into());
    }
    Ok(())
}

fn print_report(global: &GlobalOptions, out: &Path, report: &RemuxReport) {
    println!("{} {}", "saved".green().bold(), out.display());
    if global.verbose {
        if let Some(video) = report.video {
            println!(
                "  video: {} samples, {}",
                video.samples,
                format_bytes(video.bytes)
            );
        }
        if let Some(audio) = report.audio {
            println!(
                "  audio: {} samples, {}",
                audio.samples,
                format_bytes(audio.bytes)
            );
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(level) = &cli.global.ffmpeg_log_level {
        match parse_ffmpeg_log_level(level) {
            Some(level) => rebundle::set_ffmpeg_log_level(level),
            None => return Err(format!("unknown FFmpeg log level: {level}").into()),
        }
    }

    match cli.command {
        Commands::Mux { video, audio, out } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let report = Combiner::new(&video, &audio, &out)?.run()?;
            print_report(&cli.global, &out, &report);
        }
        Commands::ExtractAudio { input, out } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let report = AudioExtractor::new(&input, &out)?.run()?;
            print_report(&cli.global, &out, &report);
        }
        Commands::Download { url, out, json } => {
            ensure_writable_path(&out, cli.global.overwrite)?;

            let mut options = FetchOptions::new();
            let bar = if cli.global.progress {
                let bar = ProgressBar::new(0);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{bar:40} {bytes}/{total_bytes} ({bytes_per_sec})",
                    )?
                    .progress_chars("=>-"),
                );
                options = options.with_progress(Arc::new(BarProgress { bar: bar.clone() }));
                Some(bar)
            } else {
                None
            };

            let bytes = Downloader::new(url.clone(), &out)?
                .with_options(options)
                .run();
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            let bytes = bytes?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "url": url,
                        "path": out.display().to_string(),
                        "bytes_written": bytes,
                    }))?
                );
            } else {
                println!(
                    "{} {} ({})",
                    "downloaded".green().bold(),
                    out.display(),
                    format_bytes(bytes)
                );
            }
        }
        Commands::Tracks { input, json } => {
            let source = FfmpegDemuxer::open(&input)?;
            if json {
                let payload: Vec<_> = source
                    .tracks()
                    .iter()
                    .map(|track| {
                        json!({
                            "index": track.index,
                            "media_type": track.media_type,
                            "kind": format!("{:?}", track.kind).to_lowercase(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for track in source.tracks() {
                    println!("{:>3}  {}", track.index, track.media_type);
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "rebundle", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
