use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use serde_json::json;

use frameslice::{Rect, TimeRange, format_time};

#[cfg(feature = "ffmpeg")]
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

#[cfg(feature = "ffmpeg")]
use indicatif::{ProgressBar, ProgressStyle};

#[cfg(feature = "ffmpeg")]
use frameslice::{
    AspectPolicy, ExportOptions, ExportPackager, FfmpegLogLevel, FfmpegSource, MediaSource,
    OperationType, ProgressCallback, ProgressInfo, SamplingOptions, SliceSession,
};

const CLI_AFTER_HELP: &str = "Examples:\n  frameslice probe input.mp4 --json\n  frameslice plan --start 00:02 --end 00:10.5 --interval 0.5\n  frameslice slice input.mp4 --crop 640x360+100+50 --start 00:02 --end 00:10 --interval 1 --out frames\n  frameslice completions zsh > _frameslice";

#[derive(Debug, Parser)]
#[command(
    name = "frameslice",
    version,
    about = "Crop a region of a video and slice a time window into PNG frames",
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
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print frame size and duration of a video.
    #[cfg(feature = "ffmpeg")]
    #[command(
        about = "Print video dimensions and duration",
        after_help = "Examples:\n  frameslice probe input.mp4\n  frameslice probe input.mp4 --json"
    )]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the timestamps a range and interval produce.
    #[command(
        about = "Preview sampling timestamps without opening media",
        after_help = "Examples:\n  frameslice plan --end 5 --interval 1\n  frameslice plan --start 00:01.5 --end 01:00 --interval 2.5 --json"
    )]
    Plan {
        /// Range start (seconds, or MM:SS / MM:SS.mmm).
        #[arg(long, default_value = "0")]
        start: String,
        /// Range end (seconds, or MM:SS / MM:SS.mmm).
        #[arg(long)]
        end: String,
        /// Seconds between frames.
        #[arg(long, default_value_t = 1.0)]
        interval: f64,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Crop and slice a video into a zip of PNG frames.
    #[cfg(feature = "ffmpeg")]
    #[command(
        about = "Slice a video into cropped PNG frames",
        after_help = "Examples:\n  frameslice slice input.mp4 --out frames\n  frameslice slice input.mp4 --crop 640x360+0+0 --aspect 16:9 --start 00:05 --end 00:20 --interval 0.5 --progress"
    )]
    Slice {
        /// Input video path.
        input: PathBuf,
        /// Directory the archive is written to.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Crop rectangle as WxH+X+Y. Defaults to the full frame.
        #[arg(long)]
        crop: Option<String>,
        /// Aspect ratio: free, original, or W:H.
        #[arg(long, default_value = "free")]
        aspect: String,
        /// Range start (seconds, or MM:SS / MM:SS.mmm).
        #[arg(long)]
        start: Option<String>,
        /// Range end (seconds, or MM:SS / MM:SS.mmm). Defaults to the end of the video.
        #[arg(long)]
        end: Option<String>,
        /// Seconds between frames.
        #[arg(long, default_value_t = 1.0)]
        interval: f64,
        /// Give up on a seek after this many seconds.
        #[arg(long)]
        seek_timeout: Option<f64>,
        /// Store PNGs without deflate.
        #[arg(long)]
        store: bool,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
    },

    /// Generate shell completions.
    #[command(
        about = "Generate shell completion scripts",
        after_help = "Examples:\n  frameslice completions bash > frameslice.bash\n  frameslice completions zsh > _frameslice"
    )]
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Seconds as a plain number, or `MM:SS` / `MM:SS.mmm`.
fn parse_seconds(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }
    if let Ok(seconds) = trimmed.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(format!("invalid time value: {trimmed}").into());
        }
        return Ok(seconds);
    }
    Ok(frameslice::parse_time(trimmed)?)
}

/// `WxH+X+Y`; `×` is accepted in place of `x`.
#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
fn parse_crop(value: &str) -> Result<Rect, Box<dyn std::error::Error>> {
    let invalid = || format!("invalid crop {value:?}, expected WxH+X+Y");
    let normalized = value.trim().replace('×', "x");
    let mut parts = normalized.split('+');
    let size = parts.next().ok_or_else(invalid)?;
    let x = parts.next().ok_or_else(invalid)?;
    let y = parts.next().ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid().into());
    }
    let (w, h) = size.split_once(['x', 'X']).ok_or_else(invalid)?;
    let field = |text: &str| text.parse::<u32>().map_err(|_| invalid());
    Ok(Rect::new(field(x)?, field(y)?, field(w)?, field(h)?))
}

/// `--seek-timeout` seconds as a duration; negative, NaN and overly large
/// values are refused.
#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
fn parse_seek_timeout(seconds: f64) -> Result<Duration, Box<dyn std::error::Error>> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|error| format!("invalid --seek-timeout {seconds}: {error}").into())
}

fn init_logging(global: &GlobalOptions) {
    let level = if global.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global);

    #[cfg(feature = "ffmpeg")]
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        frameslice::set_ffmpeg_log_level(parsed);
    }

    #[cfg(not(feature = "ffmpeg"))]
    if global.log_level.is_some() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "--log-level requires building with the `ffmpeg` feature".yellow()
        );
    }

    Ok(())
}

/// Drives an indicatif bar from pipeline progress.
#[cfg(feature = "ffmpeg")]
struct TerminalProgress {
    bar: ProgressBar,
}

#[cfg(feature = "ffmpeg")]
impl TerminalProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

#[cfg(feature = "ffmpeg")]
impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_length(info.total);
        self.bar.set_position(info.current);
        let stage = match info.operation {
            OperationType::Packaging => "packaging",
            _ => "sampling",
        };
        match info.current_timestamp {
            Some(seconds) => self
                .bar
                .set_message(format!("{stage} {}", format_time(seconds))),
            None => self.bar.set_message(stage),
        }
    }
}

fn plan_command(
    start: &str,
    end: &str,
    interval: f64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let range = TimeRange::new(parse_seconds(start)?, parse_seconds(end)?);
    if range.start >= range.end {
        return Err("--start must be before --end".into());
    }
    let timestamps = frameslice::plan(&range, interval)?;

    if json {
        let payload = json!({
            "start_seconds": range.start,
            "end_seconds": range.end,
            "interval_seconds": interval,
            "count": timestamps.len(),
            "timestamps": timestamps,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for (index, timestamp) in timestamps.iter().enumerate() {
            println!("#{:<5} {}", index + 1, format_time(*timestamp));
        }
        println!("{} {} frame(s)", "estimated:".cyan().bold(), timestamps.len());
    }
    Ok(())
}

#[cfg(feature = "ffmpeg")]
fn probe_command(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let source = FfmpegSource::open(input)?;
    let dimensions = source.dimensions();
    if json {
        let payload = json!({
            "path": input.display().to_string(),
            "width": dimensions.width(),
            "height": dimensions.height(),
            "duration_seconds": dimensions.duration(),
            "aspect_ratio": dimensions.aspect_ratio(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("File: {}", input.display());
        println!("Size: {} × {} px", dimensions.width(), dimensions.height());
        println!("Duration: {}", format_time(dimensions.duration()));
    }
    Ok(())
}

#[cfg(feature = "ffmpeg")]
struct SliceArgs {
    input: PathBuf,
    out: PathBuf,
    crop: Option<String>,
    aspect: String,
    start: Option<String>,
    end: Option<String>,
    interval: f64,
    seek_timeout: Option<f64>,
    store: bool,
    progress: bool,
}

#[cfg(feature = "ffmpeg")]
fn slice_command(args: SliceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let policy = AspectPolicy::parse(&args.aspect)
        .ok_or_else(|| format!("unsupported --aspect: {}", args.aspect))?;

    let mut source = FfmpegSource::open(&args.input)?;
    let dimensions = source.dimensions();
    let (width, height) = source.current_frame_dimensions();
    let mut session = SliceSession::new(dimensions, width as f64, height as f64)?;

    if let Some(crop) = &args.crop {
        session.crop_mut().set_rect(parse_crop(crop)?);
    }
    session.set_aspect(policy);

    let start = args.start.as_deref().map(parse_seconds).transpose()?.unwrap_or(0.0);
    let end = args
        .end
        .as_deref()
        .map(parse_seconds)
        .transpose()?
        .unwrap_or(dimensions.duration());
    if start >= end {
        return Err("--start must be before --end".into());
    }
    if end > dimensions.duration() {
        log::warn!(
            "--end {} is past the end of the video; using {}",
            format_time(end),
            format_time(dimensions.duration())
        );
    }
    let range = session.time_range_mut();
    range.set_end(end);
    range.set_start(start);

    if session.set_interval(args.interval) != args.interval {
        log::warn!("--interval {} is not usable; using 1 second", args.interval);
    }

    let request = session.request();
    println!(
        "{} {} from {} to {}, every {}s ({} frame(s))",
        "slicing:".cyan().bold(),
        request.crop,
        format_time(request.range.start),
        format_time(request.range.end),
        request.interval,
        session.estimated_frame_count()
    );

    let mut sampling = SamplingOptions::new();
    if let Some(seconds) = args.seek_timeout {
        sampling = sampling.with_seek_timeout(parse_seek_timeout(seconds)?);
    }
    let mut export = ExportOptions::new();
    if args.store {
        export = export.with_compression(frameslice::Compression::Stored);
    }

    let progress = if args.progress {
        let progress = Arc::new(TerminalProgress::new(session.estimated_frame_count())?);
        sampling = sampling.with_progress(progress.clone());
        export = export.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let packager = ExportPackager::new(export);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let outcome = runtime.block_on(session.export(&mut source, &sampling, &packager));

    if let Some(progress) = &progress {
        progress.bar.finish_with_message("done");
    }

    let archive = match outcome {
        Ok(archive) => archive,
        Err(partial) => {
            if !partial.frames.is_empty() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("{} frame(s) were captured before the failure", partial.frames.len())
                        .yellow()
                );
            }
            return Err(partial.error.into());
        }
    };

    fs::create_dir_all(&args.out)?;
    let path = args.out.join(packager.archive_name());
    fs::write(&path, archive)?;

    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "Wrote {} frame(s) to {}",
            session.preview_frames().len(),
            path.display()
        )
        .green()
    );
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        #[cfg(feature = "ffmpeg")]
        Commands::Probe { input, json } => probe_command(&input, json)?,
        Commands::Plan {
            start,
            end,
            interval,
            json,
        } => plan_command(&start, &end, interval, json)?,
        #[cfg(feature = "ffmpeg")]
        Commands::Slice {
            input,
            out,
            crop,
            aspect,
            start,
            end,
            interval,
            seek_timeout,
            store,
            progress,
        } => slice_command(SliceArgs {
            input,
            out,
            crop,
            aspect,
            start,
            end,
            interval,
            seek_timeout,
            store,
            progress,
        })?,
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "frameslice", &mut std::io::stdout());
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
