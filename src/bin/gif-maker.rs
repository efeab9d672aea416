use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use gif_maker::{
    ExportOptions, FfmpegLogLevel, PipelineStage, ProgressCallback, ProgressInfo, SourceClip,
    TransformParameters,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  gif-maker metadata clip.mp4 --json\n  gif-maker preview clip.mp4 --out frame.png --at 0:02\n  gif-maker convert clip.mp4 --scale 0.5 --speed 2 --fps 15 --start 1 --end 4 --progress\n  gif-maker completions zsh > _gif-maker";

#[derive(Debug, Parser)]
#[command(
    name = "gif-maker",
    version,
    about = "Turn video clips into looping animated GIFs",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args, Clone, Default)]
struct GlobalOptions {
    /// Increase logging output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Show a progress bar while rendering.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

/// Scale, speed, frame rate and trim flags shared by several commands.
#[derive(Debug, Args, Clone)]
struct TransformArgs {
    /// Uniform scale factor in (0, 1].
    #[arg(long, default_value_t = 0.5)]
    scale: f64,

    /// Playback speed multiplier in (0, 10].
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Output frame rate, 10 to 60.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Start of the export range (seconds, MM:SS or HH:MM:SS). Defaults to 0.
    #[arg(long)]
    start: Option<String>,

    /// End of the export range. Defaults to the end of the clip.
    #[arg(long)]
    end: Option<String>,
}

impl TransformArgs {
    fn to_parameters(
        &self,
        clip_duration: Duration,
    ) -> Result<TransformParameters, Box<dyn std::error::Error>> {
        let mut params = TransformParameters::new()
            .with_scale(self.scale)
            .with_speed(self.speed)
            .with_frames_per_second(self.fps);

        if self.start.is_some() || self.end.is_some() {
            let start = self.start.as_deref().map(parse_timecode).transpose()?;
            let end = self.end.as_deref().map(parse_timecode).transpose()?;
            params = params.with_trim(
                start.unwrap_or(Duration::ZERO),
                end.unwrap_or(clip_duration),
            );
        }

        Ok(params)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print clip metadata and the metrics of an export.
    #[command(
        about = "Print clip metadata and export metrics",
        visible_alias = "info",
        after_help = "Examples:\n  gif-maker metadata clip.mp4\n  gif-maker metadata clip.mp4 --speed 2 --json"
    )]
    Metadata {
        /// Input video path.
        input: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        transform: TransformArgs,
    },

    /// Save a single scaled frame as an image.
    #[command(
        about = "Render a preview frame",
        after_help = "Examples:\n  gif-maker preview clip.mp4 --out frame.png\n  gif-maker preview clip.mp4 --out frame.jpg --at 00:00:03.5 --scale 1"
    )]
    Preview {
        /// Input video path.
        input: PathBuf,
        /// Output image path (png or jpg).
        #[arg(long)]
        out: PathBuf,
        /// Timestamp to render. Defaults to the middle of the clip.
        #[arg(long)]
        at: Option<String>,
        /// Uniform scale factor in (0, 1].
        #[arg(long, default_value_t = 0.5)]
        scale: f64,
    },

    /// Convert a clip into an animated GIF.
    #[command(
        about = "Convert a clip to GIF",
        after_help = "Examples:\n  gif-maker convert clip.mp4\n  gif-maker convert clip.mp4 --out gifs/ --scale 0.25 --fps 12 --start 0:05 --end 0:09"
    )]
    Convert {
        /// Input video path.
        input: PathBuf,
        /// Output file or directory. Defaults to a descriptive name in the
        /// current directory.
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        transform: TransformArgs,
    },

    /// Check a clip and export settings for problems.
    #[command(
        about = "Validate a clip for export",
        after_help = "Examples:\n  gif-maker validate clip.mp4\n  gif-maker validate clip.mp4 --start 2 --end 1"
    )]
    Validate {
        /// Input video path.
        input: PathBuf,

        #[command(flatten)]
        transform: TransformArgs,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn setup_logger(level: u8) {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    let log_level = match level {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    builder.filter_level(log_level);
    builder.format_timestamp_millis();
    builder.init();
}

fn parse_timecode(value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(format!("invalid time: {trimmed}").into());
        }
        return Ok(Duration::try_from_secs_f64(seconds)
            .map_err(|error| format!("invalid time {trimmed}: {error}"))?);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (0_u64, minutes.parse::<u64>()?, seconds.parse::<f64>()?),
        [hours, minutes, seconds] => (
            hours.parse::<u64>()?,
            minutes.parse::<u64>()?,
            seconds.parse::<f64>()?,
        ),
        _ => return Err(format!("invalid time format: {trimmed}").into()),
    };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("invalid time: {trimmed}").into());
    }

    let total_seconds = (hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds;
    Ok(Duration::try_from_secs_f64(total_seconds)
        .map_err(|error| format!("invalid time {trimmed}: {error}"))?)
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

/// Where `convert` writes: an explicit file, a file inside a directory, or
/// the suggested name in the working directory.
fn resolve_output_path(out: Option<&Path>, suggested_name: &str) -> PathBuf {
    match out {
        Some(path) if path.is_dir() => path.join(suggested_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(suggested_name),
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    setup_logger(global.verbose);

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        gif_maker::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

/// Renders pipeline progress on an indicatif bar.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {msg:>10} {bar:40.cyan/blue} {pos}/{len} ({eta})")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let stage = match info.stage {
            PipelineStage::Loading => "loading",
            PipelineStage::Transforming => "planning",
            PipelineStage::Rendering => "rendering",
            _ => "working",
        };
        self.bar.set_message(stage);
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Metadata {
            input,
            json,
            transform,
        } => {
            let clip = SourceClip::open(&input)?;
            let metadata = clip.metadata();
            let params = transform.to_parameters(metadata.duration)?;
            let metrics = gif_maker::derive_metrics(metadata, &params)?;

            if json {
                let payload = json!({
                    "format": metadata.format,
                    "codec": metadata.codec,
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "output": {
                        "width": metrics.width,
                        "height": metrics.height,
                        "fps": metrics.frames_per_second,
                        "duration_seconds": metrics.duration.as_secs_f64(),
                        "total_frames": metrics.total_frames,
                    },
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
                println!("Duration: {:.2}s", metadata.duration.as_secs_f64());
                println!(
                    "Output: {}x{} @ {} fps, {:.2}s, {} frames",
                    metrics.width,
                    metrics.height,
                    metrics.frames_per_second,
                    metrics.duration.as_secs_f64(),
                    metrics.total_frames,
                );
            }
        }
        Commands::Preview {
            input,
            out,
            at,
            scale,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;

            let mut clip = SourceClip::open(&input)?;
            let timestamp = match at {
                Some(value) => parse_timecode(&value)?,
                None => clip.metadata().duration / 2,
            };

            let image = clip.preview_frame(scale, timestamp)?;
            image.save(&out)?;
            println!("{} {}", "saved".green().bold(), out.display());
        }
        Commands::Convert {
            input,
            out,
            transform,
        } => {
            let mut clip = SourceClip::open(&input)?;
            let clip_duration = clip.metadata().duration;
            let params = transform.to_parameters(clip_duration)?;

            let original_name = input
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("output");
            let suggested = gif_maker::output_file_name(original_name, &params, clip_duration);
            let out = resolve_output_path(out.as_deref(), &suggested);
            ensure_writable_path(&out, cli.global.overwrite)?;

            let mut options = ExportOptions::new().with_batch_size(5);
            let progress = if cli.global.progress {
                let progress = Arc::new(TerminalProgress::new()?);
                options = options.with_progress(progress.clone());
                Some(progress)
            } else {
                None
            };

            let result = gif_maker::export(&mut clip, &params, &options);
            if let Some(progress) = &progress {
                progress.finish();
            }
            let gif = result?;

            gif.save(&out)?;
            println!(
                "{} {} ({:.1} MB, {} frames, {}x{})",
                "saved".green().bold(),
                out.display(),
                gif.size_megabytes(),
                gif.frame_count(),
                gif.width(),
                gif.height(),
            );
        }
        Commands::Validate { input, transform } => {
            let clip = SourceClip::open(&input)?;
            let params = transform.to_parameters(clip.metadata().duration)?;
            let report = clip.validate_export(&params);
            print!("{report}");
            if !report.is_valid() {
                return Err(format!("{} problem(s) found", report.errors.len()).into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "gif-maker", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timecode_formats() {
        assert_eq!(parse_timecode("75").unwrap().as_secs(), 75);
        assert_eq!(parse_timecode("01:15").unwrap().as_secs(), 75);
        assert_eq!(
            parse_timecode("00:01:15.5").unwrap(),
            Duration::from_millis(75_500)
        );
        assert_eq!(parse_timecode(" 2.5 ").unwrap(), Duration::from_millis(2_500));
    }

    #[test]
    fn parse_timecode_rejects_garbage() {
        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("-3").is_err());
        assert!(parse_timecode("1:2:3:4").is_err());
        assert!(parse_timecode("ten").is_err());
    }

    #[test]
    fn parse_timecode_rejects_out_of_range_values() {
        assert!(parse_timecode("1e20").is_err());
        assert!(parse_timecode("99999999999999999999:00").is_err());
        assert!(parse_timecode("18446744073709551615:00:00").is_err());
        assert!(parse_timecode("0:1e300").is_err());
    }

    #[test]
    fn transform_flags_default_to_whole_clip() {
        let args = TransformArgs {
            scale: 0.5,
            speed: 1.0,
            fps: 30,
            start: None,
            end: None,
        };
        let params = args.to_parameters(Duration::from_secs(8)).unwrap();
        assert_eq!(params.trim_range, None);
    }

    #[test]
    fn open_ended_trim_uses_clip_bounds() {
        let args = TransformArgs {
            scale: 0.5,
            speed: 1.0,
            fps: 30,
            start: Some("2".to_string()),
            end: None,
        };
        let params = args.to_parameters(Duration::from_secs(8)).unwrap();
        assert_eq!(
            params.trim_range,
            Some((Duration::from_secs(2), Duration::from_secs(8)))
        );
    }

    #[test]
    fn output_path_resolution() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_output_path(Some(dir.path()), "a.gif"),
            dir.path().join("a.gif")
        );
        assert_eq!(
            resolve_output_path(Some(Path::new("out.gif")), "a.gif"),
            PathBuf::from("out.gif")
        );
        assert_eq!(resolve_output_path(None, "a.gif"), PathBuf::from("a.gif"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
