use batchfit::config::{self, BatchConfig};
use batchfit::editor::{Edit, EditError, Editor, parse_dimension};
use batchfit::imaging::{FitMode, OutputFormat, RustBackend};
use batchfit::load::{self, LoadError};
use batchfit::{export, output, preview, session};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "batchfit")]
#[command(about = "Batch image resizer with focal-point cropping")]
#[command(long_about = "\
Batch image resizer with focal-point cropping

Every input image gets a target size. In cover mode the image fills the
target and the overflow is cropped around a focal point; in contain mode
the whole image is fitted inside with transparent bars.

Inputs are image files (jpg, jpeg, png, tif, tiff, webp) or directories,
which are walked recursively in path order.

Settings come from batchfit.toml (or --config), then command-line flags.
Per-image size, quality, fit, focus and crop go in [[items]] entries.

Run 'batchfit gen-config' to generate a documented batchfit.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: batchfit.toml in the working directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Settings shared by every command that loads images. Flags win over config.
#[derive(clap::Args, Clone)]
struct BatchArgs {
    /// Image files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Target width for every image (positive integer)
    #[arg(long)]
    width: Option<String>,

    /// Target height for every image (positive integer)
    #[arg(long)]
    height: Option<String>,

    /// cover or contain
    #[arg(long)]
    fit: Option<FitMode>,

    /// Derive the other axis from each image's aspect ratio
    #[arg(long)]
    aspect_lock: bool,

    /// Encoding quality, 1-100
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// webp, jpeg, png or avif
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Export as {prefix}1, {prefix}2, ... instead of each file's own name
    #[arg(long)]
    prefix: Option<String>,

    /// Layout spacing in pixels
    #[arg(long)]
    spacing: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Resize, encode and export every image
    Process {
        #[command(flatten)]
        batch: BatchArgs,

        /// Output directory
        #[arg(long, default_value = "batchfit-out")]
        out: PathBuf,

        /// Process only the image at this 1-based position
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        item: Option<u32>,

        /// Pick each image's quality to land near --target-kb
        #[arg(long)]
        auto_quality: bool,

        /// Size budget for --auto-quality, in KB
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        target_kb: Option<u64>,

        /// List each image's estimated output size before encoding
        #[arg(long)]
        estimate: bool,
    },
    /// Render the contact sheet (or one image's preview) to a file
    Sheet {
        #[command(flatten)]
        batch: BatchArgs,

        /// Output image; the extension picks the format
        #[arg(long, default_value = "sheet.png")]
        out: PathBuf,

        /// Outline the image at this 1-based position
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        select: Option<u32>,

        /// Render only the image at this 1-based position
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        item: Option<u32>,
    },
    /// Print contact sheet grid positions
    Layout {
        #[command(flatten)]
        batch: BatchArgs,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report the quality that lands one image near a size budget
    Optimize {
        #[command(flatten)]
        batch: BatchArgs,

        /// Size budget in KB
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        target_kb: Option<u64>,
    },
    /// Print a stock batchfit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Process {
            batch,
            out,
            item,
            auto_quality,
            target_kb,
            estimate,
        } => {
            let mut config = resolve(cli.config.as_deref(), &batch)?;
            config.output.auto_quality |= auto_quality;
            if let Some(kb) = target_kb {
                config.output.target_kb = kb;
            }
            let backend = RustBackend::new();
            let mut editor = open_session(&backend, &config, &batch.inputs)?;

            if config.output.auto_quality {
                let target = config.output.target_kb * 1024;
                let choices = session::optimize_all(&mut editor, &backend, target)?;
                for (item, choice) in editor.queue().items().iter().zip(&choices) {
                    output::print_optimize(item.display_name(), choice, target);
                }
            }
            let estimates: Vec<Option<u64>> = if estimate {
                (0..editor.queue().len())
                    .map(|i| {
                        editor
                            .estimate_item_size(&backend, i)
                            .inspect_err(|e| warn!("no size estimate for image {}: {e}", i + 1))
                            .ok()
                    })
                    .collect()
            } else {
                Vec::new()
            };
            output::print_queue(&editor, &estimates);

            if let Some(n) = item {
                editor.apply(Edit::Select(Some(position(n))))?;
                let file = editor.process_selected(&backend)?;
                let path = export::write_file(&file, &out)?;
                println!("Wrote {}", path.display());
                return Ok(());
            }

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            editor.process_all(&backend, None, Some(tx));
            printer.join().map_err(|_| "progress printer panicked")?;

            let report = editor.export(&out)?;
            output::print_export(&report, &out);
        }
        Command::Sheet {
            batch,
            out,
            select,
            item,
        } => {
            let config = resolve(cli.config.as_deref(), &batch)?;
            let backend = RustBackend::new();
            let mut editor = open_session(&backend, &config, &batch.inputs)?;
            if let Some(n) = select {
                editor.apply(Edit::Select(Some(position(n))))?;
                let bytes = editor.estimate_selected_size(&backend)?;
                let name = editor.queue().items()[position(n)].display_name();
                println!(
                    "{}",
                    output::format_estimate(name, bytes, editor.defaults().format)
                );
            }
            let image = match item {
                Some(n) => {
                    let index = position(n);
                    let item = editor
                        .queue()
                        .get(index)
                        .ok_or(EditError::NoSuchItem(index))?;
                    preview::render_item_preview(item, config.layout.preview_cap)
                }
                None => editor.render_sheet(),
            };
            image.save(&out)?;
            println!(
                "Wrote {} ({}x{})",
                out.display(),
                image.width(),
                image.height()
            );
        }
        Command::Layout { batch, json } => {
            let config = resolve(cli.config.as_deref(), &batch)?;
            let editor = open_session(&RustBackend::new(), &config, &batch.inputs)?;
            let layout = editor.layout();
            if json {
                println!("{}", serde_json::to_string_pretty(&layout)?);
            } else {
                let names: Vec<&str> = editor
                    .queue()
                    .items()
                    .iter()
                    .map(|i| i.display_name())
                    .collect();
                output::print_layout(&layout, &names);
            }
        }
        Command::Optimize { batch, target_kb } => {
            let config = resolve(cli.config.as_deref(), &batch)?;
            if !config.output.format.is_lossy() {
                warn!(
                    format = %config.output.format,
                    "format ignores quality; sizes will not change"
                );
            }
            let target = target_kb.unwrap_or(config.output.target_kb) * 1024;
            let backend = RustBackend::new();
            let mut editor = open_session(&backend, &config, &batch.inputs)?;
            for index in 0..editor.queue().len() {
                editor.apply(Edit::Select(Some(index)))?;
                let choice = editor.optimize_selected_quality(&backend, target)?;
                let name = editor.queue().items()[index].display_name();
                output::print_optimize(name, &choice, target);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics to stderr. `--verbose` forces debug; otherwise `RUST_LOG`, else warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Load the config file and lay the command-line flags over it.
fn resolve(path: Option<&Path>, args: &BatchArgs) -> Result<BatchConfig, Box<dyn Error>> {
    let mut config = config::load_config(path)?;
    for (flag, raw, slot) in [
        ("--width", &args.width, &mut config.resize.width),
        ("--height", &args.height, &mut config.resize.height),
    ] {
        if let Some(raw) = raw {
            match parse_dimension(raw) {
                Some(value) => *slot = Some(value),
                None => warn!("ignoring {flag} {raw:?}: not a positive integer"),
            }
        }
    }
    if let Some(fit) = args.fit {
        config.resize.fit = fit;
    }
    config.resize.aspect_lock |= args.aspect_lock;
    if let Some(quality) = args.quality {
        config.output.quality = quality;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(prefix) = &args.prefix {
        config.output.prefix = prefix.clone();
    }
    if let Some(spacing) = args.spacing.filter(|s| *s > 0) {
        config.layout.spacing = spacing;
    }
    config.validate()?;
    Ok(config)
}

/// Decode the inputs and replay the config onto a fresh editor.
fn open_session(
    backend: &RustBackend,
    config: &BatchConfig,
    inputs: &[PathBuf],
) -> Result<Editor, Box<dyn Error>> {
    init_thread_pool(&config.processing);
    let paths = load::collect_inputs(inputs)?;
    let loaded = load::successful(load::load_images(backend, &paths));
    if loaded.is_empty() {
        return Err(LoadError::NoInputs.into());
    }
    Ok(session::build_editor(config, loaded)?)
}

/// 0-based queue index for a 1-based CLI position.
fn position(n: u32) -> usize {
    n as usize - 1
}
