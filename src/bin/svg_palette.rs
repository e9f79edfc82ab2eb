use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use svg_palette_wasm::{
    AnalyzerConfig, ColorEntry, HighlightMode, PixelBuffer, ResvgRasterizer, Session, document,
    from_hex, kmeans, replace_color, to_hex,
};
use tracing_subscriber::EnvFilter;

/// Analyse, reduce and recolor the palette of SVG documents.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Longest side of the analysis rendering
    #[arg(long, global = true, default_value_t = 800)]
    max_size: u32,

    /// Number of k-means rounds
    #[arg(long, global = true, default_value_t = 10)]
    iterations: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the colors of a document as JSON, most frequent first
    Analyze {
        input: PathBuf,

        /// Only print the N most frequent colors
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Also print similarity groups
        #[arg(short, long)]
        groups: bool,
    },

    /// Reduce a document to K colors
    Reduce {
        input: PathBuf,

        /// Target number of colors
        #[arg(short = 'k', long)]
        colors: usize,

        /// Output path (defaults to `reduced_<input>`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace one color everywhere in a document
    Recolor {
        input: PathBuf,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Output path (defaults to `recolored_<input>`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Isolate a color, or the most frequent colors up to an index
    Highlight {
        input: PathBuf,

        /// Show only this color
        #[arg(long, conflicts_with = "upto", required_unless_present = "upto")]
        color: Option<String>,

        /// Show every color up to and including this index of the analysis
        #[arg(long)]
        upto: Option<usize>,

        /// Per-channel matching tolerance
        #[arg(short, long, default_value_t = 15)]
        tolerance: u8,

        /// Output path: `.png` or `.jpg` writes the highlighted rendering (JPEG on white), `.svg` a document
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert a raster image (PNG, JPEG, ...) into a quantized SVG document
    Import {
        input: PathBuf,

        /// Palette size
        #[arg(short = 'k', long, default_value_t = 16)]
        colors: usize,

        /// Output path (defaults to `<input stem>.svg`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn entry_json(entry: &ColorEntry) -> Value {
    json!({
        "hex": entry.hex(),
        "count": entry.count,
        "percentage": entry.percentage,
    })
}

fn prefixed(input: &Path, prefix: &str) -> PathBuf {
    let name = input.file_name().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{prefix}{name}"))
}

fn open(input: &Path, config: AnalyzerConfig) -> Result<Session<ResvgRasterizer>> {
    let doc = fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    Session::open(doc, ResvgRasterizer::new(), config)
        .with_context(|| format!("cannot analyse {}", input.display()))
}

fn raster(session: &Session<ResvgRasterizer>) -> Result<PixelBuffer> {
    session.export_raster()?.context("no rendering available")
}

fn write(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("cannot write {}", path.display()))?;
    eprintln!("Saved → {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AnalyzerConfig::default()
        .with_max_render_size(args.max_size)
        .with_iterations(args.iterations);

    match args.command {
        Command::Analyze { input, top, groups } => {
            let session = open(&input, config)?;
            let colors = session.colors();
            let shown = &colors[..top.unwrap_or(colors.len()).min(colors.len())];
            let mut out = json!({
                "colors": shown.iter().map(entry_json).collect::<Vec<_>>(),
                "total": session.total_opaque(),
            });
            if groups {
                let k = kmeans::suggested_group_count(colors.len());
                let groups = kmeans::group_by_similarity(colors, k)?;
                out["groups"] = groups
                    .iter()
                    .map(|g| {
                        json!({
                            "centroid": to_hex(g.centroid),
                            "total": g.total_count(),
                            "colors": g.colors.iter().map(|c| c.hex()).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }

        Command::Reduce {
            input,
            colors,
            output,
        } => {
            let mut session = open(&input, config)?;
            let before = session.colors().len();
            let mapping = session
                .reduce_colors(colors)
                .context("color reduction failed")?;
            let out_path = output.unwrap_or_else(|| prefixed(&input, "reduced_"));
            write(&out_path, session.current_document())?;

            let pairs: serde_json::Map<String, Value> = mapping
                .iter()
                .map(|(old, new)| (to_hex(old), Value::String(to_hex(new))))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "before": before,
                    "after": session.colors().len(),
                    "mapping": pairs,
                }))?
            );
        }

        Command::Recolor {
            input,
            from,
            to,
            output,
        } => {
            from_hex(&from).with_context(|| format!("--from {from}"))?;
            from_hex(&to).with_context(|| format!("--to {to}"))?;
            let doc = fs::read_to_string(&input)
                .with_context(|| format!("cannot read {}", input.display()))?;
            let out_path = output.unwrap_or_else(|| prefixed(&input, "recolored_"));
            write(&out_path, replace_color(&doc, &from, &to))?;
        }

        Command::Highlight {
            input,
            color,
            upto,
            tolerance,
            output,
        } => {
            let mut session = open(&input, config.with_tolerance(tolerance))?;
            let mode = match (color, upto) {
                (Some(hex), _) => HighlightMode::SingleColor(from_hex(&hex)?),
                (None, Some(index)) => HighlightMode::CumulativePrefix(index),
                (None, None) => bail!("either --color or --upto is required"),
            };
            session.select(mode);
            eprintln!(
                "Showing {} of {} colors",
                session.visible_color_count(),
                session.colors().len()
            );

            let ext = output
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            match ext.as_deref() {
                Some("png") => write(&output, raster(&session)?.to_png()?)?,
                Some("jpg" | "jpeg") => write(&output, raster(&session)?.to_jpeg(95)?)?,
                Some("svg") | None => write(&output, session.export_highlighted()?)?,
                Some(other) => bail!("unsupported output format .{other} (use .svg, .png or .jpg)"),
            }
        }

        Command::Import {
            input,
            colors,
            output,
        } => {
            let bytes = fs::read(&input)?;
            let config = config.with_import_colors(colors);
            let doc = svg_palette_wasm::quantize::import_raster(&bytes, &config)
                .context("raster import failed")?;
            let (w, h) = document::bounding_box(&doc)?;
            eprintln!("Imported {}x{} raster", w, h);
            let out_path = output.unwrap_or_else(|| input.with_extension("svg"));
            write(&out_path, doc)?;
        }
    }

    Ok(())
}
