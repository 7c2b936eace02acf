use std::{collections::BTreeSet, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "slideforge", version)]
struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Allocate images and render every variation to PNG files.
    Generate(GenerateArgs),
    /// Load and validate a content manifest without rendering.
    Check(CheckArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    /// Used images are forgotten at the start of every variation.
    Variation,
    /// Used images stay used for the whole run.
    Run,
}

impl From<ScopeArg> for slideforge::DuplicateScope {
    fn from(s: ScopeArg) -> Self {
        match s {
            ScopeArg::Variation => Self::Variation,
            ScopeArg::Run => Self::Run,
        }
    }
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Content manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Primary font (TTF/OTF).
    #[arg(long)]
    font: PathBuf,

    /// Directory of fallback glyph images named `{hex}.png|svg`.
    #[arg(long)]
    fallback_dir: Option<PathBuf>,

    /// Number of variations to generate.
    #[arg(long, default_value_t = 1)]
    variations: u32,

    /// Allow every product to repeat images.
    #[arg(long, default_value_t = false)]
    allow_all_duplicates: bool,

    /// Output root; defaults to `<manifest dir>/output`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Seed for allocation and styling; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Duplicate-avoidance scope.
    #[arg(long, value_enum, default_value_t = ScopeArg::Variation)]
    scope: ScopeArg,

    /// Render the slots of each variation in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Content manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Also report caption code points this font cannot draw.
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let model = slideforge::load_manifest(&args.manifest)?;
    let face = slideforge::TtfFace::load(&args.font)?;
    let fallback = match &args.fallback_dir {
        Some(dir) => slideforge::FallbackGlyphs::load_dir(dir)?,
        None => slideforge::FallbackGlyphs::new(),
    };

    let opts = slideforge::GeneratorOpts {
        seed: args.seed,
        scope: args.scope.into(),
        threading: slideforge::RenderThreading {
            parallel: args.parallel,
            threads: args.threads,
        },
    };
    let mut generator = slideforge::Generator::new(Arc::new(face), Arc::new(fallback), opts);
    generator.load(model)?;
    let report = generator
        .generate(
            args.variations,
            args.allow_all_duplicates,
            args.out.as_deref(),
        )
        .with_context(|| format!("generate from '{}'", args.manifest.display()))?;

    for missing in report.coverage.unmapped() {
        eprintln!(
            "warning: U+{:04X} ({}) has no glyph in '{}' and no fallback image ({} uses)",
            missing.codepoint, missing.ch, missing.font_family, missing.count
        );
    }
    for o in &report.overflows {
        eprintln!(
            "warning: caption '{}' at {} overflows: {:.0}px vertical, {:.0}px horizontal",
            o.overflow.caption, o.slot, o.overflow.vertical, o.overflow.horizontal
        );
    }
    eprintln!(
        "wrote {} files to {} (seed {})",
        report.files.len(),
        report.output_root.display(),
        report.seed
    );
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let model = slideforge::load_manifest(&args.manifest)?;

    for ct in model.content_types.values() {
        println!(
            "content type '{}': {} images, {} products",
            ct.name,
            ct.images.len(),
            ct.products.len()
        );
    }
    println!(
        "{} caption rows, {} images per variation",
        model.rows.len(),
        model.slots_per_variation()
    );

    if let Some(font) = &args.font {
        let face = slideforge::TtfFace::load(font)?;
        let mut missing = BTreeSet::new();
        for cell in model.rows.iter().flat_map(|r| r.cells.iter()) {
            let lines = slideforge::split_caption(&cell.text, &cell.extra_lines);
            for line in &lines {
                for run in slideforge::segment_runs(&face, line) {
                    if run.kind == slideforge::RunKind::Fallback {
                        missing.extend(run.text.chars().filter(|&c| !slideforge::is_joiner(c)));
                    }
                }
            }
        }
        for ch in &missing {
            println!("needs fallback: U+{:04X} ({ch})", *ch as u32);
        }
    }

    println!("ok");
    Ok(())
}
