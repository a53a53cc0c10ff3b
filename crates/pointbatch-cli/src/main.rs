//! Command-line front end for binary point cloud batches.
//!
//! Converts text point lists to the binary record format, decodes batches by
//! name, answers size-only bounds requests through the on-disk bounds cache,
//! and prints level-of-detail hierarchies.

use std::{
    error::Error,
    fs::File,
    io::{BufReader, BufWriter},
    ops::Range,
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use pointbatch::{
    BinaryPointsLoader, Bounds, Decimation, FilesystemBoundsCache, GeometrySink, LoadOptions,
    LodConfig, LodHierarchy, LodTreeBuilder, PointBatch, Sampling, SearchPathResolver,
};
use serde_json::json;

#[derive(Parser)]
#[command(name = "pointbatch", about = "Batch loading tools for binary point clouds")]
struct Cli {
    /// Directory to resolve point file names against. May be repeated.
    #[arg(long = "data-dir", global = true)]
    data_dirs: Vec<PathBuf>,

    /// Records hold 32-bit floats instead of 64-bit.
    #[arg(long, global = true)]
    single_precision: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert whitespace-separated `x y z [r g b a]` lines to binary records.
    Convert { input: PathBuf, output: PathBuf },

    /// Print the record count of a point file.
    Info { file: PathBuf },

    /// Decode a batch, e.g. `scan.10-5-20.xyzb`.
    Decode {
        name: String,

        /// Start of the range in percent. Ignored for batch names.
        #[arg(long, default_value_t = 0)]
        start: u32,

        /// Length of the range in percent; 0 reads to the end. Ignored for
        /// batch names.
        #[arg(long, default_value_t = 0)]
        length: u32,

        /// Keep one record in every N. Ignored for batch names.
        #[arg(long, default_value_t = 1)]
        decimation: i64,

        /// Take the first record of every bucket instead of a random one.
        #[arg(long)]
        sequential: bool,

        /// Seed for random decimation.
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum points per draw range.
        #[arg(long, default_value_t = pointbatch::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Print the bounds of a batch, reading the bounds cache first.
    Bounds { name: String },

    /// Build the level-of-detail hierarchy of a point file.
    Tree {
        file: String,

        /// `"<pointsPerBatch> <distMin>:<distMax>:<decimation> ..."`
        config: String,

        /// Print the hierarchy as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Reports what a real scene container would receive.
struct SummarySink;

impl GeometrySink for SummarySink {
    fn adopt(&mut self, batch: PointBatch, draw_ranges: Vec<Range<usize>>) {
        tracing::info!(
            points = batch.len(),
            draw_ranges = draw_ranges.len(),
            window_start = batch.window.start,
            window_length = batch.window.length,
            "adopted batch"
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let cli = Cli::parse();
    let base_options = LoadOptions::default().with_single_precision(cli.single_precision);
    let resolver = cli
        .data_dirs
        .iter()
        .fold(SearchPathResolver::new(), |r, dir| r.with_root(dir.clone()));
    let loader = BinaryPointsLoader::new(resolver, FilesystemBoundsCache);

    match cli.command {
        Command::Convert { input, output } => {
            let reader = BufReader::new(File::open(&input)?);
            let writer = BufWriter::new(File::create(&output)?);
            let records = pointbatch::convert_text(reader, writer, base_options.record_format())?;
            tracing::info!(
                input = %input.display(),
                output = %output.display(),
                records,
                "converted"
            );
            println!("{records}");
        }
        Command::Info { file } => {
            let format = base_options.record_format();
            let records = loader.record_count(&file, &base_options)?;
            println!(
                "{}",
                json!({
                    "file": file.display().to_string(),
                    "records": records,
                    "record_size": format.record_size(),
                    "single_precision": cli.single_precision,
                })
            );
        }
        Command::Decode {
            name,
            start,
            length,
            decimation,
            sequential,
            seed,
            batch_size,
        } => {
            let mut loader = match seed {
                Some(seed) => loader.with_seed(seed),
                None => loader,
            };
            let mut options = base_options
                .with_range(start, length)
                .with_decimation(Decimation::new(decimation))
                .with_sampling(if sequential {
                    Sampling::Sequential
                } else {
                    Sampling::Random
                });
            options.batch_size = batch_size;

            let summary = loader
                .load_into(&name, &options, &mut SummarySink)
                .ok_or_else(|| format!("{name} was not handled"))?;
            println!("{summary}");
        }
        Command::Bounds { name } => {
            let mut loader = loader;
            let bounds = loader.read_bounds(&name, &base_options.with_size_only(true))?;
            println!("{}", bounds_json(&bounds));
        }
        Command::Tree { file, config, json } => {
            let mut loader = loader;
            let config: LodConfig = config.parse()?;
            let hierarchy = LodTreeBuilder::from_config(config)
                .with_options(base_options)
                .build(&mut loader, &file)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&hierarchy_json(&hierarchy))?);
            } else {
                print_hierarchy(&hierarchy);
            }
        }
    }

    Ok(())
}

fn bounds_json(bounds: &Bounds) -> serde_json::Value {
    json!({
        "position_min": bounds.position_min.to_array(),
        "position_max": bounds.position_max.to_array(),
        "color_min": bounds.color_min.to_array(),
        "color_max": bounds.color_max.to_array(),
    })
}

fn hierarchy_json(hierarchy: &LodHierarchy) -> serde_json::Value {
    let batches: Vec<_> = hierarchy
        .batches
        .iter()
        .map(|batch| {
            let children: Vec<_> = batch
                .children
                .iter()
                .map(|child| {
                    json!({
                        "filename": child.filename,
                        "dist_min": child.dist_min,
                        "dist_max": child.dist_max,
                        "decimation": child.decimation.get(),
                        "min_expiry_frames": child.expiry.min_frames,
                        "min_expiry_time": child.expiry.min_time,
                    })
                })
                .collect();
            json!({
                "start_percent": batch.start_percent,
                "length_percent": batch.length_percent,
                "center": batch.center.map(|c| c.to_array()),
                "bounds": batch.bounds.as_ref().map(bounds_json),
                "children": children,
            })
        })
        .collect();

    json!({
        "source": hierarchy.source.display().to_string(),
        "total_records": hierarchy.total_records,
        "points_per_batch": hierarchy.points_per_batch,
        "length_percent": hierarchy.length_percent,
        "min_decimation": hierarchy.min_decimation.get(),
        "bounds": bounds_json(&hierarchy.bounds),
        "batches": batches,
    })
}

fn print_hierarchy(hierarchy: &LodHierarchy) {
    println!(
        "{}: {} records, {} batches of {}% ({} points), {} children",
        hierarchy.source.display(),
        hierarchy.total_records,
        hierarchy.batches.len(),
        hierarchy.length_percent,
        hierarchy.points_per_batch,
        hierarchy.child_count(),
    );
    for batch in &hierarchy.batches {
        let center = batch
            .center
            .map_or_else(|| "-".to_string(), |c| format!("({:.3}, {:.3}, {:.3})", c.x, c.y, c.z));
        println!(
            "  {:>3}+{:<3} center {center}",
            batch.start_percent, batch.length_percent
        );
        for child in &batch.children {
            println!(
                "        [{}, {}) {}",
                child.dist_min, child.dist_max, child.filename
            );
        }
    }
}
