use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use dendrolook::io::{read_matrix, write_clusters_tsv, write_json, write_matrix};
use dendrolook::render::{self, Figure};
use dendrolook::{cluster_matrix, ClusterConfig, DistanceMetric, IoError, Linkage};

#[derive(Parser)]
#[command(name = "dendrolook")]
#[command(about = "Cluster the rows and columns of a matrix and lay out their dendrograms.", long_about = None)]
struct Args {
    // MANDATORY OPTIONS
    /// Load the matrix in TSV format from this FILE.
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: PathBuf,

    /// Write the reordered matrix as TSV to this FILE.
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,

    // Clustering Options
    /// Distance between rows (and between columns).
    #[arg(short = 'd', long = "distance", value_enum, default_value_t = DistanceMetric::Euclidean)]
    distance: DistanceMetric,

    /// Linkage rule used when merging clusters.
    #[arg(short = 'l', long = "linkage", value_enum, default_value_t = Linkage::Average)]
    linkage: Linkage,

    /// Z-score normalize each row before measuring distances.
    #[arg(short = 'z', long = "zscore")]
    zscore: bool,

    /// Only cluster rows; columns keep their input order.
    #[arg(short = 'R', long = "rows-only")]
    rows_only: bool,

    /// Cut the row dendrogram at this height and write <out>.clusters.tsv.
    #[arg(short = 'c', long = "cut-height", value_name = "F")]
    cut_height: Option<f64>,

    // Output Options
    /// Write orders, merges and layout lines as JSON to this FILE.
    #[arg(short = 'j', long = "json", value_name = "FILE")]
    json: Option<PathBuf>,

    /// Draw the dendrograms to this FILE (PNG or SVG based on extension).
    #[arg(short = 'p', long = "plot", value_name = "FILE")]
    plot: Option<PathBuf>,

    /// Set the width in pixels of the plot.
    #[arg(short = 'x', long = "width", value_name = "N", default_value_t = 800)]
    width: u32,

    /// Set the height in pixels of the plot.
    #[arg(short = 'y', long = "height", value_name = "N", default_value_t = 800)]
    height: u32,

    // Threading
    /// Number of threads to use for parallel operations.
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

fn run(args: &Args) -> Result<(), IoError> {
    let labeled = read_matrix(&args.input)?;
    if labeled.matrix.rows() == 0 {
        warn!("No rows found in {:?}", args.input);
    }

    let config = ClusterConfig {
        metric: args.distance,
        linkage: args.linkage,
        normalize: args.zscore,
        cluster_columns: !args.rows_only,
    };
    let result = cluster_matrix(&labeled.matrix, &config)?;
    if let Some(fp) = &result.rows.fingerprint {
        info!("Row dendrogram fingerprint: {}", fp);
    }
    if let Some(fp) = result.columns.as_ref().and_then(|c| c.fingerprint.as_ref()) {
        info!("Column dendrogram fingerprint: {}", fp);
    }

    let column_order = result.column_order();
    let reordered = labeled.reorder(&result.rows.order, &column_order)?;
    info!("Saving to {:?}...", args.out);
    write_matrix(&args.out, &reordered)?;

    if let Some(height) = args.cut_height {
        // foo.tsv -> foo.clusters.tsv
        let tsv_path = args.out.with_extension("clusters.tsv");
        let labels = result.rows.cut(height);
        let n_clusters = labels.iter().max().map_or(0, |&m| m + 1);
        info!("Cut at height {} gives {} row clusters", height, n_clusters);
        write_clusters_tsv(&tsv_path, &labeled.row_names, &result.rows.order, &labels)?;
    }

    if let Some(json_path) = &args.json {
        write_json(json_path, &labeled, &result)?;
    }

    if let Some(plot_path) = &args.plot {
        let column_lines = result
            .columns
            .as_ref()
            .map(|c| c.layout.as_slice())
            .unwrap_or_default();
        let figure = Figure {
            width: args.width,
            height: args.height,
            row_lines: &result.rows.layout,
            column_lines,
            row_labels: &reordered.row_names,
            column_labels: &reordered.col_names,
        };
        render::save(plot_path, &figure)?;
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!("Could not configure {} threads: {}", threads, e);
        }
    }

    info!("Starting clustering...");

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!("Done.");
}
