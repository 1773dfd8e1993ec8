use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use cluster_weights::cli::Args;
use cluster_weights::config::RasterOutputConfig;
use cluster_weights::io::WriteOptions;
use cluster_weights::pipeline::{self, PipelineParams};
use cluster_weights::Result;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("=== Cluster Weight Rasterizer ===");

    // Set thread pool size if specified
    if let Some(n_threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build_global()
        {
            warn!("Could not configure thread pool ({}), using defaults", e);
        } else {
            info!("Using {} threads", n_threads);
        }
    } else {
        info!("Using all available threads");
    }

    // Load output configuration
    let config = RasterOutputConfig::from_path(&args.config)?;

    let params = PipelineParams {
        input: args.input,
        config,
        target_epsg: args.epsg,
        sigma: args.sigma,
        strict_clusters: args.strict_clusters,
        write_options: WriteOptions {
            compression: args.compression,
            tile_size: args.tile_size,
        },
    };

    // Reproject, rasterize, smooth and write
    let raster = pipeline::run(&params)?;
    info!(
        "Wrote {} weight bands ({}x{}, {})",
        raster.band_count(),
        raster.spec.width,
        raster.spec.height,
        raster.spec.spatial_ref
    );

    info!("=== Done! ===");
    Ok(())
}
