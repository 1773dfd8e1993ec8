use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cluster-weights")]
#[command(about = "Rasterize labelled polygon clusters into smoothed multi-band weight surfaces")]
#[command(version)]
pub struct Args {
    /// Input vector file with cluster polygons (EPSG:4326, integer `cluster` field)
    #[arg(short, long, value_name = "FILE")]
    pub input: String,

    /// JSON file with outputTarget, size and geotransform
    #[arg(short, long, value_name = "FILE")]
    pub config: String,

    /// EPSG code of the output raster
    #[arg(short, long, value_name = "CODE", allow_negative_numbers = true)]
    pub epsg: i32,

    /// Gaussian spread in pixels (0 disables smoothing)
    #[arg(short, long, value_name = "PIXELS", default_value_t = 15.0)]
    pub sigma: f64,

    /// Compression: DEFLATE, LZW, ZSTD, or NONE
    #[arg(long, value_name = "TYPE")]
    pub compression: Option<String>,

    /// Write a tiled GeoTIFF with this block size (multiple of 16)
    #[arg(long, value_name = "PIXELS")]
    pub tile_size: Option<usize>,

    /// Require cluster indices to be exactly 0..N-1, one feature each
    #[arg(long)]
    pub strict_clusters: bool,

    /// Number of threads (default: all available)
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
