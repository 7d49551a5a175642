/*!
geoframe command line interface

Provides commands for inspecting and reprojecting delimited datasets that
carry a WKT geometry column.
*/

use clap::{Parser, Subcommand};
use geoframe::{Crs, SourceDescriptor, SpatialTable, VERSION};
use polars::prelude::{CsvWriter, SerWriter};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "geoframe")]
#[command(about = "Inspect and transform spatially enabled tables")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show shape, geometry types, bounds, and CRS of a dataset
    Info {
        /// Delimited text file with a WKT geometry column
        file: PathBuf,

        /// Name of the geometry column
        #[arg(long, default_value = "geometry")]
        geometry_column: String,

        /// CRS the coordinates are declared in (e.g. EPSG:4326)
        #[arg(long)]
        crs: String,

        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the bounding box of a dataset
    Bounds {
        /// Delimited text file with a WKT geometry column
        file: PathBuf,

        /// Name of the geometry column
        #[arg(long, default_value = "geometry")]
        geometry_column: String,

        /// CRS the coordinates are declared in
        #[arg(long)]
        crs: String,
    },

    /// Reproject a dataset and write it back out as CSV
    Reproject {
        /// Delimited text file with a WKT geometry column
        file: PathBuf,

        /// Name of the geometry column
        #[arg(long, default_value = "geometry")]
        geometry_column: String,

        /// CRS the coordinates are declared in
        #[arg(long)]
        crs: String,

        /// Target CRS
        #[arg(long)]
        to: String,

        /// Output file path (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info {
            file,
            geometry_column,
            crs,
            json,
        } => {
            let table = load(file, geometry_column, &crs)?;
            let types: Vec<String> = table
                .geometry_types()?
                .iter()
                .map(|t| t.to_string())
                .collect();
            if json {
                let payload = serde_json::json!({
                    "rows": table.row_count(),
                    "columns": table.column_names(),
                    "geometry_types": types,
                    "crs": table.crs().to_string(),
                    "bounds": table.bounds()?,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Rows:           {}", table.row_count());
                println!("Columns:        {}", table.column_names().join(", "));
                println!("Geometry types: {}", types.join(", "));
                match table.crs().name() {
                    Some(name) => println!("CRS:            {} ({})", table.crs(), name),
                    None => println!("CRS:            {}", table.crs()),
                }
            }
        }

        Commands::Bounds {
            file,
            geometry_column,
            crs,
        } => {
            let table = load(file, geometry_column, &crs)?;
            match table.bounds()? {
                Some(b) => println!(
                    "min_x={} min_y={} max_x={} max_y={}",
                    b.min_x, b.min_y, b.max_x, b.max_y
                ),
                None => println!("no geometries"),
            }
        }

        Commands::Reproject {
            file,
            geometry_column,
            crs,
            to,
            output,
        } => {
            let table = load(file, geometry_column, &crs)?;
            let target = parse_crs(&to)?;
            let projected = table.reproject(target)?;
            let mut df = projected.df().clone();
            match output {
                Some(path) => {
                    let file = std::fs::File::create(path)?;
                    CsvWriter::new(file).finish(&mut df)?;
                }
                None => {
                    CsvWriter::new(std::io::stdout()).finish(&mut df)?;
                }
            }
        }
    }
    Ok(())
}

fn parse_crs(text: &str) -> anyhow::Result<Crs> {
    text.parse::<Crs>().map_err(|e| anyhow::anyhow!(e))
}

fn load(file: PathBuf, geometry_column: String, crs: &str) -> anyhow::Result<SpatialTable> {
    let crs = parse_crs(crs)?;
    Ok(SpatialTable::from_existing_source(
        SourceDescriptor::Csv {
            path: file,
            geometry_column: Some(geometry_column),
            crs: Some(crs),
        },
        None,
    )?)
}
