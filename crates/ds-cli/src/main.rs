//! Dungeon secrets catalog tools
//!
//! Encode room layouts into catalog blobs, inspect a catalog tree and match
//! a sampled room against it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{debug, error};
use serde::Deserialize;
use thiserror::Error;

use ds_core::catalog::ROOM_FILE_SUFFIX;
use ds_core::codec::encode_room;
use ds_core::loader::load_catalog;
use ds_core::metadata::DirResourceProvider;
use ds_core::voxel::VoxelError;
use ds_core::{
    match_room, palette, resolve, BlockPos, CatalogError, DirCatalogSource, GridDims,
    MatchResult, MetadataIds, ObservedRoom, ResourceGate, RoomLibrary, RoomVoxelGrid,
    SecretsConfig,
};

#[derive(Parser, Debug)]
#[command(name = "dungeon-secrets")]
#[command(author, version, about = "Dungeon room catalog tools", long_about = None)]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a JSON room description into a room blob
    Encode {
        input: PathBuf,
        /// Output file; the room suffix is added when missing
        output: PathBuf,
    },
    /// Load a catalog and print what was found
    Inspect {
        catalog: PathBuf,
        /// Directory holding `assets/<namespace>/...` metadata documents
        #[arg(short = 'r', long = "resources")]
        resources: Option<PathBuf>,
    },
    /// Match a sampled room (JSON room description) against a catalog
    Match {
        catalog: PathBuf,
        sample: PathBuf,
        /// Room shape, e.g. 1x1 or L-shape
        #[arg(short = 's', long = "shape", default_value = "1x1")]
        shape: String,
        /// World position of the sample's first cell, as x,y,z
        #[arg(short = 'a', long = "anchor", default_value = "0,0,0")]
        anchor: String,
        #[arg(short = 'r', long = "resources")]
        resources: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid room description: {0}")]
    Room(#[from] VoxelError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("invalid anchor {0:?}, expected x,y,z")]
    Anchor(String),
}

/// A room layout with block identifiers, x fastest, then z, then y
#[derive(Debug, Deserialize)]
struct RoomDescription {
    width: u16,
    height: u16,
    depth: u16,
    blocks: Vec<String>,
}

impl RoomDescription {
    fn read(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Unknown identifiers become unmapped cells.
    fn to_grid(&self) -> Result<RoomVoxelGrid, VoxelError> {
        let cells = self.blocks.iter().map(|id| palette::code_of(id)).collect();
        RoomVoxelGrid::from_cells(GridDims::new(self.width, self.height, self.depth), cells)
    }
}

fn parse_anchor(text: &str) -> Result<BlockPos, CliError> {
    let parts: Vec<i32> = text
        .split(',')
        .map(|p| p.trim().parse())
        .collect::<Result<_, _>>()
        .map_err(|_| CliError::Anchor(text.to_string()))?;
    match parts.as_slice() {
        [x, y, z] => Ok(BlockPos::new(*x, *y, *z)),
        _ => Err(CliError::Anchor(text.to_string())),
    }
}

fn load_config(path: Option<&Path>) -> Result<SecretsConfig, CliError> {
    match path.map(Path::to_path_buf).or_else(SecretsConfig::default_path) {
        Some(path) => Ok(SecretsConfig::load_from_file(path)?),
        None => Ok(SecretsConfig::default()),
    }
}

/// Load the catalog, plus metadata when a resource directory is given.
fn load_library(
    catalog: &Path,
    resources: Option<&Path>,
    config: &SecretsConfig,
) -> Result<(RoomLibrary, Vec<String>), CliError> {
    let source = DirCatalogSource::new(catalog);
    let (library, failures) = match resources {
        Some(dir) => {
            let gate = ResourceGate::with_provider(Arc::new(DirResourceProvider::new(dir)));
            let (library, report) =
                RoomLibrary::load(&source, &gate, &MetadataIds::from_config(config))?;
            (library, report.failures)
        }
        None => {
            let (catalog, failures) = load_catalog(&source)?;
            let library = RoomLibrary {
                catalog,
                ..RoomLibrary::default()
            };
            (library, failures)
        }
    };
    let failures = failures
        .into_iter()
        .map(|f| format!("{}: {}", f.path, f.error))
        .collect();
    Ok((library, failures))
}

fn encode(input: &Path, output: &Path) -> Result<(), CliError> {
    let grid = RoomDescription::read(input)?.to_grid()?;
    let bytes = encode_room(&grid)?;
    let mut output = output.to_path_buf();
    if !output.to_string_lossy().ends_with(ROOM_FILE_SUFFIX) {
        output.as_mut_os_string().push(ROOM_FILE_SUFFIX);
    }
    fs::write(&output, &bytes).map_err(|source| CliError::Read {
        path: output.clone(),
        source,
    })?;
    println!(
        "Wrote {} ({}, {} defined cells, {} bytes)",
        output.display(),
        grid.dims(),
        grid.defined_count(),
        bytes.len()
    );
    Ok(())
}

fn inspect(catalog: &Path, resources: Option<&Path>, config: &SecretsConfig) -> Result<(), CliError> {
    let (library, failures) = load_library(catalog, resources, config)?;
    for (dungeon, shapes) in library.catalog.dungeons() {
        println!("{dungeon}");
        for (shape, bucket) in shapes {
            println!("  {shape:<8} {:>4} room(s)  {}", bucket.len(), bucket.dims());
        }
    }
    if let Some(rooms) = &library.rooms {
        println!("room metadata: {} entries", rooms.len());
    }
    if let Some(secrets) = &library.secrets {
        println!("secret waypoints: {} rooms", secrets.len());
    }
    for failure in &failures {
        println!("failed: {failure}");
    }
    println!(
        "{} dungeon(s), {} shape(s), {} room(s), {} failure(s)",
        library.catalog.dungeon_count(),
        library.catalog.shape_count(),
        library.catalog.room_count(),
        failures.len()
    );
    Ok(())
}

fn match_sample(
    catalog: &Path,
    sample: &Path,
    shape: String,
    anchor: BlockPos,
    resources: Option<&Path>,
    config: &SecretsConfig,
) -> Result<(), CliError> {
    let (library, _) = load_library(catalog, resources, config)?;
    let observed = ObservedRoom {
        dungeon: config.dungeon_type.clone(),
        shape,
        anchor,
        sample: RoomDescription::read(sample)?.to_grid()?,
    };
    let result = match_room(&observed, &library.catalog);
    match &result {
        MatchResult::Matched(room) => {
            println!("{} ({}) at {:?}", room.name, room.orientation, room.anchor);
            if let Some(table) = &library.secrets {
                let secrets = resolve(&result, table);
                let json = serde_json::to_string_pretty(&secrets).map_err(|source| {
                    CliError::Json {
                        path: sample.to_path_buf(),
                        source,
                    }
                })?;
                println!("{json}");
            }
        }
        MatchResult::InsufficientObservation => println!("nothing observed in sample"),
        MatchResult::NoCatalogMatch => println!("no catalog room matches"),
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    debug!("Using configuration {:?}", config);
    match args.command {
        Command::Encode { input, output } => encode(&input, &output),
        Command::Inspect { catalog, resources } => {
            inspect(&catalog, resources.as_deref(), &config)
        }
        Command::Match {
            catalog,
            sample,
            shape,
            anchor,
            resources,
        } => {
            let anchor = parse_anchor(&anchor)?;
            match_sample(&catalog, &sample, shape, anchor, resources.as_deref(), &config)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_anchor() {
        assert_eq!(parse_anchor("1, -2,3").unwrap(), BlockPos::new(1, -2, 3));
        assert!(parse_anchor("1,2").is_err());
        assert!(parse_anchor("a,b,c").is_err());
    }

    #[test]
    fn test_description_maps_unknown_blocks() {
        let description = RoomDescription {
            width: 2,
            height: 1,
            depth: 1,
            blocks: vec!["minecraft:stone".into(), "minecraft:diamond_block".into()],
        };
        let grid = description.to_grid().unwrap();
        assert_eq!(grid.get(0, 0, 0), palette::code_of("minecraft:stone"));
        assert_eq!(grid.get(1, 0, 0), palette::UNMAPPED);
    }

    #[test]
    fn test_description_length_checked() {
        let description = RoomDescription {
            width: 2,
            height: 2,
            depth: 2,
            blocks: vec!["minecraft:stone".into()],
        };
        assert!(description.to_grid().is_err());
    }
}
