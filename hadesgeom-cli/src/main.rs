//! hadesgeom CLI
//!
//! Builds the HADES test-stand geometry for one detector and measurement
//! and writes it as GDML.
#![allow(clippy::uninlined_format_args, clippy::struct_excessive_bools)]

use clap::Parser;
use hadesgeom_assembly::{Assemblies, BuildError, GeometryPipeline};
use hadesgeom_core::ConfigValidationError;
use hadesgeom_io::{
    list_volumes, visualize, write_gdml, ExternalViewer, Scene, VolumeListing, VIEWER_ENV,
};
use hadesgeom_meta::{load_config, DirectoryStore, MetadataResolver, DIODE_STORE, HADES_STORE};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

/// Crates raised to debug by `--verbose`.
const WORKSPACE_CRATES: [&str; 5] = [
    "hadesgeom",
    "hadesgeom_core",
    "hadesgeom_meta",
    "hadesgeom_assembly",
    "hadesgeom_io",
];

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    #[error(transparent)]
    Export(#[from] hadesgeom_io::Error),
}

/// Build the HADES test-stand geometry as GDML.
#[derive(Parser, Debug)]
#[command(name = "hadesgeom")]
#[command(author, version, about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(long, action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Output GDML file
    filename: Option<PathBuf>,

    /// Detector name, e.g. V07302A
    #[arg(long)]
    hpge_name: String,

    /// Measurement name, e.g. am_HS1_top_dlt
    #[arg(long)]
    measurement: String,

    /// Measurement configuration (source position, lead castle)
    #[arg(short, long)]
    config: PathBuf,

    /// Use the bundled public test metadata
    #[arg(long)]
    public_geom: bool,

    /// Directory with the crystal metadata documents
    #[arg(long, env = "LEGEND_METADATA")]
    diodes_dir: Option<PathBuf>,

    /// Directory with the holder/wrap metadata documents
    #[arg(long, env = "HADES_METADATA")]
    hades_dims_dir: Option<PathBuf>,

    /// Parts to build (cryostat, lead_castle, bottom_plate, source, source_holder); all if omitted
    #[arg(long, value_delimiter = ',')]
    assemblies: Option<Vec<String>>,

    /// Open the geometry in the viewer, optionally with a scene file
    #[arg(short = 'V', long, num_args = 0..=1)]
    visualize: Option<Option<PathBuf>>,

    /// Clip the visualized geometry along the detector axis
    #[arg(long)]
    clip_geometry: bool,

    /// Turn clearance warnings into errors
    #[arg(long)]
    check_overlaps: bool,

    /// Print a volume listing (logical, physical, detector)
    #[arg(long)]
    print_volumes: Option<VolumeListing>,

    /// Debug output for hadesgeom
    #[arg(short, long)]
    verbose: bool,

    /// Debug output for everything
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    let own = if cli.verbose || cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    for name in WORKSPACE_CRATES {
        builder.filter_module(name, own);
    }
    builder.parse_default_env();
    builder.init();
}

fn resolver(cli: &Cli) -> Result<MetadataResolver> {
    if cli.public_geom {
        return Ok(MetadataResolver::public());
    }
    match (&cli.diodes_dir, &cli.hades_dims_dir) {
        (Some(diodes), Some(hades)) => Ok(MetadataResolver::new(
            DirectoryStore::new(DIODE_STORE, diodes),
            DirectoryStore::new(HADES_STORE, hades),
        )),
        _ => Err(CliError::Usage(
            "metadata directories not set: pass --diodes-dir and --hades-dims-dir \
             (or LEGEND_METADATA and HADES_METADATA), or use --public-geom"
                .into(),
        )),
    }
}

fn assemblies(cli: &Cli) -> Result<Assemblies> {
    match &cli.assemblies {
        Some(names) => Ok(Assemblies::from_names(names)?),
        None => Ok(Assemblies::default()),
    }
}

fn output_path(cli: &Cli) -> Result<PathBuf> {
    match (&cli.filename, &cli.visualize) {
        (Some(path), _) => Ok(path.clone()),
        (None, Some(_)) => Ok(std::env::temp_dir()
            .join(format!("hadesgeom_{}_{}.gdml", cli.hpge_name, cli.measurement))),
        (None, None) => Err(CliError::Usage(
            "no output file and no visualization specified".into(),
        )),
    }
}

fn show(cli: &Cli, gdml: &Path, scene_file: Option<&Path>) -> Result<()> {
    let mut scene = match scene_file {
        Some(path) => Scene::load(path)?,
        None => Scene::default(),
    };
    if cli.clip_geometry {
        scene = scene.clipped();
    }
    match ExternalViewer::from_env() {
        Some(viewer) => {
            visualize(&viewer, gdml, &scene);
        }
        None => log::warn!("no viewer configured, set {VIEWER_ENV} to visualize"),
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let output = output_path(cli)?;
    let config = load_config(&cli.config)?;
    let resolver = resolver(cli)?;

    let world = GeometryPipeline::new()
        .with_assemblies(assemblies(cli)?)
        .with_overlap_check(cli.check_overlaps)
        .construct(&resolver, &cli.hpge_name, &cli.measurement, &config)?;

    if let Some(listing) = cli.print_volumes {
        for line in list_volumes(&world, listing) {
            println!("{line}");
        }
    }

    write_gdml(&world, &output)?;

    if let Some(scene_file) = &cli.visualize {
        show(cli, &output, scene_file.as_deref())?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
