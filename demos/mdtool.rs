//! Create and inspect MiniDisc image files from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use mdimage::format::image_bytes;
use mdimage::{DiscType, FileImage, Image, MdResult};

#[derive(Parser)]
#[command(name = "mdtool", about = "Create and inspect MiniDisc image files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a blank image file for the given capacity class
    Create {
        /// Capacity class of the disc
        #[arg(long, value_enum)]
        disc_type: DiscTypeArg,
        /// Overwrite the target file if it already exists
        #[arg(long)]
        force: bool,
        /// Path of the image file to create
        path: PathBuf,
    },
    /// Open an image file and print its geometry
    Info {
        /// Path of the image file to inspect
        path: PathBuf,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum DiscTypeArg {
    Md60,
    Md74,
    Md80,
}

impl From<DiscTypeArg> for DiscType {
    fn from(arg: DiscTypeArg) -> DiscType {
        match arg {
            DiscTypeArg::Md60 => DiscType::Md60,
            DiscTypeArg::Md74 => DiscType::Md74,
            DiscTypeArg::Md80 => DiscType::Md80,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let res = match cli.command {
        Command::Create {
            disc_type,
            force,
            path,
        } => create(disc_type.into(), force, &path),
        Command::Info { path } => info(&path),
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn create(disc_type: DiscType, force: bool, path: &PathBuf) -> MdResult<()> {
    if force && path.exists() {
        std::fs::remove_file(path)?;
    }

    FileImage::create(path, disc_type)?;

    println!("Created MiniDisc image:");
    print_geometry(disc_type, path);

    Ok(())
}

fn info(path: &PathBuf) -> MdResult<()> {
    let (image, disc_type) = FileImage::open(path)?;

    println!("Opened MiniDisc image ({}):", image.image_format());
    print_geometry(disc_type, path);

    Ok(())
}

fn print_geometry(disc_type: DiscType, path: &PathBuf) {
    println!("  type          : {}", disc_type);
    println!("  program end   : {:#06x}", disc_type.program_end());
    println!("  total clusters: {}", disc_type.total_clusters());
    println!("  total bytes   : {}", image_bytes(disc_type.total_clusters()));
    println!("  path          : {}", path.display());
}
