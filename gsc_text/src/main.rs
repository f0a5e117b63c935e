use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rscript_core::batch::{run_dump, run_pack, DumpConfig, PackConfig};
use rscript_core::format::Archive;
use rscript_core::reflow::Strategy;
use rscript_nls::Encoding;

#[derive(Parser, Debug)]
#[command(version, about = "Text dump/pack toolkit for RScript .gsc script containers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump translatable strings into editable sidecar text files.
    Dump {
        /// Container files (default: every *.gsc in the current directory).
        files: Vec<PathBuf>,
        /// Encoding of the original text.
        #[clap(long, default_value = "sjis")]
        nls: Encoding,
    },
    /// Re-insert translated sidecar text into patched container copies.
    Pack {
        /// Container files (default: every *.gsc in the current directory).
        /// Only files with a `<file>.txt` sidecar are packed.
        files: Vec<PathBuf>,
        /// Encoding the translated text is written in.
        #[clap(long, default_value = "gbk")]
        nls: Encoding,
        /// Overflow strategy: 1 = forward-bleed, 2 = truncate-and-carry.
        #[clap(long, default_value = "2")]
        strategy: Strategy,
        /// Output directory for patched containers.
        #[clap(long, default_value = "new")]
        out_dir: PathBuf,
    },
    /// Extract the sub-files of an engine archive.
    Unpack {
        archive: PathBuf,
        #[clap(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

/// Default to every `*.gsc` in the current directory when no files are
/// given on the command line.
fn working_set(files: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if !files.is_empty() {
        return Ok(files);
    }
    let mut matches: Vec<PathBuf> = glob::glob("*.gsc")
        .context("scan working directory")?
        .flatten()
        .collect();
    matches.sort();
    Ok(matches)
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Dump { files, nls } => {
            let inputs = working_set(files)?;
            let written = run_dump(&DumpConfig {
                inputs,
                encoding: nls,
            });
            println!("{} sidecar(s) written", written);
        }
        Command::Pack {
            files,
            nls,
            strategy,
            out_dir,
        } => {
            let inputs = working_set(files)?;
            let written = run_pack(&PackConfig {
                inputs,
                encoding: nls,
                strategy,
                out_dir,
            });
            println!("{} patched container(s) written", written);
        }
        Command::Unpack { archive, out_dir } => {
            let bytes = std::fs::read(&archive)
                .with_context(|| format!("read {}", archive.display()))?;
            let archive = Archive::parse(bytes)?;
            let written = archive.extract_all(&out_dir);
            println!("{} file(s) extracted", written);
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli.command) {
        log::error!("Error: {:#}", err);
        std::process::exit(1);
    }
}
