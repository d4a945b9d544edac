use clap::Parser;
use std::path::PathBuf;

use crate::batch::BatchOptions;

#[derive(Parser, Debug)]
#[command(name = "zipmin")]
#[command(version)]
#[command(about = "Shrink ZIP archives by dropping directory entries, extra fields and comments", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipmin a.zip b.zip             minify both archives in place\n  \
  zipmin -n --verify *.zip       report savings and check contents, write nothing\n  \
  zipmin -o out/ release.zip     write the minified archive to out/release.zip\n  \
  zipmin -lv release.zip         list entries with what minification would drop")]
pub struct Cli {
    /// ZIP files to minify (repeats are processed once)
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,

    /// Minify and report, but write nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Write minified archives into DIR instead of replacing the inputs
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Check that every file extracts identically before writing
    #[arg(long)]
    pub verify: bool,

    /// List entries instead of minifying
    #[arg(short = 'l', long)]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            dry_run: self.dry_run,
            verify: self.verify,
            output_dir: self.output_dir.clone(),
        }
    }
}
