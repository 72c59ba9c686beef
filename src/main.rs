use clap::{Parser, Subcommand};
use kiln::config::Config;
use kiln::{init, pipeline::Pipeline};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Asset build pipeline for hand-written static sites")]
#[command(long_about = "\
Asset build pipeline for hand-written static sites

Bakes a readable source tree into a deployable build tree: HTML and JS
minified, CSS bundled and prefixed, images optimized with WebP variants,
icon SVGs merged into a sprite sheet.

Source structure:

  source/
  ├── index.html               # Top-level pages → minified
  ├── manifest.webmanifest     # Copied verbatim (with *.ico)
  ├── css/
  │   └── styles.css           # Entry; pulls partials via @import
  ├── js/                      # Top-level scripts → NAME.min.js
  ├── img/
  │   ├── favicons/            # Optimized, never converted to WebP
  │   ├── icons/               # Merged into img/stack.svg
  │   ├── backgrounds/         # Merged into img/stack.svg
  │   └── ...                  # png/jpg optimized + .webp, svg minified
  └── fonts/                   # woff/woff2, copied verbatim

Run without a subcommand for development mode: a fast build, a local
server with live reload, and a watcher that rebuilds on save.")]
#[command(version)]
struct Cli {
    /// Source directory (overrides kiln.toml)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output directory (overrides kiln.toml)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Config file (default: kiln.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full production build
    Build,
    /// Compile the stylesheet only
    Css,
    /// Scaffold a new source tree
    Init {
        /// Overwrite an existing source tree
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(source) = cli.source {
        config.paths.source = source;
    }
    if let Some(output) = cli.output {
        config.paths.output = output;
    }

    let pipeline = Pipeline::new(config);
    match cli.command {
        Some(Command::Build) => {
            pipeline.build()?;
            println!("==> Build complete: {}", pipeline.paths().output.display());
        }
        Some(Command::Css) => {
            pipeline.css_only()?;
        }
        Some(Command::Init { force }) => {
            init::scaffold(pipeline.paths(), force)?;
        }
        None => {
            pipeline.develop()?;
        }
    }
    Ok(())
}
