mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use pbpack_image::{BitDepth, PaletteFamily, ReductionMethod};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pbpack",
    version,
    about = "Resource pack compiler for Pebble-compatible firmware"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build a resource pack, C header and make dependency file from a manifest.
    Build {
        /// Path to the manifest (JSON, or TOML with a .toml extension).
        manifest: PathBuf,
        /// Base output name; .pbpack, .h and .d are appended.
        basename: PathBuf,
        /// Directory that resource and reference paths are relative to.
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        /// Write the .pbpack file.
        #[arg(short = 'P', long, default_value_t = false)]
        pack: bool,
        /// Write the .h file.
        #[arg(short = 'H', long, default_value_t = false)]
        header: bool,
        /// Write the .d file for make.
        #[arg(short = 'M', long, default_value_t = false)]
        make_dep: bool,
    },
    /// Quantize a PNG to a device palette.
    Convert {
        /// Source PNG.
        input: PathBuf,
        /// Destination PNG.
        output: PathBuf,
        /// Target palette family (pebble64 or pebble2).
        #[arg(long, default_value_t = PaletteFamily::Pebble64)]
        palette: PaletteFamily,
        /// Colour reduction method (nearest or truncate).
        #[arg(long, default_value_t = ReductionMethod::Nearest)]
        method: ReductionMethod,
        /// Force the output bit depth (1, 2, 4 or 8).
        #[arg(long)]
        bitdepth: Option<BitDepth>,
    },
    /// Print the hardware CRC of a file.
    Crc {
        /// File to checksum.
        file: PathBuf,
    },
    /// List the resource table of a pack.
    List {
        /// Path to a .pbpack file.
        pack: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PBPACK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Build {
            manifest,
            basename,
            root,
            pack,
            header,
            make_dep,
        } => commands::build::run(
            &manifest,
            &basename,
            &root,
            commands::build::Outputs::select(pack, header, make_dep),
            json_output,
        ),
        Commands::Convert {
            input,
            output,
            palette,
            method,
            bitdepth,
        } => commands::convert::run(
            &input,
            &output,
            pbpack_image::ConvertOptions {
                palette,
                method,
                bit_depth: bitdepth,
            },
            json_output,
        ),
        Commands::Crc { file } => commands::crc::run(&file, json_output),
        Commands::List { pack } => commands::list::run(&pack, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(failure) => {
            eprintln!("error: {}", failure.message);
            ExitCode::from(failure.code)
        }
    }
}
