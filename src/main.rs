use std::fs::File;
use std::io::{stdin, stdout, BufWriter, Read, Write};
use std::path::PathBuf;

use structopt::StructOpt;

use bundle_js::bundle::{bundle, BundleHost, BundleOptions, OutputOptions, SplitDefinition};
use bundle_js::compress::CompressOptions;
use bundle_js::{minify, SourceKind};

#[derive(StructOpt)]
#[structopt(
    name = "bundle-js",
    about = "JavaScript parser, compressor, and code-splitting bundler"
)]
struct Cli {
    /// File to process; omit for stdin.
    #[structopt(parse(from_os_str))]
    input: Option<PathBuf>,

    /// Output destination for single-file mode; omit for stdout.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Link the input as a module-graph entry into a bundle instead of
    /// minifying it alone.
    #[structopt(long)]
    bundle: bool,

    /// Directory bundles are written into.
    #[structopt(long, parse(from_os_str), default_value = ".")]
    outdir: PathBuf,

    /// Name of the main bundle.
    #[structopt(long, default_value = "bundle")]
    bundle_name: String,

    /// Skip compression passes.
    #[structopt(long)]
    no_compress: bool,

    /// Rename module-level symbols to short names.
    #[structopt(long)]
    mangle: bool,

    /// Bound on the compression fixed-point loop.
    #[structopt(long, default_value = "8")]
    max_passes: u32,

    /// Emit one top-level statement per line in bundles.
    #[structopt(long)]
    beautify: bool,
}

/// Host over the real filesystem: sources are read relative to the working
/// directory, bundles land in `outdir`.
struct FsHost {
    outdir: PathBuf,
}

impl BundleHost for FsHost {
    fn read_content(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(name).ok()
    }

    fn write_bundle(&mut self, name: &str, content: &str) -> () {
        let path = self.outdir.join(name);
        std::fs::write(&path, content).expect("write bundle");
    }
}

fn main() {
    let args = Cli::from_args();
    let compress_options = if args.no_compress {
        None
    } else {
        Some(CompressOptions {
            max_passes: args.max_passes,
            ..CompressOptions::default()
        })
    };

    if args.bundle {
        let entry = args
            .input
            .as_ref()
            .expect("bundling requires an entry file")
            .to_string_lossy()
            .to_string();
        let mut host = FsHost {
            outdir: args.outdir.clone(),
        };
        let options = BundleOptions {
            parts: vec![SplitDefinition {
                name: args.bundle_name.clone(),
                entry_files: vec![entry],
            }],
            mangle: args.mangle,
            compress: compress_options,
            output: OutputOptions {
                beautify: args.beautify,
            },
            ..BundleOptions::default()
        };
        if let Err(err) = bundle(&mut host, &options) {
            eprintln!("{}", err);
            std::process::exit(1);
        };
        return;
    };

    let mut input = Vec::new();
    let mut input_file: Box<dyn Read> = match args.input {
        Some(p) => Box::new(File::open(p).expect("open input file")),
        None => Box::new(stdin()),
    };
    input_file.read_to_end(&mut input).expect("read input");
    let out_file: Box<dyn Write> = match args.output {
        Some(p) => Box::new(File::create(p).expect("open output file")),
        None => Box::new(stdout()),
    };
    let mut output = BufWriter::new(out_file);
    if let Err(err) = minify(
        SourceKind::Script,
        input,
        compress_options.as_ref(),
        &mut output,
    ) {
        eprintln!("{}", err);
        std::process::exit(1);
    };
}
