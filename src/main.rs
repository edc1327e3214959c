use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use clap_verbosity_flag::WarnLevel;
use clio::{Input, OutputPath};
use colored::Colorize;
use mipsy_macro::diagnostic::{Verbosity, VERBOSITY};
use mipsy_macro::{error, PreprocessError, Preprocessor};
use shadow_rs::shadow;
use thiserror::Error;

shadow!(build);

/// An opinionated #define preprocessor for MIPS assembly.
#[derive(Parser, Debug)]
#[command(name = "mipsy-macro", author, version = build::CLAP_LONG_VERSION, about)]
struct Args {
    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity<WarnLevel>,

    /// The path of the file to be preprocessed, or `-` for stdin.
    #[clap(value_parser)]
    source: Input,

    /// The path of the file to output to, or `-` for stdout.
    ///
    /// Defaults to `<source>.preprocessed.<source extension>`,
    /// or stdout when reading from stdin.
    #[clap(short, long, value_parser, conflicts_with = "print")]
    outfile: Option<OutputPath>,

    /// Output to stdout instead of a file.
    #[clap(long)]
    print: bool,

    /// Allow overwriting the source file.
    #[clap(long)]
    clobber: bool,

    /// Continue even if an error is detected.
    ///
    /// You probably shouldn't use this!
    /// If you do, be prepared for crashes and incorrect output.
    #[clap(long)]
    keep_going: bool,
}

#[derive(Debug, Error)]
enum Error {
    #[error(transparent)]
    Clio(#[from] clio::Error),
    #[error("unable to read `{source_name}`: {err}")]
    Read {
        source_name: String,
        err: std::io::Error,
    },
    #[error("unable to write `{destination}`: {err}")]
    Write {
        destination: String,
        err: std::io::Error,
    },
    #[error("source and destination files are the same, use --clobber to allow this")]
    Clobber,
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();
    VERBOSITY.get_or_init(|| Verbosity::from_level(args.verbose.log_level()));

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}").emit();
            ExitCode::FAILURE
        }
    }
}

fn run(mut args: Args) -> Result<(), Error> {
    let start = Instant::now();
    let outpath = destination(&mut args)?;
    let source_name = args.source.to_string().trim_matches('"').to_owned();

    let mut program = String::new();
    args.source
        .read_to_string(&mut program)
        .map_err(|err| Error::Read {
            source_name: source_name.clone(),
            err,
        })?;

    let preprocessed = Preprocessor::default()
        .keep_going(args.keep_going)
        .process(&program)?;

    let to_file = !outpath.path().is_std();
    let destination_name = outpath.path().display().to_string();

    let mut output = outpath.create()?;
    output
        .lock()
        .write_all(preprocessed.as_bytes())
        .map_err(|err| Error::Write {
            destination: destination_name.clone(),
            err,
        })?;
    output.finish()?;

    if to_file {
        let elapsed = start.elapsed().as_millis();
        let seconds = elapsed / 1000;
        let millis = elapsed % 1000;
        println!(
            "    {} preprocessing `{source_name}` into `{destination_name}` in {seconds}.{millis:03}s",
            "Finished".green().bold(),
        );
    }

    Ok(())
}

/// Where the output goes, refusing to overwrite the source unless `--clobber` is given.
fn destination(args: &mut Args) -> Result<OutputPath, Error> {
    let outpath = match (args.print, args.outfile.take()) {
        (true, _) => OutputPath::std(),
        (false, Some(outfile)) => outfile,
        (false, None) if args.source.is_std() => OutputPath::std(),
        (false, None) => OutputPath::new(&preprocessed_path(args.source.path()))?,
    };

    if !args.clobber
        && !args.source.is_std()
        && !outpath.path().is_std()
        && same_file(args.source.path(), outpath.path())
    {
        return Err(Error::Clobber);
    }

    Ok(outpath)
}

/// `prog.s` -> `prog.preprocessed.s`
fn preprocessed_path(source: &Path) -> PathBuf {
    match source.extension() {
        Some(extension) => {
            source.with_extension(format!("preprocessed.{}", extension.to_string_lossy()))
        }
        None => source.with_extension("preprocessed"),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
