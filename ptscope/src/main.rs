//! # ptscope - Main Entry Point
//!
//! Setup (preflight, symbol loading, sideband registration) runs first and
//! any failure there aborts before the timeline starts. Annotation then
//! makes one sequential pass over the trace.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};

use ptscope::annotate::Annotator;
use ptscope::cli::Args;
use ptscope::decoding::EventLogDecoder;
use ptscope::domain::SetupError;
use ptscope::preflight::run_preflight_checks;
use ptscope::symbolization::{parse_sideband_file, AddressSpaceRegistry, SymbolLoader};
use ptscope::timing::TimeNormalizer;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

/// Bad option values are usage errors; clap reports its own parse errors
fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SetupError>() {
        Some(SetupError::InvalidFrequency(_)) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

/// Load every binary named on the command line or in a sideband log
fn build_registry(args: &Args) -> Result<AddressSpaceRegistry> {
    let mut registry = AddressSpaceRegistry::new();
    let mut loader = SymbolLoader::new();

    for spec in &args.elf {
        loader
            .register_binary(&mut registry, spec)
            .with_context(|| format!("Failed to load --elf {}", spec.path.display()))?;
    }

    for sideband in &args.sideband {
        let records = parse_sideband_file(sideband)?;
        info!("{} mapping records in {}", records.len(), sideband.display());
        loader
            .register_sideband(&mut registry, &records)
            .with_context(|| format!("Failed to load binaries of {}", sideband.display()))?;
    }

    if registry.is_empty() {
        warn!("No binaries given, addresses will print raw");
    }
    info!(
        "{} bindings in {} contexts from {} binaries",
        registry.binding_count(),
        registry.context_count(),
        loader.loaded_count()
    );
    Ok(registry)
}

fn run() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;

    run_preflight_checks(&args.trace, &args.elf, &args.sideband, args.freq, quiet)?;

    let registry = build_registry(&args)?;
    let decoder = EventLogDecoder::open(&args.trace)?;

    let time = TimeNormalizer::new(args.freq);

    if !quiet {
        eprintln!("ptscope v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("trace: {}", args.trace.display());
        eprintln!("bindings: {} in {} contexts", registry.binding_count(), registry.context_count());
        if time.has_frequency() {
            eprintln!("tsc: {} GHz", time.freq_ghz());
        }
    }

    let out: Box<dyn Write> = match args.output {
        Some(ref path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let mut annotator = Annotator::new(&registry, time, BufWriter::new(out))
        .with_insn_dump(args.insn);
    let summary = annotator.run(decoder).context("Annotation failed")?;

    if !quiet {
        eprintln!("\ndone: {summary}");
        if let Some(ref path) = args.output {
            eprintln!("saved: {}", path.display());
        }
    }

    Ok(())
}
