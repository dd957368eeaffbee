//! # miw CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use miw_cli::issue::{run_issue, IssueArgs};
use miw_cli::keys::{run_keygen, KeygenArgs};
use miw_cli::verify::{run_lookup, run_verify, LookupArgs, VerifyArgs};

/// Managed identity wallet issuance CLI.
///
/// Provisions sealed issuer keys, issues W3C verifiable credentials with
/// JsonWebSignature2020 proofs, verifies them and reads stored records.
#[derive(Parser, Debug)]
#[command(name = "miw", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a sealed issuer key and its DID document.
    Keygen(KeygenArgs),

    /// Issue a credential into a filesystem store.
    Issue(IssueArgs),

    /// Verify a credential against an issuer DID document.
    Verify(VerifyArgs),

    /// Look up stored credentials of a holder.
    Lookup(LookupArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Keygen(args) => run_keygen(&args),
        Commands::Issue(args) => run_issue(&args),
        Commands::Verify(args) => run_verify(&args),
        Commands::Lookup(args) => run_lookup(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("ERROR: {e:#}");
            ExitCode::from(1)
        }
    }
}
