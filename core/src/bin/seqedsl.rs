/// seqedsl CLI
///
/// Translates SeqJson command sequences to the sequencing EDSL and back,
/// without any host application.

use seqedsl_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
