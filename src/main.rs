//! ledgerdesk entry point
//!
//! Parses arguments and dispatches through `cli::run`. Errors go to stderr
//! and the process exits non-zero. Configuration, logging and storage are
//! all set up inside the CLI module.

use ledgerdesk::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
