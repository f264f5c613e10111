//! # signer CLI
//!
//! Command-line interface for the signer pipeline.
//!
//! ## Usage
//! ```bash
//! signer sign 0 1 1 2 3 5 8
//! signer sign --input values.json --output json
//! ```

mod cli;

use signer_pipeline::Result;

fn main() -> Result<()> {
    signer_pipeline::init_tracing();
    cli::run()
}
