//! File digest command — `brt hash`.

use anyhow::Result;
use std::path::Path;

use brt::hashes::{self, Verification};

pub fn cmd_hash(file: &Path, store: bool, verify: bool) -> Result<()> {
    if store {
        let sidecar = hashes::store(file)?;
        println!("Stored {}", sidecar.display());
        return Ok(());
    }

    if verify {
        match hashes::verify(file)? {
            Verification::Match => {
                println!("{}", console::style("ok").green());
            }
            Verification::Mismatch { recorded, actual } => {
                println!("{}", console::style("mismatch").red());
                println!("recorded: {recorded}");
                println!("actual:   {actual}");
                anyhow::bail!("Hash mismatch for {}", file.display());
            }
            Verification::Missing => {
                anyhow::bail!("No recorded hash for {}", file.display());
            }
        }
        return Ok(());
    }

    println!("{}", hashes::sha256_file(file)?);
    Ok(())
}
