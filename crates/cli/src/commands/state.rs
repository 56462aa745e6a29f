//! Persisted navigational state commands.
//!
//! # Usage
//!
//! ```bash
//! # Pretty-print the stored record
//! bayberry state show
//!
//! # Reset the stored record
//! bayberry state clear
//!
//! # Print the record's path
//! bayberry state path
//! ```
//!
//! # Environment Variables
//!
//! - `BAYBERRY_STATE_DIR` - Directory holding the record (default `.bayberry`)

use bayberry_catalog::config::CatalogConfig;
use bayberry_catalog::nav::{FileStorage, StateStorage};

fn storage() -> FileStorage {
    FileStorage::in_dir(CatalogConfig::state_dir_from_env())
}

/// Pretty-print the stored record, or say there is none.
pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let storage = storage();
    match storage.load() {
        Some(state) => {
            let json = serde_json::to_string_pretty(&state)?;
            #[allow(clippy::print_stdout)]
            {
                println!("{json}");
            }
        }
        None => {
            tracing::info!(path = %storage.path().display(), "no stored state");
        }
    }
    Ok(())
}

/// Delete the stored record.
pub fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let storage = storage();
    storage.remove()?;
    tracing::info!(path = %storage.path().display(), "stored state cleared");
    Ok(())
}

/// Print where the record lives.
pub fn path() {
    #[allow(clippy::print_stdout)]
    {
        println!("{}", storage().path().display());
    }
}
