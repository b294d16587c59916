//! Symbol list import.

use std::path::Path;

use analyst::{DataError, Result, Symbol, SymbolDirectory};
use tracing::info;

/// Parses a JSON list of `[symbol, name]` pairs.
///
/// Share-class dots become dashes (`BRK.B` is stored as `BRK-B`), matching
/// Yahoo Finance tickers.
///
/// # Errors
/// Returns [`DataError::Parse`] if the text is not such a list.
pub fn parse_symbols(json: &str) -> Result<Vec<(Symbol, String)>> {
    let rows: Vec<(String, String)> =
        serde_json::from_str(json).map_err(|e| DataError::Parse(e.to_string()))?;

    Ok(rows
        .into_iter()
        .map(|(symbol, name)| (Symbol::new(symbol.replace('.', "-")), name.trim().to_string()))
        .filter(|(symbol, _)| !symbol.as_str().is_empty())
        .collect())
}

/// Loads the symbol list at `path` into the directory.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or the directory
/// write fails.
pub async fn import_symbols(directory: &dyn SymbolDirectory, path: &Path) -> Result<usize> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DataError::Other(format!("{}: {e}", path.display())))?;
    let symbols = parse_symbols(&json)?;
    let written = directory.upsert_symbols(&symbols).await?;
    info!(path = %path.display(), count = written, "Imported symbol list");
    Ok(written)
}
