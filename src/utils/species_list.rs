//! Static species list files.

use crate::error::{Error, Result};
use std::path::Path;

/// Read a species list file into label strings.
///
/// One `Genus species_Common Name` label per line, as produced by the
/// `species` subcommand and by BirdNET-Analyzer. Blank lines and lines
/// starting with `#` are skipped.
pub fn read_species_list(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::SpeciesListRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_species_list_skips_blanks_and_comments() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# garden birds").unwrap();
        writeln!(file, "Parus major_Great Tit").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  Cyanistes caeruleus_Blue Tit  ").unwrap();

        let species = read_species_list(file.path()).unwrap();
        assert_eq!(
            species,
            vec![
                "Parus major_Great Tit".to_string(),
                "Cyanistes caeruleus_Blue Tit".to_string(),
            ]
        );
    }

    #[test]
    fn test_read_species_list_file_not_found() {
        let result = read_species_list(Path::new("nonexistent.txt"));
        assert!(matches!(result, Err(Error::SpeciesListRead { .. })));
    }
}
