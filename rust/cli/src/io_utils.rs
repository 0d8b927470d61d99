//! File I/O utilities for reading hand history uploads and ensuring directories.
//!
//! Helpers shared across CLI commands:
//! - Reading text files with automatic .zst decompression
//! - Ensuring parent directories exist before file writes
//!
//! ## Compressed File Support
//!
//! The `read_text_auto` function automatically detects and decompresses .zst
//! (Zstandard) compressed files based on the file extension. Poker sites and
//! trackers commonly archive old hand histories this way.

/// Read text file with automatic .zst decompression detection.
///
/// If the path ends with ".zst", the file is decompressed with Zstandard
/// first. A UTF-8 BOM (Byte Order Mark) is stripped if present; Windows hand
/// history exports frequently carry one.
///
/// # Arguments
///
/// * `path` - File path to read (supports .zst compressed files)
///
/// # Returns
///
/// * `Ok(String)` - File contents as UTF-8 string
/// * `Err(String)` - I/O error, decompression error, or UTF-8 conversion error
pub fn read_text_auto(path: &str) -> Result<String, String> {
    let mut content = if path.ends_with(".zst") {
        // Streaming decode: archived session files routinely expand to tens
        // of megabytes, so no fixed output capacity.
        let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
        let dec = zstd::stream::decode_all(std::io::BufReader::new(file))
            .map_err(|e| e.to_string())?;
        String::from_utf8(dec).map_err(|e| e.to_string())?
    } else {
        std::fs::read_to_string(path).map_err(|e| e.to_string())?
    };
    strip_utf8_bom(&mut content);
    Ok(content)
}

/// Ensure parent directory exists for given path, creating if needed.
///
/// # Arguments
///
/// * `path` - File path whose parent directory should exist
///
/// # Returns
///
/// * `Ok(())` - Parent directory exists or was created successfully
/// * `Err(String)` - Failed to create directory with error message
pub fn ensure_parent_dir(path: &std::path::Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory {}: {}", parent.display(), e))?;
        }
    }
    Ok(())
}

/// Strip UTF-8 BOM (Byte Order Mark) from the beginning of a string if present.
fn strip_utf8_bom(s: &mut String) {
    const UTF8_BOM: &str = "\u{feff}";
    if s.starts_with(UTF8_BOM) {
        s.drain(..UTF8_BOM.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_utf8_bom() {
        let mut s = "\u{feff}PokerStars Hand #1".to_string();
        strip_utf8_bom(&mut s);
        assert_eq!(s, "PokerStars Hand #1");
    }

    #[test]
    fn test_strip_utf8_bom_no_bom() {
        let mut s = "PokerStars Hand #1".to_string();
        strip_utf8_bom(&mut s);
        assert_eq!(s, "PokerStars Hand #1");
    }

    #[test]
    fn test_read_text_auto_plain_file() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut temp, b"hello").unwrap();
        let content = read_text_auto(temp.path().to_str().unwrap()).unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn test_read_text_auto_zst_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hands.txt.zst");
        let compressed = zstd::bulk::compress(b"PokerStars Hand #1", 3).unwrap();
        std::fs::write(&path, compressed).unwrap();
        let content = read_text_auto(path.to_str().unwrap()).unwrap();
        assert_eq!(content, "PokerStars Hand #1");
    }

    #[test]
    fn test_ensure_parent_dir_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("subdir").join("file.json");

        let result = ensure_parent_dir(&nested_path);
        assert!(result.is_ok());
        assert!(temp_dir.path().join("subdir").exists());
    }

    #[test]
    fn test_ensure_parent_dir_no_parent() {
        let path = std::path::Path::new("file.json");
        assert!(ensure_parent_dir(path).is_ok());
    }
}
