use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("word list is empty")]
    EmptyWordList,
    #[error("tokens line {line}: expected `token username`")]
    MalformedToken { line: usize },
}

/// Reads a line-oriented config file, skipping blank lines and `#` comments.
pub async fn read_lines(path: &Path) -> Result<Vec<String>, ConfigError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(significant_lines(&contents))
}

pub fn significant_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn skips_comments_and_blank_lines() {
        let lines = significant_lines("# animals\n\n  cat \nelephant\n   # more\nowl\n");
        assert_eq!(lines, vec!["cat", "elephant", "owl"]);
    }

    #[test_log::test(tokio::test)]
    async fn missing_file_reports_its_path() {
        let err = read_lines(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.txt"), "{err}");
    }
}
