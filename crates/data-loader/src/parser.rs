//! Line-oriented parsers for the feature and rating files.
//!
//! Both formats share the same tokenization: a record is one text line,
//! tokens are separated by any run of spaces, tabs or commas, there is no
//! header row and no quoting.
//!
//! - feature file: `item feature feature ...`
//! - rating file:  `user item rating [ignored columns ...]`

use crate::error::{DataLoadError, Result};
use std::io::BufRead;
use std::path::Path;
use tracing::warn;

/// One line of the feature file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    pub item: String,
    pub features: Vec<String>,
}

/// One line of the rating file, labels still unresolved
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRecord {
    pub user: String,
    pub item: String,
    pub rating: f64,
}

/// Split a line on runs of spaces, tabs and commas
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split([' ', '\t', ','])
        .filter(|token| !token.is_empty())
}

/// Read every complete line from `reader`, handing `(line_no, line)` to `visit`.
///
/// A line counts as complete only once its terminator has been read; a
/// CRLF terminator is accepted too. An unterminated fragment at
/// end-of-stream is dropped with a warning.
/// `path` is only used to label errors.
pub fn for_each_line<R, F>(mut reader: R, path: &Path, mut visit: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &str) -> Result<()>,
{
    let mut buffer = String::new();
    let mut line_no = 0;

    loop {
        buffer.clear();
        let read = reader
            .read_line(&mut buffer)
            .map_err(|source| DataLoadError::Ingestion {
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let Some(line) = buffer.strip_suffix('\n') else {
            if !buffer.trim().is_empty() {
                warn!(
                    path = %path.display(),
                    line = line_no,
                    "dropping unterminated trailing line: {:?}",
                    buffer.trim()
                );
            }
            break;
        };

        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            continue;
        }
        visit(line_no, line)?;
    }

    Ok(())
}

/// Parse one feature-file line.
///
/// Returns `None` for a line with no tokens at all.
pub fn parse_feature_line(line: &str) -> Option<FeatureRecord> {
    let mut tokens = tokenize(line);
    let item = tokens.next()?;
    Some(FeatureRecord {
        item: item.to_string(),
        features: tokens.map(|t| t.to_string()).collect(),
    })
}

/// Parse one rating-file line
///
/// Format: user item rating [extra columns are ignored]
pub fn parse_rating_line(file: &str, line_no: usize, line: &str) -> Result<RatingRecord> {
    let mut parts = tokenize(line);

    let user = parts.next().ok_or_else(|| DataLoadError::Parse {
        file: file.to_string(),
        line: line_no,
        reason: "Missing user".to_string(),
    })?;

    let item = parts.next().ok_or_else(|| DataLoadError::Parse {
        file: file.to_string(),
        line: line_no,
        reason: "Missing item".to_string(),
    })?;

    let rating = parts.next().ok_or_else(|| DataLoadError::Parse {
        file: file.to_string(),
        line: line_no,
        reason: "Missing rating".to_string(),
    })?;

    Ok(RatingRecord {
        user: user.to_string(),
        item: item.to_string(),
        rating: rating.parse().map_err(|e| DataLoadError::Parse {
            file: file.to_string(),
            line: line_no,
            reason: format!("Invalid rating {:?}: {}", rating, e),
        })?,
    })
}
