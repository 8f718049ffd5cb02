use std::fs;
use std::path::Path;

use flatfield_math::FixedBuffer;

use crate::IoError;

/// Per-frame pointing offsets in whole pixels, one `[a, b]` row per frame,
/// in the column order the table was written in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplacementTable {
    pub rows: Vec<[i32; 2]>,
}

impl DisplacementTable {
    /// Parse two integers per line, separated by whitespace and/or commas.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse(text: &str) -> Result<Self, IoError> {
        let mut rows = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .map(|f| f.parse::<i32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| IoError::Displacement {
                    line: index + 1,
                    reason: e.to_string(),
                })?;
            match fields[..] {
                [a, b] => rows.push([a, b]),
                _ => {
                    return Err(IoError::Displacement {
                        line: index + 1,
                        reason: format!("expected 2 values, found {}", fields.len()),
                    })
                }
            }
        }
        Ok(Self { rows })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, IoError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flattened `N x 2` table in Q24.8.
    pub fn to_fixed(&self) -> FixedBuffer {
        let flat: Vec<i32> = self.rows.iter().flatten().copied().collect();
        FixedBuffer::from_ints(&flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfield_math::FP32_ONE;

    #[test]
    fn test_parse_mixed_separators() {
        let table = DisplacementTable::parse("# dx dy\n0 0\n 12, -3\n\n-7\t4\n").unwrap();
        assert_eq!(table.rows, vec![[0, 0], [12, -3], [-7, 4]]);
        assert_eq!(table.to_fixed().data[2..4], [12 * FP32_ONE, -3 * FP32_ONE]);
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = DisplacementTable::parse("0 0\n1 2 3\n").unwrap_err();
        assert!(matches!(err, IoError::Displacement { line: 2, .. }));
        let err = DisplacementTable::parse("0 x\n").unwrap_err();
        assert!(matches!(err, IoError::Displacement { line: 1, .. }));
    }
}
