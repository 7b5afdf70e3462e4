use crate::prelude::{PipelineError, PipelineResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Projected 2-D coordinates, one entry per segment, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Coordinates {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Coordinates {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Parses whitespace-separated pairs, one per line. Tokens past the second are ignored.
pub fn parse_coordinates(text: &str) -> PipelineResult<Coordinates> {
    let mut coordinates = Coordinates::default();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let mut tokens = line.split_whitespace();
        let (Some(x), Some(y)) = (tokens.next(), tokens.next()) else {
            return Err(PipelineError::MalformedOutput(format!(
                "line {line_no}: expected two numeric columns in `{line}`"
            )));
        };
        coordinates.x.push(parse_value(x, line_no)?);
        coordinates.y.push(parse_value(y, line_no)?);
    }
    Ok(coordinates)
}

fn parse_value(token: &str, line_no: usize) -> PipelineResult<f64> {
    token.parse::<f64>().map_err(|_| {
        PipelineError::MalformedOutput(format!("line {line_no}: `{token}` is not a number"))
    })
}

pub fn read_coordinates(path: &Path) -> PipelineResult<Coordinates> {
    let contents = fs::read_to_string(path).map_err(|source| PipelineError::io(path, source))?;
    parse_coordinates(&contents).map_err(|err| match err {
        PipelineError::MalformedOutput(message) => {
            PipelineError::MalformedOutput(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_pairs_in_file_order() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"1.0 2.0\n3.5 4.25\n").unwrap();
        let coords = read_coordinates(file.path()).unwrap();
        assert_eq!(coords.x, vec![1.0, 3.5]);
        assert_eq!(coords.y, vec![2.0, 4.25]);
    }

    #[test]
    fn empty_file_yields_empty_sequences() {
        let file = NamedTempFile::new().unwrap();
        let coords = read_coordinates(file.path()).unwrap();
        assert!(coords.is_empty());
        assert!(coords.y.is_empty());
    }

    #[test]
    fn written_values_read_back_exactly() {
        let values = [
            (0.1, -0.2),
            (1.0e-300, 6.02214076e23),
            (-123.456789012345, 0.0),
            (f64::MAX, f64::MIN_POSITIVE),
        ];
        let mut text = String::new();
        for (x, y) in values {
            writeln!(text, "{x} {y}").unwrap();
        }
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();

        let coords = read_coordinates(file.path()).unwrap();
        assert_eq!(coords.pairs().collect::<Vec<_>>(), values.to_vec());
    }

    #[test]
    fn short_line_is_malformed() {
        let err = parse_coordinates("1.0 2.0\n3.0\n").unwrap_err();
        match err {
            PipelineError::MalformedOutput(message) => assert!(message.starts_with("line 2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_token_is_malformed() {
        assert!(matches!(
            parse_coordinates("1.0 nope\n"),
            Err(PipelineError::MalformedOutput(_))
        ));
    }

    #[test]
    fn tabs_and_extra_columns_are_tolerated() {
        let coords = parse_coordinates("1\t2\t99\r\n").unwrap();
        assert_eq!(coords.pairs().collect::<Vec<_>>(), vec![(1.0, 2.0)]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_coordinates(&dir.path().join("xy.dat")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
