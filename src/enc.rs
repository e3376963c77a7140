use crate::volume::{Shape, Volume};
use regex::Regex;
use std::sync::OnceLock;

pub trait VolumeCodec {
    fn encode(self, volume: &Volume) -> String;
    fn decode(self, value: &str) -> Result<Volume, DecodeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("missing `x = .., y = .., z = ..` header")]
    MissingHeader,
    #[error("invalid token in {0:?}")]
    InvalidToken(String),
    #[error("too many cells, shape holds {expected}")]
    TooManyCells { expected: usize },
    #[error("shape {x}x{y}x{z} is too large")]
    InvalidShape { x: usize, y: usize, z: usize },
}

struct RunEncoder {
    sequence: String,
    line_len: usize,
    max_line_len: usize,
}
impl RunEncoder {
    fn new(max_line_len: usize) -> Self {
        Self {
            sequence: String::new(),
            line_len: 0,
            max_line_len,
        }
    }

    fn push_run(&mut self, run: usize, token: &str) {
        let append = match run {
            0 => String::new(),
            1 => token.to_owned(),
            n => format!("{}{}", n, token),
        };
        if self.line_len + append.len() > self.max_line_len {
            self.sequence.push('\n');
            self.line_len = 0;
        }
        self.line_len += append.len();
        self.sequence.push_str(&append);
    }

    pub fn end(mut self) -> String {
        if self.line_len + 1 > self.max_line_len {
            self.sequence.push('\n');
        }
        self.sequence.push('!');
        self.sequence
    }
}

fn cell_token(value: i32) -> String {
    match value {
        0 => "b".to_owned(),
        1 => "o".to_owned(),
        v => format!("({})", v),
    }
}

fn header_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"^x\s*=\s*(\d+)\s*,\s*y\s*=\s*(\d+)\s*,\s*z\s*=\s*(\d+)\s*(?:,\s*rule\s*=\s*(\S+))?\s*$")
            .unwrap()
    })
}

fn token_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(\d*)(b|o|\((-?\d+)\)|!)").unwrap())
}

/// Run-length text encoding of a volume's flat row-major buffer
///
/// ```text
/// #N glider
/// x = 3, y = 3, z = 3, rule = B3/S23
/// 4bo(-1)3b2(7)!
/// ```
///
/// `b` is a dead cell, `o` identity 1 and `(v)` any other value, each
/// optionally prefixed by a run count. Trailing dead cells may be left out.
pub struct RunLengthEncoded {
    name: Option<String>,
    rule: Option<String>,
}
impl RunLengthEncoded {
    pub fn set_name<T: AsRef<str>>(mut self, name: T) -> Self {
        self.name = Some(name.as_ref().to_owned());
        self
    }
    pub fn set_rule<T: AsRef<str>>(mut self, rule: T) -> Self {
        self.rule = Some(rule.as_ref().to_owned());
        self
    }

    fn encode_header(&self, shape: Shape) -> String {
        let mut header = String::new();
        if let Some(name) = &self.name {
            header.push_str(&format!("#N {}\n", name));
        }
        header.push_str(&format!("x = {}, y = {}, z = {}", shape.x, shape.y, shape.z));
        if let Some(rule) = &self.rule {
            header.push_str(&format!(", rule = {}", rule));
        }
        header
    }
    fn encode_cells(&self, cells: &[i32]) -> String {
        // trailing dead cells are implied by the shape
        let end = cells.iter().rposition(|&v| v != 0).map_or(0, |i| i + 1);

        let mut seq = RunEncoder::new(70);
        let mut run = 0;
        let mut last = None;
        for &value in &cells[..end] {
            if last == Some(value) {
                run += 1;
                continue;
            }
            if let Some(prev) = last {
                seq.push_run(run, &cell_token(prev));
            }
            last = Some(value);
            run = 1;
        }
        if let Some(prev) = last {
            seq.push_run(run, &cell_token(prev));
        }
        seq.end()
    }

    /// Decodes a volume along with the rule named in its header, if any
    pub fn parse(value: &str) -> Result<(Volume, Option<String>), DecodeError> {
        let mut lines = value
            .lines()
            .map(|line| match line.find('#') {
                Some(i) => &line[..i],
                None => line,
            })
            .map(str::trim)
            .filter(|line| !line.is_empty());

        let header = lines.next().ok_or(DecodeError::MissingHeader)?;
        let caps = header_regex()
            .captures(header)
            .ok_or(DecodeError::MissingHeader)?;
        let dim = |i: usize| caps[i].parse::<usize>().map_err(|_| DecodeError::MissingHeader);
        let shape = Shape::new(dim(1)?, dim(2)?, dim(3)?);
        let rule = caps.get(4).map(|m| m.as_str().to_owned());

        let too_large = DecodeError::InvalidShape {
            x: shape.x,
            y: shape.y,
            z: shape.z,
        };
        let expected = shape.check().map_err(|_| too_large.clone())?;
        let mut cells: Vec<i32> = Vec::new();
        cells.try_reserve_exact(expected).map_err(|_| too_large)?;
        'lines_loop: for line in lines {
            let line: String = line.split_whitespace().collect();
            let mut consumed = 0;
            for caps in token_regex().captures_iter(&line) {
                let whole = &caps[0];
                if caps.get(0).map(|m| m.start()) != Some(consumed) {
                    return Err(DecodeError::InvalidToken(line.clone()));
                }
                consumed += whole.len();

                let run = match &caps[1] {
                    "" => 1,
                    digits => digits
                        .parse::<usize>()
                        .map_err(|_| DecodeError::InvalidToken(whole.to_owned()))?,
                };
                let value = match &caps[2] {
                    "!" => break 'lines_loop,
                    "b" => 0,
                    "o" => 1,
                    _ => caps[3]
                        .parse::<i32>()
                        .map_err(|_| DecodeError::InvalidToken(whole.to_owned()))?,
                };
                let filled = cells
                    .len()
                    .checked_add(run)
                    .filter(|&n| n <= expected)
                    .ok_or(DecodeError::TooManyCells { expected })?;
                cells.resize(filled, value);
            }
            if consumed != line.len() {
                return Err(DecodeError::InvalidToken(line));
            }
        }

        cells.resize(expected, 0);
        let volume = Volume::from_cells(shape, cells)
            .map_err(|_| DecodeError::TooManyCells { expected })?;
        Ok((volume, rule))
    }
}
impl Default for RunLengthEncoded {
    fn default() -> Self {
        Self {
            name: None,
            rule: None,
        }
    }
}

impl VolumeCodec for RunLengthEncoded {
    fn encode(self, volume: &Volume) -> String {
        format!(
            "{}\n{}\n",
            self.encode_header(volume.shape()),
            self.encode_cells(volume.cells())
        )
    }

    fn decode(self, value: &str) -> Result<Volume, DecodeError> {
        Self::parse(value).map(|(volume, _)| volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pos3;

    #[test]
    fn encodes_runs_and_identities() {
        let mut volume = Volume::zeros(Shape::new(2, 2, 3)).unwrap();
        volume.set(Pos3::new(0, 0, 2), 1);
        volume.set(Pos3::new(0, 1, 0), 1);
        volume.set(Pos3::new(0, 1, 1), -1);
        volume.set(Pos3::new(1, 0, 0), 7);
        volume.set(Pos3::new(1, 0, 1), 7);

        let text = RunLengthEncoded::default()
            .set_name("sample")
            .set_rule("B3/S23")
            .encode(&volume);

        assert_eq!(
            text,
            "#N sample\nx = 2, y = 2, z = 3, rule = B3/S23\n2b2o(-1)b2(7)!\n"
        );
    }

    #[test]
    fn decodes_what_it_encodes() {
        let mut volume = Volume::zeros(Shape::new(3, 4, 5)).unwrap();
        volume.set(Pos3::new(1, 2, 3), 4);
        volume.set(Pos3::new(2, 0, 0), -1);
        volume.set(Pos3::new(2, 3, 4), 1);
        let text = RunLengthEncoded::default().set_rule("B4/S4").encode(&volume);

        let (decoded, rule) = RunLengthEncoded::parse(&text).unwrap();

        assert_eq!(decoded, volume);
        assert_eq!(rule.as_deref(), Some("B4/S4"));
    }

    #[test]
    fn long_runs_wrap_lines() {
        let cells: Vec<i32> = (0..200).map(|i| (i % 3) as i32).collect();
        let volume = Volume::from_cells(Shape::new(2, 10, 10), cells).unwrap();
        let text = RunLengthEncoded::default().encode(&volume);

        assert!(text.lines().all(|line| line.len() <= 70));
        assert_eq!(RunLengthEncoded::default().decode(&text).unwrap(), volume);
    }

    #[test]
    fn trailing_dead_cells_are_implied() {
        let volume = RunLengthEncoded::default()
            .decode("x = 1, y = 1, z = 4\no!")
            .unwrap();

        assert_eq!(volume.cells(), &[1, 0, 0, 0]);
    }

    #[test]
    fn rejects_malformed_input() {
        let codec = || RunLengthEncoded::default();

        assert_eq!(codec().decode("3o!"), Err(DecodeError::MissingHeader));
        assert_eq!(
            codec().decode("x = 1, y = 1, z = 2\n3o!"),
            Err(DecodeError::TooManyCells { expected: 2 })
        );
        assert!(matches!(
            codec().decode("x = 1, y = 1, z = 2\noq!"),
            Err(DecodeError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_oversized_runs() {
        let codec = || RunLengthEncoded::default();

        assert_eq!(
            codec().decode("x = 1, y = 1, z = 3\no18446744073709551615b!"),
            Err(DecodeError::TooManyCells { expected: 3 })
        );
        // wider than usize
        assert_eq!(
            codec().decode("x = 1, y = 1, z = 3\n99999999999999999999999o!"),
            Err(DecodeError::InvalidToken("99999999999999999999999o".to_owned()))
        );
        assert_eq!(
            codec().decode("x = 1, y = 1, z = 3\n3o!").unwrap().cells(),
            &[1, 1, 1]
        );
    }

    #[test]
    fn rejects_oversized_shapes() {
        let codec = || RunLengthEncoded::default();

        assert_eq!(
            codec().decode("x = 4294967296, y = 4294967296, z = 4294967296\n!"),
            Err(DecodeError::InvalidShape {
                x: 1 << 32,
                y: 1 << 32,
                z: 1 << 32,
            })
        );
        assert!(matches!(
            codec().decode("x = 3000000000, y = 1, z = 1\n!"),
            Err(DecodeError::InvalidShape { .. })
        ));
        assert_eq!(
            codec().decode("x = 99999999999999999999, y = 1, z = 1\n!"),
            Err(DecodeError::MissingHeader)
        );
    }
}
