//! Problem and answer files.
//!
//! Problem text, whitespace separated:
//! - 32 rows of 32 characters, `'1'` for a blocked cell
//! - the stone count `n`
//! - `n` stones, each 8 rows of 8 characters, `'1'` for an occupied cell
//!
//! Answer text has one CRLF terminated line per stone in id order: empty for
//! an unplaced stone, otherwise `x y H|T degrees`.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::answer::Answer;
use crate::error::{Error, Result};
use crate::geometry::{BOARD_DIM, STONE_DIM};
use crate::grid::MAX_STONES;
use crate::stones::{Problem, StoneShape};

/// Whitespace tokens with their 1-based line numbers.
struct Tokens<'a> {
    inner: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let inner = text
            .lines()
            .enumerate()
            .flat_map(|(i, line)| line.split_whitespace().map(move |token| (i + 1, token)));
        Self {
            inner: Box::new(inner),
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<(usize, &'a str)> {
        self.inner.next().ok_or(Error::Truncated { expected })
    }

    /// Reads a row of exactly `width` cells.
    fn row(&mut self, width: usize, expected: &'static str) -> Result<impl Iterator<Item = bool> + 'a> {
        let (line, token) = self.next(expected)?;
        let found = token.chars().count();
        if found != width {
            return Err(Error::BadRow {
                line,
                expected: width,
                found,
            });
        }
        Ok(token.chars().map(|c| c == '1'))
    }
}

pub fn parse_problem(text: &str) -> Result<Problem> {
    let mut tokens = Tokens::new(text);

    let mut blocked = [[false; BOARD_DIM]; BOARD_DIM];
    for row in blocked.iter_mut() {
        for (cell, value) in row.iter_mut().zip(tokens.row(BOARD_DIM, "a board row")?) {
            *cell = value;
        }
    }

    let (line, token) = tokens.next("the stone count")?;
    let count: usize = token.parse().map_err(|_| Error::BadStoneCount {
        line,
        token: token.to_string(),
    })?;
    if count > MAX_STONES {
        return Err(Error::TooManyStones {
            count,
            max: MAX_STONES,
        });
    }

    let mut stones = Vec::with_capacity(count);
    for _ in 0..count {
        let mut shape: StoneShape = [[false; STONE_DIM]; STONE_DIM];
        for row in shape.iter_mut() {
            for (cell, value) in row.iter_mut().zip(tokens.row(STONE_DIM, "a stone row")?) {
                *cell = value;
            }
        }
        stones.push(shape);
    }

    Ok(Problem::new(blocked, stones))
}

pub fn read_problem(path: &Path) -> Result<Problem> {
    let text = fs::read_to_string(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_problem(&text)
}

pub fn write_answer<W: Write>(out: &mut W, answer: &Answer) -> io::Result<()> {
    let mut placements = answer.placements().iter().peekable();
    for stone in 0..answer.stone_count() {
        match placements.next_if(|p| p.stone as usize == stone) {
            Some(p) => write!(out, "{} {} {} {}\r\n", p.x, p.y, p.flip_flag(), p.degrees())?,
            None => out.write_all(b"\r\n")?,
        }
    }
    out.flush()
}

pub fn format_answer(answer: &Answer) -> String {
    let mut buffer = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_answer(&mut buffer, answer);
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn save_answer(path: &Path, answer: &Answer) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    write_answer(&mut BufWriter::new(file), answer)?;
    Ok(())
}

/// Writes `<dir>/<empty>_<used>.ans`, e.g. `0042_017.ans`, and returns its path.
pub fn save_snapshot(dir: &Path, empty_count: i16, answer: &Answer) -> Result<PathBuf> {
    let path = dir.join(format!("{:04}_{:03}.ans", empty_count, answer.len()));
    save_answer(&path, answer)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::Placement;
    use crate::geometry::Orientation;

    fn problem_text(blocked_rows: usize, stones: &[[&str; 8]]) -> String {
        let mut text = String::new();
        for y in 0..BOARD_DIM {
            let row = if y < blocked_rows { "1" } else { "0" };
            text.push_str(&row.repeat(BOARD_DIM));
            text.push('\n');
        }
        text.push_str(&format!("{}\n", stones.len()));
        for stone in stones {
            text.push('\n');
            for row in stone {
                text.push_str(row);
                text.push('\n');
            }
        }
        text
    }

    const DOMINO: [&str; 8] = [
        "11000000", "00000000", "00000000", "00000000", "00000000", "00000000", "00000000",
        "00000000",
    ];

    #[test]
    fn test_parse_problem() {
        let text = problem_text(2, &[DOMINO, DOMINO]).replace('\n', "\r\n");
        let problem = parse_problem(&text).expect("well-formed input");
        assert_eq!(problem.stone_count(), 2);
        assert!(problem.blocked[1].iter().all(|&b| b));
        assert!(problem.blocked[2].iter().all(|&b| !b));
        assert!(problem.stones[1][0][1]);
        assert!(!problem.stones[1][0][2]);
    }

    #[test]
    fn test_parse_problem_errors() {
        let short_row = problem_text(0, &[DOMINO]).replacen(&"0".repeat(BOARD_DIM), "000", 1);
        assert!(matches!(
            parse_problem(&short_row),
            Err(Error::BadRow { line: 1, expected: 32, found: 3 })
        ));

        let bad_count = problem_text(0, &[]).replace("\n0\n", "\nx\n");
        assert!(matches!(
            parse_problem(&bad_count),
            Err(Error::BadStoneCount { line: 33, .. })
        ));

        let truncated = problem_text(0, &[DOMINO]).replace("\n1\n", "\n2\n");
        assert!(matches!(parse_problem(&truncated), Err(Error::Truncated { .. })));

        assert!(matches!(parse_problem(""), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_answer_text() {
        let mut answer = Answer::new(4);
        answer.place(Placement {
            stone: 0,
            x: -3,
            y: 12,
            orientation: Orientation::IDENTITY,
        });
        answer.place(Placement {
            stone: 2,
            x: 7,
            y: 0,
            orientation: Orientation::from_parts(true, 1),
        });

        let text = format_answer(&answer);
        assert!(text.ends_with("\r\n"));
        insta::assert_snapshot!(text.replace("\r\n", "|\n"), @r"
        -3 12 H 0|
        |
        7 0 T 90|
        |
        ");
    }

    #[test]
    fn test_missing_problem_file() {
        let err = read_problem(Path::new("/nonexistent/stonepack/problem.txt")).unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert!(err.to_string().contains("problem.txt"));
    }
}
