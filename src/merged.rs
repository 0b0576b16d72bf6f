// This file is part of the diff3utils package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::fmt;
use std::io::{self, BufRead, Write};

use crate::merge::{Diff3Block, Diff3Type, FILE0, FILE1, FILE2};
use crate::params::Params;

#[derive(Debug)]
pub enum MergeOutputError {
    /// The first file has fewer lines than the diff accounted for.
    InputShrank,
    Io(io::Error),
}

impl fmt::Display for MergeOutputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MergeOutputError::InputShrank => f.write_str("input file shrank"),
            MergeOutputError::Io(error) => write!(f, "read failed: {error}"),
        }
    }
}

impl From<io::Error> for MergeOutputError {
    fn from(error: io::Error) -> MergeOutputError {
        MergeOutputError::Io(error)
    }
}

/// Stream the first file through to `out`, splicing in the selected
/// hunks and conflict brackets. This acts like applying the ed script
/// to the first file, except that it also works for binary data and
/// incomplete lines. Returns true if any conflict was written.
pub fn output_diff3_merge<R: BufRead, W: Write>(
    infile: &mut R,
    out: &mut W,
    diff: &[Diff3Block],
    mapping: &[usize; 3],
    rev_mapping: &[usize; 3],
    labels: &[String; 3],
    params: &Params,
) -> Result<bool, MergeOutputError> {
    let mut conflicts_found = false;
    let mut linesread = 0usize;
    let mut line = Vec::new();

    for (n, block) in diff.iter().enumerate() {
        let kind = block.kind.mapped(rev_mapping);
        let (conflict, format_2nd) = match kind {
            Diff3Type::First => continue,
            Diff3Type::Second => {
                if !params.show_2nd {
                    continue;
                }
                (true, "<<<<<<<")
            }
            Diff3Type::Third => {
                if params.overlap_only {
                    continue;
                }
                (false, "<<<<<<<")
            }
            Diff3Type::All => {
                if params.simple_only {
                    continue;
                }
                // The old file is the base here, not one of the sides.
                (params.flagging, "|||||||")
            }
        };

        // Copy the lines leading up to this hunk.
        let mut i0 = block.low_line(FILE0) - linesread - 1;
        linesread += i0;
        while i0 > 0 {
            if !read_line(infile, &mut line)? {
                return Err(MergeOutputError::InputShrank);
            }
            out.write_all(&line)?;
            i0 -= 1;
        }

        if conflict {
            conflicts_found = true;

            if kind == Diff3Type::All {
                writeln!(out, "<<<<<<< {}", labels[0])?;
                for line in &block.lines[mapping[FILE0]] {
                    out.write_all(line)?;
                }
            }
            if params.show_2nd {
                writeln!(out, "{} {}", format_2nd, labels[1])?;
                for line in &block.lines[mapping[FILE1]] {
                    out.write_all(line)?;
                }
            }
            writeln!(out, "=======")?;
        }

        for line in &block.lines[mapping[FILE2]] {
            out.write_all(line)?;
        }

        if conflict {
            writeln!(out, ">>>>>>> {}", labels[2])?;
        }

        // Discard the lines the hunk replaced.
        let mut i1 = block.num_lines(FILE0);
        linesread += i1;
        while i1 > 0 {
            i1 -= 1;
            if !read_line(infile, &mut line)? {
                // An unterminated final line is only acceptable at the
                // very end of the diff.
                if i1 > 0 || n + 1 < diff.len() {
                    return Err(MergeOutputError::InputShrank);
                }
                return Ok(conflicts_found);
            }
        }
    }

    // Copy the rest of the file.
    loop {
        let buffer = infile.fill_buf()?;
        if buffer.is_empty() {
            break;
        }
        let consumed = buffer.len();
        out.write_all(buffer)?;
        infile.consume(consumed);
    }

    Ok(conflicts_found)
}

/// Read one line, newline included, into `line`. Returns false when
/// the input ends before a newline is seen.
fn read_line<R: BufRead>(infile: &mut R, line: &mut Vec<u8>) -> io::Result<bool> {
    line.clear();
    infile.read_until(b'\n', line)?;
    Ok(line.last() == Some(&b'\n'))
}
