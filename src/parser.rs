// This file is part of the diff3utils package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::fmt;
use std::io::Write;

/// The "other" side of a two-way diff block.
pub const FO: usize = 0;
/// The common-file side of a two-way diff block.
pub const FC: usize = 1;

// Line numbers stay well below this so that the +1/+2 arithmetic on
// ranges cannot overflow.
const MAX_LINE_NUMBER: usize = usize::MAX / 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiffType {
    Add,
    Change,
    Delete,
}

/// One hunk of a normal-format two-way diff.
///
/// `ranges[side]` is an inclusive `[lo, hi]` pair; an empty range is
/// normalised to `[n + 1, n]` (the side-0 range of an add, the side-1
/// range of a delete). `lines[side]` holds one slice per line of the
/// range, borrowed from the raw diff output, newline included unless
/// the source line was unterminated.
#[derive(Debug, PartialEq)]
pub struct DiffBlock<'a> {
    pub kind: DiffType,
    pub ranges: [[usize; 2]; 2],
    pub lines: [Vec<&'a [u8]>; 2],
}

impl DiffBlock<'_> {
    pub fn low_line(&self, side: usize) -> usize {
        self.ranges[side][0]
    }

    pub fn high_line(&self, side: usize) -> usize {
        self.ranges[side][1]
    }

    pub fn num_lines(&self, side: usize) -> usize {
        self.high_line(side) + 1 - self.low_line(side)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A malformed hunk header; carries the offending line.
    BadControl(Vec<u8>),
    BadChangeSeparator,
    BadLineStart,
    IncompleteLastLine,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::BadControl(line) => {
                write!(f, "diff failed: {}", String::from_utf8_lossy(line))
            }
            ParseError::BadChangeSeparator => {
                f.write_str("invalid diff format; invalid change separator")
            }
            ParseError::BadLineStart => {
                f.write_str("invalid diff format; incorrect leading line chars")
            }
            ParseError::IncompleteLastLine => {
                f.write_str("invalid diff format; incomplete last line")
            }
        }
    }
}

/// Parse the output of the subsidiary diff into a list of blocks,
/// ascending and non-overlapping on the common side.
///
/// Line content is borrowed from `raw`, so the buffer must outlive the
/// blocks. A `\ No newline at end of file` note from the subsidiary
/// diff normally causes the newline to be dropped from the captured
/// line; when `edscript` is set the newline is kept instead (ed cannot
/// express unterminated lines) and the note is forwarded to
/// `diagnostics`, prefixed with the program name.
pub fn parse_diff<'a, W: Write>(
    raw: &'a [u8],
    edscript: bool,
    program: &str,
    diagnostics: &mut W,
) -> Result<Vec<DiffBlock<'a>>, ParseError> {
    if !raw.is_empty() && raw.last() != Some(&b'\n') {
        return Err(ParseError::IncompleteLastLine);
    }

    let mut blocks = Vec::new();
    let mut pos = 0;
    let mut prev_high = [0usize; 2];

    while pos < raw.len() {
        let control_start = pos;
        let (kind, mut ranges, next) = parse_control(raw, pos)?;
        pos = next;

        // Force the appropriate range to be empty.
        match kind {
            DiffType::Add => ranges[FO][0] += 1,
            DiffType::Delete => ranges[FC][0] += 1,
            DiffType::Change => {}
        }

        // Between hunks the two files are identical: consecutive
        // blocks advance both sides by the same positive amount.
        let gap_fo = ranges[FO][0].checked_sub(prev_high[FO]);
        let gap_fc = ranges[FC][0].checked_sub(prev_high[FC]);
        match (gap_fo, gap_fc) {
            (Some(fo), Some(fc)) if fo == fc && fo > 0 => {}
            _ => return Err(control_error(raw, control_start)),
        }
        prev_high = [ranges[FO][1], ranges[FC][1]];

        let mut block = DiffBlock {
            kind,
            ranges,
            lines: [Vec::new(), Vec::new()],
        };

        if kind != DiffType::Add {
            let numlines = block.num_lines(FO);
            block.lines[FO].reserve(numlines);
            for _ in 0..numlines {
                let (line, next) = scan_line(raw, pos, b'<', edscript, program, diagnostics)?;
                block.lines[FO].push(line);
                pos = next;
            }
        }

        if kind == DiffType::Change {
            if raw.get(pos..pos + 4) != Some(b"---\n") {
                return Err(ParseError::BadChangeSeparator);
            }
            pos += 4;
        }

        if kind != DiffType::Delete {
            let numlines = block.num_lines(FC);
            block.lines[FC].reserve(numlines);
            for _ in 0..numlines {
                let (line, next) = scan_line(raw, pos, b'>', edscript, program, diagnostics)?;
                block.lines[FC].push(line);
                pos = next;
            }
        }

        blocks.push(block);
    }

    Ok(blocks)
}

fn skip_blanks(raw: &[u8], mut pos: usize) -> usize {
    while let Some(b' ' | b'\t') = raw.get(pos) {
        pos += 1;
    }
    pos
}

fn read_num(raw: &[u8], mut pos: usize) -> Option<(usize, usize)> {
    let mut num: usize = 0;
    if !raw.get(pos)?.is_ascii_digit() {
        return None;
    }
    while let Some(c) = raw.get(pos) {
        if !c.is_ascii_digit() {
            break;
        }
        num = num.checked_mul(10)?.checked_add(usize::from(c - b'0'))?;
        pos += 1;
    }
    if num > MAX_LINE_NUMBER {
        return None;
    }
    Some((num, pos))
}

fn control_error(raw: &[u8], start: usize) -> ParseError {
    let end = raw[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(raw.len(), |i| start + i);
    ParseError::BadControl(raw[start..end].to_vec())
}

/// Parse one hunk header of the form `R[,R] {a,c,d} R[,R]`. A single
/// number stands for the degenerate range `[n, n]`.
fn parse_control(raw: &[u8], start: usize) -> Result<(DiffType, [[usize; 2]; 2], usize), ParseError> {
    let mut ranges = [[0usize; 2]; 2];

    let mut pos = skip_blanks(raw, start);
    let (lo, next) = read_num(raw, pos).ok_or_else(|| control_error(raw, start))?;
    ranges[FO][0] = lo;
    pos = skip_blanks(raw, next);
    if raw.get(pos) == Some(&b',') {
        let (hi, next) = read_num(raw, pos + 1).ok_or_else(|| control_error(raw, start))?;
        ranges[FO][1] = hi;
        pos = skip_blanks(raw, next);
    } else {
        ranges[FO][1] = ranges[FO][0];
    }

    let kind = match raw.get(pos) {
        Some(b'a') => DiffType::Add,
        Some(b'c') => DiffType::Change,
        Some(b'd') => DiffType::Delete,
        _ => return Err(control_error(raw, start)),
    };
    pos += 1;

    pos = skip_blanks(raw, pos);
    let (lo, next) = read_num(raw, pos).ok_or_else(|| control_error(raw, start))?;
    ranges[FC][0] = lo;
    pos = skip_blanks(raw, next);
    if raw.get(pos) == Some(&b',') {
        let (hi, next) = read_num(raw, pos + 1).ok_or_else(|| control_error(raw, start))?;
        ranges[FC][1] = hi;
        pos = skip_blanks(raw, next);
    } else {
        ranges[FC][1] = ranges[FC][0];
    }

    if raw.get(pos) != Some(&b'\n') {
        return Err(control_error(raw, start));
    }

    // lo may exceed hi only by one, the empty-range form.
    if ranges[FO][0] > ranges[FO][1] + 1 || ranges[FC][0] > ranges[FC][1] + 1 {
        return Err(control_error(raw, start));
    }

    Ok((kind, ranges, pos + 1))
}

/// Scan one literal line: the leading character, a space, then text
/// (NUL bytes included) through the newline.
fn scan_line<'a, W: Write>(
    raw: &'a [u8],
    pos: usize,
    leading: u8,
    edscript: bool,
    program: &str,
    diagnostics: &mut W,
) -> Result<(&'a [u8], usize), ParseError> {
    if raw.get(pos) != Some(&leading) || raw.get(pos + 1) != Some(&b' ') {
        return Err(ParseError::BadLineStart);
    }

    let start = pos + 2;
    let mut end = start;
    while raw.get(end) != Some(&b'\n') {
        end += 1;
    }
    end += 1;
    let mut line = &raw[start..end];

    let mut next = end;
    if raw.get(next) == Some(&b'\\') {
        // The previous line was not newline-terminated.
        if edscript {
            let _ = write!(diagnostics, "{program}:");
        } else {
            line = &line[..line.len() - 1];
        }
        next += 1;
        let note_start = next;
        while raw.get(next) != Some(&b'\n') {
            next += 1;
        }
        next += 1;
        if edscript {
            let _ = diagnostics.write_all(&raw[note_start..next]);
        }
    }

    Ok((line, next))
}
