// This file is part of the diff3utils package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::io::{self, Write};

use crate::merge::{Diff3Block, Diff3Type, FILE0, FILE1, FILE2};
use crate::params::Params;

/// Write an ed script that applies the changes between the second and
/// third files to the first. The blocks are traversed in reverse so
/// that earlier commands cannot shift the line numbers used by later
/// ones. Returns true if any conflict was written.
pub fn output_diff3_edscript<W: Write>(
    out: &mut W,
    diff: &[Diff3Block],
    mapping: &[usize; 3],
    rev_mapping: &[usize; 3],
    labels: &[String; 3],
    params: &Params,
) -> io::Result<bool> {
    let mut conflicts_found = false;

    for block in diff.iter().rev() {
        let kind = block.kind.mapped(rev_mapping);
        let conflict = match kind {
            Diff3Type::First => continue,
            Diff3Type::Second => {
                if !params.show_2nd {
                    continue;
                }
                true
            }
            Diff3Type::Third => {
                if params.overlap_only {
                    continue;
                }
                false
            }
            Diff3Type::All => {
                if params.simple_only {
                    continue;
                }
                params.flagging
            }
        };

        let low0 = block.low_line(mapping[FILE0]);
        let high0 = block.high_line(mapping[FILE0]);

        if conflict {
            conflicts_found = true;

            // Mark the end of the conflict.
            writeln!(out, "{high0}a")?;
            let mut leading_dot = false;
            if kind == Diff3Type::All {
                if params.show_2nd {
                    writeln!(out, "||||||| {}", labels[1])?;
                    leading_dot = dotlines(out, block, mapping[FILE1])?;
                }
                writeln!(out, "=======")?;
                leading_dot |= dotlines(out, block, mapping[FILE2])?;
            }
            writeln!(out, ">>>>>>> {}", labels[2])?;
            undotlines(
                out,
                leading_dot,
                high0 + 2,
                block.num_lines(mapping[FILE1]) + block.num_lines(mapping[FILE2]) + 1,
            )?;

            // Mark the start of the conflict.
            writeln!(out, "{}a", low0 - 1)?;
            writeln!(
                out,
                "<<<<<<< {}",
                if kind == Diff3Type::All {
                    &labels[0]
                } else {
                    &labels[1]
                }
            )?;
            let mut leading_dot = false;
            if kind == Diff3Type::Second {
                leading_dot = dotlines(out, block, mapping[FILE1])?;
                writeln!(out, "=======")?;
            }
            undotlines(out, leading_dot, low0 + 1, block.num_lines(mapping[FILE1]))?;
        } else if block.num_lines(mapping[FILE2]) == 0 {
            // Write out a delete.
            if low0 == high0 {
                writeln!(out, "{low0}d")?;
            } else {
                writeln!(out, "{low0},{high0}d")?;
            }
        } else {
            // Write out an add or change.
            if low0 == high0 + 1 {
                writeln!(out, "{high0}a")?;
            } else if low0 == high0 {
                writeln!(out, "{high0}c")?;
            } else {
                writeln!(out, "{low0},{high0}c")?;
            }
            let leading_dot = dotlines(out, block, mapping[FILE2])?;
            undotlines(out, leading_dot, low0, block.num_lines(mapping[FILE2]))?;
        }
    }

    if params.finalwrite {
        out.write_all(b"w\nq\n")?;
    }

    Ok(conflicts_found)
}

/// Write the lines of `block` taken from `filenum`, doubling any
/// leading dot; report whether one was doubled.
fn dotlines<W: Write>(out: &mut W, block: &Diff3Block, filenum: usize) -> io::Result<bool> {
    let mut leading_dot = false;
    for line in &block.lines[filenum] {
        if line.first() == Some(&b'.') {
            leading_dot = true;
            out.write_all(b".")?;
        }
        out.write_all(line)?;
    }
    Ok(leading_dot)
}

/// Terminate an append with a lone dot. If any appended line had a
/// doubled dot, follow up with the substitute command that removes
/// them again, covering `num` lines starting at `start`.
fn undotlines<W: Write>(out: &mut W, leading_dot: bool, start: usize, num: usize) -> io::Result<()> {
    out.write_all(b".\n")?;
    if leading_dot {
        if num == 1 {
            writeln!(out, "{start}s/^\\.//")?;
        } else {
            writeln!(out, "{},{}s/^\\.//", start, start + num - 1)?;
        }
    }
    Ok(())
}
