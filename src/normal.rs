// This file is part of the diff3utils package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::io::{self, Write};

use crate::merge::Diff3Block;

// Print order when the odd file is the second one: 0, 2, 1, so that
// the two equivalent files come out adjacent.
const SKEW_INCREMENT: [usize; 3] = [2, 3, 1];

/// Write a three-way diff in the default somewhat-human-readable
/// format. `mapping` translates argument-list file numbers to the
/// file numbers of the diff, `rev_mapping` is its inverse; all output
/// refers to files in argument-list order.
pub fn output_diff3<W: Write>(
    out: &mut W,
    diff: &[Diff3Block],
    mapping: &[usize; 3],
    rev_mapping: &[usize; 3],
    initial_tab: bool,
) -> io::Result<()> {
    let line_prefix: &[u8] = if initial_tab { b"\t" } else { b"  " };

    for block in diff {
        let (oddoneout, dontprint) = match block.kind.odd_index() {
            // Nobody's odder than anyone else; print them all.
            None => (3, 3),
            Some(internal) => {
                let odd = rev_mapping[internal];
                (odd, usize::from(odd == 0))
            }
        };

        if oddoneout == 3 {
            writeln!(out, "====")?;
        } else {
            writeln!(out, "===={}", oddoneout + 1)?;
        }

        let mut i = 0;
        while i < 3 {
            let realfile = mapping[i];
            let lowt = block.low_line(realfile);
            let hight = block.high_line(realfile);

            if lowt == hight + 1 {
                writeln!(out, "{}:{}a", i + 1, lowt - 1)?;
            } else if lowt == hight {
                writeln!(out, "{}:{}c", i + 1, lowt)?;
            } else {
                writeln!(out, "{}:{},{}c", i + 1, lowt, hight)?;
            }

            if i != dontprint {
                let lines = &block.lines[realfile];
                for (n, line) in lines.iter().enumerate() {
                    out.write_all(line_prefix)?;
                    out.write_all(line)?;
                    if n + 1 == lines.len() && line.last() != Some(&b'\n') {
                        out.write_all(b"\n\\ No newline at end of file\n")?;
                    }
                }
            }

            i = if oddoneout == 1 { SKEW_INCREMENT[i] } else { i + 1 };
        }
    }

    Ok(())
}
