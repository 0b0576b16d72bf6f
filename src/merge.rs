// This file is part of the diff3utils package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

// A three-way diff is built from two two-way diffs that share a common
// file. The two block lists are walked in lockstep over the common
// file's line space:
//
// 1) Pick the thread whose head block starts lower in the common file
//    and move that block into the "using" set.
//
// 2) While the other thread's head overlaps or abuts the set's high
//    water mark in the common file, move it in too, raising the mark
//    whenever the newcomer reaches higher. Two blocks whose ranges
//    merely touch are still folded into one hunk.
//
// 3) Fabricate one three-way block from the set: the common side is
//    assembled from every contributed block (lines asserted by both
//    threads must agree byte for byte), each other side comes from its
//    thread's blocks with the gaps filled from the common side, and a
//    side whose thread contributed nothing is carried over from the
//    previous block, since outside any diff that file and the common
//    file advance together.
//
// Repeat until both lists are exhausted.

use std::fmt;

use tracing::trace;

use crate::parser::{DiffBlock, FC, FO};

/// Internal file indices of a three-way diff.
pub const FILE0: usize = 0;
pub const FILE1: usize = 1;
pub const FILE2: usize = 2;
/// The file shared by the two two-way diffs.
pub const FILEC: usize = FILE2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Diff3Type {
    /// All three files differ.
    All,
    /// Only the first file differs.
    First,
    /// Only the second.
    Second,
    /// Only the third.
    Third,
}

impl Diff3Type {
    /// Renumber the odd file from internal to external (argument
    /// list) order.
    pub fn mapped(self, rev_mapping: &[usize; 3]) -> Diff3Type {
        match self {
            Diff3Type::All => Diff3Type::All,
            Diff3Type::First => ODD_ONE_OUT[rev_mapping[0]],
            Diff3Type::Second => ODD_ONE_OUT[rev_mapping[1]],
            Diff3Type::Third => ODD_ONE_OUT[rev_mapping[2]],
        }
    }

    /// Index of the odd file, when there is one.
    pub fn odd_index(self) -> Option<usize> {
        match self {
            Diff3Type::All => None,
            Diff3Type::First => Some(0),
            Diff3Type::Second => Some(1),
            Diff3Type::Third => Some(2),
        }
    }
}

const ODD_ONE_OUT: [Diff3Type; 3] = [Diff3Type::First, Diff3Type::Second, Diff3Type::Third];

/// One hunk of a three-way diff. Ranges are inclusive; the projection
/// of consecutive blocks onto FILEC covers the common file in order,
/// difference regions interleaved with equal regions.
#[derive(Debug, PartialEq)]
pub struct Diff3Block<'a> {
    pub kind: Diff3Type,
    pub ranges: [[usize; 2]; 3],
    pub lines: [Vec<&'a [u8]>; 3],
}

impl Diff3Block<'_> {
    pub fn low_line(&self, filenum: usize) -> usize {
        self.ranges[filenum][0]
    }

    pub fn high_line(&self, filenum: usize) -> usize {
        self.ranges[filenum][1]
    }

    pub fn num_lines(&self, filenum: usize) -> usize {
        self.high_line(filenum) + 1 - self.low_line(filenum)
    }
}

/// The two two-way diffs disagree about the contents of the common
/// file, so at least one of them is not a diff against it.
#[derive(Debug, PartialEq, Eq)]
pub struct InconsistencyError;

impl fmt::Display for InconsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("internal error: screwup in format of diff blocks")
    }
}

/// Combine two two-way diffs onto the same common file into one
/// three-way diff. Thread 0 is the diff of the first "other" file
/// against the common file, thread 1 the diff of the second.
pub fn make_3way_diff<'a>(
    thread0: &[DiffBlock<'a>],
    thread1: &[DiffBlock<'a>],
) -> Result<Vec<Diff3Block<'a>>, InconsistencyError> {
    let threads = [thread0, thread1];
    let mut index = [0usize; 2];
    let mut result: Vec<Diff3Block<'a>> = Vec::new();

    // The imaginary predecessor of the first block has high line 0 on
    // every side.
    let mut last_ranges = [[0usize; 2]; 3];

    while index[0] < thread0.len() || index[1] < thread1.len() {
        let mut using: [Vec<&DiffBlock<'a>>; 2] = [Vec::new(), Vec::new()];

        let base_thread = if index[0] >= thread0.len() {
            1
        } else if index[1] >= thread1.len() {
            0
        } else {
            usize::from(
                threads[0][index[0]].low_line(FC) > threads[1][index[1]].low_line(FC),
            )
        };

        let mut high_water_thread = base_thread;
        let mut high_water_mark = threads[base_thread][index[base_thread]].high_line(FC);
        using[base_thread].push(&threads[base_thread][index[base_thread]]);
        index[base_thread] += 1;

        let mut other_thread = high_water_thread ^ 1;
        while let Some(other) = threads[other_thread].get(index[other_thread]) {
            // Ranges that touch without overlapping still belong to
            // the same hunk.
            if other.low_line(FC) > high_water_mark + 1 {
                break;
            }
            using[other_thread].push(other);
            index[other_thread] += 1;

            if high_water_mark < other.high_line(FC) {
                high_water_thread = other_thread;
                high_water_mark = other.high_line(FC);
            }
            other_thread = high_water_thread ^ 1;
        }

        let lowc = using[base_thread][0].low_line(FC);
        let block = using_to_diff3_block(&using, lowc, high_water_mark, &last_ranges)?;
        trace!(lowc, highc = high_water_mark, kind = ?block.kind, "fabricated hunk");
        last_ranges = block.ranges;
        result.push(block);
    }

    Ok(result)
}

/// Build one three-way block from the blocks contributed by each
/// thread. `lowc..=highc` is the block's range in the common file;
/// `last` holds the ranges of the previously fabricated block.
fn using_to_diff3_block<'a>(
    using: &[Vec<&DiffBlock<'a>>; 2],
    lowc: usize,
    highc: usize,
    last: &[[usize; 2]; 3],
) -> Result<Diff3Block<'a>, InconsistencyError> {
    // Ranges in the other files. A thread that contributed nothing is
    // equivalent to the common file over this range, so its lines are
    // found by carrying the offset of the previous block forward.
    let mut low = [0usize; 2];
    let mut high = [0usize; 2];
    for d in 0..2 {
        if let (Some(first), Some(last_block)) = (using[d].first(), using[d].last()) {
            low[d] = first.low_line(FO) + lowc - first.low_line(FC);
            high[d] = last_block.high_line(FO) + (highc - last_block.high_line(FC));
        } else {
            low[d] = last[FILE0 + d][1] + (lowc - last[FILEC][1]);
            high[d] = last[FILE0 + d][1] + (highc - last[FILEC][1]);
        }
    }

    // Assemble the common side. When both threads assert a line at
    // the same position the bytes must match; the first assertion
    // wins, later equal ones alias it.
    let numc = highc + 1 - lowc;
    let mut slots: Vec<Option<&'a [u8]>> = vec![None; numc];
    for side in using {
        for block in side {
            let offset = block.low_line(FC) - lowc;
            for (i, &line) in block.lines[FC].iter().enumerate() {
                match slots[offset + i] {
                    Some(seen) if seen != line => return Err(InconsistencyError),
                    Some(_) => {}
                    None => slots[offset + i] = Some(line),
                }
            }
        }
    }
    let common: Vec<&'a [u8]> = slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(InconsistencyError)?;

    // Assemble each other side: the thread's own lines where it has
    // blocks, the common file's lines everywhere else.
    let mut others: [Vec<&'a [u8]>; 2] = [Vec::new(), Vec::new()];
    for d in 0..2 {
        let lo = low[d];
        let hi = high[d];
        let mut slots: Vec<Option<&'a [u8]>> = vec![None; hi + 1 - lo];

        let first_low = using[d].first().map_or(hi + 1, |b| b.low_line(FO));
        let mut i = 0;
        while i + lo < first_low {
            slots[i] = Some(*common.get(i).ok_or(InconsistencyError)?);
            i += 1;
        }

        for (n, block) in using[d].iter().enumerate() {
            let offset = block.low_line(FO) - lo;
            for (i, &line) in block.lines[FO].iter().enumerate() {
                slots[offset + i] = Some(line);
            }

            // Catch the equal stretch between this block and the next.
            let next_low = using[d].get(n + 1).map_or(hi + 1, |b| b.low_line(FO));
            let mut linec = block.high_line(FC) + 1 - lowc;
            for i in (block.high_line(FO) + 1 - lo)..(next_low - lo) {
                slots[i] = Some(*common.get(linec).ok_or(InconsistencyError)?);
                linec += 1;
            }
        }

        others[d] = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(InconsistencyError)?;
    }

    let kind = if using[0].is_empty() {
        Diff3Type::Second
    } else if using[1].is_empty() {
        Diff3Type::First
    } else if others[0] == others[1] {
        Diff3Type::Third
    } else {
        Diff3Type::All
    };

    let [lines0, lines1] = others;
    Ok(Diff3Block {
        kind,
        ranges: [[low[0], high[0]], [low[1], high[1]], [lowc, highc]],
        lines: [lines0, lines1, common],
    })
}
