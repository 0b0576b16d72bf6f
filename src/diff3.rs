// This file is part of the diff3utils package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::env::ArgsOs;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::iter::Peekable;
use std::process::ExitCode;

use crate::ed_script;
use crate::merge::{self, FILE0, FILE1, FILEC};
use crate::merged;
use crate::normal;
use crate::params::{parse_params, Params};
use crate::parser;
use crate::runner;
use crate::utils::report_failure_to_read_input_file;

/// Pick the common file and build the argument-order/diff-order
/// mappings.
///
/// The two subsidiary diffs always share their right-hand operand. For
/// the default output format that is the third operand (historically
/// what tools like Emacs ediff expect); for ed scripts and merges it
/// is the second, the real ancestor. Standard input cannot be diffed
/// twice, so if it lands on the common slot the choice flips to the
/// other candidate.
fn file_mapping(params: &Params) -> Result<([usize; 3], [usize; 3]), String> {
    let mut common = 2 - usize::from(params.edscript || params.merge);
    if params.file[common] == "-" {
        common = 3 - common;
        if params.file[0] == "-" || params.file[common] == "-" {
            return Err("'-' specified for more than one input file".to_string());
        }
    }

    let mapping = [0, 3 - common, common];
    let mut rev_mapping = [0usize; 3];
    for (external, &internal) in mapping.iter().enumerate() {
        rev_mapping[internal] = external;
    }
    Ok((mapping, rev_mapping))
}

// Exit status is 0 if successful, 1 if conflicts, 2 if trouble.
pub fn main(opts: Peekable<ArgsOs>) -> ExitCode {
    let params = match parse_params(opts) {
        Ok(params) => params,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::from(2);
        }
    };
    let prog = params.executable.to_string_lossy().into_owned();

    // Three names for the same file cannot produce any output, except
    // when merging (the file itself) or when -i wants its w and q.
    if !params.merge
        && !params.finalwrite
        && params.file.iter().all(|file| file != "-")
        && same_file::is_same_file(&params.file[0], &params.file[1]).unwrap_or(false)
        && same_file::is_same_file(&params.file[1], &params.file[2]).unwrap_or(false)
    {
        return ExitCode::SUCCESS;
    }

    let (mapping, rev_mapping) = match file_mapping(&params) {
        Ok(mappings) => mappings,
        Err(error) => {
            eprintln!("{prog}: {error}");
            return ExitCode::from(2);
        }
    };

    let labels: [String; 3] = std::array::from_fn(|i| {
        params.labels[i]
            .clone()
            .unwrap_or_else(|| params.file[i].to_string_lossy().into_owned())
    });

    // Run the subsidiary diff twice and combine the results.
    let commonname = &params.file[rev_mapping[FILEC]];
    let mut stderr = io::stderr();

    let raw1 = match runner::run_diff(
        &params.diff_program,
        params.text,
        params.strip_trailing_cr,
        &params.file[rev_mapping[FILE1]],
        commonname,
    ) {
        Ok(raw) => raw,
        Err(error) => {
            eprintln!("{prog}: {error}");
            return ExitCode::from(2);
        }
    };
    let thread1 = match parser::parse_diff(&raw1, params.edscript, &prog, &mut stderr) {
        Ok(blocks) => blocks,
        Err(error) => {
            eprintln!("{prog}: {error}");
            return ExitCode::from(2);
        }
    };

    let raw0 = match runner::run_diff(
        &params.diff_program,
        params.text,
        params.strip_trailing_cr,
        &params.file[rev_mapping[FILE0]],
        commonname,
    ) {
        Ok(raw) => raw,
        Err(error) => {
            eprintln!("{prog}: {error}");
            return ExitCode::from(2);
        }
    };
    let thread0 = match parser::parse_diff(&raw0, params.edscript, &prog, &mut stderr) {
        Ok(blocks) => blocks,
        Err(error) => {
            eprintln!("{prog}: {error}");
            return ExitCode::from(2);
        }
    };

    let diff3 = match merge::make_3way_diff(&thread0, &thread1) {
        Ok(diff3) => diff3,
        Err(error) => {
            eprintln!("{prog}: {error}");
            return ExitCode::from(2);
        }
    };

    let mut output = Vec::new();
    let conflicts_found = if params.edscript {
        match ed_script::output_diff3_edscript(
            &mut output,
            &diff3,
            &mapping,
            &rev_mapping,
            &labels,
            &params,
        ) {
            Ok(conflicts) => conflicts,
            Err(error) => {
                eprintln!("{prog}: {error}");
                return ExitCode::from(2);
            }
        }
    } else if params.merge {
        let file0 = &params.file[rev_mapping[FILE0]];
        let infile = match File::open(file0) {
            Ok(infile) => infile,
            Err(error) => {
                report_failure_to_read_input_file(&params.executable, file0, &error);
                return ExitCode::from(2);
            }
        };
        match merged::output_diff3_merge(
            &mut BufReader::new(infile),
            &mut output,
            &diff3,
            &mapping,
            &rev_mapping,
            &labels,
            &params,
        ) {
            Ok(conflicts) => conflicts,
            Err(error) => {
                eprintln!("{prog}: {error}");
                return ExitCode::from(2);
            }
        }
    } else {
        match normal::output_diff3(&mut output, &diff3, &mapping, &rev_mapping, params.initial_tab)
        {
            Ok(()) => false,
            Err(error) => {
                eprintln!("{prog}: {error}");
                return ExitCode::from(2);
            }
        }
    };

    if let Err(error) = io::stdout().write_all(&output) {
        eprintln!("{prog}: write failed: {error}");
        return ExitCode::from(2);
    }

    if conflicts_found {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(files: [&str; 3], edscript: bool, merge: bool) -> Params {
        Params {
            file: [files[0].into(), files[1].into(), files[2].into()],
            edscript,
            merge,
            ..Params::default()
        }
    }

    #[test]
    fn default_format_uses_the_third_operand() {
        let (mapping, rev_mapping) =
            file_mapping(&params(["m", "o", "y"], false, false)).unwrap();
        assert_eq!(mapping, [0, 1, 2]);
        assert_eq!(rev_mapping, [0, 1, 2]);
    }

    #[test]
    fn ed_and_merge_use_the_second_operand() {
        for (edscript, merge) in [(true, false), (false, true)] {
            let (mapping, rev_mapping) =
                file_mapping(&params(["m", "o", "y"], edscript, merge)).unwrap();
            assert_eq!(mapping, [0, 2, 1]);
            assert_eq!(rev_mapping, [0, 2, 1]);
        }
    }

    #[test]
    fn stdin_on_the_common_slot_swaps() {
        let (mapping, _) = file_mapping(&params(["m", "o", "-"], false, false)).unwrap();
        assert_eq!(mapping, [0, 2, 1]);

        let (mapping, _) = file_mapping(&params(["m", "-", "y"], false, true)).unwrap();
        assert_eq!(mapping, [0, 1, 2]);
    }

    #[test]
    fn stdin_twice_is_rejected() {
        assert!(file_mapping(&params(["-", "o", "-"], false, false)).is_err());
        assert!(file_mapping(&params(["m", "-", "-"], false, true)).is_err());
    }
}
