// This file is part of the diff3utils package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::ffi::OsString;
use std::iter::Peekable;
use std::process::exit;

/// Options for one diff3 run. `edscript`, `flagging` and `show_2nd`
/// are derived from the flag combination rather than set directly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Params {
    pub executable: OsString,
    /// MYFILE, OLDFILE, YOURFILE in argument order.
    pub file: [OsString; 3],
    pub text: bool,
    pub strip_trailing_cr: bool,
    /// Output an ed script instead of the default format.
    pub edscript: bool,
    /// Bracket conflicts instead of silently taking one side.
    pub flagging: bool,
    /// Output hunks where only the second file differs.
    pub show_2nd: bool,
    /// Suppress overlapping hunks (-3).
    pub simple_only: bool,
    /// Suppress non-overlapping hunks (-x, -X).
    pub overlap_only: bool,
    /// Append `w` and `q` commands to ed scripts (-i).
    pub finalwrite: bool,
    pub merge: bool,
    pub initial_tab: bool,
    pub labels: [Option<String>; 3],
    pub diff_program: OsString,
}

impl Default for Params {
    fn default() -> Params {
        Params {
            executable: OsString::new(),
            file: [OsString::new(), OsString::new(), OsString::new()],
            text: false,
            strip_trailing_cr: false,
            edscript: false,
            flagging: false,
            show_2nd: false,
            simple_only: false,
            overlap_only: false,
            finalwrite: false,
            merge: false,
            initial_tab: false,
            labels: [None, None, None],
            diff_program: OsString::from("diff"),
        }
    }
}

// Bits for the mutually exclusive output-selection options.
const OPTION_3: u32 = 1 << 0;
const OPTION_A: u32 = 1 << 1;
const OPTION_E: u32 = 1 << 2;
const OPTION_X: u32 = 1 << 3;
const OPTION_LOWER_E: u32 = 1 << 4;
const OPTION_LOWER_X: u32 = 1 << 5;

fn try_help(prog: &str, reason: &str) -> String {
    format!("{prog}: {reason}\n{prog}: Try '{prog} --help' for more information.")
}

fn push_label(
    prog: &str,
    labels: &mut [Option<String>; 3],
    label_count: &mut usize,
    label: OsString,
) -> Result<(), String> {
    if *label_count >= 3 {
        return Err(try_help(prog, "too many file label options"));
    }
    labels[*label_count] = Some(
        label
            .into_string()
            .map_err(|_| "Label must be valid UTF-8".to_string())?,
    );
    *label_count += 1;
    Ok(())
}

pub fn parse_params<I: Iterator<Item = OsString>>(
    mut opts: Peekable<I>,
) -> Result<Params, String> {
    let Some(executable) = opts.next() else {
        return Err("Usage: <exe> MYFILE OLDFILE YOURFILE".to_string());
    };
    let prog = executable.to_string_lossy().into_owned();
    let mut params = Params {
        executable,
        ..Default::default()
    };

    let mut incompat: u32 = 0;
    let mut label_count = 0;
    let mut files: Vec<OsString> = Vec::new();
    let mut last_arg = prog.clone();

    while let Some(param) = opts.next() {
        last_arg = param.to_string_lossy().into_owned();
        let param_str = param.to_string_lossy();

        if param_str == "--" {
            break;
        }

        if !param_str.starts_with('-') || param_str == "-" {
            files.push(param);
            continue;
        }

        match param_str.as_ref() {
            "-a" | "--text" => params.text = true,
            "-A" | "--show-all" => {
                params.show_2nd = true;
                params.flagging = true;
                incompat |= OPTION_A;
            }
            "-e" | "--ed" => incompat |= OPTION_LOWER_E,
            "-E" | "--show-overlap" => {
                params.flagging = true;
                incompat |= OPTION_E;
            }
            "-3" | "--easy-only" => {
                params.simple_only = true;
                incompat |= OPTION_3;
            }
            "-x" | "--overlap-only" => {
                params.overlap_only = true;
                incompat |= OPTION_LOWER_X;
            }
            "-X" => {
                params.overlap_only = true;
                incompat |= OPTION_X;
            }
            "-i" => params.finalwrite = true,
            "-m" | "--merge" => params.merge = true,
            "-T" | "--initial-tab" => params.initial_tab = true,
            "--strip-trailing-cr" => params.strip_trailing_cr = true,
            "-L" | "--label" => {
                let label = opts
                    .next()
                    .ok_or_else(|| try_help(&prog, "option '--label' requires an argument"))?;
                push_label(&prog, &mut params.labels, &mut label_count, label)?;
            }
            "--diff-program" => {
                params.diff_program = opts.next().ok_or_else(|| {
                    try_help(&prog, "option '--diff-program' requires an argument")
                })?;
            }
            "--help" => {
                print_help(&prog);
                exit(0);
            }
            "-v" | "--version" => {
                println!("diff3 {}", env!("CARGO_PKG_VERSION"));
                exit(0);
            }
            _ => {
                if let Some(label) = param_str.strip_prefix("--label=") {
                    push_label(
                        &prog,
                        &mut params.labels,
                        &mut label_count,
                        OsString::from(label),
                    )?;
                } else if let Some(program) = param_str.strip_prefix("--diff-program=") {
                    params.diff_program = OsString::from(program);
                } else {
                    return Err(try_help(
                        &prog,
                        &format!("unrecognized option '{param_str}'"),
                    ));
                }
            }
        }
    }

    for param in opts {
        last_arg = param.to_string_lossy().into_owned();
        files.push(param);
    }

    // -AeExX3 without -m implies an ed script; -m without -AeExX3
    // implies -A.
    params.edscript = incompat != 0 && !params.merge;
    if incompat == 0 && params.merge {
        params.show_2nd = true;
        params.flagging = true;
    }

    if incompat & incompat.wrapping_sub(1) != 0
        || (params.finalwrite && params.merge)
        || (label_count != 0 && !params.flagging)
    {
        return Err(try_help(&prog, "incompatible options"));
    }

    if files.len() < 3 {
        return Err(try_help(
            &prog,
            &format!("missing operand after '{last_arg}'"),
        ));
    }
    if files.len() > 3 {
        return Err(try_help(
            &prog,
            &format!("extra operand '{}'", files[3].to_string_lossy()),
        ));
    }

    let mut files = files.into_iter();
    for slot in &mut params.file {
        *slot = files.next().expect("length checked above");
    }

    Ok(params)
}

fn print_help(prog: &str) {
    println!("Usage: {prog} [OPTION]... MYFILE OLDFILE YOURFILE");
    println!("Compare three files line by line.");
    println!();
    println!("  -A, --show-all              output all changes, bracketing conflicts");
    println!();
    println!("  -e, --ed                    output ed script incorporating changes");
    println!("                                  from OLDFILE to YOURFILE into MYFILE");
    println!("  -E, --show-overlap          like -e, but bracket conflicts");
    println!("  -3, --easy-only             like -e, but incorporate only nonoverlapping changes");
    println!("  -x, --overlap-only          like -e, but incorporate only overlapping changes");
    println!("  -X                          like -x, but bracket conflicts");
    println!("  -i                          append 'w' and 'q' commands to ed scripts");
    println!();
    println!("  -m, --merge                 output actual merged file, according to");
    println!("                                  -A if no other options are given");
    println!();
    println!("  -a, --text                  treat all files as text");
    println!("      --strip-trailing-cr     strip trailing carriage return on input");
    println!("  -T, --initial-tab           make tabs line up by prepending a tab");
    println!("      --diff-program=PROGRAM  use PROGRAM to compare files");
    println!("  -L, --label=LABEL           use LABEL instead of file name");
    println!("                                  (can be repeated up to three times)");
    println!();
    println!("      --help                  display this help and exit");
    println!("  -v, --version               output version information and exit");
    println!();
    println!("The default output format is a somewhat human-readable representation of");
    println!("the changes.");
    println!();
    println!("The -e, -E, -x, -X (and corresponding long) options cause an ed script");
    println!("to be output instead of the default.");
    println!();
    println!("Finally, the -m (--merge) option causes diff3 to do the merge internally");
    println!("and output the actual merged file.  For unusual input, this is more");
    println!("robust than using ed.");
    println!();
    println!("If a FILE is '-', read standard input.");
    println!("Exit status is 0 if successful, 1 if conflicts, 2 if trouble.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn os(s: &str) -> OsString {
        OsString::from(s)
    }

    fn parse(args: &[&str]) -> Result<Params, String> {
        let mut full = vec![os("diff3")];
        full.extend(args.iter().map(|s| os(s)));
        parse_params(full.into_iter().peekable())
    }

    #[test]
    fn plain_invocation() {
        let params = parse(&["mine", "older", "yours"]).unwrap();
        assert_eq!(params.file, [os("mine"), os("older"), os("yours")]);
        assert!(!params.edscript);
        assert!(!params.merge);
        assert!(!params.flagging);
        assert_eq!(params.diff_program, os("diff"));
    }

    #[test]
    fn ed_variants_imply_edscript() {
        for flag in ["-e", "-E", "-3", "-x", "-X", "-A"] {
            let params = parse(&[flag, "a", "b", "c"]).unwrap();
            assert!(params.edscript, "{flag} should imply an ed script");
        }
        assert!(parse(&["-E", "a", "b", "c"]).unwrap().flagging);
        assert!(parse(&["-3", "a", "b", "c"]).unwrap().simple_only);
        assert!(parse(&["-x", "a", "b", "c"]).unwrap().overlap_only);
        assert!(parse(&["-X", "a", "b", "c"]).unwrap().overlap_only);
        let show_all = parse(&["-A", "a", "b", "c"]).unwrap();
        assert!(show_all.show_2nd && show_all.flagging);
    }

    #[test]
    fn merge_alone_implies_show_all() {
        let params = parse(&["-m", "a", "b", "c"]).unwrap();
        assert!(params.merge && params.show_2nd && params.flagging);
        assert!(!params.edscript);
    }

    #[test]
    fn merge_with_selector_keeps_selector_flags() {
        let params = parse(&["-m", "-e", "a", "b", "c"]).unwrap();
        assert!(params.merge);
        assert!(!params.edscript);
        assert!(!params.show_2nd && !params.flagging);

        let params = parse(&["-m", "-E", "a", "b", "c"]).unwrap();
        assert!(params.flagging && !params.show_2nd);
    }

    #[test]
    fn at_most_one_selector() {
        assert!(parse(&["-e", "-E", "a", "b", "c"]).is_err());
        assert!(parse(&["-A", "-x", "a", "b", "c"]).is_err());
        // Repeating the same selector is fine.
        assert!(parse(&["-e", "-e", "a", "b", "c"]).is_ok());
    }

    #[test]
    fn final_write_conflicts_with_merge() {
        let err = parse(&["-i", "-m", "a", "b", "c"]).unwrap_err();
        assert!(err.contains("incompatible options"));
        assert!(parse(&["-i", "-e", "a", "b", "c"]).is_ok());
    }

    #[test]
    fn labels_require_flagging() {
        assert!(parse(&["-L", "l1", "-e", "a", "b", "c"]).is_err());
        assert!(parse(&["-L", "l1", "-x", "a", "b", "c"]).is_err());
        let params = parse(&["-L", "l1", "-A", "a", "b", "c"]).unwrap();
        assert_eq!(params.labels, [Some("l1".to_string()), None, None]);
        let params = parse(&["--label=l1", "--label=l2", "-m", "a", "b", "c"]).unwrap();
        assert_eq!(
            params.labels,
            [Some("l1".to_string()), Some("l2".to_string()), None]
        );
    }

    #[test]
    fn too_many_labels() {
        let err = parse(&["-A", "-L", "1", "-L", "2", "-L", "3", "-L", "4", "a", "b", "c"])
            .unwrap_err();
        assert!(err.contains("too many file label options"));
    }

    #[test]
    fn operand_count_is_checked() {
        let err = parse(&["a", "b"]).unwrap_err();
        assert!(err.contains("missing operand after 'b'"));
        let err = parse(&[]).unwrap_err();
        assert!(err.contains("missing operand after 'diff3'"));
        let err = parse(&["a", "b", "c", "d"]).unwrap_err();
        assert!(err.contains("extra operand 'd'"));
    }

    #[test]
    fn double_dash_ends_options() {
        let params = parse(&["--", "-m", "-e", "-x"]).unwrap();
        assert_eq!(params.file, [os("-m"), os("-e"), os("-x")]);
        assert!(!params.merge);
    }

    #[test]
    fn stdin_operand() {
        let params = parse(&["a", "-", "c"]).unwrap();
        assert_eq!(params.file[1], os("-"));
    }

    #[test]
    fn diff_program_override() {
        let params = parse(&["--diff-program=mydiff", "a", "b", "c"]).unwrap();
        assert_eq!(params.diff_program, os("mydiff"));
        let params = parse(&["--diff-program", "otherdiff", "a", "b", "c"]).unwrap();
        assert_eq!(params.diff_program, os("otherdiff"));
    }

    #[test]
    fn unrecognized_option() {
        let err = parse(&["--frobnicate", "a", "b", "c"]).unwrap_err();
        assert!(err.contains("unrecognized option '--frobnicate'"));
        assert!(err.contains("--help"));
    }

    #[test]
    fn passthrough_flags() {
        let params = parse(&["-a", "-T", "--strip-trailing-cr", "a", "b", "c"]).unwrap();
        assert!(params.text && params.initial_tab && params.strip_trailing_cr);
    }
}
