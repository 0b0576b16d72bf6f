// This file is part of the diff3utils package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::ffi::OsString;

use regex::Regex;

/// Report a file that could not be read as `PROG: FILE: reason`.
/// `io::Error` renders as "{reason} (os error {code})"; the numeric
/// suffix is dropped so the message reads like the system tools'.
pub fn report_failure_to_read_input_file(
    executable: &OsString,
    filepath: &OsString,
    error: &std::io::Error,
) {
    let os_error_suffix = Regex::new(r" \(os error \d+\)$").unwrap();
    let reason = error.to_string();
    eprintln!(
        "{}: {}: {}",
        executable.to_string_lossy(),
        filepath.to_string_lossy(),
        os_error_suffix.replace(&reason, ""),
    );
}
