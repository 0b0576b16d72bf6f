// This file is part of the diff3utils package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Read};
use std::process::{Command, Stdio};

use tracing::{instrument, trace};

#[derive(Debug)]
pub enum RunError {
    /// The child exited 126, or could not be spawned at all.
    CouldNotInvoke(OsString),
    /// The child exited 127, or the executable does not exist.
    NotFound(OsString),
    /// The child exited with some other status >= 2, or was killed.
    Failed(OsString, Option<i32>),
    /// The captured output did not end in a newline.
    IncompleteLastLine,
    Io(&'static str, io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunError::CouldNotInvoke(program) => write!(
                f,
                "subsidiary program '{}' could not be invoked",
                program.to_string_lossy()
            ),
            RunError::NotFound(program) => write!(
                f,
                "subsidiary program '{}' not found",
                program.to_string_lossy()
            ),
            RunError::Failed(program, Some(status)) => write!(
                f,
                "subsidiary program '{}' failed (exit status {})",
                program.to_string_lossy(),
                status
            ),
            RunError::Failed(program, None) => {
                write!(f, "subsidiary program '{}' failed", program.to_string_lossy())
            }
            RunError::IncompleteLastLine => {
                f.write_str("invalid diff format; incomplete last line")
            }
            RunError::Io(what, error) => write!(f, "{what}: {error}"),
        }
    }
}

/// Run the subsidiary diff program on `(filea, fileb)` and capture its
/// standard output. Exit status 0 (no differences) and 1 (differences)
/// are both success; anything else is fatal. The child's standard
/// error is passed through untouched.
#[instrument(level = "trace", skip_all, fields(program = ?program))]
pub fn run_diff(
    program: &OsStr,
    text: bool,
    strip_trailing_cr: bool,
    filea: &OsStr,
    fileb: &OsStr,
) -> Result<Vec<u8>, RunError> {
    let mut command = Command::new(program);
    if text {
        command.arg("-a");
    }
    if strip_trailing_cr {
        command.arg("--strip-trailing-cr");
    }
    // GNU diff3 also passes ---no-directory, but only GNU diff >= 3.10
    // understands it; older diffs exit 2 on sight of it.
    command
        .arg("--horizon-lines=100")
        .arg("--")
        .arg(filea)
        .arg(fileb)
        .stdout(Stdio::piped());

    let mut child = command.spawn().map_err(|error| {
        if error.kind() == io::ErrorKind::NotFound {
            RunError::NotFound(program.to_os_string())
        } else {
            RunError::CouldNotInvoke(program.to_os_string())
        }
    })?;

    // read_to_end grows the buffer geometrically and resumes
    // interrupted reads, so the whole pipe drains before waitpid.
    let mut raw = Vec::new();
    child
        .stdout
        .take()
        .ok_or_else(|| RunError::Io("pipe", io::Error::other("no child stdout")))?
        .read_to_end(&mut raw)
        .map_err(|error| RunError::Io("read failed", error))?;

    let status = child
        .wait()
        .map_err(|error| RunError::Io("waitpid", error))?;
    trace!(bytes = raw.len(), ?status, "subsidiary diff finished");

    if !raw.is_empty() && raw.last() != Some(&b'\n') {
        return Err(RunError::IncompleteLastLine);
    }

    match status.code() {
        Some(0 | 1) => Ok(raw),
        Some(126) => Err(RunError::CouldNotInvoke(program.to_os_string())),
        Some(127) => Err(RunError::NotFound(program.to_os_string())),
        Some(code) => Err(RunError::Failed(program.to_os_string(), Some(code))),
        None => Err(RunError::Failed(program.to_os_string(), None)),
    }
}
