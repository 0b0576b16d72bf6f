// This file is part of the diff3utils package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::process::ExitCode;

fn main() -> ExitCode {
    diff3utils::diff3::main(std::env::args_os().peekable())
}
