//! Interactive overwrite confirmation on the terminal.

use rebarup_core::Shell;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Asks on stderr before overwriting an existing install; prints progress to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalShell;

impl Shell for TerminalShell {
    fn may_write(&self, target: &Path) -> bool {
        if !target.exists() {
            return true;
        }
        let stdin = io::stdin();
        let mut input = stdin.lock();
        ask_overwrite(target, &mut input, &mut io::stderr())
    }

    fn info(&self, message: &str) {
        println!("{message}");
    }
}

/// Ask `"<target> already exists, overwrite? [Yn] "`. Read or write failures decline.
pub fn ask_overwrite<R: BufRead, W: Write>(target: &Path, input: &mut R, output: &mut W) -> bool {
    if write!(output, "{} already exists, overwrite? [Yn] ", target.display())
        .and_then(|_| output.flush())
        .is_err()
    {
        return false;
    }
    let mut line = String::new();
    match input.read_line(&mut line) {
        // EOF: nobody to answer.
        Ok(0) => false,
        Ok(_) => is_yes(&line),
        Err(e) => {
            tracing::warn!("failed to read confirmation: {}", e);
            false
        }
    }
}

/// Empty answer defaults to yes.
fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes"
    )
}
