//! Confirmation prompt shown before a real migration.

use std::io::{self, BufRead, IsTerminal, Write};

/// Ask a yes/no question on stdout and read the answer from stdin.
pub fn confirm(question: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        tracing::debug!("stdin is not a terminal; reading confirmation from input stream");
    }
    confirm_with(question, &mut stdin.lock(), &mut io::stdout())
}

/// Only `y` or `yes` (any case) confirms. End of input declines.
pub fn confirm_with<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }

    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
