//! completion command - Print a completion script for `kit`

use std::io::{self, Write};

use crate::cli::args::{Cli, Shell};
use anyhow::{Context as _, Result};
use clap::CommandFactory;
use clap_complete::shells;

/// Print the completion script for `shell` to stdout.
pub fn completion(shell: Shell) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_script(shell, &mut stdout);
    stdout.flush().context("Failed to write completion script")
}

/// Write the completion script for the `kit` binary to `out`.
fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    match shell {
        Shell::Bash => clap_complete::generate(shells::Bash, &mut cmd, bin, out),
        Shell::Zsh => clap_complete::generate(shells::Zsh, &mut cmd, bin, out),
        Shell::Fish => clap_complete::generate(shells::Fish, &mut cmd, bin, out),
        Shell::PowerShell => clap_complete::generate(shells::PowerShell, &mut cmd, bin, out),
    }
}
