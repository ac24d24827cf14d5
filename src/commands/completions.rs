//! # Completions Command Implementation
//!
//! Generates tab-completion scripts with `clap_complete`. The script is
//! written to stdout:
//!
//! ```bash
//! attr-merge completions bash > ~/.local/share/bash-completion/completions/attr-merge
//! attr-merge completions zsh > ~/.zfunc/_attr-merge
//! attr-merge completions fish > ~/.config/fish/completions/attr-merge.fish
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io::{self, Write};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for (bash, zsh, fish, powershell, elvish)
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell, &mut io::stdout())
}

fn write_completions<W: Write>(shell: Shell, out: &mut W) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_for(shell: Shell) -> String {
        let mut buf = Vec::new();
        write_completions(shell, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_bash_completion_names_subcommands() {
        let script = script_for(Shell::Bash);
        assert!(script.contains("attr-merge"));
        assert!(script.contains("check"));
        assert!(script.contains("merge"));
        assert!(script.contains("validate"));
    }

    #[test]
    fn test_every_shell_generates_output() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
            assert!(!script_for(shell).is_empty(), "{shell} produced no script");
        }
    }
}
