use anyhow::Result;
use clap::{Args, CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};
use owo_colors::OwoColorize;

use crate::{command::Command, Cli};

const BIN_NAME: &str = "nedeval";

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ShellWrapper {
    Bash,
    Fish,
    Zsh,
}

impl ShellWrapper {
    fn install_path(self) -> String {
        match self {
            ShellWrapper::Bash => format!("/usr/share/bash-completion/completions/{BIN_NAME}"),
            ShellWrapper::Fish => format!("~/.config/fish/completions/{BIN_NAME}.fish"),
            ShellWrapper::Zsh => format!("~/.zfunc/_{BIN_NAME}"),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ShellWrapper::Bash => "bash",
            ShellWrapper::Fish => "fish",
            ShellWrapper::Zsh => "zsh",
        }
    }
}

impl From<ShellWrapper> for Shell {
    fn from(s: ShellWrapper) -> Self {
        match s {
            ShellWrapper::Bash => Shell::Bash,
            ShellWrapper::Fish => Shell::Fish,
            ShellWrapper::Zsh => Shell::Zsh,
        }
    }
}

#[derive(Args)]
pub(crate) struct GenCompletionsArgs {
    shell: Option<ShellWrapper>,
}

pub(crate) struct GenCompletionsCommand;

impl Command for GenCompletionsCommand {
    type Args = GenCompletionsArgs;
    fn execute(args: &GenCompletionsArgs, quiet: bool) -> Result<()> {
        match args.shell {
            Some(shell) => {
                generate(
                    Shell::from(shell),
                    &mut Cli::command(),
                    BIN_NAME,
                    &mut std::io::stdout(),
                );
                if !quiet {
                    eprintln!();
                    eprintln!(
                        "{}: To install these completions, run: {BIN_NAME} gen-completions {} > {}",
                        "Hint".blue(),
                        shell.name(),
                        shell.install_path()
                    );
                }
            }
            None => {
                eprintln!("Generate shell completions. To install them for your shell, run:");
                for shell in ShellWrapper::value_variants() {
                    eprintln!();
                    eprintln!("{}", format!("{}:", shell.name()).blue());
                    eprintln!(
                        "  {BIN_NAME} gen-completions {} > {}",
                        shell.name(),
                        shell.install_path()
                    );
                }
            }
        }
        Ok(())
    }
}
