use argh::FromArgs;
use xshell::cmd;

use crate::Flag;
use crate::Prepare;
use crate::PreparedCommand;

/// Checks, lints and runs the loom model tests.
#[derive(FromArgs, Default)]
#[argh(subcommand, name = "loom")]
pub struct LoomCommand {}

impl Prepare for LoomCommand {
    fn prepare<'a>(&self, sh: &'a xshell::Shell, _flags: Flag) -> Vec<PreparedCommand<'a>> {
        vec![
            PreparedCommand::new::<Self>(
                cmd!(sh, "cargo clippy --test loom -- -Dwarnings"),
                "Please fix clippy errors in output above.",
            )
            .with_env_var("RUSTFLAGS", "--cfg loom"),
            PreparedCommand::new::<Self>(
                cmd!(sh, "cargo test --test loom --profile loom"),
                "Please fix failing loom tests in output above.",
            )
            .with_env_var("RUSTFLAGS", "--cfg loom")
            .with_env_var("LOOM_MAX_PREEMPTIONS", "3"),
        ]
    }
}
