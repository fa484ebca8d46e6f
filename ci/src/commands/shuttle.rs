use argh::FromArgs;
use xshell::cmd;

use crate::Flag;
use crate::Prepare;
use crate::PreparedCommand;

/// Checks, lints and runs the shuttle randomized scheduling tests.
#[derive(FromArgs, Default)]
#[argh(subcommand, name = "shuttle")]
pub struct ShuttleCommand {}

impl Prepare for ShuttleCommand {
    fn prepare<'a>(&self, sh: &'a xshell::Shell, _flags: Flag) -> Vec<PreparedCommand<'a>> {
        vec![
            PreparedCommand::new::<Self>(
                cmd!(
                    sh,
                    "cargo clippy --test shuttle --features shuttle -- -Dwarnings"
                ),
                "Please fix clippy errors in output above.",
            ),
            PreparedCommand::new::<Self>(
                cmd!(
                    sh,
                    "cargo test --test shuttle --profile shuttle --features shuttle"
                ),
                "Please fix failing shuttle tests in output above.",
            ),
        ]
    }
}
