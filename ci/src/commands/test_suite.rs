use argh::FromArgs;
use xshell::cmd;

use crate::Flag;
use crate::Prepare;
use crate::PreparedCommand;

/// Runs the unit and integration tests.
#[derive(FromArgs, Default)]
#[argh(subcommand, name = "test")]
pub struct TestCommand {}

impl Prepare for TestCommand {
    fn prepare<'a>(&self, sh: &'a xshell::Shell, flags: Flag) -> Vec<PreparedCommand<'a>> {
        // Keep running the remaining test binaries if one of them fails.
        let no_fail_fast = flags.contains(Flag::KEEP_GOING).then_some("--no-fail-fast");

        vec![PreparedCommand::new::<Self>(
            cmd!(sh, "cargo test --lib --tests {no_fail_fast...}"),
            "Please fix failing tests in output above.",
        )]
    }
}
