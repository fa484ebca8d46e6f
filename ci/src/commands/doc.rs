use argh::FromArgs;
use xshell::cmd;

use crate::Flag;
use crate::Prepare;
use crate::PreparedCommand;

/// Builds the documentation and runs the doctests, including the compile-fail
/// tests.
#[derive(FromArgs, Default)]
#[argh(subcommand, name = "doc")]
pub struct DocCommand {}

impl Prepare for DocCommand {
    fn prepare<'a>(&self, sh: &'a xshell::Shell, _flags: Flag) -> Vec<PreparedCommand<'a>> {
        vec![
            PreparedCommand::new::<Self>(
                cmd!(sh, "cargo doc --no-deps --document-private-items"),
                "Please fix doc warnings in output above.",
            )
            .with_env_var("RUSTDOCFLAGS", "-D warnings"),
            PreparedCommand::new::<Self>(
                cmd!(sh, "cargo test --doc"),
                "Please fix failing doc tests in output above.",
            ),
        ]
    }
}
