use std::time::Instant;

use argh::FromArgs;

use crate::{
    commands,
    prepare::{Flag, Prepare, PreparedCommand},
};

/// The CI command line tool for Waitline.
#[derive(FromArgs)]
pub struct CI {
    #[argh(subcommand)]
    command: Option<Commands>,

    /// continue running commands even if one fails.
    #[argh(switch)]
    keep_going: bool,
}

impl CI {
    /// Runs the specified commands or all default commands if none are specified.
    ///
    /// The model checkers (`loom`, `shuttle`) and `miri` are slow, so they only
    /// run when asked for by name.
    pub fn run(self) {
        let sh = xshell::Shell::new().unwrap();

        let prepared_commands = self.prepare(&sh);

        let mut failures = vec![];
        let mut timings = vec![];

        for command in prepared_commands {
            let name = command.name;
            let started = Instant::now();
            let passed = command.command.envs(command.env_vars).run().is_ok();
            timings.push((name, passed, started.elapsed()));

            if !passed {
                let message = command.failure_message;

                if self.keep_going {
                    // We use bullet points here because there can be more than one error.
                    failures.push(format!("- {name}: {message}"));
                } else {
                    failures.push(format!("{name}: {message}"));
                    break;
                }
            }
        }

        // Model checker runs can take minutes, so show where the time went.
        println!("\nSummary:");
        for (name, passed, elapsed) in timings {
            let status = if passed { "ok" } else { "FAILED" };
            println!("  {name:<10} {status:<6} {elapsed:.1?}");
        }

        // Log errors at the very end.
        if !failures.is_empty() {
            let failures = failures.join("\n");

            panic!(
                "One or more CI commands failed:\n\
                {failures}"
            );
        }
    }

    fn prepare<'a>(&self, sh: &'a xshell::Shell) -> Vec<PreparedCommand<'a>> {
        let mut flags = Flag::empty();

        if self.keep_going {
            flags |= Flag::KEEP_GOING;
        }

        match &self.command {
            Some(command) => command.prepare(sh, flags),
            None => {
                let mut cmds = vec![];
                cmds.append(&mut commands::FormatCommand::default().prepare(sh, flags));
                cmds.append(&mut commands::ClippyCommand::default().prepare(sh, flags));
                cmds.append(&mut commands::TestCommand::default().prepare(sh, flags));
                cmds.append(&mut commands::DocCommand::default().prepare(sh, flags));
                cmds
            }
        }
    }
}

/// The subcommands that can be run by the CI script.
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    // Lint commands
    Format(commands::FormatCommand),
    Clippy(commands::ClippyCommand),
    // Test commands
    Test(commands::TestCommand),
    Doc(commands::DocCommand),
    // Concurrency checking commands
    Loom(commands::LoomCommand),
    Shuttle(commands::ShuttleCommand),
    Miri(commands::MiriCommand),
}

impl Prepare for Commands {
    fn prepare<'a>(&self, sh: &'a xshell::Shell, flags: Flag) -> Vec<PreparedCommand<'a>> {
        match self {
            // Lint commands
            Commands::Format(subcommand) => subcommand.prepare(sh, flags),
            Commands::Clippy(subcommand) => subcommand.prepare(sh, flags),
            // Test commands
            Commands::Test(subcommand) => subcommand.prepare(sh, flags),
            Commands::Doc(subcommand) => subcommand.prepare(sh, flags),
            // Concurrency checking commands
            Commands::Loom(subcommand) => subcommand.prepare(sh, flags),
            Commands::Shuttle(subcommand) => subcommand.prepare(sh, flags),
            Commands::Miri(subcommand) => subcommand.prepare(sh, flags),
        }
    }
}
