use bitflags::bitflags;

/// Trait for preparing a subcommand to be run.
pub trait Prepare {
    /// Returns the commands to run for this subcommand, in order.
    fn prepare<'a>(&self, sh: &'a xshell::Shell, flags: Flag) -> Vec<PreparedCommand<'a>>;
}

bitflags! {
    /// Flags that modify how commands are run.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Flag: u32 {
        /// Forces certain checks to continue running even if they hit an error.
        const KEEP_GOING = 1 << 0;
    }
}

/// A command with associated metadata, created from a command that implements [`Prepare`].
pub struct PreparedCommand<'a> {
    /// The name of the subcommand this was prepared by.
    pub name: &'static str,
    /// The command to execute.
    pub command: xshell::Cmd<'a>,
    /// The message to display if the command fails.
    pub failure_message: &'static str,
    /// Environment variables to set for the command.
    pub env_vars: Vec<(&'static str, &'static str)>,
}

impl<'a> PreparedCommand<'a> {
    /// Creates a new [`PreparedCommand`] with no extra environment variables.
    pub fn new<T: argh::SubCommand>(
        command: xshell::Cmd<'a>,
        failure_message: &'static str,
    ) -> Self {
        Self {
            name: T::COMMAND.name,
            command,
            failure_message,
            env_vars: vec![],
        }
    }

    /// Adds an environment variable to set when running the command.
    pub fn with_env_var(mut self, key: &'static str, value: &'static str) -> Self {
        self.env_vars.push((key, value));
        self
    }
}
