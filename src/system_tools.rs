//! External tools gemkit shells out to (git and the configured commands)

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

/// A program gemkit runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tool {
    /// `git`, for tagging and pushing releases
    Git,
    /// Any program named in `gemkit.toml`
    Program(String),
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Git => write!(f, "git"),
            Tool::Program(name) => write!(f, "{name}"),
        }
    }
}

/// Errors of external commands.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ToolError {
    /// The program is not on `PATH`
    #[error("could not find `{tool}`: {source}")]
    NotFound {
        /// The missing program
        tool: String,
        /// The lookup error
        #[source]
        source: which::Error,
    },

    /// The program could not be started
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The command line
        command: String,
        /// The spawn error
        #[source]
        source: std::io::Error,
    },

    /// The program exited unsuccessfully
    #[error("`{command}` failed with {status}")]
    Failed {
        /// The command line
        command: String,
        /// Its exit status
        status: ExitStatus,
    },

    /// A configured command has no program
    #[error("the `{0}` command in gemkit.toml is empty")]
    #[diagnostic(help("set `commands.{0}` to an argv list such as [\"gem\", \"push\", \"{{archive}}\"]"))]
    EmptyCommand(&'static str),
}

/// Looks up programs once and runs them.
#[derive(Debug, Default)]
pub struct SystemTools {
    found_tools: RefCell<HashMap<Tool, PathBuf>>,
}

impl SystemTools {
    /// Create a new, empty lookup cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a tool on `PATH`.
    pub fn find_tool(&self, tool: &Tool) -> Result<PathBuf, ToolError> {
        if let Some(path) = self.found_tools.borrow().get(tool) {
            return Ok(path.clone());
        }

        let path = which::which(tool.to_string()).map_err(|source| ToolError::NotFound {
            tool: tool.to_string(),
            source,
        })?;
        tracing::debug!("found {tool} at {}", path.display());

        self.found_tools
            .borrow_mut()
            .insert(tool.clone(), path.clone());
        Ok(path)
    }

    /// A command for the tool, run in `cwd`.
    pub fn call(&self, tool: &Tool, cwd: &Path) -> Result<Command, ToolError> {
        let mut command = Command::new(self.find_tool(tool)?);
        command.current_dir(cwd);
        Ok(command)
    }

    /// Run `git` with the given arguments.
    pub fn git(&self, args: &[&str], cwd: &Path) -> Result<(), ToolError> {
        let mut command = self.call(&Tool::Git, cwd)?;
        command.args(args);
        run(&mut command, &format!("git {}", args.join(" ")))
    }

    /// Run a configured argv vector. `name` identifies the command in errors.
    pub fn run_argv(&self, name: &'static str, argv: &[String], cwd: &Path) -> Result<(), ToolError> {
        let (program, args) = argv.split_first().ok_or(ToolError::EmptyCommand(name))?;
        let mut command = self.call(&Tool::Program(program.clone()), cwd)?;
        command.args(args);
        run(&mut command, &argv.join(" "))
    }
}

fn run(command: &mut Command, command_line: &str) -> Result<(), ToolError> {
    tracing::info!("running {command_line}");
    let status = command.status().map_err(|source| ToolError::Spawn {
        command: command_line.to_string(),
        source,
    })?;

    if !status.success() {
        tracing::error!("Command failed: {command_line}");
        return Err(ToolError::Failed {
            command: command_line.to_string(),
            status,
        });
    }
    Ok(())
}

/// Replace `{name}` placeholders in every argument.
pub fn expand_placeholders(argv: &[String], values: &[(&str, &str)]) -> Vec<String> {
    argv.iter()
        .map(|arg| {
            values.iter().fold(arg.clone(), |arg, (name, value)| {
                arg.replace(&format!("{{{name}}}"), value)
            })
        })
        .collect()
}
