//! Init command implementation.
//!
//! Writes a default `gcsimt.toml` into the target directory.

use std::path::{Path, PathBuf};

use crate::commands::traits::{Command, CommandDescription};
use crate::config::{Config, CONFIG_FILE_NAME};
use crate::error::{GcsimtError, Result};

/// Arguments for the init command.
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    /// Enable verbose output.
    pub verbose: bool,
    /// Overwrite an existing configuration file.
    pub force: bool,
    /// Directory to write into (default: current directory).
    pub path: Option<PathBuf>,
}

/// Init command handler.
pub struct InitCommand {
    args: InitArgs,
}

impl InitCommand {
    /// Execute the command, returning the path written.
    pub fn run(&self) -> Result<PathBuf> {
        let dir = self
            .args
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        self.validate_directory(&dir)?;

        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() && !self.args.force {
            return Err(GcsimtError::Validation(format!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            )));
        }

        Config::default().save_to_path(&config_path)?;
        tracing::info!("wrote {}", config_path.display());

        if self.args.verbose {
            eprintln!("Created file: {}", config_path.display());
        }
        Ok(config_path)
    }

    fn validate_directory(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
            return Ok(());
        }
        if !path.is_dir() {
            return Err(GcsimtError::Validation(format!(
                "Target path is not a directory: {}",
                path.display()
            )));
        }
        Ok(())
    }
}

impl Command for InitCommand {
    type Args = InitArgs;
    type Output = PathBuf;

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<Self::Output> {
        self.run()
    }

    fn name() -> &'static str {
        "init"
    }
}

impl CommandDescription for InitCommand {
    fn description() -> &'static str {
        "Write a default gcsimt.toml"
    }

    fn help() -> &'static str {
        "Creates gcsimt.toml with the default simulation parameters in the \
         given directory, or the current directory when none is given."
    }
}

/// Run the init command.
pub fn run_init(args: InitArgs) -> Result<PathBuf> {
    tracing::debug!("{}: {}", InitCommand::name(), InitCommand::description());
    InitCommand::new(args).execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args_for(dir: &Path, force: bool) -> InitArgs {
        InitArgs {
            verbose: false,
            force,
            path: Some(dir.to_path_buf()),
        }
    }

    #[test]
    fn test_init_command_name() {
        assert_eq!(<InitCommand as Command>::name(), "init");
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = run_init(args_for(temp_dir.path(), false)).unwrap();

        assert_eq!(path, temp_dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(Config::load_from_path(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_init_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        run_init(args_for(&nested, false)).unwrap();
        assert!(nested.join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let temp_dir = TempDir::new().unwrap();
        run_init(args_for(temp_dir.path(), false)).unwrap();

        let result = run_init(args_for(temp_dir.path(), false));
        assert!(matches!(result, Err(GcsimtError::Validation(msg)) if msg.contains("already exists")));

        assert!(run_init(args_for(temp_dir.path(), true)).is_ok());
    }

    #[test]
    fn test_init_rejects_file_target() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(run_init(args_for(&file, false)).is_err());
    }
}
