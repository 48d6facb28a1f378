//! Running the target command with the injected environment.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

use crate::error::{Result, SecretsEnvError};
use crate::injector::{SanitizedEnvironment, is_sanitized};

/// A command resolved on `PATH`, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    program: PathBuf,
    args: Vec<String>,
}

impl Launch {
    /// Resolve `command[0]` on `PATH`. Runs before any secret is fetched.
    pub fn resolve(command: &[String]) -> Result<Self> {
        let (name, args) = command.split_first().ok_or_else(|| {
            SecretsEnvError::validation("no command given, pass it after --")
        })?;
        let program = which::which(name)
            .map_err(|e| SecretsEnvError::validation(format!("command '{}' not found: {}", name, e)))?;
        Ok(Self {
            program,
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn command(&self, env: &SanitizedEnvironment, opaque: &[(OsString, OsString)]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env_clear()
            .envs(opaque.iter().map(|(k, v)| (k, v)))
            .envs(env.pairs());
        cmd
    }

    /// Replace the current process with the command. Only returns on failure.
    #[cfg(unix)]
    pub fn run(self, env: &SanitizedEnvironment, opaque: &[(OsString, OsString)]) -> Result<i32> {
        use std::os::unix::process::CommandExt;

        info!(program = %self.program.display(), vars = env.len(), "executing command");
        let err = self.command(env, opaque).exec();
        Err(SecretsEnvError::Other(format!(
            "failed to execute {}: {}",
            self.program.display(),
            err
        )))
    }

    /// Run the command as a child and hand back its exit code.
    #[cfg(not(unix))]
    pub fn run(self, env: &SanitizedEnvironment, opaque: &[(OsString, OsString)]) -> Result<i32> {
        info!(program = %self.program.display(), vars = env.len(), "running command");
        let status = self.command(env, opaque).status()?;
        Ok(status.code().unwrap_or(1))
    }
}

/// The process environment, split by encoding.
#[derive(Debug, Default)]
pub struct AmbientEnvironment {
    /// `name=value` entries, scanned for secret references.
    pub entries: Vec<String>,
    /// Entries that are not valid UTF-8. They cannot hold a secret reference
    /// and are forwarded to the command as they are, minus denylisted names.
    pub opaque: Vec<(OsString, OsString)>,
}

impl AmbientEnvironment {
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut env = Self::default();
        for (name, value) in vars {
            match (name.to_str(), value.to_str()) {
                (Some(n), Some(v)) => env.entries.push(format!("{}={}", n, v)),
                (Some(n), None) if is_sanitized(n) => {
                    debug!(name = n, "dropping secret-store variable from child environment");
                }
                _ => {
                    debug!(name = ?name, "forwarding non UTF-8 environment variable unchanged");
                    env.opaque.push((name, value));
                }
            }
        }
        env
    }
}

/// Snapshot of the current process environment.
pub fn ambient_environment() -> AmbientEnvironment {
    AmbientEnvironment::from_vars(std::env::vars_os())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_is_rejected() {
        let err = Launch::resolve(&[]).unwrap_err();
        assert!(matches!(err, SecretsEnvError::Validation(_)));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let err = Launch::resolve(&["definitely-not-a-real-binary-4821".to_string()]).unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-real-binary-4821"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_finds_sh() {
        let launch = Launch::resolve(&["sh".to_string(), "-c".to_string(), "true".to_string()]).unwrap();
        assert!(launch.program().ends_with("sh"));
        assert_eq!(launch.args, vec!["-c".to_string(), "true".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_variables_are_forwarded() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(vec![b'a', 0xff]);
        let ambient = AmbientEnvironment::from_vars([
            (OsString::from("HOME"), OsString::from("/root")),
            (OsString::from("LEGACY"), raw.clone()),
            (OsString::from("VAULT_TOKEN"), raw.clone()),
        ]);
        assert_eq!(ambient.entries, vec!["HOME=/root".to_string()]);
        assert_eq!(ambient.opaque, vec![(OsString::from("LEGACY"), raw.clone())]);

        let launch = Launch::resolve(&["sh".to_string()]).unwrap();
        let mut env = SanitizedEnvironment::new();
        env.push("HOME", "/root");
        let cmd = launch.command(&env, &ambient.opaque);
        let forwarded: Vec<_> = cmd
            .get_envs()
            .map(|(k, v)| (k.to_os_string(), v.map(|v| v.to_os_string())))
            .collect();
        assert!(forwarded.contains(&(OsString::from("LEGACY"), Some(raw))));
        assert!(forwarded.contains(&(OsString::from("HOME"), Some(OsString::from("/root")))));
    }
}
