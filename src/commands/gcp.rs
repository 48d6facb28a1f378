//! `secrets-env gcp`

use tracing::debug;

use super::{Launch, launch_with_secrets};
use crate::cli::GcpArgs;
use crate::config::Config;
use crate::error::{Result, SecretsEnvError};
use crate::secrets::providers::gcp::LATEST_VERSION;
use crate::secrets::providers::{GcpSettings, Store};
use crate::secrets::{KvVersion, SecretAddress};

pub fn gcp_settings(config: &Config, args: &GcpArgs) -> Result<GcpSettings> {
    let project_id = args
        .project_id
        .clone()
        .or(config.gcp().project)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            SecretsEnvError::validation(
                "GCP project is missing, pass it via --project-id flag or use PROJECT_ID environment variable",
            )
        })?;
    Ok(GcpSettings { project_id })
}

fn gcp_address(args: &GcpArgs) -> Result<SecretAddress> {
    let version = Some(args.secret_version.clone()).filter(|v| v != LATEST_VERSION);
    Ok(SecretAddress::new(args.secret_name.clone())?
        .with_store(KvVersion::V2, "")
        .as_document()
        .with_version(version))
}

/// Check the credentials file and export it for the SDK.
fn export_credentials(args: &GcpArgs) -> Result<()> {
    let Some(path) = &args.google_application_credentials else {
        return Ok(());
    };
    if !path.is_file() {
        return Err(SecretsEnvError::validation(format!(
            "google application credentials file {} does not exist",
            path.display()
        )));
    }
    debug!(path = %path.display(), "using service account credentials");
    // SAFETY: called on the main thread before the runtime or any client
    // thread exists.
    unsafe {
        std::env::set_var("GOOGLE_APPLICATION_CREDENTIALS", path);
    }
    Ok(())
}

/// Handle the gcp command
pub fn handle_gcp(config: &Config, args: GcpArgs) -> Result<i32> {
    let launch = Launch::resolve(&args.command)?;
    let settings = gcp_settings(config, &args)?;
    let address = gcp_address(&args)?;
    export_credentials(&args)?;

    let store = Store::connect_gcp(&settings)?;
    launch_with_secrets(&store, &[address], launch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::secrets::path::{ReadPlan, plan};
    use clap::Parser;
    use std::path::PathBuf;

    fn gcp_args(extra: &[&str]) -> GcpArgs {
        let mut argv = vec!["secrets-env", "gcp", "--secret-name", "db"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Gcp(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_latest_version_is_unpinned() {
        let mut args = gcp_args(&[]);
        args.secret_version = "latest".into();
        assert_eq!(gcp_address(&args).unwrap().version(), None);

        args.secret_version = "7".into();
        assert_eq!(gcp_address(&args).unwrap().version(), Some("7"));
    }

    #[test]
    fn test_trailing_slash_name_is_one_secret() {
        let mut args = gcp_args(&[]);
        args.secret_name = "db/".into();
        args.secret_version = "3".into();
        match plan(&gcp_address(&args).unwrap()).unwrap() {
            ReadPlan::Document { path, version } => {
                assert_eq!(path, "db/");
                assert_eq!(version.as_deref(), Some("3"));
            }
            other => panic!("unexpected plan: {:?}", other),
        }
    }

    #[test]
    fn test_project_from_config() {
        let mut args = gcp_args(&[]);
        args.project_id = None;
        assert!(gcp_settings(&Config::default(), &args).is_err());

        let config = Config::parse("test.kdl", r#"gcp project="my-project""#).unwrap();
        assert_eq!(gcp_settings(&config, &args).unwrap().project_id, "my-project");
    }

    #[test]
    fn test_missing_credentials_file() {
        let mut args = gcp_args(&[]);
        args.google_application_credentials = Some(PathBuf::from("/nonexistent/creds.json"));
        assert!(matches!(
            export_credentials(&args),
            Err(SecretsEnvError::Validation(_))
        ));
    }
}
