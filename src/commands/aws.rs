//! `secrets-env aws`

use super::{Launch, launch_with_secrets};
use crate::cli::AwsArgs;
use crate::config::Config;
use crate::error::Result;
use crate::secrets::providers::aws::{DEFAULT_REGION, PREVIOUS_STAGE};
use crate::secrets::providers::{AwsSettings, Store};
use crate::secrets::{KvVersion, SecretAddress};

pub fn aws_settings(config: &Config, args: &AwsArgs) -> AwsSettings {
    let file = config.aws();
    AwsSettings {
        region: args
            .region
            .clone()
            .or(file.region)
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        role_arn: args
            .role_arn
            .clone()
            .or(file.role_arn)
            .filter(|r| !r.is_empty()),
    }
}

/// The secret as a single versioned document; the previous staging label
/// when asked for.
fn aws_address(args: &AwsArgs) -> Result<SecretAddress> {
    Ok(SecretAddress::new(args.secret_name.clone())?
        .with_store(KvVersion::V2, "")
        .as_document()
        .with_version(args.previous_version.then(|| PREVIOUS_STAGE.to_string())))
}

/// Handle the aws command
pub fn handle_aws(config: &Config, args: AwsArgs) -> Result<i32> {
    let launch = Launch::resolve(&args.command)?;
    let address = aws_address(&args)?;
    let store = Store::connect_aws(&aws_settings(config, &args))?;
    launch_with_secrets(&store, &[address], launch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::secrets::path::{ReadPlan, plan};
    use clap::Parser;

    fn aws_args(extra: &[&str]) -> AwsArgs {
        let mut argv = vec!["secrets-env", "aws", "--secret-name", "prod/app"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Aws(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_region_falls_back_to_config_then_default() {
        let mut args = aws_args(&[]);
        args.region = None;
        assert_eq!(aws_settings(&Config::default(), &args).region, DEFAULT_REGION);

        let config = Config::parse("test.kdl", r#"aws region="eu-west-1""#).unwrap();
        assert_eq!(aws_settings(&config, &args).region, "eu-west-1");
    }

    #[test]
    fn test_previous_version_pins_stage() {
        let mut args = aws_args(&[]);
        args.previous_version = true;
        let address = aws_address(&args).unwrap();
        assert_eq!(address.version(), Some(PREVIOUS_STAGE));
        assert!(!address.is_multi_key());

        args.previous_version = false;
        assert_eq!(aws_address(&args).unwrap().version(), None);
    }

    #[test]
    fn test_trailing_slash_name_is_one_secret() {
        let mut args = aws_args(&[]);
        args.secret_name = "prod/app/".into();
        let address = aws_address(&args).unwrap();
        assert!(!address.is_multi_key());
        match plan(&address).unwrap() {
            ReadPlan::Document { path, version } => {
                assert_eq!(path, "prod/app/");
                assert_eq!(version, None);
            }
            other => panic!("unexpected plan: {:?}", other),
        }
    }
}
