//! `show` command
//!
//! Loads one configuration, applies command-line overrides and prints the
//! result as a summary, YAML or JSON.

use std::io::Write;
use std::num::NonZeroUsize;

use crate::cli::args::{ShowArgs, ShowFormat};
use crate::config::{ConfigLoader, Configuration, Overrides, summary};
use crate::error::Era5CfgError;

/// Loads, overrides and prints a configuration.
///
/// # Errors
///
/// Returns a usage error if no configuration path was given (neither
/// `--config` nor `ERA5CFG_CONFIG`), a config error if loading fails, or a
/// serialization or stdout write error.
pub fn run(args: &ShowArgs) -> Result<(), Era5CfgError> {
    let Some(path) = args.config.as_deref() else {
        return Err(Era5CfgError::Usage(
            "no configuration given: pass --config or set ERA5CFG_CONFIG".to_string(),
        ));
    };

    tracing::info!(config = %path.display(), "loading configuration");
    let loaded = ConfigLoader::with_defaults().load(path)?;
    for warning in &loaded.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }

    let config = loaded.config.with_overrides(&overrides(args)?);
    writeln!(std::io::stdout().lock(), "{}", render(&config, args.format)?)?;
    Ok(())
}

fn overrides(args: &ShowArgs) -> Result<Overrides, Era5CfgError> {
    let nprocs = args
        .nprocs
        .map(|n| {
            usize::try_from(n)
                .ok()
                .and_then(NonZeroUsize::new)
                .ok_or_else(|| Era5CfgError::Usage(format!("invalid --nprocs value {n}")))
        })
        .transpose()?;
    Ok(Overrides {
        nprocs,
        update: args.update,
    })
}

fn render(config: &Configuration, format: ShowFormat) -> Result<String, Era5CfgError> {
    Ok(match format {
        ShowFormat::Human => summary::render(config).trim_end().to_string(),
        ShowFormat::Yaml => serde_yaml::to_string(config)?.trim_end().to_string(),
        ShowFormat::Json => serde_json::to_string_pretty(config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::tests::sample_config;

    fn args(nprocs: Option<u32>, update: bool) -> ShowArgs {
        ShowArgs {
            config: None,
            nprocs,
            update,
            format: ShowFormat::Human,
        }
    }

    #[test]
    fn test_missing_config_is_usage_error() {
        let err = run(&args(None, false)).unwrap_err();
        assert_eq!(err.exit_code(), 64);
    }

    #[test]
    fn test_overrides_from_args() {
        let overrides = overrides(&args(Some(12), true)).unwrap();
        assert_eq!(overrides.nprocs.map(NonZeroUsize::get), Some(12));
        assert!(overrides.update);
        assert!(super::overrides(&args(None, false)).unwrap().is_empty());
    }

    #[test]
    fn test_render_formats() {
        let config = sample_config();
        let yaml = render(&config, ShowFormat::Yaml).unwrap();
        assert!(yaml.contains("dataset: ERA5"));
        let json: serde_json::Value =
            serde_json::from_str(&render(&config, ShowFormat::Json).unwrap()).unwrap();
        assert_eq!(json["freq"], "1hr");
        assert_eq!(json["nprocs"], 4);
        let human = render(&config, ShowFormat::Human).unwrap();
        assert!(human.starts_with("Download directory:"));
    }
}
