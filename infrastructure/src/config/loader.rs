//! Configuration file loader with multi-source merging

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use super::ConfigError;
use super::file_config::FileConfig;

/// Project-level config file names, checked in order
const PROJECT_FILES: [&str; 2] = ["toolgate.toml", ".toolgate.toml"];

/// Environment variable prefix; `TOOLGATE_POLICY__TIMEOUT_SECS=5`
const ENV_PREFIX: &str = "TOOLGATE_";

/// One place configuration may come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: &'static str,
    pub path: PathBuf,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority and
    /// validate it.
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let config: FileConfig = Self::figment(config_path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The merged figment, lowest priority first.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `$XDG_CONFIG_HOME/toolgate/config.toml` (or the platform equivalent)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("toolgate").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Config file locations in priority order (highest first).
    pub fn sources(config_path: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();
        if let Some(path) = config_path {
            sources.push(ConfigSource {
                label: "Explicit",
                path: path.to_path_buf(),
                found: path.exists(),
            });
        }
        sources.push(match Self::project_config_path() {
            Some(path) => ConfigSource {
                label: "Project",
                path,
                found: true,
            },
            None => ConfigSource {
                label: "Project",
                path: PathBuf::from(PROJECT_FILES[0]),
                found: false,
            },
        });
        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource {
                label: "Global",
                found: path.exists(),
                path,
            });
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;
    use crate::sandbox::SandboxKind;
    use figment::Jail;
    use toolgate_domain::NetworkAccess;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.providers.default, ProviderKind::Anthropic);
        assert_eq!(config.sandbox.kind, SandboxKind::Process);
        assert!(config.tools.enabled.is_empty());
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("toolgate/config.toml"));
    }

    #[test]
    fn test_project_file_and_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "toolgate.toml",
                r#"
[policy]
timeout_secs = 10
network = "allow"

[sandbox]
kind = "container"
"#,
            )?;
            jail.set_env("TOOLGATE_POLICY__TIMEOUT_SECS", "3");

            let config: FileConfig = ConfigLoader::figment(None).extract()?;
            assert_eq!(config.policy.timeout_secs, Some(3));
            assert_eq!(config.sandbox.kind, SandboxKind::Container);
            let policy = config.to_policy().map_err(|e| e.to_string())?;
            assert_eq!(policy.network_access, NetworkAccess::Allow);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_beats_project_file() {
        Jail::expect_with(|jail| {
            jail.create_file(".toolgate.toml", "[providers]\ndefault = \"openai\"\n")?;
            jail.create_file("custom.toml", "[providers]\ndefault = \"gemini\"\n")?;

            let config = ConfigLoader::load(Some(Path::new("custom.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.providers.default, ProviderKind::Gemini);

            let config = ConfigLoader::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.providers.default, ProviderKind::OpenAi);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_errors() {
        Jail::expect_with(|jail| {
            jail.create_file("toolgate.toml", "[policy]\nnetwork = \"maybe\"\n")?;
            assert!(matches!(
                ConfigLoader::load(None),
                Err(ConfigError::Invalid(_))
            ));

            jail.create_file("toolgate.toml", "[sandbox]\nkind = \"vm\"\n")?;
            assert!(matches!(ConfigLoader::load(None), Err(ConfigError::Load(_))));
            Ok(())
        });
    }

    #[test]
    fn test_sources_list_explicit_first() {
        let sources = ConfigLoader::sources(Some(Path::new("/nonexistent/toolgate.toml")));
        assert_eq!(sources[0].label, "Explicit");
        assert!(!sources[0].found);
        assert_eq!(sources[1].label, "Project");
    }
}
