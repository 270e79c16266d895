use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use kg_backend::{BackendKind, StoreFormat};
use serde::Serialize;

use super::{Config, ConfigError, ConfigRaw, defaults};

const ENV_PREFIX: &str = "KG_BRIDGE_";

/// Explicit command-line values, the highest-priority layer.
///
/// Unset fields are skipped so they never mask lower layers.
#[derive(Debug, Default, Serialize)]
pub(crate) struct ConfigOverrides {
    pub backend: BackendOverrides,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct BackendOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<BackendKind>,
    pub local: LocalOverrides,
    pub remote: RemoteOverrides,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct LocalOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_format: Option<StoreFormat>,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct RemoteOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_repository: Option<String>,
}

/// Resolve configuration from, lowest to highest priority: typed defaults,
/// `config.toml` in the working directory, the `--config` file, `KG_BRIDGE_`
/// environment variables (nested keys split on `__`), then CLI flags.
pub(crate) fn load_configuration(
    custom_config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<Config, ConfigError> {
    let figment = layered(custom_config_path, overrides);
    let config: ConfigRaw = figment.extract().map_err(Box::new)?;

    config.resolve()
}

fn layered(custom_config_path: Option<&Path>, overrides: &ConfigOverrides) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(defaults::config()));

    if Path::new("config.toml").exists() {
        figment = figment.merge(Toml::file("config.toml"));
    }

    if let Some(config_path) = custom_config_path {
        tracing::debug!(path = %config_path.display(), "Loading custom config file");
        figment = figment.merge(Toml::file(config_path));
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Serialized::defaults(overrides))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_apply_without_any_source() {
        Jail::expect_with(|_jail| {
            let config = load_configuration(None, &ConfigOverrides::default()).unwrap();
            assert_eq!(config.backend.kind, BackendKind::Local);
            assert_eq!(config.query.default_limit, 100);
            Ok(())
        });
    }

    #[test]
    fn layers_apply_in_priority_order() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [backend]
                kind = "remote"

                [backend.remote]
                server_url = "http://from-config-toml:8080/rdf4j-server"
                default_repository = "from-config-toml"

                [query]
                default_limit = 10
                max_limit = 50
                "#,
            )?;
            jail.create_file(
                "custom.toml",
                r#"
                [backend.remote]
                server_url = "http://from-custom:8080/rdf4j-server"

                [query]
                max_limit = 500
                "#,
            )?;
            jail.set_env("KG_BRIDGE_QUERY__DEFAULT_LIMIT", "25");
            jail.set_env("KG_BRIDGE_BACKEND__REMOTE__DEFAULT_REPOSITORY", "from-env");

            let overrides = ConfigOverrides {
                backend: BackendOverrides {
                    remote: RemoteOverrides {
                        default_repository: Some("from-cli".to_string()),
                        ..RemoteOverrides::default()
                    },
                    ..BackendOverrides::default()
                },
            };
            let config = load_configuration(Some(Path::new("custom.toml")), &overrides).unwrap();

            assert_eq!(config.backend.kind, BackendKind::Remote);
            assert_eq!(
                config.backend.remote.server_url,
                "http://from-custom:8080/rdf4j-server"
            );
            assert_eq!(
                config.backend.remote.default_repository.as_deref(),
                Some("from-cli")
            );
            assert_eq!(config.query.default_limit, 25);
            assert_eq!(config.query.max_limit, 500);
            Ok(())
        });
    }

    #[test]
    fn store_format_aliases_accepted_from_files() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [backend.local]
                store_path = "data/graph.nt"
                store_format = "nt"
                "#,
            )?;
            let config = load_configuration(None, &ConfigOverrides::default()).unwrap();
            assert_eq!(config.backend.local.store_format, StoreFormat::NTriples);
            assert_eq!(
                config.backend.local.store_path.as_deref(),
                Some(Path::new("data/graph.nt"))
            );
            Ok(())
        });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[query]\nrow_cap = 5\n")?;
            let error = load_configuration(None, &ConfigOverrides::default()).unwrap_err();
            assert!(matches!(error, ConfigError::LoadError(_)));
            Ok(())
        });
    }

    #[test]
    fn inverted_limits_are_invalid() {
        Jail::expect_with(|jail| {
            jail.set_env("KG_BRIDGE_QUERY__DEFAULT_LIMIT", "20000");
            let error = load_configuration(None, &ConfigOverrides::default()).unwrap_err();
            assert!(matches!(error, ConfigError::InvalidConfig(_)));
            Ok(())
        });
    }

    #[test]
    fn remote_backend_requires_server_url() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[backend]\nkind = \"remote\"\n\n[backend.remote]\nserver_url = \" \"\n",
            )?;
            let error = load_configuration(None, &ConfigOverrides::default()).unwrap_err();
            assert!(matches!(error, ConfigError::InvalidConfig(_)));
            Ok(())
        });
    }
}
