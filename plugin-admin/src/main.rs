use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use app_config::AppConfig;
use clap::{Parser, Subcommand};
use plugin_settings::http_impl::HttpSettingsBackend;
use plugin_settings::{EntityId, PluginEnablementStore, PluginId};
use settings_client::SettingsClient;
use tracing_subscriber::EnvFilter;

/// Manage which projects have each optional plugin enabled.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Config file (defaults to ~/.plugin-admin/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API root, overriding the config file
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token, overriding the config file
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List enabled projects per plugin
    List {
        #[arg(short, long)]
        plugin: Option<PluginId>,
    },
    /// Enable a plugin for one project
    Enable { plugin: PluginId, id: EntityId },
    /// Disable a plugin for one project
    Disable { plugin: PluginId, id: EntityId },
    /// Flip a plugin for one project
    Toggle { plugin: PluginId, id: EntityId },
    /// Enable a plugin for exactly these projects, replacing the current list
    EnableAll {
        plugin: PluginId,
        #[arg(required = true)]
        ids: Vec<EntityId>,
    },
    /// Disable a plugin for every project
    DisableAll { plugin: PluginId },
    /// Enable a plugin for these projects in addition to the current list
    Add {
        plugin: PluginId,
        #[arg(required = true)]
        ids: Vec<EntityId>,
    },
    /// Disable a plugin for these projects
    Remove {
        plugin: PluginId,
        #[arg(required = true)]
        ids: Vec<EntityId>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli);
    init_logging(&config);

    let store = build_store(&config)?;

    // Never mutate on top of an empty fallback map: the save would wipe the record.
    store
        .try_load()
        .await
        .context("Could not read plugin settings from the backend")?;

    match &cli.cmd {
        Commands::List { plugin } => {
            let plugins = match plugin {
                Some(p) => vec![*p],
                None => PluginId::ALL.to_vec(),
            };
            for line in render_listing(&store, &plugins) {
                println!("{line}");
            }
            return Ok(());
        }
        Commands::Enable { plugin, id } => store.enable(*plugin, *id).await?,
        Commands::Disable { plugin, id } => store.disable(*plugin, *id).await?,
        Commands::Toggle { plugin, id } => store.toggle(*plugin, *id).await?,
        Commands::EnableAll { plugin, ids } => store.enable_all(*plugin, ids.clone()).await?,
        Commands::DisableAll { plugin } => store.disable_all(*plugin).await?,
        Commands::Add { plugin, ids } => store.enable_many(*plugin, ids.clone()).await?,
        Commands::Remove { plugin, ids } => store.disable_many(*plugin, ids.clone()).await?,
    }

    if let Some(plugin) = cli.cmd.plugin() {
        tracing::info!(%plugin, "plugin settings updated");
        for line in render_listing(&store, &[plugin]) {
            println!("{line}");
        }
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> AppConfig {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_or_default_from(path),
        None => AppConfig::load_or_default(),
    };
    if let Some(url) = &cli.base_url {
        config.api_base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.auth_token = Some(token.clone());
    }
    config
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_store(config: &AppConfig) -> anyhow::Result<PluginEnablementStore> {
    let mut client = SettingsClient::with_timeout(&config.api_base_url, config.request_timeout())
        .with_context(|| format!("Invalid API base URL: {}", config.api_base_url))?;
    if let Some(token) = config.bearer_token() {
        client = client.with_token(token);
    }
    tracing::debug!(
        base_url = %client.base_url(),
        authenticated = config.bearer_token().is_some(),
        "using settings backend"
    );
    Ok(PluginEnablementStore::new(Arc::new(HttpSettingsBackend::new(client))))
}

impl Commands {
    /// Plugin a mutating command touches; `None` for read-only commands.
    fn plugin(&self) -> Option<PluginId> {
        match self {
            Commands::List { .. } => None,
            Commands::Enable { plugin, .. }
            | Commands::Disable { plugin, .. }
            | Commands::Toggle { plugin, .. }
            | Commands::EnableAll { plugin, .. }
            | Commands::DisableAll { plugin }
            | Commands::Add { plugin, .. }
            | Commands::Remove { plugin, .. } => Some(*plugin),
        }
    }
}

fn render_listing(store: &PluginEnablementStore, plugins: &[PluginId]) -> Vec<String> {
    plugins
        .iter()
        .map(|&plugin| {
            let ids = store.enabled_ids(plugin);
            let list = ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{plugin} ({}): {} enabled [{list}]",
                plugin.label(),
                ids.len()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plugin_settings::{BackendError, EnablementMap, SettingsBackend};

    struct FixedBackend(EnablementMap);

    #[async_trait]
    impl SettingsBackend for FixedBackend {
        async fn fetch(&self) -> Result<EnablementMap, BackendError> {
            Ok(self.0.clone())
        }

        async fn persist(&self, _map: &EnablementMap) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[test]
    fn parses_plugin_identifiers_and_ids() {
        let cli = Cli::try_parse_from(["plugin-admin", "enable-all", "video-playback", "1", "2"])
            .unwrap();
        match cli.cmd {
            Commands::EnableAll { plugin, ids } => {
                assert_eq!(plugin, PluginId::VideoPlayback);
                assert_eq!(ids, vec![1, 2]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_plugin() {
        assert!(Cli::try_parse_from(["plugin-admin", "enable", "wiki", "1"]).is_err());
    }

    #[test]
    fn bulk_commands_require_ids() {
        assert!(Cli::try_parse_from(["plugin-admin", "add", "parts"]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let cli = Cli::try_parse_from([
            "plugin-admin",
            "--config",
            "/nonexistent/config.toml",
            "--base-url",
            "http://example.test/api/",
            "--token",
            "abc",
            "list",
        ])
        .unwrap();

        let config = resolve_config(&cli);
        assert_eq!(config.api_base_url, "http://example.test/api/");
        assert_eq!(config.bearer_token(), Some("abc"));
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn mutating_commands_name_their_plugin() {
        let cli = Cli::try_parse_from(["plugin-admin", "disable-all", "github"]).unwrap();
        assert_eq!(cli.cmd.plugin(), Some(PluginId::Github));

        let cli = Cli::try_parse_from(["plugin-admin", "list"]).unwrap();
        assert_eq!(cli.cmd.plugin(), None);
    }

    #[test]
    fn build_store_rejects_unparsable_base_url() {
        let config = AppConfig {
            api_base_url: "not a url".to_string(),
            ..AppConfig::default()
        };
        let err = build_store(&config).err().unwrap();
        assert!(err.to_string().contains("Invalid API base URL"));

        assert!(build_store(&AppConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn listing_shows_count_and_ids() {
        let record = EnablementMap::new().with(PluginId::Graduation, [1, 2]);
        let store = PluginEnablementStore::new(Arc::new(FixedBackend(record)));
        store.try_load().await.unwrap();

        let lines = render_listing(&store, &[PluginId::Graduation, PluginId::Parts]);
        assert_eq!(
            lines,
            vec![
                "graduation (Graduation documents): 2 enabled [1, 2]".to_string(),
                "parts (Parts list): 0 enabled []".to_string(),
            ]
        );
    }
}
