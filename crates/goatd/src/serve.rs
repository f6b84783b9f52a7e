//! Serve and seed commands.

use std::path::Path;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};

use goats_app::GoatsModule;
use goats_core::{Goat, GoatsConfig};
use goats_state::KvStore;
use goats_trigger::{Forwarder, HttpTrigger};

/// Load config from `path` (defaults when absent), applying a port override.
pub fn load_config(path: Option<&Path>, port: Option<u16>) -> anyhow::Result<GoatsConfig> {
    let mut config = match path {
        Some(path) => GoatsConfig::from_file(path)?,
        None => GoatsConfig::default(),
    };
    if let Some(port) = port {
        let mut addr = config.bind_addr()?;
        addr.set_port(port);
        config.server.bind = addr.to_string();
    }
    Ok(config)
}

fn open_store(config: &GoatsConfig) -> anyhow::Result<KvStore> {
    match &config.store.path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let store = KvStore::open(path)?;
            info!(path = ?path, "kv store opened");
            Ok(store)
        }
        None => {
            info!("no store path configured, using an in-memory store");
            Ok(KvStore::open_in_memory()?)
        }
    }
}

/// Run the site until Ctrl-C.
pub async fn run(config: GoatsConfig) -> anyhow::Result<()> {
    info!("goatd starting");
    let addr = config.bind_addr()?;

    // ── Module + forwarder ─────────────────────────────────────

    let store = open_store(&config)?;
    let module = GoatsModule::from_config(store, &config)?;
    let forwarder = Forwarder::new(module, config.module.init);
    forwarder
        .warm_up()
        .await
        .context("backing module failed to initialize")?;
    info!(policy = ?config.module.init, "module initialized");

    // ── Trigger ────────────────────────────────────────────────

    let trigger = HttpTrigger::new(addr);
    trigger.register(forwarder.into_handler())?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(trigger.serve(shutdown_rx));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
        _ = shutdown_tx.closed() => {}
    }

    server.await??;
    info!("goatd stopped");
    Ok(())
}

/// Replace the featured catalogue with the goats in `file`.
pub fn seed(config: &GoatsConfig, file: &Path) -> anyhow::Result<()> {
    if config.store.path.is_none() {
        anyhow::bail!("seeding needs [store].path; an in-memory store would be discarded");
    }
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let goats: Vec<Goat> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of goats", file.display()))?;

    let store = open_store(config)?;
    store.put_featured_goats(&goats)?;
    info!(count = goats.len(), "featured goats seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_override_keeps_host() {
        let config = load_config(None, Some(9999)).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9999");
    }

    #[test]
    fn seed_requires_store_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("goats.json");
        std::fs::write(&file, "[]").unwrap();
        assert!(seed(&GoatsConfig::default(), &file).is_err());
    }

    #[test]
    fn seed_writes_featured_goats() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("goats.json");
        std::fs::write(
            &file,
            r#"[{"id":1,"name":"Billy","image":"/images/1.jpg","imageSmall":"/images/1_s.jpg"}]"#,
        )
        .unwrap();

        let mut config = GoatsConfig::default();
        config.store.path = Some(dir.path().join("data/goats.redb"));
        seed(&config, &file).unwrap();

        let store = KvStore::open(config.store.path.as_ref().unwrap()).unwrap();
        let goats = store.featured_goats().unwrap();
        assert_eq!(goats.len(), 1);
        assert_eq!(goats[0].name, "Billy");
    }

    #[test]
    fn seed_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("goats.json");
        std::fs::write(&file, "{\"not\": \"a list\"}").unwrap();

        let mut config = GoatsConfig::default();
        config.store.path = Some(dir.path().join("goats.redb"));
        assert!(seed(&config, &file).is_err());
    }
}
