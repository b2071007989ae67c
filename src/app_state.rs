use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::core::client::{build_nomad_client, NomadApi, NomadHttpClient};
use crate::watcher::dispatcher::Dispatcher;
use crate::watcher::Watcher;

/// Everything the UI needs, wired from configuration.
#[derive(Clone)]
pub struct AppState {
    pub watcher: Watcher<NomadHttpClient>,
}

pub fn build_app_state(config: &Config) -> Result<(AppState, Dispatcher)> {
    let nomad = build_nomad_client(&config.nomad)?;
    let (watcher, dispatcher) = Watcher::new(nomad, config.watcher.clone());

    watcher.select_namespace(config.nomad.namespace.clone());
    watcher.select_region(config.nomad.region.clone());

    info!("Connected to Nomad at {}", watcher.nomad().address());
    Ok((AppState { watcher }, dispatcher))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_search_options_from_config() {
        let mut config = Config::default();
        config.nomad.namespace = Some("billing".into());
        config.nomad.region = Some("eu".into());

        let (state, _dispatcher) = build_app_state(&config).unwrap();
        let opts = state.watcher.search_options();

        assert_eq!(opts.namespace.as_deref(), Some("billing"));
        assert_eq!(opts.region.as_deref(), Some("eu"));
        assert_eq!(state.watcher.nomad().address(), "http://127.0.0.1:4646");
    }
}
