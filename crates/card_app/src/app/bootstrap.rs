use std::path::Path;

use card_engine::{
    app_paths_for_root, load_card_content, load_stage_config, resolve_app_paths, AppPaths,
    CardContent, JsonFlagStore, LoggingHaptics, LoggingSoundPlayer, PngCertificateWriter,
    Services, StageConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Everything resolved from disk before either host starts.
pub(crate) struct AppWiring {
    pub(crate) paths: AppPaths,
    pub(crate) config: StageConfig,
    pub(crate) content: CardContent,
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn build_wiring(root: Option<&Path>) -> Result<AppWiring, String> {
    let paths = match root {
        Some(root) => app_paths_for_root(root),
        None => resolve_app_paths(),
    }
    .map_err(|error| error.to_string())?;
    info!(root = %paths.root.display(), "app_paths_resolved");

    let config = load_stage_config(&paths.stage_config_path()).map_err(|error| error.to_string())?;
    info!(
        loading_delay_ms = config.loading_delay_ms,
        post_drag_stage = %config.post_drag_stage.stage(),
        drag_threshold = config.drag.completion_threshold,
        "stage_config"
    );

    let content = load_content_or_default(&paths.card_content_path());
    Ok(AppWiring {
        paths,
        config,
        content,
    })
}

/// Broken card text never blocks the experience; the built-in card is used instead.
pub(crate) fn load_content_or_default(path: &Path) -> CardContent {
    match load_card_content(path) {
        Ok(content) => {
            info!(
                path = %path.display(),
                tutorial_steps = content.tutorial.len(),
                "card_content_loaded"
            );
            content
        }
        Err(error) => {
            warn!(error = %error, "card_content_fallback");
            CardContent::default()
        }
    }
}

/// Services for the windowed host: real certificate file and persisted flag.
pub(crate) fn live_services(wiring: &AppWiring) -> Services {
    Services::silent()
        .with_sound(LoggingSoundPlayer)
        .with_haptics(LoggingHaptics)
        .with_certificate(PngCertificateWriter::new(
            &wiring.paths.downloads_dir,
            wiring.content.clone(),
        ))
        .with_flags(JsonFlagStore::open(&wiring.paths.flag_store_path()))
}
