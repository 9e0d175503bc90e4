use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod config;
pub mod content;
pub mod services;

pub use app::{
    keyboard_events, pointer_events, present, progress_indicator, run_app, vertical_coordinate,
    ActiveTouches, AppError, CompletedStages, DragSettings, HapticPattern, InteractionFlags,
    KeyTrigger, LoopConfig, Milestone, Notice, PointerAction, PointerSample, Presentation,
    ProgressIndicator, SideEffect, SoundEffect, Stage, StageController, StageEvent, StageRuntime,
    StageView, TimerKind, TimerQueue, Tone, TouchPoint, Vec2,
};
pub use config::{load_stage_config, ConfigError, PostDragStage, StageConfig};
pub use content::{
    load_card_content, parse_card_content, CardContent, CertificateText, ContentErrorCode,
    ContentLoadError, SourceLocation, TutorialStep,
};
pub use services::{
    certificate_serial, CertificateError, CertificateService, FlagStore, FlagStoreError, Haptics,
    JsonFlagStore, LoggingHaptics, LoggingSoundPlayer, MemoryFlagStore, NoCertificate, NoHaptics,
    NoSound, PngCertificateWriter, ServiceError, Services, SoundPlayer,
};

pub const ROOT_ENV_VAR: &str = "GREETCARD_ROOT";

const CARD_CONTENT_FILE: &str = "card.xml";
const STAGE_CONFIG_FILE: &str = "card_config.json";
const FLAG_FILE: &str = "flags.json";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub base_content_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub downloads_dir: PathBuf,
}

impl AppPaths {
    pub fn card_content_path(&self) -> PathBuf {
        self.base_content_dir.join(CARD_CONTENT_FILE)
    }

    pub fn stage_config_path(&self) -> PathBuf {
        self.root.join(STAGE_CONFIG_FILE)
    }

    pub fn flag_store_path(&self) -> PathBuf {
        self.cache_dir.join(FLAG_FILE)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "GREETCARD_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/greeting-card\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    app_paths_for_root(&root)
}

/// Builds the directory layout under an explicit root and makes sure the
/// writable directories exist.
pub fn app_paths_for_root(root: &Path) -> Result<AppPaths, StartupError> {
    let root = normalize_path(root);
    let paths = AppPaths {
        base_content_dir: root.join("assets").join("base"),
        cache_dir: root.join("cache"),
        downloads_dir: root.join("downloads"),
        root,
    };

    for dir in [&paths.cache_dir, &paths.downloads_dir] {
        fs::create_dir_all(dir).map_err(|source| StartupError::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }

    Ok(paths)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
