mod app;

use std::env;
use std::io;
use std::process::ExitCode;

use card_engine::{run_app, LoopConfig, StageRuntime};
use tracing::{error, info};

use app::bootstrap::{build_wiring, init_tracing, live_services};
use app::cli::{parse_args, usage_text, CliOptions, Mode};
use app::script::{load_script, replay, write_summary};

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let options = parse_args(env::args().skip(1))?;
    if options.mode == Mode::Help {
        println!("{}", usage_text());
        return Ok(());
    }

    init_tracing();
    info!("=== Greeting Card Startup ===");
    run_mode(options)
}

fn run_mode(options: CliOptions) -> Result<(), String> {
    let wiring = build_wiring(options.root.as_deref())?;
    match options.mode {
        Mode::Script { path } => {
            let steps = load_script(&path)?;
            info!(path = %path.display(), steps = steps.len(), "script_replay");
            let summary = replay(
                &steps,
                wiring.config,
                &wiring.content,
                &wiring.paths.downloads_dir,
            );
            write_summary(&summary, &mut io::stdout())
                .map_err(|err| format!("failed to write replay summary: {err}"))
        }
        Mode::Window => {
            let runtime = StageRuntime::new(
                wiring.config,
                wiring.content.tutorial.len(),
                live_services(&wiring),
            );
            run_app(LoopConfig::default(), runtime, wiring.content).map_err(|err| {
                error!(error = %err, "startup_failed");
                err.to_string()
            })
        }
        Mode::Help => Ok(()),
    }
}
