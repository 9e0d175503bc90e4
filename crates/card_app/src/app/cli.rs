use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mode {
    Window,
    Script { path: PathBuf },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliOptions {
    pub(crate) root: Option<PathBuf>,
    pub(crate) mode: Mode,
}

pub(crate) fn parse_args<I>(args: I) -> Result<CliOptions, String>
where
    I: IntoIterator<Item = String>,
{
    let args = args.into_iter().collect::<Vec<_>>();
    let mut options = CliOptions {
        root: None,
        mode: Mode::Window,
    };

    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => {
                options.mode = Mode::Help;
                return Ok(options);
            }
            "--root" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --root".to_string())?;
                options.root = Some(PathBuf::from(value));
                index += 2;
            }
            "--script" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --script".to_string())?;
                options.mode = Mode::Script {
                    path: PathBuf::from(value),
                };
                index += 2;
            }
            other => return Err(format!("unknown argument '{other}'\n\n{}", usage_text())),
        }
    }

    Ok(options)
}

pub(crate) fn usage_text() -> String {
    [
        "Usage:",
        "  card_app [--root <dir>]",
        "  card_app [--root <dir>] --script <file.json>",
        "",
        "Options:",
        "  --root <dir>       project root holding assets/",
        "                     (default: GREETCARD_ROOT or auto-detect)",
        "  --script <file>    replay a JSON event script headlessly and print the stage timeline",
        "  -h, --help         print this message",
    ]
    .join("\n")
}
