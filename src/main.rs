use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use log::{LevelFilter, debug, info};

use mxforge::provider::DEFAULT_MODEL;
use mxforge::{
    Config, DiagramKind, Direction, FileProvider, GenerationRequest, Generator, LlmProvider,
    StyleOverrides,
};

/// Generate a native draw.io diagram from a prompt
#[derive(Parser, Debug)]
#[command(name = "mxforge")]
#[command(version)]
#[command(
    about = "Generate native draw.io diagrams from a prompt, styled with a harvested style library",
    long_about = None
)]
struct Args {
    /// What the diagram should show
    #[arg(value_name = "PROMPT")]
    prompt: String,

    /// Output file prefix (without extension)
    #[arg(long, value_name = "PREFIX", default_value = "diagram")]
    out: PathBuf,

    /// Model id, e.g. gpt-4o-mini or ollama:llama3.1
    #[arg(long, value_name = "ID")]
    model: Option<String>,

    /// Diagram kind; `auto` detects it from the prompt
    #[arg(long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,

    /// Layout direction; chosen automatically when omitted
    #[arg(long, value_enum, ignore_case = true)]
    direction: Option<Direction>,

    /// Do not append a hash to the output file name
    #[arg(long)]
    no_hash: bool,

    /// Style library produced by mxforge-harvest
    #[arg(long, value_name = "PATH")]
    styles: Option<PathBuf>,

    /// Read the diagram description from a JSON file instead of a model
    #[arg(long, value_name = "PATH")]
    spec_file: Option<PathBuf>,

    /// Settings file (TOML) with model, styles and override defaults
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// ER entity style (library key or literal style)
    #[arg(long, value_name = "STYLE")]
    style_er_entity: Option<String>,

    /// ER relationship edge style
    #[arg(long, value_name = "STYLE")]
    style_er_edge: Option<String>,

    /// UML class vertex style
    #[arg(long, value_name = "STYLE")]
    style_class: Option<String>,

    /// Class diagram edge style
    #[arg(long, value_name = "STYLE")]
    style_class_edge: Option<String>,

    /// Use case actor style
    #[arg(long, value_name = "STYLE")]
    style_actor: Option<String>,

    /// Use case ellipse style
    #[arg(long, value_name = "STYLE")]
    style_usecase: Option<String>,

    /// Vertex style for the remaining kinds
    #[arg(long, value_name = "STYLE")]
    style_vertex: Option<String>,

    /// Edge style for the remaining kinds
    #[arg(long, value_name = "STYLE")]
    style_edge: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Auto,
    Er,
    Class,
    Sequence,
    State,
    Activity,
    #[value(name = "usecase")]
    UseCase,
    Generic,
}

impl Mode {
    fn kind(self) -> Option<DiagramKind> {
        match self {
            Mode::Auto => None,
            Mode::Er => Some(DiagramKind::Er),
            Mode::Class => Some(DiagramKind::Class),
            Mode::Sequence => Some(DiagramKind::Sequence),
            Mode::State => Some(DiagramKind::State),
            Mode::Activity => Some(DiagramKind::Activity),
            Mode::UseCase => Some(DiagramKind::UseCase),
            Mode::Generic => Some(DiagramKind::Generic),
        }
    }
}

impl Args {
    fn overrides(&self) -> StyleOverrides {
        StyleOverrides {
            er_entity: self.style_er_entity.clone(),
            er_edge: self.style_er_edge.clone(),
            class: self.style_class.clone(),
            class_edge: self.style_class_edge.clone(),
            actor: self.style_actor.clone(),
            usecase: self.style_usecase.clone(),
            vertex: self.style_vertex.clone(),
            edge: self.style_edge.clone(),
        }
    }
}

fn run(args: &Args) -> mxforge::Result<PathBuf> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let request = GenerationRequest {
        prompt: args.prompt.clone(),
        kind: args.mode.kind(),
        direction: args.direction,
        out: args.out.clone(),
        add_hash: !args.no_hash,
        styles: args.styles.clone().or(config.styles),
        overrides: args.overrides().or(config.overrides),
    };
    debug!(request:?; "Generation request");

    match &args.spec_file {
        Some(path) => Generator::new(FileProvider::new(path)).run(&request),
        None => {
            let model = args
                .model
                .clone()
                .or(config.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string());
            Generator::new(LlmProvider::new(&model)).run(&request)
        }
    }
}

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting mxforge");
    debug!(args:?; "Parsed arguments");

    match run(&args) {
        Ok(path) => {
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            println!("{}", serde_json::json!({ "drawio": name }));
        }
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_failure_surfaces_as_error_with_logging_off() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let argv: Vec<OsString> = vec![
            "mxforge".into(),
            "ERD for users".into(),
            "--log-level".into(),
            "off".into(),
            "--spec-file".into(),
            missing.as_path().into(),
        ];
        let args = Args::try_parse_from(argv).unwrap();

        let err = run(&args).unwrap_err();
        assert!(matches!(err, mxforge::Error::Input(_)), "got {err:?}");
        assert!(err.to_string().contains("missing.json"), "{err}");
    }

    #[test]
    fn test_mode_names() {
        let args = Args::try_parse_from(["mxforge", "x", "--mode", "usecase"]).unwrap();
        assert_eq!(args.mode.kind(), Some(DiagramKind::UseCase));
        let args = Args::try_parse_from(["mxforge", "x"]).unwrap();
        assert_eq!(args.mode.kind(), None);
    }
}
