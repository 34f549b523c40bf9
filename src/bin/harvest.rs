use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use mxforge::discover::{collect_files, expand_inputs};
use mxforge::{Error, StyleHarvester, StyleLibrary};

const SUMMARY_ENTRIES: usize = 20;
const SUMMARY_VALUE_CHARS: usize = 120;

/// Harvest draw.io styles into a reusable style library
#[derive(Parser, Debug)]
#[command(name = "mxforge-harvest")]
#[command(version)]
#[command(
    about = "Collect every style used in draw.io documents and shape libraries into styles.json",
    long_about = None
)]
struct Args {
    /// Files or directories to scan (.drawio / .xml)
    #[arg(value_name = "INPUTS")]
    inputs: Vec<PathBuf>,

    /// Only scan files whose path inside a directory input matches this glob
    #[arg(long, value_name = "PATTERN")]
    glob: Option<String>,

    /// Where to write the style library
    #[arg(long, value_name = "PATH", default_value = "styles.json")]
    styles_out: PathBuf,

    /// Write the library even when no style was found
    #[arg(long)]
    force_write: bool,

    /// Shorthand for --log-level debug
    #[arg(long)]
    debug: bool,

    /// Print the first entries of the library after writing it
    #[arg(long)]
    print_summary: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn run(args: &Args) -> mxforge::Result<StyleLibrary> {
    if args.inputs.is_empty() {
        return Err(Error::Input("pass at least one file or directory".to_string()));
    }

    let paths = expand_inputs(&args.inputs);
    let files = collect_files(&paths, args.glob.as_deref())?;
    if files.is_empty() {
        return Err(Error::Input(
            "no .drawio/.xml files found under the given paths".to_string(),
        ));
    }
    info!(files = files.len(); "Scanning files");

    let mut harvester = StyleHarvester::default();
    harvester.harvest_files(&files);
    let report = harvester.finish();
    info!(
        files = report.files,
        cells = report.cells,
        files_with_styles = report.files_with_styles,
        failed_files = report.failed_files,
        styles = report.library.len();
        "Harvest finished"
    );

    if report.library.is_empty() && !args.force_write {
        warn!("Point the harvester at real draw.io 'shapes' directories (look under */shapes of an unpacked app bundle)");
        warn!("Or pass a .drawio file that uses many native shapes, or use --force-write to write an empty library");
        return Err(Error::Input("no style was extracted".to_string()));
    }

    report.library.save(&args.styles_out)?;
    Ok(report.library)
}

fn print_summary(library: &StyleLibrary) {
    eprintln!("Extracted styles: {}", library.len());
    for (key, style) in library.iter().take(SUMMARY_ENTRIES) {
        let snippet = match style.char_indices().nth(SUMMARY_VALUE_CHARS) {
            Some((idx, _)) => format!("{}...", &style[..idx]),
            None => style.to_string(),
        };
        eprintln!("- {key}: {snippet}");
    }
}

fn main() {
    let args = Args::parse();

    let log_level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
            eprintln!(
                "Invalid log level: {}. Using 'warn' instead.",
                args.log_level
            );
            LevelFilter::Warn
        })
    };

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    debug!(args:?; "Parsed arguments");

    match run(&args) {
        Ok(library) => {
            if args.print_summary {
                print_summary(&library);
            }
            println!(
                "{}",
                serde_json::json!({
                    "styles_json": args.styles_out.display().to_string(),
                    "styles_count": library.len(),
                })
            );
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
    fn test_failures_surface_as_input_errors() {
        let args = Args::try_parse_from(["mxforge-harvest", "--log-level", "off"]).unwrap();
        assert!(matches!(run(&args), Err(Error::Input(_))));

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "nothing").unwrap();
        let argv: Vec<OsString> = vec!["mxforge-harvest".into(), dir.path().into()];
        let args = Args::try_parse_from(argv).unwrap();
        assert!(matches!(run(&args), Err(Error::Input(_))));
    }

    #[test]
    fn test_empty_library_needs_force_write() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blank.drawio"), "<mxfile/>").unwrap();
        let out = dir.path().join("styles.json");

        let mut argv: Vec<OsString> = vec![
            "mxforge-harvest".into(),
            dir.path().into(),
            "--styles-out".into(),
            out.as_path().into(),
        ];
        let args = Args::try_parse_from(argv.clone()).unwrap();
        assert!(matches!(run(&args), Err(Error::Input(_))));
        assert!(!out.exists());

        argv.push("--force-write".into());
        let args = Args::try_parse_from(argv).unwrap();
        assert!(run(&args).unwrap().is_empty());
        assert!(out.exists());
    }
}
