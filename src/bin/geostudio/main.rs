//! GeoStudio CLI - Tool for inspecting and rewriting GeoStudio project documents.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use geostudio::prelude::*;
use geostudio::xml;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "warn";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        // Info command - analysis summary
        "info" | "i" => match filtered_args.get(1) {
            Some(path) => cmd_info(path),
            None => usage("info <file.xml>"),
        },

        // Tree command - analysis hierarchy
        "tree" | "t" => match filtered_args.get(1) {
            Some(path) => cmd_tree(path),
            None => usage("tree <file.xml>"),
        },

        // Steps command - timestep table of one analysis
        "steps" | "s" => match filtered_args.get(1) {
            Some(path) => cmd_steps(path, filtered_args.get(2).copied()),
            None => usage("steps <file.xml> [analysis_id]"),
        },

        // Roundtrip command - read every analysis and write the document back
        "roundtrip" | "r" => match (filtered_args.get(1), filtered_args.get(2)) {
            (Some(input), Some(output)) => cmd_roundtrip(input, output),
            _ => usage("roundtrip <input.xml> <output.xml>"),
        },

        "version" => {
            cmd_version();
            Ok(())
        }

        // Help
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        // Default: if file exists, show info; otherwise error
        _ => {
            if Path::new(filtered_args[0]).exists() {
                cmd_info(filtered_args[0])
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn usage(text: &str) -> anyhow::Result<()> {
    bail!("missing arguments\nUsage: geostudio {}", text)
}

fn print_help() {
    println!("geostudio - GeoStudio project toolkit");
    println!();
    println!("USAGE:");
    println!("    geostudio [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info      <file>              Show analyses with kind, parent and schedule size");
    println!("    t, tree      <file>              Show analysis hierarchy");
    println!("    s, steps     <file> [id]         Show the timestep table of an analysis");
    println!("    r, roundtrip <in> <out>          Read every analysis and write the document back");
    println!("    version                          Show build information");
    println!("    h, help                          Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("NOTES:");
    println!("    - Passing a file directly is equivalent to 'info'");
    println!("    - RUST_LOG overrides the verbosity flags");
    println!("    - 'steps' without an id uses default_analysis from the settings file");
}

fn open(path: &str) -> anyhow::Result<(Element, Vec<Analysis>)> {
    info!(path, "opening document");
    let root = xml::read_file(path).with_context(|| format!("failed to open {}", path))?;
    let analyses = read_analyses(&root).with_context(|| format!("failed to read analyses of {}", path))?;

    let mut settings = Settings::load();
    settings.add_recent(PathBuf::from(path));
    if let Err(e) = settings.save() {
        debug!(error = %e, "settings not saved");
    }
    Ok((root, analyses))
}

fn cmd_info(path: &str) -> anyhow::Result<()> {
    let (root, analyses) = open(path)?;

    println!("Document: {}", path);
    println!("Root: <{}>", root.tag);
    println!("Analyses: {}", analyses.len());
    println!();

    for analysis in &analyses {
        let kind = analysis
            .kind()
            .map(|k| k.to_string())
            .unwrap_or_else(|_| "?".to_string());
        let parent = match analysis.parent_id()? {
            Some(id) => id.to_string(),
            None => "-".to_string(),
        };
        let steps = analysis
            .time_increments()
            .map(|ti| ti.schedule().len())
            .unwrap_or(0);
        println!("  {}  kind: {}  parent: {}  steps: {}", analysis, kind, parent, steps);

        if let Some(ti) = analysis.time_increments() {
            if let Some((declared, actual)) = ti.count_mismatch()? {
                println!("    ! IncrementCount is {} but {} timesteps are listed", declared, actual);
            }
        }
    }
    Ok(())
}

fn cmd_tree(path: &str) -> anyhow::Result<()> {
    let (_, analyses) = open(path)?;
    let tree = AnalysisTree::build(&analyses)?;

    println!("Document: {}", path);
    println!();
    print!("{}", tree.render());
    Ok(())
}

fn cmd_steps(path: &str, id: Option<&str>) -> anyhow::Result<()> {
    let (_, analyses) = open(path)?;

    let id = match id {
        Some(text) => text
            .parse::<i64>()
            .with_context(|| format!("invalid analysis id '{}'", text))?,
        None => match Settings::load().default_analysis {
            Some(id) => id,
            None => match analyses.first() {
                Some(first) => first.id()?,
                None => bail!("{} has no analyses", path),
            },
        },
    };
    let analysis = find_analysis(&analyses, id)?;

    println!("{}", analysis);
    let Some(ti) = analysis.time_increments() else {
        println!("  no time increments");
        return Ok(());
    };
    println!("  Start: {}", ti.start()?);
    if let Some(duration) = ti.duration()? {
        println!("  Duration: {}", duration);
    }
    println!();
    println!("  {:>5}  {:>14}  {:>14}  Saved", "#", "Step", "Time");
    for row in ti.time_step_rows()? {
        println!("  {:>5}  {:>14}  {:>14}  {}", row.index, row.step, row.time, row.saved);
    }
    Ok(())
}

fn cmd_roundtrip(input: &str, output: &str) -> anyhow::Result<()> {
    let (mut root, analyses) = open(input)?;
    write_analyses(&mut root, &analyses)?;

    let options = Settings::load().write_options();
    xml::write_file(output, &root, &options).with_context(|| format!("failed to write {}", output))?;
    info!(output, analyses = analyses.len(), "document written");
    println!("Wrote {} analyses to {}", analyses.len(), output);
    Ok(())
}

fn cmd_version() {
    println!("geostudio {}", env!("CARGO_PKG_VERSION"));
    println!(
        "built {} {}",
        env!("GEOSTUDIO_BUILD_DATE"),
        env!("GEOSTUDIO_BUILD_TIME")
    );
}
