/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Headless driver: load a graph file, run a built-in algorithm to
//! completion, print the visible run log and the outcome.

use bpaf::Bpaf;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use graphtrace::runtime::{RunState, history};
use graphtrace::script::vars::ScriptVars;
use graphtrace::settings::Settings;
use graphtrace::{ExecutionController, Graph, algo, persistence};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
struct Options {
    /// Built-in algorithm to run: bfs, dfs, path, info
    #[bpaf(short('a'), long, argument("NAME"), fallback(String::from("bfs")))]
    algorithm: String,

    /// Run speed 1-10; 10 disables the per-step delay (default: settings)
    #[bpaf(short('s'), long, argument("N"))]
    speed: Option<u8>,

    /// Log classification symbols to display (default: settings)
    #[bpaf(long, argument("SYMBOLS"))]
    log_symbols: Option<String>,

    /// Properties file for the algorithm (default: `<algorithm>.json`
    /// next to the graph file, when present)
    #[bpaf(long, argument("FILE"))]
    vars: Option<PathBuf>,

    /// Settings file (default: built-in defaults)
    #[bpaf(long, argument("FILE"))]
    settings: Option<PathBuf>,

    /// Append a history record to this file after the run
    #[bpaf(long, argument("FILE"))]
    history: Option<PathBuf>,

    /// Graph JSON file
    #[bpaf(positional("GRAPH"))]
    graph: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let options = options().run();
    match drive(options) {
        Ok(solved) => {
            if solved {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn drive(options: Options) -> Result<bool, Box<dyn Error>> {
    let settings = match &options.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let symbols = options
        .log_symbols
        .unwrap_or_else(|| settings.log_symbols.clone());

    let mut graph = Graph::new();
    persistence::load_into(&mut graph, &options.graph)?;

    let graph_name = options
        .graph
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut controller = ExecutionController::new(graph);
    controller.set_graph_name(graph_name);
    let history_path = options.history.or_else(|| {
        settings
            .execution_history
            .then(|| PathBuf::from(history::HISTORY_FILE))
    });
    controller.set_history_path(history_path);

    controller
        .host()
        .set_speed(options.speed.unwrap_or(settings.speed));
    controller.host().set_animation(settings.animation);

    let vars_path = options.vars.unwrap_or_else(|| {
        options
            .graph
            .with_file_name(format!("{}.rs", options.algorithm))
    });
    controller.host().set_vars(ScriptVars::load_for(&vars_path)?);

    let script = algo::by_name(&options.algorithm)
        .ok_or_else(|| format!("unknown algorithm '{}'", options.algorithm))?;
    controller.run(script)?;
    let report = controller
        .wait()
        .ok_or("run finished without a report")?;

    controller.host().with_log(|log| {
        for line in log.visible(&symbols) {
            println!("{line}");
        }
    });
    println!(
        "{:?} in {:.4}s (solved: {})",
        report.outcome, report.elapsed, report.solved
    );
    Ok(report.outcome == RunState::Completed && report.solved)
}
