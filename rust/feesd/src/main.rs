mod calc;
mod db;
mod filter;
mod ids;
mod ipc;
mod model;
mod render;
mod store;
mod submit;

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "feesd", version, about = "Student fee tracker sidecar")]
struct Cli {
    /// Workspace directory to open at startup
    #[arg(short = 'w', long = "workspace")]
    workspace: Option<PathBuf>,
}

fn main() {
    // stdout carries the protocol; logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut state = ipc::AppState::new();
    if let Some(path) = cli.workspace.as_deref() {
        if let Err(e) = ipc::open_workspace(&mut state, path) {
            log::error!("could not open workspace {}: {:#}", path.to_string_lossy(), e);
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                log::error!("stdin read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                log::warn!("unparseable request line: {}", e);
                ipc::bad_json(e.to_string())
            }
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
