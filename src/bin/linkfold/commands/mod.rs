//! Command implementations

pub mod check;
pub mod explain;
pub mod plan;

use std::path::Path;

use anyhow::{bail, Result};

use linkfold::ops::GraphFile;
use linkfold::util::config::{global_config_path, load_config, project_config_path};
use linkfold::util::diagnostic::suggestions;
use linkfold::util::{Config, Shell, Status};

/// Global config merged with the current directory's project config.
pub fn load_settings() -> Result<Config> {
    let cwd = std::env::current_dir()?;
    Ok(load_config(
        global_config_path().as_deref(),
        &project_config_path(&cwd),
    ))
}

pub fn load_graph(path: &Path, shell: &Shell) -> Result<GraphFile> {
    if !path.exists() {
        bail!(
            "graph file not found: {}\n\
             help: {}",
            path.display(),
            suggestions::NO_GRAPH_FILE
        );
    }

    shell.status(Status::Loading, path.display());
    GraphFile::load(path)
}
