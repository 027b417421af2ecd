// src/config/validate.rs

use std::path::Path;

use anyhow::{anyhow, Result};

use crate::config::model::ConfigFile;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `timeout >= 1`
/// - project names are non-empty relative path segments
/// - the kernel command is non-empty
///
/// It does **not** check that the project directories exist; that is a
/// per-project concern at sweep time.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_projects(cfg)?;
    validate_kernel(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &ConfigFile) -> Result<()> {
    if cfg.config.timeout == 0 {
        return Err(anyhow!("[config].timeout must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_projects(cfg: &ConfigFile) -> Result<()> {
    let Some(ref projects) = cfg.projects else {
        return Ok(());
    };

    if projects.is_empty() {
        return Err(anyhow!("`projects` must not be an empty list"));
    }

    for name in projects {
        if name.trim().is_empty() {
            return Err(anyhow!("`projects` entries must be non-empty names"));
        }
        let path = Path::new(name);
        if path.is_absolute() {
            return Err(anyhow!(
                "project '{}' must be a relative subfolder, not an absolute path",
                name
            ));
        }
        if path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(anyhow!(
                "project '{}' must not contain `..` components",
                name
            ));
        }
    }

    Ok(())
}

fn validate_kernel(cfg: &ConfigFile) -> Result<()> {
    if cfg.kernel.command.trim().is_empty() {
        return Err(anyhow!("[kernel].command must be a non-empty command"));
    }
    Ok(())
}
