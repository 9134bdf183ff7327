//! Remote environment emission.
//!
//! The environment captured from the remote container can be written to
//! files for consumption by other tooling, in one of a few syntaxes.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Injected into the merged environment: the local directory under which
/// the remote volumes are mounted.
pub const ENV_ROOT: &str = "TELEPRESENCE_ROOT";

/// Read back from the server-provided environment: overrides the handler's
/// container name for subsequent operations.
pub const ENV_CONTAINER: &str = "TELEPRESENCE_CONTAINER";

/// Syntax used when emitting the environment to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    /// `KEY=value` lines, values quoted when needed.
    #[default]
    Dotenv,
    /// `export KEY='value'` lines for sourcing into a POSIX shell.
    Shell,
    /// A single JSON object.
    Json,
}

impl Syntax {
    /// Render the environment in this syntax. Keys are emitted sorted.
    pub fn render(&self, env: &HashMap<String, String>) -> Result<String> {
        let sorted: BTreeMap<&str, &str> =
            env.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        match self {
            Syntax::Dotenv => {
                let mut out = String::new();
                for (k, v) in &sorted {
                    out.push_str(k);
                    out.push('=');
                    out.push_str(&dotenv_quote(v));
                    out.push('\n');
                }
                Ok(out)
            }
            Syntax::Shell => {
                let mut out = String::new();
                for (k, v) in &sorted {
                    out.push_str("export ");
                    out.push_str(k);
                    out.push('=');
                    out.push_str(&shell_quote(v));
                    out.push('\n');
                }
                Ok(out)
            }
            Syntax::Json => {
                let mut out = serde_json::to_string_pretty(&sorted)
                    .map_err(|e| Error::user(format!("environment is not serializable: {e}")))?;
                out.push('\n');
                Ok(out)
            }
        }
    }

    /// Write the environment to `path` in this syntax.
    pub fn write_file(&self, path: &Path, env: &HashMap<String, String>) -> Result<()> {
        let rendered = self.render(env)?;
        std::fs::write(path, rendered).map_err(|e| Error::EnvWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Syntax::Dotenv => "dotenv",
            Syntax::Shell => "shell",
            Syntax::Json => "json",
        })
    }
}

impl FromStr for Syntax {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dotenv" => Ok(Syntax::Dotenv),
            "shell" => Ok(Syntax::Shell),
            "json" => Ok(Syntax::Json),
            other => Err(Error::user(format!(
                "invalid env syntax {other}: must be one of dotenv, shell, json"
            ))),
        }
    }
}

fn dotenv_quote(v: &str) -> String {
    if !v.is_empty()
        && !v.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == '\\')
    {
        return v.to_string();
    }
    let mut quoted = String::with_capacity(v.len() + 2);
    quoted.push('"');
    for c in v.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn shell_quote(v: &str) -> String {
    let mut quoted = String::with_capacity(v.len() + 2);
    quoted.push('\'');
    quoted.push_str(&v.replace('\'', "'\\''"));
    quoted.push('\'');
    quoted
}

/// Env emission targets picked up from the command line.
#[derive(Debug, Clone, Default)]
pub struct EnvFlags {
    /// `--env-file`: emit the environment here, in [`EnvFlags::syntax`].
    pub file: Option<PathBuf>,
    /// `--env-syntax`: syntax for [`EnvFlags::file`].
    pub syntax: Syntax,
    /// `--env-json`: emit the environment here as JSON, regardless of
    /// syntax.
    pub json_file: Option<PathBuf>,
}

impl EnvFlags {
    /// Write the environment to whichever targets are set.
    pub fn perhaps_write(&self, env: &HashMap<String, String>) -> Result<()> {
        if let Some(file) = &self.file {
            self.syntax.write_file(file, env)?;
        }
        if let Some(file) = &self.json_file {
            Syntax::Json.write_file(file, env)?;
        }
        Ok(())
    }
}
