use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Why an external command produced no usable output.
#[derive(Debug)]
pub enum ToolFailure {
    /// The binary could not be found.
    Missing,
    /// The command ran and exited non-zero.
    Exited { status: String, stderr: String },
    /// Spawning failed for another reason (permissions, bad cwd, ...).
    Spawn(io::Error),
}

impl ToolFailure {
    pub fn status(&self) -> String {
        match self {
            ToolFailure::Missing => "not found".to_string(),
            ToolFailure::Exited { status, .. } => status.clone(),
            ToolFailure::Spawn(_) => "spawn failed".to_string(),
        }
    }

    pub fn stderr(&self) -> String {
        match self {
            ToolFailure::Missing => "binary not found in PATH".to_string(),
            ToolFailure::Exited { stderr, .. } => stderr.clone(),
            ToolFailure::Spawn(err) => err.to_string(),
        }
    }
}

/// Run `program args...` in `cwd` and return its stdout.
pub fn run<S: AsRef<OsStr>>(program: &OsStr, args: &[S], cwd: &Path) -> Result<String, ToolFailure> {
    debug!(
        program = %program.to_string_lossy(),
        args = %command_line_args(args),
        cwd = %cwd.display(),
        "running external tool"
    );

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ToolFailure::Missing
            } else {
                ToolFailure::Spawn(e)
            }
        })?;

    if !output.status.success() {
        let status = match output.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!(%status, %stderr, "external tool failed");
        return Err(ToolFailure::Exited { status, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Render a command line for error messages.
pub fn command_line<S: AsRef<OsStr>>(program: &OsStr, args: &[S]) -> String {
    let rest = command_line_args(args);
    if rest.is_empty() {
        program.to_string_lossy().into_owned()
    } else {
        format!("{} {}", program.to_string_lossy(), rest)
    }
}

fn command_line_args<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| {
            let a = a.as_ref().to_string_lossy();
            if a.contains(char::is_whitespace) {
                format!("'{a}'")
            } else {
                a.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
