//! Shell scripts behind each engine operation and parsers for their output

use crate::error::{EngineError, Result};
use crate::transport::shell_escape;
use serde::{Deserialize, Serialize};

/// Desired state for the file operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Create the file if missing, update its mtime otherwise
    Touch,
    /// Remove the path
    Absent,
    /// Ensure a directory exists
    Directory,
}

/// Desired state for the package operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageState {
    Present,
    Absent,
}

/// Result of `stat` on one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub exists: bool,
    pub size: u64,
    pub mode: String,
    pub owner: String,
    pub kind: String,
}

impl FileStat {
    fn missing() -> Self {
        Self {
            exists: false,
            size: 0,
            mode: String::new(),
            owner: String::new(),
            kind: String::new(),
        }
    }
}

/// Facts gathered from one host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facts {
    pub hostname: String,
    pub system: String,
    pub kernel: String,
    pub architecture: String,
    pub processor_count: u32,
    pub memtotal_mb: u64,
    pub os_id: Option<String>,
    pub os_name: Option<String>,
}

const STAT_MISSING: &str = "__missing__";

pub(crate) const PING_SCRIPT: &str = "echo pong";

pub(crate) const REACHABILITY_SCRIPT: &str = "true";

pub(crate) const FACTS_SCRIPT: &str = "hostname; uname -s -r -m; nproc; \
     awk '/^MemTotal:/ {print $2}' /proc/meminfo; cat /etc/os-release 2>/dev/null || true";

pub(crate) fn file_script(path: &str, state: FileState) -> Result<String> {
    let path = checked_path(path)?;
    Ok(match state {
        FileState::Touch => format!("touch {}", path),
        FileState::Absent => format!("rm -rf {}", path),
        FileState::Directory => format!("mkdir -p {}", path),
    })
}

pub(crate) fn stat_script(path: &str) -> Result<String> {
    let path = checked_path(path)?;
    Ok(format!(
        "if [ -e {p} ]; then stat -c '%s %a %U %F' {p}; else echo {m}; fi",
        p = path,
        m = STAT_MISSING
    ))
}

/// Script that writes stdin to `dest` and applies `mode`
pub(crate) fn copy_script(dest: &str, mode: &str) -> Result<String> {
    let dest = checked_path(dest)?;
    if !is_octal_mode(mode) {
        return Err(EngineError::InvalidArgument(format!(
            "mode must be an octal string like 0644, got '{}'",
            mode
        )));
    }
    Ok(format!(
        "cat > {d}.fleetscale-tmp && chmod {m} {d}.fleetscale-tmp && mv -f {d}.fleetscale-tmp {d}",
        d = dest,
        m = mode
    ))
}

pub(crate) fn package_script(name: &str, state: PackageState) -> Result<String> {
    if name.is_empty() || name.starts_with('-') {
        return Err(EngineError::InvalidArgument(format!(
            "invalid package name '{}'",
            name
        )));
    }
    let name = shell_escape(name);
    Ok(match state {
        PackageState::Present => format!(
            "rpm -q {n} >/dev/null 2>&1 || dnf install -y {n}",
            n = name
        ),
        PackageState::Absent => format!(
            "! rpm -q {n} >/dev/null 2>&1 || dnf remove -y {n}",
            n = name
        ),
    })
}

fn checked_path(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(EngineError::InvalidArgument(format!(
            "path must be absolute, got '{}'",
            path
        )));
    }
    Ok(shell_escape(path))
}

fn is_octal_mode(mode: &str) -> bool {
    (3..=4).contains(&mode.len()) && mode.chars().all(|c| ('0'..='7').contains(&c))
}

pub(crate) fn parse_stat(host: &str, stdout: &str) -> Result<FileStat> {
    let line = stdout.trim();
    if line == STAT_MISSING {
        return Ok(FileStat::missing());
    }

    let parse_error = || EngineError::Parse {
        host: host.to_string(),
        message: format!("unexpected stat output '{}'", line),
    };

    let mut parts = line.splitn(4, ' ');
    let size = parts
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(parse_error)?;
    let mode = parts.next().ok_or_else(parse_error)?;
    let owner = parts.next().ok_or_else(parse_error)?;
    let kind = parts.next().ok_or_else(parse_error)?;

    Ok(FileStat {
        exists: true,
        size,
        mode: format!("{:0>4}", mode),
        owner: owner.to_string(),
        kind: kind.to_string(),
    })
}

pub(crate) fn parse_facts(host: &str, stdout: &str) -> Result<Facts> {
    let parse_error = |what: &str| EngineError::Parse {
        host: host.to_string(),
        message: format!("missing {} in facts output", what),
    };

    let mut lines = stdout.lines();
    let hostname = lines.next().ok_or_else(|| parse_error("hostname"))?;
    let uname = lines.next().ok_or_else(|| parse_error("uname"))?;
    let mut uname_parts = uname.split_whitespace();
    let system = uname_parts.next().ok_or_else(|| parse_error("system"))?;
    let kernel = uname_parts.next().ok_or_else(|| parse_error("kernel"))?;
    let architecture = uname_parts
        .next()
        .ok_or_else(|| parse_error("architecture"))?;

    let processor_count = lines
        .next()
        .and_then(|l| l.trim().parse::<u32>().ok())
        .ok_or_else(|| parse_error("processor count"))?;
    let memtotal_kb = lines
        .next()
        .and_then(|l| l.trim().parse::<u64>().ok())
        .ok_or_else(|| parse_error("memory total"))?;

    let mut facts = Facts {
        hostname: hostname.trim().to_string(),
        system: system.to_string(),
        kernel: kernel.to_string(),
        architecture: architecture.to_string(),
        processor_count,
        memtotal_mb: memtotal_kb / 1024,
        os_id: None,
        os_name: None,
    };

    for line in lines {
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').to_string();
            match key.trim() {
                "ID" => facts.os_id = Some(value),
                "PRETTY_NAME" => facts.os_name = Some(value),
                _ => {}
            }
        }
    }

    Ok(facts)
}
