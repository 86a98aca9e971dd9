//! Licensed backend: the Gurobi command-line solver.
//!
//! The model is written in CPLEX LP format to a temporary directory and
//! solved by `gurobi_cl` with a JSON result file. No Gurobi library is
//! linked; the backend only needs the executable and a license file.
//!
//! # License lookup
//! 1. The configured license file (no fallback when set).
//! 2. `GRB_LICENSE_FILE`.
//! 3. `~/gurobi.lic`, then `/opt/gurobi/gurobi.lic`.
//!
//! # Executable lookup
//! `$GUROBI_HOME/bin/gurobi_cl`, then every directory on `PATH`.

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use super::backend::{BackendOutcome, RawSolution, SolverBackend};
use crate::compiler::CompiledModel;
use crate::error::{Result, SchedulingError};

const BACKEND_NAME: &str = "gurobi";
const EXECUTABLE: &str = "gurobi_cl";

/// Gurobi status codes (`GRB.Status`).
mod status {
    pub const OPTIMAL: i32 = 2;
    pub const INFEASIBLE: i32 = 3;
    pub const INF_OR_UNBD: i32 = 4;
    pub const UNBOUNDED: i32 = 5;
}

/// Runs `gurobi_cl` on an LP file.
#[derive(Debug, Clone, Default)]
pub struct GurobiBackend {
    license_file: Option<PathBuf>,
    executable: Option<PathBuf>,
}

impl GurobiBackend {
    /// Creates a backend that searches the default license locations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an explicit license file.
    pub fn with_license_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.license_file = Some(path.into());
        self
    }

    /// Uses an explicit `gurobi_cl` executable.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Resolves the license file to use.
    pub fn find_license(&self) -> Option<PathBuf> {
        if let Some(path) = &self.license_file {
            return path.is_file().then(|| path.clone());
        }
        let mut candidates = Vec::new();
        if let Some(path) = env::var_os("GRB_LICENSE_FILE") {
            candidates.push(PathBuf::from(path));
        }
        if let Some(home) = env::var_os("HOME") {
            candidates.push(Path::new(&home).join("gurobi.lic"));
        }
        candidates.push(PathBuf::from("/opt/gurobi/gurobi.lic"));
        candidates.into_iter().find(|p| p.is_file())
    }

    /// Resolves the `gurobi_cl` executable.
    pub fn find_executable(&self) -> Option<PathBuf> {
        if let Some(path) = &self.executable {
            return path.is_file().then(|| path.clone());
        }
        let file_name = format!("{EXECUTABLE}{}", env::consts::EXE_SUFFIX);
        let mut candidates = Vec::new();
        if let Some(home) = env::var_os("GUROBI_HOME") {
            candidates.push(Path::new(&home).join("bin").join(&file_name));
        }
        if let Some(paths) = env::var_os("PATH") {
            candidates.extend(env::split_paths(&paths).map(|dir| dir.join(&file_name)));
        }
        candidates.into_iter().find(|p| p.is_file())
    }

    fn unavailable(reason: impl Into<String>) -> SchedulingError {
        SchedulingError::LicenseUnavailable {
            backend: BACKEND_NAME,
            reason: reason.into(),
        }
    }

    fn resolve(&self) -> Result<(PathBuf, PathBuf)> {
        let license = self.find_license().ok_or_else(|| match &self.license_file {
            Some(path) => Self::unavailable(format!("license file {} not found", path.display())),
            None => Self::unavailable(
                "no license file (set GRB_LICENSE_FILE or place gurobi.lic in the home directory)",
            ),
        })?;
        let executable = self
            .find_executable()
            .ok_or_else(|| Self::unavailable(format!("{EXECUTABLE} not found on PATH or GUROBI_HOME")))?;
        Ok((license, executable))
    }
}

impl SolverBackend for GurobiBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn check_available(&self) -> Result<()> {
        self.resolve().map(|_| ())
    }

    fn solve(&self, model: &CompiledModel, time_limit: Duration) -> Result<BackendOutcome> {
        let (license, executable) = self.resolve()?;
        let dir = tempfile::tempdir().map_err(io_failure)?;
        let lp_path = dir.path().join("roster.lp");
        let result_path = dir.path().join("solution.json");

        let mut writer = BufWriter::new(File::create(&lp_path).map_err(io_failure)?);
        write_lp(model, &mut writer).map_err(io_failure)?;
        writer.flush().map_err(io_failure)?;
        drop(writer);

        info!(
            "running {} with a {:.1}s limit",
            executable.display(),
            time_limit.as_secs_f64()
        );
        let output = Command::new(&executable)
            .arg(format!("TimeLimit={}", time_limit.as_secs_f64()))
            .arg(format!("ResultFile={}", result_path.display()))
            .arg(&lp_path)
            .env("GRB_LICENSE_FILE", &license)
            .output()
            .map_err(|e| SchedulingError::Backend(format!("cannot run {EXECUTABLE}: {e}")))?;

        if result_path.is_file() {
            let text = fs::read_to_string(&result_path).map_err(io_failure)?;
            return parse_result(&text, model);
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
        debug!("{EXECUTABLE} wrote no result file; exit status {}", output.status);
        if stdout.contains("infeasible") {
            Ok(BackendOutcome::Infeasible)
        } else if stdout.contains("time limit") {
            Ok(BackendOutcome::NoSolution)
        } else if stdout.contains("license") {
            Err(Self::unavailable(first_line_containing(&stdout, "license")))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SchedulingError::Backend(format!(
                "{EXECUTABLE} exited with {} and no result: {}",
                output.status,
                stderr.trim()
            )))
        }
    }
}

fn io_failure(error: io::Error) -> SchedulingError {
    SchedulingError::Backend(format!("gurobi model I/O: {error}"))
}

fn first_line_containing(text: &str, needle: &str) -> String {
    text.lines()
        .find(|line| line.contains(needle))
        .unwrap_or(needle)
        .trim()
        .to_string()
}

/// Writes `model` in CPLEX LP format.
///
/// Variables are named after their [`VarId`](crate::compiler::VarId)
/// (`x0`, `x1`, ...). Rows without variables are omitted.
pub fn write_lp<W: Write>(model: &CompiledModel, out: &mut W) -> io::Result<()> {
    writeln!(out, "\\ u-roster nurse assignment model")?;
    writeln!(out, "Minimize")?;
    write!(out, " obj:")?;
    let objective: Vec<_> = model.objective().terms().collect();
    if objective.is_empty() {
        write!(out, " 0")?;
        if let Some(first) = model.variables().first() {
            write!(out, " {}", first.id)?;
        }
    } else {
        for (id, coef) in objective {
            write_term(out, coef, &id.to_string())?;
        }
    }
    writeln!(out)?;

    writeln!(out, "Subject To")?;
    for (i, row) in model.constraints().iter().enumerate() {
        if row.is_constant() {
            continue;
        }
        write!(out, " c{i}:")?;
        for &(id, coef) in &row.terms {
            write_term(out, coef, &id.to_string())?;
        }
        writeln!(out, " {} {}", row.sense, row.rhs)?;
    }

    writeln!(out, "Bounds")?;
    for var in model.variables() {
        writeln!(out, " 0 <= {} <= {}", var.id, var.upper)?;
    }

    if !model.variables().is_empty() {
        writeln!(out, "General")?;
        for chunk in model.variables().chunks(16) {
            let names: Vec<String> = chunk.iter().map(|v| v.id.to_string()).collect();
            writeln!(out, " {}", names.join(" "))?;
        }
    }
    writeln!(out, "End")
}

fn write_term<W: Write>(out: &mut W, coef: f64, name: &str) -> io::Result<()> {
    if coef < 0.0 {
        write!(out, " - {} {}", -coef, name)
    } else {
        write!(out, " + {} {}", coef, name)
    }
}

#[derive(Debug, Deserialize)]
struct ResultFile {
    #[serde(rename = "SolutionInfo")]
    info: SolutionInfo,
    #[serde(rename = "Vars", default)]
    vars: Vec<ResultVar>,
}

#[derive(Debug, Deserialize)]
struct SolutionInfo {
    #[serde(rename = "Status")]
    status: i32,
    #[serde(rename = "SolCount", default)]
    sol_count: u32,
    #[serde(rename = "ObjVal")]
    obj_val: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ResultVar {
    #[serde(rename = "VarName")]
    name: String,
    #[serde(rename = "X")]
    value: f64,
}

/// Maps a Gurobi JSON result file to an outcome.
///
/// Variables missing from `Vars` are zero.
pub fn parse_result(text: &str, model: &CompiledModel) -> Result<BackendOutcome> {
    let result: ResultFile = serde_json::from_str(text)
        .map_err(|e| SchedulingError::Backend(format!("malformed gurobi result: {e}")))?;
    let info = &result.info;

    match info.status {
        status::INFEASIBLE | status::INF_OR_UNBD => return Ok(BackendOutcome::Infeasible),
        status::UNBOUNDED => {
            return Err(SchedulingError::Backend(
                "gurobi reported an unbounded model".into(),
            ))
        }
        _ => {}
    }
    if info.sol_count == 0 {
        return Ok(BackendOutcome::NoSolution);
    }

    let mut values = vec![0.0; model.num_variables()];
    for var in &result.vars {
        let index = var
            .name
            .strip_prefix('x')
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&i| i < values.len())
            .ok_or_else(|| {
                SchedulingError::Backend(format!("gurobi returned unknown variable '{}'", var.name))
            })?;
        values[index] = var.value;
    }
    let solution = RawSolution {
        objective: info.obj_val.unwrap_or_else(|| model.objective_value(&values)),
        values,
    };

    if info.status == status::OPTIMAL {
        Ok(BackendOutcome::Optimal(solution))
    } else {
        debug!("gurobi status {} with {} solution(s)", info.status, info.sol_count);
        Ok(BackendOutcome::Feasible(solution))
    }
}
