use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseClass {
    /// No diagnostics from any stage.
    Clean,
    /// At least one syntax diagnostic.
    SyntaxError,
    /// A clean parse with at least one semantic diagnostic.
    SemanticError,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BenchConfig {
    pub enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Files under the case directory holding the expected output of each stage.
/// An absent file means the stage is not compared.
#[derive(Debug, Deserialize, Clone)]
pub struct ExpectedOutcome {
    pub exit_code: i32,
    pub syntax_file: Option<String>,
    pub semantic_file: Option<String>,
    pub symbols_file: Option<String>,
    pub ast_file: Option<String>,
    pub bytecode_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaseConfig {
    pub class: CaseClass,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bench: BenchConfig,
    pub expected: ExpectedOutcome,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    pub dir: PathBuf,
    pub program_path: PathBuf,
    pub config: CaseConfig,
}

impl Case {
    pub fn read_text(&self, relative_path: &str) -> Result<String> {
        fs::read_to_string(self.dir.join(relative_path))
            .with_context(|| format!("Reading {} fixture file {}", self.name, relative_path))
    }

    pub fn read_source(&self) -> Result<String> {
        fs::read_to_string(&self.program_path)
            .with_context(|| format!("Reading {}", self.program_path.display()))
    }

    /// Expected lines from an optional fixture file, or `None` when the case
    /// does not check that stage.
    pub fn expected_lines(&self, relative_path: Option<&str>) -> Result<Option<Vec<String>>> {
        relative_path
            .map(|path| self.read_text(path).map(|text| lines(&text)))
            .transpose()
    }
}

pub fn load_cases(programs_dir: &Path) -> Result<Vec<Case>> {
    let mut cases = Vec::new();

    for entry in
        fs::read_dir(programs_dir).with_context(|| format!("Reading {}", programs_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        let case_path = path.join("case.yaml");
        if !case_path.exists() {
            continue;
        }

        let program_path = path.join("program.js");
        ensure!(
            program_path.exists(),
            "Missing program.js for case {}",
            path.display()
        );

        let case_name = path
            .file_name()
            .and_then(|value| value.to_str())
            .map(str::to_string)
            .with_context(|| format!("Invalid case directory name {}", path.display()))?;
        let case_raw = fs::read_to_string(&case_path)
            .with_context(|| format!("Reading {}", case_path.display()))?;
        let config: CaseConfig = serde_yaml::from_str(&case_raw)
            .with_context(|| format!("Parsing {}", case_path.display()))?;

        cases.push(Case {
            name: case_name,
            dir: path,
            program_path,
            config,
        });
    }

    ensure!(
        !cases.is_empty(),
        "No test cases found in {}",
        programs_dir.display()
    );
    cases.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(cases)
}

pub fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}

/// Normalized output split into lines; empty text gives no lines.
pub fn lines(output: &str) -> Vec<String> {
    let normalized = normalize_output(output);
    if normalized.is_empty() {
        return Vec::new();
    }
    normalized.lines().map(str::to_string).collect()
}

pub struct CliOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the compiler binary on `path` with extra arguments.
pub fn run_cli(binary: &Path, args: &[&str], path: &Path) -> Result<CliOutput> {
    let output = Command::new(binary)
        .args(args)
        .arg(path)
        .output()
        .with_context(|| format!("Running {} on {}", binary.display(), path.display()))?;
    let exit_code = output
        .status
        .code()
        .with_context(|| format!("{} was terminated by a signal", binary.display()))?;
    Ok(CliOutput {
        exit_code,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

pub fn bench_cases(programs_dir: &Path, tag: &str) -> Result<Vec<Case>> {
    Ok(load_cases(programs_dir)?
        .into_iter()
        .filter(|case| {
            case.config.bench.enabled && case.config.bench.tags.iter().any(|name| name == tag)
        })
        .collect())
}
