use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};

use crate::Compilation;
use crate::ast::to_dot;
use crate::bytecode::to_binary;

pub const USAGE: &str =
    "usage: minijs [--emit tokens|ast|dot|diagnostics|symbols|bytecode]... [--format tuple|binary] [path]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Tokens,
    Ast,
    Dot,
    Diagnostics,
    Symbols,
    Bytecode,
}

impl Emit {
    pub const DEFAULT: [Emit; 3] = [Emit::Diagnostics, Emit::Symbols, Emit::Bytecode];

    pub fn name(self) -> &'static str {
        match self {
            Emit::Tokens => "tokens",
            Emit::Ast => "ast",
            Emit::Dot => "dot",
            Emit::Diagnostics => "diagnostics",
            Emit::Symbols => "symbols",
            Emit::Bytecode => "bytecode",
        }
    }
}

impl FromStr for Emit {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "tokens" => Ok(Emit::Tokens),
            "ast" => Ok(Emit::Ast),
            "dot" => Ok(Emit::Dot),
            "diagnostics" => Ok(Emit::Diagnostics),
            "symbols" => Ok(Emit::Symbols),
            "bytecode" => Ok(Emit::Bytecode),
            other => bail!("Unknown section '{other}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BytecodeFormat {
    Tuple,
    #[default]
    Binary,
}

impl FromStr for BytecodeFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "tuple" => Ok(BytecodeFormat::Tuple),
            "binary" => Ok(BytecodeFormat::Binary),
            other => bail!("Unknown bytecode format '{other}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Sections in the order they were requested, without repeats.
    pub emit: Vec<Emit>,
    pub format: BytecodeFormat,
    /// Source file; stdin when absent.
    pub input: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            emit: Emit::DEFAULT.to_vec(),
            format: BytecodeFormat::default(),
            input: None,
        }
    }
}

impl Options {
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut emit = Vec::new();
        let mut format = BytecodeFormat::default();
        let mut input = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--emit" | "-e" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("Missing section name after {arg}"))?;
                    let section = value.parse::<Emit>()?;
                    if !emit.contains(&section) {
                        emit.push(section);
                    }
                }
                "--format" | "-f" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("Missing format after {arg}"))?;
                    format = value.parse()?;
                }
                flag if flag.starts_with('-') && flag != "-" => {
                    bail!("Unknown option '{flag}'\n{USAGE}")
                }
                _ => {
                    if input.is_some() {
                        bail!("Only one input file is supported");
                    }
                    if arg != "-" {
                        input = Some(PathBuf::from(arg));
                    }
                }
            }
        }

        if emit.is_empty() {
            emit = Emit::DEFAULT.to_vec();
        }
        Ok(Self {
            emit,
            format,
            input,
        })
    }

    pub fn input_name(&self) -> String {
        self.input
            .as_ref()
            .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string())
    }
}

/// Renders the requested sections, each under a `== name ==` header.
pub fn render(compilation: &Compilation<'_>, options: &Options) -> String {
    let sections = options
        .emit
        .iter()
        .map(|&section| {
            let body = render_section(compilation, section, options.format);
            format!("== {} ==\n{body}", section.name())
        })
        .collect::<Vec<_>>();
    let mut out = sections.join("\n");
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn render_section(compilation: &Compilation<'_>, section: Emit, format: BytecodeFormat) -> String {
    let lines: Vec<String> = match section {
        Emit::Tokens => compilation
            .tokens
            .iter()
            .map(ToString::to_string)
            .collect(),
        Emit::Ast => return compilation.program.render_tree(),
        Emit::Dot => vec![to_dot(&compilation.program)],
        Emit::Diagnostics => {
            let lines = compilation
                .diagnostics()
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            if lines.is_empty() {
                vec!["Sin errores.".to_string()]
            } else {
                lines
            }
        }
        Emit::Symbols => vec![compilation.analysis.format_symbol_table()],
        Emit::Bytecode => match format {
            BytecodeFormat::Binary => to_binary(&compilation.instructions),
            BytecodeFormat::Tuple => compilation
                .instructions
                .iter()
                .map(ToString::to_string)
                .collect(),
        },
    };
    let mut body = lines.join("\n");
    body.push('\n');
    body
}

/// Reads the source named by `options`, falling back to stdin.
pub fn read_source(options: &Options) -> Result<String> {
    match &options.input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Reading stdin")?;
            Ok(buffer)
        }
    }
}
