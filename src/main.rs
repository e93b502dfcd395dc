use std::process::ExitCode;

use anyhow::Result;

use minijs::cli::{self, Options};

fn main() -> Result<ExitCode> {
    let options = Options::parse(std::env::args().skip(1))?;
    let source = cli::read_source(&options)?;
    let compilation = minijs::compile(&source);

    print!("{}", cli::render(&compilation, &options));

    let syntax = compilation.syntax_diagnostics.len();
    let semantic = compilation.analysis.diagnostics().len();
    if syntax + semantic > 0 {
        eprintln!(
            "{}: {syntax} syntax diagnostic(s), {semantic} semantic diagnostic(s)",
            options.input_name()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
