use std::path::Path;
use std::process;

use serde::Serialize;

use admit_eval::{validate::is_valid, Issue, Severity, ValidationContext};

use crate::{print_json, OutputFormat};

#[derive(Serialize)]
struct Report<'a> {
    valid: bool,
    errors: usize,
    warnings: usize,
    issues: &'a [Issue],
}

pub(crate) fn cmd_validate(
    path: &Path,
    ctx: &ValidationContext,
    output: OutputFormat,
    quiet: bool,
) {
    let (session, _) = super::open_record(path, output, quiet);
    let issues = session.validate(ctx);
    let valid = is_valid(&issues);
    let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
    let warnings = issues.len() - errors;

    match output {
        OutputFormat::Json => print_json(&Report {
            valid,
            errors,
            warnings,
            issues: &issues,
        }),
        OutputFormat::Text => {
            for issue in &issues {
                println!("{}", issue);
            }
            if !quiet {
                println!(
                    "{}: {} error(s), {} warning(s)",
                    if valid { "valid" } else { "invalid" },
                    errors,
                    warnings
                );
            }
        }
    }

    if !valid {
        process::exit(1);
    }
}
