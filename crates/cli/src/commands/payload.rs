use std::path::Path;
use std::process;

use admit_eval::{Issue, PayloadError, ValidationContext};

use crate::{print_json, report_error, OutputFormat};

pub(crate) fn cmd_payload(path: &Path, ctx: &ValidationContext, output: OutputFormat, quiet: bool) {
    let (session, _) = super::open_record(path, output, quiet);
    match session.build_payload(ctx) {
        Ok(payload) => print_json(&payload),
        Err(PayloadError::Invalid { issues }) => {
            report_refusal(&issues, output, quiet);
            process::exit(1);
        }
    }
}

/// Explain why a payload was refused.
pub(crate) fn report_refusal(issues: &[Issue], output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "error": format!("record has {} error(s)", issues.len()),
                "issues": issues,
            });
            eprintln!("{}", body);
        }
        OutputFormat::Text => {
            report_error(
                &format!("error: record has {} error(s)", issues.len()),
                output,
                quiet,
            );
            for issue in issues {
                eprintln!("  {}", issue);
            }
        }
    }
}
