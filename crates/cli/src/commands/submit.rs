use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use admit_eval::{
    AdmitConfig, HttpSubmission, PayloadError, SubmissionTransport, TokenAuth, ValidationContext,
};

use crate::{print_json, report_error, OutputFormat};

pub(crate) fn cmd_submit(
    config: &AdmitConfig,
    path: &Path,
    ctx: &ValidationContext,
    output: OutputFormat,
    quiet: bool,
) {
    let Some(url) = config.submit.url.clone() else {
        report_error(
            "error: no submission endpoint configured (set submit.url or ADMIT_SUBMIT_URL)",
            output,
            quiet,
        );
        process::exit(1);
    };

    let (session, _) = super::open_record(path, output, quiet);
    let payload = match session.build_payload(ctx) {
        Ok(payload) => payload,
        Err(PayloadError::Invalid { issues }) => {
            super::payload::report_refusal(&issues, output, quiet);
            process::exit(1);
        }
    };

    let auth = Arc::new(TokenAuth::new(config.submit.auth_token.clone()));
    let transport = HttpSubmission::new(url, auth)
        .with_timeout(Duration::from_millis(config.submit.timeout_ms));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("error: failed to start runtime: {}", e), output, quiet);
            process::exit(1);
        }
    };
    match rt.block_on(transport.submit(&payload)) {
        Ok(receipt) => match output {
            OutputFormat::Json => print_json(&receipt),
            OutputFormat::Text => {
                if !quiet {
                    println!("submitted ({})", receipt.status);
                }
            }
        },
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}
