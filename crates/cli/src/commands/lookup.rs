use std::process;
use std::sync::Arc;

use admit_eval::address::resolve;
use admit_eval::{
    AddressQuery, AddressResult, AdmitConfig, HttpPostalLookup, LookupError, PostalLookup,
    StaticPostalLookup,
};

use crate::{print_json, read_json, report_error, OutputFormat};

/// Pick the configured lookup service: a local table wins over the HTTP
/// endpoint.
fn lookup_service(
    config: &AdmitConfig,
    output: OutputFormat,
    quiet: bool,
) -> Arc<dyn PostalLookup> {
    let settings = &config.lookup;
    if let Some(table) = &settings.table {
        let json = read_json(table, output, quiet);
        return match StaticPostalLookup::from_json(&json) {
            Ok(lookup) => Arc::new(lookup),
            Err(e) => {
                let msg = format!("error in lookup table '{}': {}", table.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        };
    }
    match &settings.base_url {
        Some(base_url) => Arc::new(
            HttpPostalLookup::new(base_url.clone())
                .with_auth_token(settings.auth_token.clone())
                .with_timeout(settings.enricher_settings().timeout),
        ),
        None => {
            report_error(
                "error: no address lookup configured (set lookup.base_url, lookup.table or ADMIT_LOOKUP_BASE_URL)",
                output,
                quiet,
            );
            process::exit(1);
        }
    }
}

pub(crate) fn cmd_lookup(
    config: &AdmitConfig,
    country: &str,
    postal_code: &str,
    output: OutputFormat,
    quiet: bool,
) {
    let lookup = lookup_service(config, output, quiet);
    let query = AddressQuery::new(country, postal_code);
    let timeout = config.lookup.enricher_settings().timeout;

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("error: failed to start runtime: {}", e), output, quiet);
            process::exit(1);
        }
    };
    let result = rt.block_on(async {
        match tokio::time::timeout(timeout, resolve(lookup.as_ref(), &query)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout {
                after_ms: timeout.as_millis() as u64,
            }),
        }
    });

    match result {
        Ok(found) => match output {
            OutputFormat::Json => print_json(&found),
            OutputFormat::Text => print_result(&found),
        },
        Err(e) => {
            tracing::warn!(lookup = lookup.lookup_id(), error = %e, "address lookup failed");
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

fn print_result(found: &AddressResult) {
    println!("region: {}", found.chosen_region.as_deref().unwrap_or("-"));
    println!("city:   {}", found.chosen_city.as_deref().unwrap_or("-"));
    println!("cities: {}", found.city_options.join(", "));
}
