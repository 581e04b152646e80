pub(crate) mod evaluate;
pub(crate) mod lookup;
pub(crate) mod payload;
pub(crate) mod submit;
pub(crate) mod validate;

use std::path::Path;
use std::process;

use admit_core::Record;
use admit_eval::{Session, Update};

use crate::{read_json, report_error, OutputFormat};

/// Read and settle a record file, exiting with a report on failure.
pub(crate) fn open_record(path: &Path, output: OutputFormat, quiet: bool) -> (Session, Update) {
    let json = read_json(path, output, quiet);
    match Record::from_json(&json) {
        Ok(record) => Session::open(record),
        Err(e) => {
            let msg = format!("error in record '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}
