use std::path::Path;

use admit_eval::Update;

use crate::{print_json, OutputFormat};

pub(crate) fn cmd_evaluate(path: &Path, output: OutputFormat, quiet: bool) {
    let (_, update) = super::open_record(path, output, quiet);
    match output {
        OutputFormat::Json => print_json(&update),
        OutputFormat::Text => print_update(&update),
    }
}

fn print_update(update: &Update) {
    let list = |items: Vec<&str>| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };
    let active = &update.active;
    println!("fired:    {}", list(active.fired.iter().map(String::as_str).collect()));
    println!("required: {}", list(active.required.iter().map(String::as_str).collect()));
    println!("hidden:   {}", list(active.hidden.iter().map(String::as_str).collect()));
    println!("cleared:  {}", list(update.cleared.iter().map(String::as_str).collect()));
    for (kind, outcome) in &update.outcomes {
        println!("group {}: {}", kind.key(), format!("{:?}", outcome).to_lowercase());
    }
}
