use crate::support::fail;
use ghmock_config::{ReviewConfig, load_review_config};
use std::path::Path;

pub fn run(home: &Path, json_output: bool) {
    let config = load_review_config(home).unwrap_or_else(|e| fail(e));

    if json_output {
        let rendered = serde_json::to_string_pretty(&config).unwrap_or_else(|e| fail(e));
        println!("{rendered}");
    } else {
        print!("{}", exports(&config));
    }
}

/// `NAME='value'` lines, safe to `eval` in a POSIX shell.
fn exports(config: &ReviewConfig) -> String {
    config
        .exports()
        .into_iter()
        .map(|(name, value)| format!("{name}={}\n", shell_quote(&value)))
        .collect()
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
