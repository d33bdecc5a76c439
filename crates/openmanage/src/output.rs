//! Result rendering: one document on stdout per invocation.

use std::io::{self, Write};

use openmanage_core::OperationResult;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(format: OutputFormat, result: &OperationResult) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::JsonCompact => serde_json::to_string(result)?,
        OutputFormat::Yaml => serde_yaml::to_string(result)?,
    })
}

/// Print the rendered result to stdout.
pub fn print_result(format: OutputFormat, result: &OperationResult) -> Result<(), CliError> {
    let rendered = render(format, result)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", rendered.trim_end())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn compact_json_is_one_line() {
        let result = OperationResult::changed("Successfully deleted the job.")
            .with_payload("status", json!({"Status": "Success"}));
        let out = render(OutputFormat::JsonCompact, &result).expect("render");
        assert!(!out.contains('\n'));
        let back: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(back["changed"], true);
        assert_eq!(back["status"]["Status"], "Success");
    }

    #[test]
    fn yaml_carries_the_same_keys() {
        let out = render(OutputFormat::Yaml, &OperationResult::failed("boom")).expect("render");
        assert!(out.contains("failed: true"));
        assert!(out.contains("msg: boom"));
    }
}
