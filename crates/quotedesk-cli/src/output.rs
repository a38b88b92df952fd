use crate::commands::CommandOutput;
use crate::error::CliError;

/// Writes each envelope to stdout, one JSON document per run.
pub fn render(outputs: &[CommandOutput], pretty: bool) -> Result<(), CliError> {
    for output in outputs {
        let payload = if pretty {
            serde_json::to_string_pretty(&output.body)?
        } else {
            serde_json::to_string(&output.body)?
        };
        println!("{payload}");
    }

    Ok(())
}
