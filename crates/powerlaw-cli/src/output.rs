use std::io::Write;

use powerlaw_core::Envelope;
use serde_json::Value;

use crate::error::CliError;

pub fn render(envelope: &Envelope<Value>, pretty: bool) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    write_json(&mut stdout.lock(), envelope, pretty)
}

/// Print a failed command as a JSON error object on stderr.
pub fn render_error(error: &CliError, pretty: bool) -> Result<(), CliError> {
    let stderr = std::io::stderr();
    write_json(&mut stderr.lock(), &error.to_envelope_error(), pretty)
}

fn write_json<W, T>(writer: &mut W, value: &T, pretty: bool) -> Result<(), CliError>
where
    W: Write,
    T: serde::Serialize,
{
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, value)?;
    } else {
        serde_json::to_writer(&mut *writer, value)?;
    }
    writeln!(writer)?;
    Ok(())
}
