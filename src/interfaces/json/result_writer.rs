use crate::domain::outcome::WorkflowResult;
use crate::error::InputError;
use std::io::Write;

/// Writes one JSON object per workflow result.
pub struct ResultWriter<W: Write> {
    sink: W,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn write_result(&mut self, result: &WorkflowResult) -> Result<(), InputError> {
        serde_json::to_writer(&mut self.sink, result)?;
        self.sink.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), InputError> {
        self.sink.flush()?;
        Ok(())
    }
}
