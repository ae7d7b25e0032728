use crate::domain::request::CheckoutRequest;
use crate::error::InputError;
use std::io::BufRead;

/// Reads checkout requests from a JSON-lines source, one request per line.
///
/// Blank lines are skipped. A malformed line yields an error for that line
/// only; the stream carries on with the next one.
pub struct RequestReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> RequestReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn requests(self) -> impl Iterator<Item = Result<CheckoutRequest, InputError>> {
        self.source
            .lines()
            .enumerate()
            .filter(|(_, line)| !matches!(line, Ok(text) if text.trim().is_empty()))
            .map(|(index, line)| {
                let line = line?;
                serde_json::from_str(&line).map_err(|err| {
                    InputError::InvalidRecord(format!("line {}: {err}", index + 1))
                })
            })
    }
}
