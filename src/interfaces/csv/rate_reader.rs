use crate::domain::money::Currency;
use crate::error::InputError;
use crate::infrastructure::in_memory::InMemoryRateCache;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct RateRow {
    pub currency: Currency,
    pub rate: Decimal,
}

/// Reads a `currency,rate` table from a CSV source.
///
/// Rates are expressed against the base currency, which itself should be
/// listed with a rate of 1.
pub struct RateReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RateReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields rows; non-positive rates are reported as invalid records.
    pub fn rates(self) -> impl Iterator<Item = Result<RateRow, InputError>> {
        self.reader.into_deserialize().map(|result| {
            let row: RateRow = result?;
            if row.rate > Decimal::ZERO {
                Ok(row)
            } else {
                Err(InputError::InvalidRecord(format!(
                    "rate for {} must be positive",
                    row.currency
                )))
            }
        })
    }

    /// Loads every row into a fresh cache, failing on the first bad row.
    pub async fn into_cache(self) -> Result<InMemoryRateCache, InputError> {
        let cache = InMemoryRateCache::new();
        for row in self.rates() {
            let row = row?;
            cache.write(row.currency, row.rate).await;
        }
        Ok(cache)
    }
}
