use crate::config::DocumentConfig;
use crate::repository::counter_repo::CounterRepository;
use crate::repository::quote_repo::QuoteRepository;
use crate::util::error::ServiceError;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{error, info};

/// `YYMM` for the given date, e.g. May 2025 -> "2505".
pub fn month_prefix(date: NaiveDate) -> String {
    date.format("%y%m").to_string()
}

/// Sequence part of `number` when it belongs to the `prefix` month.
pub fn sequence_of(prefix: &str, number: &str) -> Option<u32> {
    let rest = number.trim().strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

pub fn format_number(prefix: &str, sequence: u32, width: usize) -> String {
    format!("{}{:0width$}", prefix, sequence, width = width)
}

/// Next number after the highest one already issued under `prefix`.
pub fn next_in_sequence<'a, I>(prefix: &str, issued: I, width: usize) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let last = issued
        .into_iter()
        .filter_map(|number| sequence_of(prefix, number))
        .max()
        .unwrap_or(0);
    format_number(prefix, last + 1, width)
}

/// Issues `YYMM` + zero-padded sequence numbers from a per-month counter
/// document. A month's counter is created on first use, seeded from the
/// highest number already stored for that month.
pub struct RunningNumberGenerator {
    quote_repo: Arc<dyn QuoteRepository>,
    counter_repo: Arc<dyn CounterRepository>,
    scope: String,
    width: usize,
}

impl RunningNumberGenerator {
    pub fn new(
        quote_repo: Arc<dyn QuoteRepository>,
        counter_repo: Arc<dyn CounterRepository>,
        config: &DocumentConfig,
    ) -> Self {
        RunningNumberGenerator {
            quote_repo,
            counter_repo,
            scope: config.counter_scope.clone(),
            width: config.sequence_width,
        }
    }

    fn counter_key(&self, prefix: &str) -> String {
        format!("{}-{}", self.scope, prefix)
    }

    async fn highest_issued(&self, prefix: &str) -> Result<u32, ServiceError> {
        let issued = self.quote_repo.running_numbers_with_prefix(prefix).await?;
        Ok(issued.iter().filter_map(|n| sequence_of(prefix, n)).max().unwrap_or(0))
    }

    /// Takes the next number for the current local month.
    pub async fn next(&self) -> Result<String, ServiceError> {
        self.next_for(Local::now().date_naive()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn next_for(&self, date: NaiveDate) -> Result<String, ServiceError> {
        let prefix = month_prefix(date);
        let key = self.counter_key(&prefix);

        if self.counter_repo.current(&key).await?.is_none() {
            let floor = self.highest_issued(&prefix).await?;
            self.counter_repo.raise_to(&key, floor).await.map_err(|e| {
                error!("Failed to seed counter {}: {}", key, e);
                ServiceError::from(e)
            })?;
        }

        let sequence = self.counter_repo.increment(&key).await.map_err(|e| {
            error!("Failed to increment counter {}: {}", key, e);
            ServiceError::from(e)
        })?;
        let number = format_number(&prefix, sequence, self.width);
        info!("Issued running number {}", number);
        Ok(number)
    }

    /// The number the next call to `next` would issue right now, without
    /// taking it. Another caller may take it first.
    pub async fn peek(&self) -> Result<String, ServiceError> {
        let prefix = month_prefix(Local::now().date_naive());
        let last = match self.counter_repo.current(&self.counter_key(&prefix)).await? {
            Some(seq) => seq,
            None => self.highest_issued(&prefix).await?,
        };
        Ok(format_number(&prefix, last + 1, self.width))
    }
}
