use crate::repositories::{PlotRepository, RepositoryError};
use rand::Rng;
use std::sync::Arc;

pub const PLOT_NUMBER_LEN: usize = 6;
pub const DEFAULT_MAX_ATTEMPTS: usize = 64;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, thiserror::Error)]
pub enum PlotNumberError {
    #[error("No free plot number found after {0} attempts")]
    Exhausted(usize),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Draw one candidate: six characters from `A-Z0-9`.
pub fn random_plot_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..PLOT_NUMBER_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

pub fn is_generated_format(plot_number: &str) -> bool {
    plot_number.len() == PLOT_NUMBER_LEN
        && plot_number
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Allocates plot numbers that are free at the time of the check.
///
/// The check is advisory: the unique index on `plots.plot_number` still
/// decides at insert time.
pub struct PlotNumberGenerator {
    repository: Arc<dyn PlotRepository>,
    max_attempts: usize,
}

impl PlotNumberGenerator {
    pub fn new(repository: Arc<dyn PlotRepository>) -> Self {
        Self {
            repository,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn generate(&self) -> Result<String, PlotNumberError> {
        for attempt in 1..=self.max_attempts {
            let candidate = random_plot_number(&mut rand::thread_rng());

            if !self.repository.plot_number_exists(&candidate).await? {
                return Ok(candidate);
            }

            tracing::debug!("Plot number {} taken (attempt {})", candidate, attempt);
        }

        tracing::error!(
            "Plot number space exhausted after {} attempts",
            self.max_attempts
        );
        Err(PlotNumberError::Exhausted(self.max_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::plot_repository::MockPlotRepository;

    #[test]
    fn test_random_plot_number_format() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let number = random_plot_number(&mut rng);
            assert!(is_generated_format(&number), "bad number {}", number);
        }
    }

    #[test]
    fn test_is_generated_format() {
        assert!(is_generated_format("AB12CD"));
        assert!(!is_generated_format("ab12cd"));
        assert!(!is_generated_format("AB12C"));
        assert!(!is_generated_format("AB-2CD"));
    }

    #[tokio::test]
    async fn test_generate_retries_until_free() {
        let mut mock_repo = MockPlotRepository::new();
        let mut calls = 0;

        mock_repo
            .expect_plot_number_exists()
            .times(3)
            .returning(move |_| {
                calls += 1;
                let taken = calls < 3;
                Box::pin(async move { Ok(taken) })
            });

        let generator = PlotNumberGenerator::new(Arc::new(mock_repo));
        let number = generator.generate().await.unwrap();
        assert!(is_generated_format(&number));
    }

    #[tokio::test]
    async fn test_generate_gives_up_after_max_attempts() {
        let mut mock_repo = MockPlotRepository::new();

        mock_repo
            .expect_plot_number_exists()
            .times(5)
            .returning(|_| Box::pin(async move { Ok(true) }));

        let generator = PlotNumberGenerator::new(Arc::new(mock_repo)).with_max_attempts(5);
        let result = generator.generate().await;
        assert!(matches!(result, Err(PlotNumberError::Exhausted(5))));
    }
}
