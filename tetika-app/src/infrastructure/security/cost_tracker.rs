use chrono::{NaiveDate, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tetika_errors::AppError;

const ESTIMATED_COST_PER_REQUEST_CENTS: u32 = 1;
const DAILY_COST_LIMIT_CENTS: u32 = 200;

#[derive(Debug)]
struct DailyUsage {
    day: NaiveDate,
    requests: u32,
    cost_cents: u32,
}

/// Daily budget for calls to the AI instruction advisor.
pub struct CostTracker {
    daily_request_limit: u32,
    usage: Mutex<DailyUsage>,
}

impl CostTracker {
    pub fn new(daily_request_limit: u32) -> Self {
        Self {
            daily_request_limit,
            usage: Mutex::new(DailyUsage {
                day: Utc::now().date_naive(),
                requests: 0,
                cost_cents: 0,
            }),
        }
    }

    /// Checks both limits and counts the request under one lock.
    pub fn check_and_increment(&self) -> Result<(), CostLimitError> {
        let mut usage = self.current_usage();

        if usage.requests >= self.daily_request_limit {
            return Err(CostLimitError::DailyRequestLimitReached);
        }

        if usage.cost_cents + ESTIMATED_COST_PER_REQUEST_CENTS > DAILY_COST_LIMIT_CENTS {
            return Err(CostLimitError::DailyCostLimitReached);
        }

        usage.requests += 1;
        usage.cost_cents += ESTIMATED_COST_PER_REQUEST_CENTS;
        Ok(())
    }

    pub fn remaining_requests(&self) -> u32 {
        self.daily_request_limit
            .saturating_sub(self.current_usage().requests)
    }

    // Locks the counters, zeroing them first when the day has changed.
    fn current_usage(&self) -> MutexGuard<'_, DailyUsage> {
        let mut usage = self.usage.lock().unwrap_or_else(PoisonError::into_inner);
        let today = Utc::now().date_naive();
        if usage.day != today {
            *usage = DailyUsage {
                day: today,
                requests: 0,
                cost_cents: 0,
            };
            tracing::info!("Daily AI cost tracker reset");
        }
        usage
    }
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostLimitError {
    DailyRequestLimitReached,
    DailyCostLimitReached,
}

impl CostLimitError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::DailyRequestLimitReached => "The daily AI advisor limit has been reached. Try again tomorrow.",
            Self::DailyCostLimitReached => "The AI advisor budget for today is spent. Try again tomorrow.",
        }
    }
}

impl From<CostLimitError> for AppError {
    fn from(error: CostLimitError) -> Self {
        AppError::BudgetExceeded(error.message().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_limit() {
        let tracker = CostTracker::new(2);
        assert!(tracker.check_and_increment().is_ok());
        assert!(tracker.check_and_increment().is_ok());
        assert_eq!(tracker.remaining_requests(), 0);
        assert_eq!(
            tracker.check_and_increment().unwrap_err(),
            CostLimitError::DailyRequestLimitReached
        );
    }

    #[test]
    fn test_cost_limit_caps_large_request_limits() {
        let tracker = CostTracker::new(10_000);
        for _ in 0..DAILY_COST_LIMIT_CENTS {
            tracker.check_and_increment().unwrap();
        }
        let err: AppError = tracker.check_and_increment().unwrap_err().into();
        assert_eq!(err.error_code(), "budget_exceeded");
    }

    #[test]
    fn test_concurrent_requests_never_exceed_limit() {
        let tracker = CostTracker::new(50);
        let granted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..20)
                            .filter(|_| tracker.check_and_increment().is_ok())
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(granted, 50);
        assert_eq!(tracker.remaining_requests(), 0);
    }
}
