//! Service-level defaults for the planner.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::strategy::{FirstSolutionStrategy, LocalSearchStrategy};

const ENV_PREFIX: &str = "ROUTE_PLANNER_";

/// Defaults applied when a request leaves an option unset, plus the knobs
/// that bound how long and how often the engine may run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub default_time_limit_seconds: u64,
    /// Largest time limit a request may ask for.
    pub max_time_limit_seconds: u64,
    pub default_average_speed_kmh: f64,
    pub default_first_solution_strategy: FirstSolutionStrategy,
    pub default_local_search_strategy: LocalSearchStrategy,
    /// Extra time granted past the time limit before the engine is abandoned.
    pub solver_grace_millis: u64,
    /// Upper bound on engine runs in flight across all requests.
    pub max_concurrent_solves: usize,
    /// How long a request waits for a free solve slot.
    pub admission_wait_millis: u64,
    /// Generation budget of the default engine for `AUTOMATIC` local search.
    pub max_generations: usize,
    /// Generation budget for `GREEDY_DESCENT`.
    pub descent_generations: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_time_limit_seconds: 30,
            max_time_limit_seconds: 3_600,
            default_average_speed_kmh: 50.0,
            default_first_solution_strategy: FirstSolutionStrategy::PathCheapestArc,
            default_local_search_strategy: LocalSearchStrategy::TabuSearch,
            solver_grace_millis: 2_000,
            max_concurrent_solves: default_parallelism(),
            admission_wait_millis: 5_000,
            max_generations: 3_000,
            descent_generations: 200,
        }
    }
}

impl PlannerConfig {
    /// Defaults overridden by `ROUTE_PLANNER_*` environment variables.
    ///
    /// Unset variables keep their default; a set but unparseable variable is a
    /// configuration error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        override_from_env(
            "DEFAULT_TIME_LIMIT_SECONDS",
            &mut config.default_time_limit_seconds,
        )?;
        override_from_env(
            "MAX_TIME_LIMIT_SECONDS",
            &mut config.max_time_limit_seconds,
        )?;
        override_from_env(
            "DEFAULT_AVERAGE_SPEED_KMH",
            &mut config.default_average_speed_kmh,
        )?;
        override_from_env(
            "DEFAULT_FIRST_SOLUTION_STRATEGY",
            &mut config.default_first_solution_strategy,
        )?;
        override_from_env(
            "DEFAULT_LOCAL_SEARCH_STRATEGY",
            &mut config.default_local_search_strategy,
        )?;
        override_from_env("SOLVER_GRACE_MILLIS", &mut config.solver_grace_millis)?;
        override_from_env("MAX_CONCURRENT_SOLVES", &mut config.max_concurrent_solves)?;
        override_from_env("ADMISSION_WAIT_MILLIS", &mut config.admission_wait_millis)?;
        override_from_env("MAX_GENERATIONS", &mut config.max_generations)?;
        override_from_env("DESCENT_GENERATIONS", &mut config.descent_generations)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_time_limit_seconds == 0 {
            return Err(PlannerError::config(
                "default_time_limit_seconds must be > 0",
            ));
        }
        if self.default_time_limit_seconds > self.max_time_limit_seconds {
            return Err(PlannerError::config(format!(
                "default_time_limit_seconds {} exceeds max_time_limit_seconds {}",
                self.default_time_limit_seconds, self.max_time_limit_seconds
            )));
        }
        if !(self.default_average_speed_kmh.is_finite() && self.default_average_speed_kmh > 0.0) {
            return Err(PlannerError::config(
                "default_average_speed_kmh must be > 0",
            ));
        }
        if self.max_concurrent_solves == 0 {
            return Err(PlannerError::config("max_concurrent_solves must be > 0"));
        }
        if self.max_generations == 0 || self.descent_generations == 0 {
            return Err(PlannerError::config("generation budgets must be > 0"));
        }
        Ok(())
    }

    pub fn solver_grace(&self) -> Duration {
        Duration::from_millis(self.solver_grace_millis)
    }

    pub fn admission_wait(&self) -> Duration {
        Duration::from_millis(self.admission_wait_millis)
    }
}

fn override_from_env<T>(key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let name = format!("{ENV_PREFIX}{key}");
    match env::var(&name) {
        Ok(raw) => {
            *target = parse_override(&name, &raw)?;
            tracing::debug!(variable = %name, "planner config override");
            Ok(())
        }
        Err(env::VarError::NotPresent) => Ok(()),
        Err(env::VarError::NotUnicode(_)) => Err(PlannerError::config(format!(
            "{name} is not valid unicode"
        ))),
    }
}

fn parse_override<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| PlannerError::config(format!("{name}={raw:?}: {e}")))
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_time_limit_seconds, 30);
        assert_eq!(
            config.default_local_search_strategy,
            LocalSearchStrategy::TabuSearch
        );
        assert_eq!(config.solver_grace(), Duration::from_secs(2));
    }

    #[test]
    fn test_validate_rejects_zero_speed() {
        let config = PlannerConfig {
            default_average_speed_kmh: 0.0,
            ..PlannerConfig::default()
        };
        assert!(matches!(config.validate(), Err(PlannerError::Config(_))));
    }

    #[test]
    fn test_override_parses_strategy() {
        let strategy: FirstSolutionStrategy =
            parse_override("ROUTE_PLANNER_DEFAULT_FIRST_SOLUTION_STRATEGY", " savings\n").unwrap();
        assert_eq!(strategy, FirstSolutionStrategy::Savings);
    }

    #[test]
    fn test_override_rejects_garbage() {
        let err = parse_override::<u64>("ROUTE_PLANNER_MAX_GENERATIONS", "fast").unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("ROUTE_PLANNER_MAX_GENERATIONS"), "{err}");
    }

    #[test]
    fn test_validate_rejects_default_above_maximum() {
        let config = PlannerConfig {
            default_time_limit_seconds: 120,
            max_time_limit_seconds: 60,
            ..PlannerConfig::default()
        };
        assert!(matches!(config.validate(), Err(PlannerError::Config(_))));
    }

    #[test]
    fn test_missing_variable_keeps_default() {
        let mut value = 42_usize;
        override_from_env("TEST_ONLY_NEVER_SET", &mut value).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{"default_time_limit_seconds": 5}"#).unwrap();
        assert_eq!(config.default_time_limit_seconds, 5);
        assert_eq!(config.default_average_speed_kmh, 50.0);
    }
}
