//! # Dice Pipeline
//!
//! Builds expressions from templates, bounds their cost, and runs the
//! evaluator off the async runtime with a per-call timeout.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Template binding, size limits, blocking evaluation with timeout

pub mod evaluator;

use log::{debug, error};
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::error::EvaluationError;

pub use evaluator::{DiceEvaluator, DieRoll, Evaluation, StandardEvaluator};

/// Upper bounds applied before an expression reaches the evaluator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiceLimits {
    /// Dice per term and in total
    pub max_dice: u32,
    pub max_sides: u32,
    pub max_expression_length: usize,
}

impl Default for DiceLimits {
    fn default() -> Self {
        Self {
            max_dice: 100,
            max_sides: 1000,
            max_expression_length: 200,
        }
    }
}

/// Outcome of one evaluation, consumed by the renderer and never stored
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollResult {
    pub expression: String,
    pub rolls: Vec<DieRoll>,
    pub total: i64,
}

impl RollResult {
    /// Face values of all dice, including dropped ones
    pub fn values(&self) -> Vec<u32> {
        self.rolls.iter().map(|r| r.value).collect()
    }
}

pub struct DicePipeline {
    evaluator: Arc<dyn DiceEvaluator>,
    limits: DiceLimits,
    timeout: Duration,
    rng: Mutex<StdRng>,
    dice_term: Regex,
    variable: Regex,
}

impl DicePipeline {
    pub fn new(
        evaluator: Arc<dyn DiceEvaluator>,
        limits: DiceLimits,
        timeout: Duration,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            evaluator,
            limits,
            timeout,
            rng: Mutex::new(StdRng::from_os_rng()),
            dice_term: Regex::new(r"(?i)(\d*)d(\d+)")?,
            variable: Regex::new(r"\{([a-z_][a-z0-9_]*)\}")?,
        })
    }

    /// Replace the master RNG with a seeded one for reproducible rolls
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn limits(&self) -> &DiceLimits {
        &self.limits
    }

    /// Substitute `{name}` placeholders with bound values
    pub fn bind(&self, template: &str, vars: &[(&str, String)]) -> Result<String, EvaluationError> {
        let mut expression = String::with_capacity(template.len());
        let mut last = 0;
        for caps in self.variable.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = vars
                .iter()
                .find(|(var, _)| *var == name.as_str())
                .map(|(_, value)| value)
                .ok_or_else(|| {
                    EvaluationError::SyntaxError(format!("unbound variable {{{}}}", name.as_str()))
                })?;
            expression.push_str(&template[last..whole.start()]);
            expression.push_str(value);
            last = whole.end();
        }
        expression.push_str(&template[last..]);
        Ok(expression)
    }

    /// Reject expressions whose declared size exceeds the configured limits
    pub fn check_limits(&self, expression: &str) -> Result<(), EvaluationError> {
        let limits = &self.limits;
        if expression.len() > limits.max_expression_length {
            return Err(EvaluationError::LimitExceeded(format!(
                "expression longer than {} characters",
                limits.max_expression_length
            )));
        }

        let mut total_dice: u64 = 0;
        for caps in self.dice_term.captures_iter(expression) {
            let term = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            let count = match caps.get(1).map(|m| m.as_str()) {
                Some("") | None => 1,
                Some(digits) => digits.parse::<u64>().unwrap_or(u64::MAX),
            };
            let sides = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .unwrap_or(u64::MAX);

            if count > u64::from(limits.max_dice) {
                return Err(EvaluationError::LimitExceeded(format!(
                    "{term} rolls more than {} dice",
                    limits.max_dice
                )));
            }
            if sides > u64::from(limits.max_sides) {
                return Err(EvaluationError::LimitExceeded(format!(
                    "{term} has more than {} sides",
                    limits.max_sides
                )));
            }
            total_dice += count;
        }
        if total_dice > u64::from(limits.max_dice) {
            return Err(EvaluationError::LimitExceeded(format!(
                "expression rolls more than {} dice in total",
                limits.max_dice
            )));
        }
        Ok(())
    }

    /// Check limits and syntax without rolling
    pub fn validate(&self, expression: &str) -> Result<(), EvaluationError> {
        self.check_limits(expression)?;
        self.evaluator.validate(expression)
    }

    /// Bind, bound and evaluate a template on the blocking pool
    pub async fn evaluate(
        &self,
        template: &str,
        vars: &[(&str, String)],
    ) -> Result<RollResult, EvaluationError> {
        let expression = self.bind(template, vars)?;
        self.check_limits(&expression)?;

        let mut rng = self.fork_rng()?;
        let evaluator = Arc::clone(&self.evaluator);
        let input = expression.clone();
        let task = tokio::task::spawn_blocking(move || evaluator.evaluate(&input, &mut rng));

        let evaluation = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                error!("Dice evaluation of {expression} panicked: {join_error}");
                return Err(EvaluationError::InternalError(
                    "evaluator task failed".into(),
                ));
            }
            Err(_) => {
                error!(
                    "Dice evaluation of {expression} timed out after {}ms",
                    self.timeout.as_millis()
                );
                return Err(EvaluationError::InternalError(format!(
                    "evaluation timed out after {}ms",
                    self.timeout.as_millis()
                )));
            }
        };

        debug!("Rolled {expression} => {}", evaluation.total);
        Ok(RollResult {
            expression,
            rolls: evaluation.rolls,
            total: evaluation.total,
        })
    }

    /// Evaluate a plain expression without variables
    pub async fn roll(&self, expression: &str) -> Result<RollResult, EvaluationError> {
        self.evaluate(expression, &[]).await
    }

    /// Derive an independent per-call RNG from the master generator
    fn fork_rng(&self) -> Result<StdRng, EvaluationError> {
        let mut master = self
            .rng
            .lock()
            .map_err(|_| EvaluationError::InternalError("rng lock poisoned".into()))?;
        Ok(StdRng::from_rng(&mut *master))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> DicePipeline {
        DicePipeline::new(
            Arc::new(StandardEvaluator),
            DiceLimits::default(),
            Duration::from_secs(2),
        )
        .unwrap()
        .with_seed(7)
    }

    struct SlowEvaluator;

    impl DiceEvaluator for SlowEvaluator {
        fn validate(&self, _expression: &str) -> Result<(), EvaluationError> {
            Ok(())
        }

        fn evaluate(&self, _expression: &str, _rng: &mut StdRng) -> Result<Evaluation, EvaluationError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Evaluation {
                total: 0,
                rolls: Vec::new(),
            })
        }
    }

    #[test]
    fn test_bind_substitutes_variables() {
        let expression = pipeline()
            .bind("{count}d{sides}", &[("count", "3".into()), ("sides", "10".into())])
            .unwrap();
        assert_eq!(expression, "3d10");
    }

    #[test]
    fn test_bind_rejects_unbound_variable() {
        assert!(matches!(
            pipeline().bind("{count}d6", &[]),
            Err(EvaluationError::SyntaxError(_))
        ));
    }

    #[test]
    fn test_limits_reject_large_expressions() {
        let pipeline = pipeline();
        assert!(matches!(
            pipeline.check_limits("1000d1000"),
            Err(EvaluationError::LimitExceeded(_))
        ));
        assert!(matches!(
            pipeline.check_limits("1d100000"),
            Err(EvaluationError::LimitExceeded(_))
        ));
        assert!(matches!(
            pipeline.check_limits("60d6+60d6"),
            Err(EvaluationError::LimitExceeded(_))
        ));
        assert!(matches!(
            pipeline.check_limits(&"1+".repeat(150)),
            Err(EvaluationError::LimitExceeded(_))
        ));
        assert!(pipeline.check_limits("100d1000").is_ok());
    }

    #[tokio::test]
    async fn test_evaluate_produces_roll_result() {
        let result = pipeline().roll("2d6+3").await.unwrap();
        assert_eq!(result.expression, "2d6+3");
        assert_eq!(result.rolls.len(), 2);
        assert!((5..=15).contains(&result.total));
    }

    #[tokio::test]
    async fn test_limit_checked_before_evaluation() {
        assert!(matches!(
            pipeline().roll("1000d1000").await,
            Err(EvaluationError::LimitExceeded(_))
        ));
    }

    #[tokio::test]
    async fn test_same_seed_reproduces_sequence() {
        let a = pipeline().roll("10d10").await.unwrap();
        let b = pipeline().roll("10d10").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_internal_error() {
        let pipeline = DicePipeline::new(
            Arc::new(SlowEvaluator),
            DiceLimits::default(),
            Duration::from_millis(20),
        )
        .unwrap();
        assert!(matches!(
            pipeline.roll("1d6").await,
            Err(EvaluationError::InternalError(_))
        ));
    }
}
