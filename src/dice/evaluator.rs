//! Evaluator boundary and the built-in standard notation evaluator
//!
//! Supported notation: `NdS`, `dS`, keep modifiers `NdSkK` / `NdSkhK` /
//! `NdSklK`, integer constants, combined with `+` and `-`.

use rand::rngs::StdRng;
use rand::Rng;

use crate::core::error::EvaluationError;

/// One physical die thrown during evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DieRoll {
    pub sides: u32,
    pub value: u32,
    /// Excluded from the total by a keep modifier
    pub dropped: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub total: i64,
    pub rolls: Vec<DieRoll>,
}

/// A dice grammar implementation.
///
/// Called on the blocking pool; implementations may be slow but must be
/// deterministic for a given RNG state.
pub trait DiceEvaluator: Send + Sync + 'static {
    /// Check the syntax without rolling
    fn validate(&self, expression: &str) -> Result<(), EvaluationError>;

    fn evaluate(&self, expression: &str, rng: &mut StdRng) -> Result<Evaluation, EvaluationError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Keep {
    All,
    Highest(u32),
    Lowest(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Term {
    Dice { count: u32, sides: u32, keep: Keep },
    Constant(i64),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StandardEvaluator;

impl StandardEvaluator {
    fn parse(expression: &str) -> Result<Vec<(i64, Term)>, EvaluationError> {
        let compact: String = expression
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if compact.is_empty() {
            return Err(EvaluationError::SyntaxError("empty expression".into()));
        }

        let chars: Vec<char> = compact.chars().collect();
        let mut pos = 0;
        let mut terms = Vec::new();
        let mut sign = 1;

        if chars[0] == '-' || chars[0] == '+' {
            sign = if chars[0] == '-' { -1 } else { 1 };
            pos = 1;
        }

        loop {
            let (term, next) = Self::parse_term(&chars, pos, &compact)?;
            terms.push((sign, term));
            pos = next;
            match chars.get(pos) {
                None => break,
                Some('+') => sign = 1,
                Some('-') => sign = -1,
                Some(other) => {
                    return Err(EvaluationError::SyntaxError(format!(
                        "unexpected '{other}' at position {} in {compact}",
                        pos + 1
                    )))
                }
            }
            pos += 1;
        }
        Ok(terms)
    }

    fn parse_number(chars: &[char], start: usize) -> (Option<u64>, usize) {
        let mut end = start;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }
        if end == start {
            return (None, start);
        }
        let digits: String = chars[start..end].iter().collect();
        (digits.parse().ok(), end)
    }

    fn parse_term(chars: &[char], start: usize, source: &str) -> Result<(Term, usize), EvaluationError> {
        let syntax = |msg: &str| EvaluationError::SyntaxError(format!("{msg} in {source}"));
        let too_big = || EvaluationError::LimitExceeded(format!("number too large in {source}"));

        let (count, pos) = Self::parse_number(chars, start);
        if chars.get(pos) != Some(&'d') {
            let value = match count {
                Some(value) => value,
                None if pos != start => return Err(too_big()),
                None => return Err(syntax("expected a number or dice")),
            };
            let value = i64::try_from(value).map_err(|_| too_big())?;
            return Ok((Term::Constant(value), pos));
        }

        let count = match count {
            Some(n) => u32::try_from(n).map_err(|_| too_big())?,
            None if pos == start => 1,
            None => return Err(too_big()),
        };
        let (sides, mut pos) = Self::parse_number(chars, pos + 1);
        let sides = sides.ok_or_else(|| syntax("expected die sides after 'd'"))?;
        let sides = u32::try_from(sides).map_err(|_| too_big())?;
        if count == 0 || sides == 0 {
            return Err(syntax("dice need at least one die with one side"));
        }

        let mut keep = Keep::All;
        if chars.get(pos) == Some(&'k') {
            pos += 1;
            let lowest = match chars.get(pos) {
                Some('h') => {
                    pos += 1;
                    false
                }
                Some('l') => {
                    pos += 1;
                    true
                }
                _ => false,
            };
            let (kept, next) = Self::parse_number(chars, pos);
            let kept = kept.ok_or_else(|| syntax("expected a number after keep modifier"))?;
            let kept = u32::try_from(kept).map_err(|_| too_big())?;
            pos = next;
            keep = if lowest {
                Keep::Lowest(kept)
            } else {
                Keep::Highest(kept)
            };
        }

        Ok((Term::Dice { count, sides, keep }, pos))
    }
}

impl DiceEvaluator for StandardEvaluator {
    fn validate(&self, expression: &str) -> Result<(), EvaluationError> {
        Self::parse(expression).map(|_| ())
    }

    fn evaluate(&self, expression: &str, rng: &mut StdRng) -> Result<Evaluation, EvaluationError> {
        let overflow =
            || EvaluationError::LimitExceeded(format!("result of {expression} is out of range"));
        let mut total: i64 = 0;
        let mut rolls = Vec::new();

        for (sign, term) in Self::parse(expression)? {
            let value = match term {
                Term::Constant(value) => value,
                Term::Dice { count, sides, keep } => {
                    let mut thrown: Vec<u32> =
                        (0..count).map(|_| rng.random_range(1..=sides)).collect();
                    let mut order: Vec<usize> = (0..thrown.len()).collect();
                    order.sort_by_key(|&i| thrown[i]);
                    let kept: Vec<usize> = match keep {
                        Keep::All => order,
                        Keep::Lowest(k) => order.into_iter().take(k as usize).collect(),
                        Keep::Highest(k) => order.into_iter().rev().take(k as usize).collect(),
                    };

                    let mut subtotal: i64 = 0;
                    for (i, value) in thrown.drain(..).enumerate() {
                        let dropped = !kept.contains(&i);
                        if !dropped {
                            subtotal += i64::from(value);
                        }
                        rolls.push(DieRoll {
                            sides,
                            value,
                            dropped,
                        });
                    }
                    subtotal
                }
            };
            total = value
                .checked_mul(sign)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(overflow)?;
        }

        Ok(Evaluation { total, rolls })
    }
}
