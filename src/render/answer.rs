//! Roll result formatting for the four answer formats

use crate::dice::RollResult;
use crate::store::AnswerFormat;

use super::{Answer, EmbedAnswer};

/// List values as `[a, b, c]`, bolding the ones `marked` selects
pub fn mark_values(values: &[u32], marked: impl Fn(usize, u32) -> bool) -> String {
    let items: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| if marked(i, v) { format!("**{v}**") } else { v.to_string() })
        .collect();
    format!("[{}]", items.join(", "))
}

/// Build an answer from a title line and its details.
///
/// `Full` shows the expression, `WithoutExpression` hides it, `Compact` is a
/// single content line and `Minimal` only the title.
pub fn format_answer(
    title: &str,
    expression: Option<&str>,
    details: &str,
    format: AnswerFormat,
) -> Answer {
    let details = details.trim();
    match format {
        AnswerFormat::Full => {
            let description = match (expression, details.is_empty()) {
                (Some(expr), true) => Some(format!("`{expr}`")),
                (Some(expr), false) => Some(format!("`{expr}`: {details}")),
                (None, true) => None,
                (None, false) => Some(details.to_string()),
            };
            Answer {
                embed: Some(EmbedAnswer {
                    title: title.to_string(),
                    description,
                    fields: Vec::new(),
                }),
                ..Answer::default()
            }
        }
        AnswerFormat::WithoutExpression => Answer {
            embed: Some(EmbedAnswer {
                title: title.to_string(),
                description: (!details.is_empty()).then(|| details.to_string()),
                fields: Vec::new(),
            }),
            ..Answer::default()
        },
        AnswerFormat::Compact if details.is_empty() => Answer::text(format!("**{title}**")),
        AnswerFormat::Compact => Answer::text(format!("**{title}** {details}")),
        AnswerFormat::Minimal => Answer::text(title),
    }
}

/// Answer for a plain roll, `label ⇒ total` with dropped dice struck through
pub fn roll_answer(label: Option<&str>, result: &RollResult, format: AnswerFormat) -> Answer {
    let title = format!("{} ⇒ {}", label.unwrap_or(&result.expression), result.total);
    let details = if result.rolls.is_empty() {
        String::new()
    } else {
        let dice: Vec<String> = result
            .rolls
            .iter()
            .map(|r| {
                if r.dropped {
                    format!("~~{}~~", r.value)
                } else {
                    r.value.to_string()
                }
            })
            .collect();
        format!("[{}]", dice.join(", "))
    };
    format_answer(&title, Some(&result.expression), &details, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DieRoll;

    fn result() -> RollResult {
        RollResult {
            expression: "2d6+3".into(),
            rolls: vec![
                DieRoll { sides: 6, value: 4, dropped: false },
                DieRoll { sides: 6, value: 2, dropped: false },
            ],
            total: 9,
        }
    }

    #[test]
    fn test_full_format_shows_expression() {
        let answer = roll_answer(Some("Attack"), &result(), AnswerFormat::Full);
        let embed = answer.embed.unwrap();
        assert_eq!(embed.title, "Attack ⇒ 9");
        assert_eq!(embed.description.as_deref(), Some("`2d6+3`: [4, 2]"));
    }

    #[test]
    fn test_without_expression_hides_it() {
        let answer = roll_answer(None, &result(), AnswerFormat::WithoutExpression);
        let embed = answer.embed.unwrap();
        assert_eq!(embed.title, "2d6+3 ⇒ 9");
        assert_eq!(embed.description.as_deref(), Some("[4, 2]"));
    }

    #[test]
    fn test_compact_and_minimal_are_content_only() {
        let compact = roll_answer(None, &result(), AnswerFormat::Compact);
        assert_eq!(compact.content.as_deref(), Some("**2d6+3 ⇒ 9** [4, 2]"));
        assert!(compact.embed.is_none());

        let minimal = roll_answer(Some("Init"), &result(), AnswerFormat::Minimal);
        assert_eq!(minimal.content.as_deref(), Some("Init ⇒ 9"));
    }

    #[test]
    fn test_dropped_dice_struck_through() {
        let mut result = result();
        result.rolls[1].dropped = true;
        let answer = roll_answer(None, &result, AnswerFormat::WithoutExpression);
        assert_eq!(answer.embed.unwrap().description.as_deref(), Some("[4, ~~2~~]"));
    }

    #[test]
    fn test_mark_values() {
        assert_eq!(mark_values(&[6, 2, 5], |_, v| v >= 5), "[**6**, 2, **5**]");
        assert_eq!(mark_values(&[], |_, _| true), "[]");
    }
}
