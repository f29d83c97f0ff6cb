use anyhow::Context;
use riskpick_core::domain::contract::{QuizAnswer, QuizAnswers};
use riskpick_core::domain::risk::QUIZ;
use std::io::{BufRead, Write};

/// Parses `--answers`: five comma-separated weights (1-3) or choice labels.
pub fn parse_answers(raw: &str) -> QuizAnswers {
    QuizAnswers(
        raw.split(',')
            .map(|t| {
                let t = t.trim();
                match t.parse::<i64>() {
                    Ok(w) => QuizAnswer::Weight(w),
                    Err(_) => QuizAnswer::Label(t.to_string()),
                }
            })
            .collect(),
    )
}

/// Asks each question in turn until a valid choice is entered.
pub fn prompt_answers<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> anyhow::Result<Vec<u8>> {
    writeln!(out, "Risk Tolerance Quiz")?;

    let mut weights = Vec::with_capacity(QUIZ.len());
    for (idx, question) in QUIZ.iter().enumerate() {
        writeln!(out, "\n{}. {}", idx + 1, question.prompt)?;
        for (i, choice) in question.choices.iter().enumerate() {
            writeln!(out, "   [{}] {}", i + 1, choice)?;
        }

        loop {
            write!(out, "> ")?;
            out.flush()?;

            let mut line = String::new();
            let n = input.read_line(&mut line).context("failed to read quiz answer")?;
            anyhow::ensure!(n > 0, "quiz aborted: no answer for question {}", idx + 1);

            let line = line.trim();
            let weight = match line.parse::<u8>() {
                Ok(w) if (1..=3).contains(&w) => Some(w),
                Ok(_) => None,
                Err(_) => question.weight_of(line),
            };

            match weight {
                Some(w) => {
                    weights.push(w);
                    break;
                }
                None => writeln!(out, "Please pick 1, 2 or 3.")?,
            }
        }
    }

    Ok(weights)
}
