//! Terminal driver: runs a flow over stdin/stdout for local use.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast;

use crate::error::PurchaseError;
use crate::flow::{Advance, Answer, FlowController, FlowEvent, FlowOutcome, Step, StepKind};
use crate::paywall::{Product, PurchaseCapability};

/// What a line of input means on the current step.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Back,
    Quit,
    /// Move on, optionally recording an answer first.
    Next(Option<Answer>),
}

/// Interpret a line typed while `step` is shown.
///
/// Choice steps take the 1-based option number. Dates use `YYYY-MM-DD`.
/// A blank line just tries to advance.
pub fn parse_input(step: &Step, line: &str) -> Result<Input, String> {
    let line = line.trim();
    match line {
        "/back" => return Ok(Input::Back),
        "/quit" => return Ok(Input::Quit),
        "" => return Ok(Input::Next(None)),
        _ => {}
    }

    let answer = match step.kind {
        StepKind::SingleChoice => {
            let n: usize = line
                .parse()
                .map_err(|_| format!("Pick a number from 1 to {}", step.options.len()))?;
            let option = n
                .checked_sub(1)
                .and_then(|i| step.options.get(i))
                .ok_or_else(|| format!("Pick a number from 1 to {}", step.options.len()))?;
            Answer::choice(option.value.clone())
        }
        StepKind::DateInput => NaiveDate::parse_from_str(line, "%Y-%m-%d")
            .map(Answer::Date)
            .map_err(|_| "Enter a date as YYYY-MM-DD".to_string())?,
        StepKind::TextInput => Answer::text(line),
        _ => return Ok(Input::Next(None)),
    };
    Ok(Input::Next(Some(answer)))
}

pub fn render_step(step: &Step, index: usize, count: usize) -> String {
    let mut out = format!("[{}/{}] {}", index + 1, count, step.title);
    if !step.body.is_empty() {
        out.push_str(&format!("\n    {}", step.body));
    }
    for (i, option) in step.options.iter().enumerate() {
        out.push_str(&format!("\n    {}. {}", i + 1, option.label));
    }
    if step.kind == StepKind::DateInput {
        out.push_str("\n    (YYYY-MM-DD)");
    }
    out
}

/// Line reader over stdin.
pub struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `prompt` and read one line. `None` on EOF.
    pub async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        eprint!("{prompt}> ");
        self.lines.next_line().await
    }

    /// Drive `controller` until it completes. Returns `None` if the user
    /// quit or stdin closed first.
    pub async fn run_flow(
        &mut self,
        controller: &FlowController,
    ) -> anyhow::Result<Option<FlowOutcome>> {
        let mut events = controller.subscribe();
        let count = controller.sequence().step_count();

        loop {
            let index = controller.current_index().await;
            let step = controller.current_step().await;
            println!("\n{}", render_step(&step, index, count));

            let Some(line) = self.ask("").await? else {
                return Ok(None);
            };
            let input = match parse_input(&step, &line) {
                Ok(input) => input,
                Err(hint) => {
                    eprintln!("   {hint}");
                    continue;
                }
            };

            match input {
                Input::Quit => return Ok(None),
                Input::Back => {
                    controller.retreat().await?;
                }
                Input::Next(answer) => {
                    if let Some(answer) = answer {
                        controller.set_answer(&step.id, answer).await?;
                    }
                    match controller.advance().await? {
                        Advance::Moved(_) => {}
                        Advance::Blocked => eprintln!("   This one needs an answer."),
                        Advance::Submitting => {
                            println!("\n{}", controller.current_step().await.title);
                            return wait_for_outcome(&mut events, controller).await;
                        }
                    }
                }
            }
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_outcome(
    events: &mut broadcast::Receiver<FlowEvent>,
    controller: &FlowController,
) -> anyhow::Result<Option<FlowOutcome>> {
    loop {
        match events.recv().await {
            Ok(FlowEvent::Completed { flow_id, outcome }) if flow_id == controller.id() => {
                return Ok(Some(outcome));
            }
            Ok(FlowEvent::Failed { flow_id, reason }) if flow_id == controller.id() => {
                anyhow::bail!("{} flow failed: {reason}", controller.name());
            }
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return Ok(None),
        }
    }
}

/// Purchase capability for running without a platform store: lists the
/// configured products and approves every purchase the user confirms.
pub struct DemoStoreFront {
    products: Vec<Product>,
}

impl DemoStoreFront {
    pub fn new(ids: &[String]) -> Self {
        let products = ids
            .iter()
            .map(|id| {
                let period = if id.ends_with("yearly") { "year" } else { "week" };
                let price = if period == "year" { "$39.99" } else { "$4.99" };
                Product {
                    id: id.clone(),
                    title: format!("Dream Journal Premium ({period}ly)"),
                    price_label: price.to_string(),
                    period: period.to_string(),
                }
            })
            .collect();
        Self { products }
    }
}

#[async_trait]
impl PurchaseCapability for DemoStoreFront {
    async fn get_product(&self, id: &str) -> Result<Option<Product>, PurchaseError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn purchase(&self, _product: &Product) -> Result<bool, PurchaseError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::StepOption;

    fn choice_step() -> Step {
        Step::single_choice(
            "recall",
            "How often?",
            vec![StepOption::new("Never", "never"), StepOption::new("Often", "often")],
        )
    }

    #[test]
    fn choice_input_is_one_based() {
        let step = choice_step();
        assert_eq!(
            parse_input(&step, "2").unwrap(),
            Input::Next(Some(Answer::choice("often")))
        );
        assert!(parse_input(&step, "0").is_err());
        assert!(parse_input(&step, "3").is_err());
        assert!(parse_input(&step, "often").is_err());
    }

    #[test]
    fn date_input_parses_iso_dates() {
        let step = Step::date_input("birth_date", "Birth date");
        assert_eq!(
            parse_input(&step, " 1990-03-14 ").unwrap(),
            Input::Next(Some(Answer::Date(
                NaiveDate::from_ymd_opt(1990, 3, 14).unwrap()
            )))
        );
        assert!(parse_input(&step, "14/03/1990").is_err());
    }

    #[test]
    fn commands_and_blank_lines() {
        let step = choice_step();
        assert_eq!(parse_input(&step, "/back").unwrap(), Input::Back);
        assert_eq!(parse_input(&step, "/quit").unwrap(), Input::Quit);
        assert_eq!(parse_input(&step, "   ").unwrap(), Input::Next(None));

        let info = Step::info("welcome", "Hi");
        assert_eq!(parse_input(&info, "ok").unwrap(), Input::Next(None));
    }

    #[test]
    fn render_numbers_options() {
        let rendered = render_step(&choice_step(), 2, 5);
        assert!(rendered.starts_with("[3/5] How often?"));
        assert!(rendered.contains("1. Never"));
        assert!(rendered.contains("2. Often"));
    }

    #[tokio::test]
    async fn demo_store_front_lists_configured_products() {
        let front = DemoStoreFront::new(&["dream.weekly".to_string(), "dream.yearly".to_string()]);
        let yearly = front.get_product("dream.yearly").await.unwrap().unwrap();
        assert_eq!(yearly.period, "year");
        assert!(front.get_product("dream.lifetime").await.unwrap().is_none());
        assert!(front.purchase(&yearly).await.unwrap());
    }
}
