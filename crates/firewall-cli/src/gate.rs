//! Terminal confirmation gate.

use std::io::{BufRead, Write};

use color_eyre::eyre::{Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use firewall_data::{RiskAssessment, RiskLevel, Transaction};
use firewall_engine::gate::{
    acknowledgement_authorizes, summary_rows, ConfirmationGate, HIGH_RISK_ACKNOWLEDGEMENT,
};

const COLOR_RESET: &str = "\x1b[0m";

pub fn level_color(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Safe => "\x1b[32m",    // Green
        RiskLevel::Caution => "\x1b[33m", // Yellow
        RiskLevel::High => "\x1b[31m",    // Red
    }
}

/// Summary table followed by the numbered reasons.
pub fn assessment_table(assessment: &RiskAssessment, tx: &Transaction) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Field", "Value"]);

    for (label, value) in summary_rows(assessment, tx) {
        let value = if label == "Risk level" {
            format!("{}{}{}", level_color(assessment.level()), value, COLOR_RESET)
        } else {
            value
        };
        table.add_row(vec![label.to_string(), value]);
    }

    for (i, reason) in assessment.reasons().iter().enumerate() {
        table.add_row(vec![format!("Reason {}", i + 1), reason.clone()]);
    }
    table
}

/// Prompts on a line-oriented terminal.
pub struct TerminalGate<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ConfirmationGate for TerminalGate<R, W> {
    fn confirm(&mut self, assessment: &RiskAssessment, tx: &Transaction) -> Result<bool> {
        writeln!(self.output, "\n{}\n", assessment_table(assessment, tx))?;

        if assessment.level() == RiskLevel::High {
            write!(
                self.output,
                "This transaction is HIGH RISK. Type {HIGH_RISK_ACKNOWLEDGEMENT} to sign anyway: "
            )?;
        } else {
            write!(self.output, "Proceed with signing? [y/N]: ")?;
        }
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .wrap_err("failed to read confirmation")?;
        if read == 0 {
            return Ok(false);
        }
        Ok(acknowledgement_authorizes(assessment.level(), &line))
    }
}
