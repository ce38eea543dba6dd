use crate::monitoring::domain::{ApplicationRecord, RiskAssessment, RiskLevel};
use owo_colors::OwoColorize;
use std::io::{self, IsTerminal, Write};

/// ScanPresenter renders a one-shot inventory scan for the terminal
pub struct ScanPresenter {
    colored: bool,
}

impl ScanPresenter {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    /// Colours output only when stdout is a terminal.
    pub fn for_stdout() -> Self {
        Self::new(io::stdout().is_terminal())
    }

    fn level_label(&self, level: RiskLevel) -> String {
        let label = format!("{:<8}", level.as_str());
        if !self.colored {
            return label;
        }
        match level {
            RiskLevel::Critical => label.red().bold().to_string(),
            RiskLevel::High => label.red().to_string(),
            RiskLevel::Medium => label.yellow().to_string(),
            RiskLevel::Low => label.green().to_string(),
        }
    }

    pub fn render(&self, entries: &[(ApplicationRecord, RiskAssessment)]) -> String {
        let mut out = String::new();
        for (record, assessment) in entries {
            let version = if record.version().is_empty() { "-" } else { record.version() };
            out.push_str(&format!(
                "{} {} {} ({})\n",
                self.level_label(assessment.level()),
                record.name(),
                version,
                record.key()
            ));
            if !assessment.flags().is_empty() {
                let flags = assessment
                    .flags()
                    .iter()
                    .map(|f| f.description())
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&format!("         flags: {flags}\n"));
                out.push_str(&format!("         action: {}\n", assessment.recommended_action()));
            }
        }

        let flagged = entries.iter().filter(|(_, a)| a.level() >= RiskLevel::Medium).count();
        let summary = format!("{} applications, {} flagged", entries.len(), flagged);
        if self.colored {
            out.push_str(&format!("\n{}\n", summary.bold()));
        } else {
            out.push_str(&format!("\n{summary}\n"));
        }
        out
    }

    pub fn present(&self, entries: &[(ApplicationRecord, RiskAssessment)]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(self.render(entries).as_bytes())?;
        stdout.flush()
    }
}
