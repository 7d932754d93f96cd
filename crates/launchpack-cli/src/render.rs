use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use launchpack_installer::InstallPhase;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Renderer {
    style: OutputStyle,
}

impl Renderer {
    pub(crate) fn stdout() -> Self {
        let style = if std::io::stdout().is_terminal() {
            OutputStyle::Rich
        } else {
            OutputStyle::Plain
        };
        Self { style }
    }

    pub(crate) fn status(&self, status: &str, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn warn(&self, message: &str) {
        eprintln!("{}", render_status_line(self.style, "warning", message));
    }

    pub(crate) fn start_install_progress(&self) -> InstallProgress {
        let bar = if self.style == OutputStyle::Rich {
            let bar = ProgressBar::new(100);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan.bold} {msg:<24} [{bar:20.cyan/blue}] {pos:>3}%",
            ) {
                bar.set_style(style.progress_chars("=>-"));
            }
            bar.enable_steady_tick(Duration::from_millis(80));
            Some(bar)
        } else {
            None
        };
        InstallProgress {
            style: self.style,
            bar,
        }
    }
}

pub(crate) struct InstallProgress {
    style: OutputStyle,
    bar: Option<ProgressBar>,
}

impl InstallProgress {
    pub(crate) fn phase(&mut self, phase: InstallPhase) {
        match &self.bar {
            Some(bar) => {
                bar.set_position(u64::from(phase.percent()));
                bar.set_message(phase.label().to_string());
            }
            None => {
                println!(
                    "{}",
                    render_status_line(
                        self.style,
                        "progress",
                        &format!("{} ({}%)", phase.label(), phase.percent())
                    )
                );
            }
        }
    }

    pub(crate) fn transfer(&mut self, bytes: u64, total: u64) {
        let Some(bar) = &self.bar else {
            return;
        };
        let counts = if total > 0 {
            format!("{} / {}", HumanBytes(bytes), HumanBytes(total))
        } else {
            format!("{}", HumanBytes(bytes))
        };
        bar.set_message(format!("downloading {counts}"));
    }

    pub(crate) fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => format!("{status}: {message}"),
        OutputStyle::Rich => format!("{}: {message}", colorize(status_style(), status)),
    }
}

fn status_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightGreen.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
