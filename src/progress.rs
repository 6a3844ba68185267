use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use spinners_rs::{Spinner, Spinners};

// ESEQ is for "escape sequence"
pub const ESEQ_DELETE_LINE: &str = "\x1b[0J";
pub const ESEQ_RED: &str = "\x1b[38;5;1m";
pub const ESEQ_GREEN: &str = "\x1b[38;5;2m";
pub const ESEQ_WEAK: &str = "\x1b[38;5;240m";
pub const ESEQ_RESET: &str = "\x1b[m";

pub const SPINNER_MS: u64 = 50;

#[derive(Debug, Default)]
pub struct Reporter {
    captured: Option<Vec<String>>,
}

impl Reporter {
    pub fn stdout() -> Self {
        Self { captured: None }
    }

    #[cfg(test)]
    pub fn capturing() -> Self {
        Self {
            captured: Some(Vec::new()),
        }
    }

    pub fn step(&mut self, message: impl Display) {
        self.line(format!("· {message}"));
    }

    pub fn line(&mut self, message: impl Display) {
        match &mut self.captured {
            Some(lines) => lines.push(message.to_string()),
            None => println!("{message}"),
        }
    }

    pub fn lines(&self) -> &[String] {
        self.captured.as_deref().unwrap_or_default()
    }
}

pub struct ProgressView {
    task: String,
    spinner: Spinner,
    previous_update: Instant,
}

impl ProgressView {
    pub fn new(task: impl ToString) -> Self {
        let mut spinner = Spinner::new(Spinners::BouncingBar, task.to_string());
        spinner.set_interval(SPINNER_MS);

        Self {
            task: task.to_string(),
            spinner,
            previous_update: Instant::now(),
        }
    }

    pub fn with<T>(task: impl ToString, func: impl FnOnce(&mut Self) -> T) -> T {
        let mut view = Self::new(task);
        view.start();

        func(&mut view)
    }

    pub fn start(&mut self) {
        self.spinner.start();
    }

    pub fn report_intermediate(&mut self, progress: (usize, usize), comment: Option<&str>) {
        if self.previous_update.elapsed() <= Duration::from_millis(SPINNER_MS * 2) {
            return;
        }
        self.previous_update = Instant::now();

        self.spinner.set_message(format!(
            "{ESEQ_DELETE_LINE}[{}/{}] {}{}{ESEQ_RESET}",
            progress.0,
            progress.1,
            self.task,
            comment
                .map(|comment| format!("{ESEQ_WEAK} - {comment}"))
                .unwrap_or_default()
        ));
    }

    pub fn success(&mut self, message: Option<&str>) {
        self.finish(ESEQ_GREEN, '✓', message);
    }

    pub fn failure(&mut self, message: Option<&str>) {
        self.finish(ESEQ_RED, '!', message);
    }

    fn finish(&mut self, color: &str, mark: char, message: Option<&str>) {
        self.previous_update = Instant::now();

        self.spinner.stop_with_message(format!(
            "{ESEQ_DELETE_LINE}{color}{mark} {}{}{ESEQ_RESET}",
            self.task,
            message
                .map(|message| format!(" - {message}"))
                .unwrap_or_default()
        ));
        println!();
    }
}
