/// Progress bars for long-running ingestion
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar in the house style, counting `unit`s
pub fn progress_bar(len: u64, unit: &str, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let template = format!("[{{bar:40.green/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}", unit);
    let style = ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("▉▊▋▌▍▎▏ ");
    pb.set_style(style);
    pb.set_message(message);
    pb
}
