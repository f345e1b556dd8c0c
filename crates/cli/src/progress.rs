use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress goes to stderr, and only when it is a terminal, so values piped
/// out of `get` stay clean.
fn draw_target() -> ProgressDrawTarget {
    if Term::stderr().is_term() {
        ProgressDrawTarget::stderr()
    } else {
        ProgressDrawTarget::hidden()
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, draw_target());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed}")
            .expect("valid spinner template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn create_progress(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total), draw_target());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.green/dim}] {pos}/{len} {msg}")
            .expect("valid progress template")
            .progress_chars("#- "),
    );
    pb.set_message(msg.to_string());
    pb
}
