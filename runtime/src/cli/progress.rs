//! Progress display for a classification batch.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// A bar over `total` URLs, drawn on stderr. Hidden when `visible` is false.
pub fn create_batch_progress(total: usize, visible: bool) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    if !visible {
        bar.set_draw_target(ProgressDrawTarget::hidden());
        return bar;
    }
    if let Ok(style) = ProgressStyle::with_template(
        "  {spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}",
    ) {
        bar.set_style(style.progress_chars("\u{2588}\u{2589}\u{2591}"));
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// A spinner for steps with unknown length, like sitemap discovery.
pub fn create_spinner(message: &str, visible: bool) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if !visible {
        bar.set_draw_target(ProgressDrawTarget::hidden());
        return bar;
    }
    if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
        bar.set_style(style.tick_chars("\u{25b8}\u{25b9}\u{25b8}\u{25b9}\u{25b8}"));
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
