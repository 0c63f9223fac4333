use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "downloading {msg} {wide_bar} {bytes} of {total_bytes} ({bytes_per_sec})";
const SPINNER_TEMPLATE: &str = "downloading {msg} {spinner} {bytes} ({bytes_per_sec})";

/// Progress display for an archive download of `total` bytes, if known.
///
/// Returns a hidden bar when `enabled` is false so callers can wrap their
/// reader unconditionally.
pub fn download_bar(name: &str, total: Option<u64>, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let bar = match total {
        Some(len) => ProgressBar::new(len).with_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        ),
        None => ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        ),
    };
    bar.with_message(name.to_owned())
}
