use std::io::Write;

/// Every bar the tool draws, so log lines can be printed around them.
fn bars() -> &'static indicatif::MultiProgress {
    static BARS: std::sync::OnceLock<indicatif::MultiProgress> = std::sync::OnceLock::new();
    BARS.get_or_init(indicatif::MultiProgress::new)
}

/// Creates a progress bar for `len` photos labelled with `message`.
///
/// Draws to stderr and stays hidden when stderr is not a terminal, so log
/// output and test runs are not cluttered.
pub fn photo_bar(len: usize, message: &'static str) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new(len as u64);
    let style = indicatif::ProgressStyle::with_template(
        "{msg:>10} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )
    .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
    .progress_chars("=> ");
    bar.set_style(style);
    bar.set_message(message);
    bars().add(bar)
}

/// Writer that clears the active bars while a log line is written, then
/// redraws them below it.
#[derive(Debug)]
pub struct SuspendedWriter<W>(W);

impl<W: Write> Write for SuspendedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let inner = &mut self.0;
        bars().suspend(|| inner.write(buf))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

/// `tracing` writer for stderr that keeps log lines from tearing the bars.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogWriter {
    type Writer = SuspendedWriter<std::io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendedWriter(std::io::stderr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_bar_tracks_length() {
        let bar = photo_bar(3, "Matching");
        assert_eq!(bar.length(), Some(3));
        bar.inc(2);
        assert_eq!(bar.position(), 2);
        bar.finish_and_clear();
    }

    #[test]
    fn test_log_line_written_while_bar_active() {
        let bar = photo_bar(10, "Writing");
        bar.inc(4);

        let mut writer = SuspendedWriter(Vec::new());
        writer
            .write_all(b"WARN Skipping file a.jpg because it already has GPS metadata\n")
            .unwrap();
        writer.flush().unwrap();

        assert_eq!(
            writer.0,
            b"WARN Skipping file a.jpg because it already has GPS metadata\n".to_vec()
        );
        assert_eq!(bar.position(), 4);
        assert!(!bar.is_finished());
        bar.finish_and_clear();
    }
}
