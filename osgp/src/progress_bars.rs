#[cfg(feature = "progress")]
mod imp {
    use std::io::IsTerminal;
    use std::time::{Duration, Instant};

    use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

    use crate::algorithm::GenerationReport;

    pub(crate) struct SearchProgress {
        show: bool,
        bar: ProgressBar,
        msg_min_interval: Duration,
        last_msg_update: Instant,
        ansi: bool,
    }

    impl SearchProgress {
        pub(crate) fn new(enabled: bool, generations: usize) -> Self {
            let show = enabled && std::io::stderr().is_terminal();
            let ansi = console::colors_enabled_stderr();

            let bar = if show {
                let pb = ProgressBar::new(generations as u64);
                pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
                pb.set_prefix(format!("Evolving for {generations} generations..."));
                match ProgressStyle::with_template(
                    "{prefix} {wide_bar} {pos:>7}/{len:7} [{elapsed_precise}<{eta_precise}]\n{msg}",
                ) {
                    Ok(style) => pb.set_style(style),
                    Err(e) => log::debug!("progress template rejected: {e}"),
                }
                pb
            } else {
                ProgressBar::hidden()
            };

            Self {
                show,
                bar,
                msg_min_interval: Duration::from_millis(500),
                last_msg_update: Instant::now(),
                ansi,
            }
        }

        pub(crate) fn on_generation(&mut self, report: &GenerationReport, is_last: bool) {
            if !self.show {
                return;
            }
            self.bar.set_position(report.generation as u64);
            let now = Instant::now();
            if now.duration_since(self.last_msg_update) < self.msg_min_interval && !is_last {
                return;
            }
            let width = {
                let (_, w) = console::Term::stderr().size();
                (w as usize).max(80)
            };
            let line = format!(
                "r2 train {:.4} test {:.4} | pressure {:.2} | evals {} (local {})",
                report.r2_train, report.r2_test, report.selection_pressure, report.total_evaluations, report.local_evaluations,
            );
            let line = if self.ansi {
                console::truncate_str(&line, width - 1, "").into_owned()
            } else {
                line.chars().take(width - 1).collect()
            };
            self.bar.set_message(line);
            self.last_msg_update = now;
        }

        pub(crate) fn finish(&self) {
            if self.show {
                self.bar.finish();
            }
        }
    }
}

#[cfg(not(feature = "progress"))]
mod imp {
    use crate::algorithm::GenerationReport;

    pub(crate) struct SearchProgress;

    impl SearchProgress {
        pub(crate) fn new(_enabled: bool, _generations: usize) -> Self {
            Self
        }

        pub(crate) fn on_generation(&mut self, _report: &GenerationReport, _is_last: bool) {}

        pub(crate) fn finish(&self) {}
    }
}

pub(crate) use imp::SearchProgress;
