use chrono::{DateTime, Local};
use texup_core::{Activity, AppViewModel};

/// Prints the status line whenever it changes, the way the page would redraw it.
#[derive(Debug, Default)]
pub struct StatusPrinter {
    last: Option<String>,
    quiet: bool,
}

impl StatusPrinter {
    pub fn new(quiet: bool) -> Self {
        Self { last: None, quiet }
    }

    pub fn render(&mut self, view: &AppViewModel) {
        if view.message == self.last {
            return;
        }
        self.last = view.message.clone();
        let Some(line) = status_line(view, Local::now()) else {
            return;
        };
        if view.activity == Activity::Failed {
            eprintln!("{line}");
        } else if !self.quiet {
            println!("{line}");
        }
    }
}

pub(crate) fn status_line(view: &AppViewModel, now: DateTime<Local>) -> Option<String> {
    let message = view.message.as_deref()?;
    let marker = match view.activity {
        Activity::Failed => "!",
        Activity::Finished => "✓",
        Activity::Ready => "*",
        _ => "-",
    };
    Some(format!("[{}] {} {}", now.format("%H:%M:%S"), marker, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 7).unwrap()
    }

    #[test]
    fn no_message_no_line() {
        assert_eq!(status_line(&AppViewModel::default(), at_noon()), None);
    }

    #[test]
    fn line_carries_time_and_marker() {
        let view = AppViewModel {
            message: Some("status: pending".to_string()),
            activity: Activity::Polling,
            ..AppViewModel::default()
        };
        assert_eq!(
            status_line(&view, at_noon()).as_deref(),
            Some("[12:00:07] - status: pending")
        );

        let failed = AppViewModel {
            message: Some("download failed: http status 404".to_string()),
            activity: Activity::Failed,
            ..AppViewModel::default()
        };
        assert_eq!(
            status_line(&failed, at_noon()).as_deref(),
            Some("[12:00:07] ! download failed: http status 404")
        );
    }
}
