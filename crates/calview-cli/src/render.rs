use calview_core::datetime::{format_full, format_short, month_title, weekday_index};
use calview_core::state::{DayPopup, EventDetails, MAX_EVENTS_PER_DAY};
use calview_core::urgency::Urgency;
use calview_core::widget::LOAD_FAILURE_MESSAGE;
use calview_core::{CalendarEvent, GridCell, ViewState};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MINI_CELL_WIDTH: usize = 3;
const MONTH_CELL_WIDTH: usize = 14;
const WEEK_LABEL_WIDTH: usize = 11;
const EVENT_MARKER: &str = "\u{2022}";
const NO_EVENTS: &str = "\u{2014}";
const EMPTY_COUNTDOWN: &str = "No upcoming due dates found.";

const BOLD: &str = "1";
const DIM: &str = "2";
const UNDERLINE: &str = "4";
const INVERSE: &str = "7";
const RED: &str = "31";
const YELLOW: &str = "33";
const CYAN: &str = "36";

/// Plain-text renderer for the three views and both popups.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Mini month with the selected week highlighted, then the expanded week.
    #[tracing::instrument(skip_all)]
    pub fn weekly(&self, view: &ViewState) -> String {
        let index = view.index();
        let grid = view.mini_month_grid();
        let mut lines = Vec::new();

        lines.push(self.paint(
            &format!("\u{2190} {} \u{2192}", month_title(grid.cursor())),
            BOLD,
        ));
        lines.push(
            DAY_NAMES
                .iter()
                .map(|name| fit_right(&name[..1], MINI_CELL_WIDTH))
                .collect::<String>(),
        );

        for row in grid.rows() {
            let line = row
                .iter()
                .map(|cell| {
                    let marker = if index.has_events_on(cell.date) {
                        EVENT_MARKER
                    } else {
                        " "
                    };
                    let text = format!("{:>2}{marker}", cell.day());
                    let mut codes = Vec::new();
                    if !cell.in_current_month {
                        codes.push(DIM);
                    }
                    if view.is_in_selected_week(cell.date) {
                        codes.push(UNDERLINE);
                    }
                    if view.is_today(cell.date) {
                        codes.push(INVERSE);
                    }
                    self.paint(&text, &codes.join(";"))
                })
                .collect::<String>();
            lines.push(line);
        }

        lines.push(String::new());
        lines.push(self.paint(&view.selected_week_label(), BOLD));

        for day in view.selected_week_days() {
            let label = fit(
                &format!(
                    "{} {}",
                    DAY_NAMES[weekday_index(day.date) as usize],
                    format_short(day.date)
                ),
                WEEK_LABEL_WIDTH,
            );
            let label = if day.is_today {
                self.paint(&label, INVERSE)
            } else if day.has_due {
                self.paint(&label, RED)
            } else {
                label
            };

            let events = if day.events.is_empty() {
                self.paint(NO_EVENTS, DIM)
            } else {
                day.events
                    .iter()
                    .map(|event| self.chip(event, None))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            lines.push(format!("{label} \u{2502} {events}"));
        }

        lines.join("\n")
    }

    /// Countdown sections for upcoming due events.
    #[tracing::instrument(skip_all)]
    pub fn upcoming(&self, view: &ViewState) -> String {
        let buckets = view.urgency_buckets();
        if buckets.is_empty() {
            return EMPTY_COUNTDOWN.to_string();
        }

        let mut lines = Vec::new();
        for urgency in [Urgency::Urgent, Urgency::Soon, Urgency::Later] {
            let entries = buckets.bucket(urgency);
            if entries.is_empty() {
                continue;
            }
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(self.paint(urgency.heading(), BOLD));

            let code = match urgency {
                Urgency::Urgent => RED,
                Urgency::Soon => YELLOW,
                Urgency::Later => CYAN,
            };
            for entry in entries {
                let badge = format!("{:>3} {:<4}", entry.days, entry.day_label());
                lines.push(format!(
                    "  {}  {}  {}",
                    self.paint(&badge, code),
                    entry.event.title,
                    self.paint(&format_full(entry.date), DIM)
                ));
            }
        }

        lines.join("\n")
    }

    /// The displayed month as a 6x7 grid of day cells.
    #[tracing::instrument(skip_all)]
    pub fn monthly(&self, view: &ViewState) -> String {
        let grid = view.displayed_month_grid();
        let separator = vec!["\u{2500}".repeat(MONTH_CELL_WIDTH); DAY_NAMES.len()]
            .join("\u{253c}");
        let mut lines = Vec::new();

        lines.push(self.paint(&month_title(grid.cursor()), BOLD));
        lines.push(
            DAY_NAMES
                .iter()
                .map(|name| fit(name, MONTH_CELL_WIDTH))
                .collect::<Vec<_>>()
                .join("\u{2502}"),
        );
        lines.push(separator.clone());

        for row in grid.rows() {
            let cells = row
                .iter()
                .map(|cell| self.month_cell(view, cell))
                .collect::<Vec<_>>();
            let height = cells.first().map(Vec::len).unwrap_or(0);
            for line in 0..height {
                lines.push(
                    cells
                        .iter()
                        .map(|cell| cell[line].as_str())
                        .collect::<Vec<_>>()
                        .join("\u{2502}"),
                );
            }
            lines.push(separator.clone());
        }

        lines.join("\n")
    }

    pub fn day_popup(&self, popup: &DayPopup<'_>) -> String {
        let mut lines = vec![self.paint(&popup.title, BOLD)];
        if popup.events.is_empty() {
            lines.push(self.paint("  No events.", DIM));
        }
        for event in &popup.events {
            lines.push(format!("  {} {}", EVENT_MARKER, self.chip(event, None)));
        }
        lines.join("\n")
    }

    pub fn event_popup(&self, details: &EventDetails) -> String {
        let title = if details.is_due {
            self.paint(&details.title, &format!("{BOLD};{RED}"))
        } else {
            self.paint(&details.title, BOLD)
        };
        [
            title,
            self.paint(&details.when, DIM),
            String::new(),
            details.description.clone(),
        ]
        .join("\n")
    }

    /// Replaces any of the views once loading has failed.
    pub fn error_state(&self) -> String {
        self.paint(LOAD_FAILURE_MESSAGE, RED)
    }

    fn month_cell(&self, view: &ViewState, cell: &GridCell) -> Vec<String> {
        let mut lines = Vec::with_capacity(MAX_EVENTS_PER_DAY + 2);

        let number = fit(&cell.day().to_string(), MONTH_CELL_WIDTH);
        lines.push(if view.is_today(cell.date) {
            self.paint(&number, INVERSE)
        } else if !cell.in_current_month || view.is_past(cell.date) {
            self.paint(&number, DIM)
        } else {
            number
        });

        let preview = view.day_preview(cell.date);
        for event in &preview.shown {
            lines.push(self.chip(event, Some(MONTH_CELL_WIDTH)));
        }
        if preview.hidden > 0 {
            lines.push(self.paint(
                &fit(&format!("+{} more", preview.hidden), MONTH_CELL_WIDTH),
                DIM,
            ));
        }

        while lines.len() < MAX_EVENTS_PER_DAY + 2 {
            lines.push(fit("", MONTH_CELL_WIDTH));
        }
        lines
    }

    fn chip(&self, event: &CalendarEvent, width: Option<usize>) -> String {
        let text = if event.is_due() {
            format!("! {}", event.title)
        } else {
            event.title.clone()
        };
        let text = match width {
            Some(width) => fit(&text, width),
            None => text,
        };
        if event.is_due() {
            self.paint(&text, RED)
        } else {
            text
        }
    }

    fn paint(&self, s: &str, code: &str) -> String {
        if self.color && !code.is_empty() {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }
}

/// Pads or truncates `text` to exactly `width` display columns.
pub fn fit(text: &str, width: usize) -> String {
    let text_width = UnicodeWidthStr::width(text);
    if text_width <= width {
        return format!("{text}{}", " ".repeat(width - text_width));
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('\u{2026}');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn fit_right(text: &str, width: usize) -> String {
    let text_width = UnicodeWidthStr::width(text);
    format!("{}{text}", " ".repeat(width.saturating_sub(text_width)))
}
