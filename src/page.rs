//! Static portfolio content laid out as rows of text, with one-shot fade-in
//! once a section first scrolls into view.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::experience::{CategoryFilter, Experience};

/// Id of the section whose body is generated from [`Experience`].
pub const EXPERIENCE_SECTION: &str = "experience";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lines: Vec<String>,
}

impl Section {
    pub fn new(id: &str, title: &str, lines: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            lines: lines.iter().map(|line| line.to_string()).collect(),
        }
    }
}

/// The stock portfolio shown when the config does not supply sections.
pub fn default_sections() -> Vec<Section> {
    vec![
        Section::new(
            "hero",
            "Alex Morgan",
            &[
                "Systems engineer. I build fast, boring, reliable software.",
                "",
                "Scroll with the mouse wheel, arrows, PgUp/PgDn, Home/End. q to quit.",
                "Jump with 1-8 or Tab/Shift+Tab, t for top. Filter experience",
                "with a/e/w and switch entries with Left/Right or h/l.",
            ],
        ),
        // Body comes from the experience entries
        Section::new(EXPERIENCE_SECTION, "Experience", &[]),
        Section::new(
            "skills",
            "Skills",
            &[
                "Languages   Rust, C, Go, TypeScript, SQL",
                "Systems     Linux, networking, storage engines, profiling",
                "Practice    design reviews, incident response, mentoring",
            ],
        ),
        Section::new(
            "projects",
            "Projects",
            &[
                "tidepool    log-structured key-value store with crash-safe compaction",
                "wirecat     packet capture viewer for the terminal",
                "starfield   this page",
            ],
        ),
        Section::new(
            "certificates",
            "Certificates",
            &[
                "Certified Kubernetes Administrator (2023)",
                "AWS Solutions Architect, Associate (2021)",
            ],
        ),
        Section::new(
            "resume",
            "Resume",
            &["Full resume available on request, PDF or plain text."],
        ),
        Section::new(
            "contact",
            "Contact",
            &[
                "mail     alex@example.com",
                "github   github.com/example",
            ],
        ),
        Section::new("footer", "", &["Built with Rust and a lot of stars."]),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Title,
    Body,
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub section: usize,
    pub kind: RowKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default)]
struct Reveal {
    revealed: bool,
    progress: f32,
}

pub struct Page {
    sections: Vec<Section>,
    experience: Option<Experience>,
    rows: Vec<Row>,
    spans: Vec<Range<usize>>,
    reveal: Vec<Reveal>,
    reveal_secs: f32,
}

impl Page {
    pub fn new(sections: Vec<Section>, reveal_secs: f32) -> Self {
        let (rows, spans) = Self::layout(&sections, None);
        let reveal = vec![Reveal::default(); sections.len()];
        Self {
            sections,
            experience: None,
            rows,
            spans,
            reveal,
            reveal_secs,
        }
    }

    /// Renders `experience` into the section with id `experience`. Without
    /// such a section the entries are kept but not shown.
    pub fn with_experience(mut self, experience: Experience) -> Self {
        self.experience = Some(experience);
        self.relayout();
        self
    }

    fn relayout(&mut self) {
        let (rows, spans) = Self::layout(&self.sections, self.experience.as_ref());
        self.rows = rows;
        self.spans = spans;
    }

    /// Title row, body rows, then one blank separator per section. Untitled
    /// sections skip the title row.
    fn layout(sections: &[Section], experience: Option<&Experience>) -> (Vec<Row>, Vec<Range<usize>>) {
        let mut rows = Vec::new();
        let mut spans = Vec::with_capacity(sections.len());

        for (index, section) in sections.iter().enumerate() {
            let start = rows.len();
            if !section.title.is_empty() {
                rows.push(Row {
                    section: index,
                    kind: RowKind::Title,
                    text: section.title.clone(),
                });
            }
            let generated = match experience {
                Some(experience) if section.id == EXPERIENCE_SECTION => experience.lines(),
                _ => Vec::new(),
            };
            for line in section.lines.iter().chain(&generated) {
                rows.push(Row {
                    section: index,
                    kind: RowKind::Body,
                    text: line.clone(),
                });
            }
            rows.push(Row {
                section: index,
                kind: RowKind::Blank,
                text: String::new(),
            });
            spans.push(start..rows.len());
        }

        (rows, spans)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn height_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn section_rows(&self, section: usize) -> Option<Range<usize>> {
        self.spans.get(section).cloned()
    }

    /// Index of the section containing `row`.
    pub fn section_at(&self, row: usize) -> Option<usize> {
        self.spans.iter().position(|span| span.contains(&row))
    }

    /// Scroll offset in pixels that puts the first row of `section` at the
    /// top of the viewport. `None` for a section that does not exist.
    pub fn jump_target(&self, section: usize, cell_height: f64) -> Option<f64> {
        self.spans.get(section).map(|span| span.start as f64 * cell_height)
    }

    /// First section starting below `row`.
    pub fn next_section(&self, row: usize) -> Option<usize> {
        self.spans.iter().position(|span| span.start > row)
    }

    /// Last section starting above `row`, so from the middle of a section
    /// this is the section's own start.
    pub fn prev_section(&self, row: usize) -> Option<usize> {
        self.spans.iter().rposition(|span| span.start < row)
    }

    pub fn experience(&self) -> Option<&Experience> {
        self.experience.as_ref()
    }

    /// Applies `change` to the experience entries and lays the page out
    /// again when it reports a change. Returns that report.
    fn edit_experience(&mut self, change: impl FnOnce(&mut Experience) -> bool) -> bool {
        let Some(experience) = self.experience.as_mut() else {
            return false;
        };
        let changed = change(experience);
        if changed {
            self.relayout();
        }
        changed
    }

    pub fn set_experience_filter(&mut self, filter: CategoryFilter) -> bool {
        self.edit_experience(|experience| experience.set_filter(filter))
    }

    pub fn next_experience_tab(&mut self) -> bool {
        self.edit_experience(Experience::next_tab)
    }

    pub fn prev_experience_tab(&mut self) -> bool {
        self.edit_experience(Experience::prev_tab)
    }

    /// Reveals every section with at least one row in
    /// `first_row..first_row + visible_rows`. Returns how many were newly
    /// revealed; revealed sections stay revealed.
    pub fn observe(&mut self, first_row: usize, visible_rows: usize) -> usize {
        let window_end = first_row.saturating_add(visible_rows);
        let mut newly = 0;
        for (span, reveal) in self.spans.iter().zip(self.reveal.iter_mut()) {
            let intersects = span.start < window_end && first_row < span.end;
            if intersects && !reveal.revealed {
                reveal.revealed = true;
                if self.reveal_secs <= 0.0 {
                    reveal.progress = 1.0;
                }
                newly += 1;
            }
        }
        if newly > 0 {
            log::debug!("Revealed {} section(s) at row {}", newly, first_row);
        }
        newly
    }

    /// Advances fade-in of revealed sections.
    pub fn update(&mut self, dt: f32) {
        if self.reveal_secs <= 0.0 {
            return;
        }
        let step = dt / self.reveal_secs;
        for reveal in self.reveal.iter_mut().filter(|r| r.revealed) {
            reveal.progress = (reveal.progress + step).min(1.0);
        }
    }

    pub fn is_revealed(&self, section: usize) -> bool {
        self.reveal.get(section).is_some_and(|r| r.revealed)
    }

    /// 0.0 until revealed, then rising to 1.0.
    pub fn opacity(&self, section: usize) -> f32 {
        self.reveal.get(section).map_or(0.0, |r| r.progress)
    }
}
