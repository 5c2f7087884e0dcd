//! Education and work history with a category filter and a selected tab.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Education,
    Work,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Education,
    Work,
}

impl CategoryFilter {
    pub const ALL: [CategoryFilter; 3] = [CategoryFilter::All, CategoryFilter::Education, CategoryFilter::Work];

    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Education => category == Category::Education,
            CategoryFilter::Work => category == Category::Work,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CategoryFilter::All => "All",
            CategoryFilter::Education => "Education",
            CategoryFilter::Work => "Work",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub category: Category,
    pub title: String,
    pub organization: String,
    #[serde(default)]
    pub location: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub description: Vec<String>,
}

impl ExperienceEntry {
    pub fn new(category: Category, title: &str, organization: &str, location: &str, dates: (&str, &str)) -> Self {
        Self {
            category,
            title: title.to_string(),
            organization: organization.to_string(),
            location: location.to_string(),
            start: dates.0.to_string(),
            end: dates.1.to_string(),
            description: Vec::new(),
        }
    }

    pub fn with_description(mut self, lines: &[&str]) -> Self {
        self.description = lines.iter().map(|line| line.to_string()).collect();
        self
    }
}

pub fn default_entries() -> Vec<ExperienceEntry> {
    vec![
        ExperienceEntry::new(
            Category::Work,
            "Staff Engineer",
            "Lumen Storage",
            "Remote",
            ("2022", "Present"),
        )
        .with_description(&[
            "Block cache and cross-region replication",
            "Cut p99 read latency by 40%",
        ]),
        ExperienceEntry::new(
            Category::Work,
            "Senior Engineer",
            "Parcelwise",
            "Berlin",
            ("2019", "2022"),
        )
        .with_description(&["Routing service at 40k req/s", "On-call lead for the platform team"]),
        ExperienceEntry::new(
            Category::Work,
            "Engineer",
            "Brightline Labs",
            "Leeds",
            ("2016", "2019"),
        )
        .with_description(&["Embedded telemetry firmware"]),
        ExperienceEntry::new(
            Category::Education,
            "BSc Computer Science",
            "University of Leeds",
            "Leeds",
            ("2012", "2016"),
        )
        .with_description(&["Dissertation on log-structured storage"]),
    ]
}

/// Entries plus the viewer's current filter and tab. The tab indexes the
/// filtered list and returns to the first entry whenever the filter changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    entries: Vec<ExperienceEntry>,
    filter: CategoryFilter,
    active_tab: usize,
}

impl Experience {
    pub fn new(entries: Vec<ExperienceEntry>) -> Self {
        Self {
            entries,
            filter: CategoryFilter::All,
            active_tab: 0,
        }
    }

    pub fn entries(&self) -> &[ExperienceEntry] {
        &self.entries
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn active_tab(&self) -> usize {
        self.active_tab
    }

    /// Returns whether anything changed.
    pub fn set_filter(&mut self, filter: CategoryFilter) -> bool {
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        self.active_tab = 0;
        log::debug!("Experience filter set to {}", filter);
        true
    }

    pub fn filtered(&self) -> Vec<&ExperienceEntry> {
        self.entries.iter().filter(|entry| self.filter.matches(entry.category)).collect()
    }

    /// Out-of-range tabs are ignored.
    pub fn select_tab(&mut self, tab: usize) -> bool {
        if tab >= self.filtered().len() || tab == self.active_tab {
            return false;
        }
        self.active_tab = tab;
        true
    }

    pub fn next_tab(&mut self) -> bool {
        self.select_tab(self.active_tab + 1)
    }

    pub fn prev_tab(&mut self) -> bool {
        match self.active_tab.checked_sub(1) {
            Some(tab) => self.select_tab(tab),
            None => false,
        }
    }

    /// `None` when the filter leaves nothing to show.
    pub fn active(&self) -> Option<&ExperienceEntry> {
        self.filtered().get(self.active_tab).copied()
    }

    /// Body text for the experience section: filter bar, one tab per
    /// organization, then the selected entry.
    pub fn lines(&self) -> Vec<String> {
        let filters: Vec<String> = CategoryFilter::ALL
            .iter()
            .map(|filter| bracket(&filter.to_string(), *filter == self.filter))
            .collect();
        let mut lines = vec![filters.join(" ")];

        let filtered = self.filtered();
        let Some(entry) = filtered.get(self.active_tab) else {
            lines.push(String::new());
            lines.push("(no entries)".to_string());
            return lines;
        };

        let tabs: Vec<String> = filtered
            .iter()
            .enumerate()
            .map(|(index, entry)| bracket(&entry.organization, index == self.active_tab))
            .collect();
        lines.push(tabs.join(" "));
        lines.push(String::new());

        lines.push(entry.title.clone());
        if entry.location.is_empty() {
            lines.push(entry.organization.clone());
        } else {
            lines.push(format!("{} • {}", entry.organization, entry.location));
        }
        lines.push(format!("{} - {}", entry.start, entry.end));
        lines.extend(entry.description.iter().map(|line| format!("- {line}")));
        lines
    }
}

fn bracket(label: &str, selected: bool) -> String {
    if selected { format!("[{label}]") } else { format!(" {label} ") }
}
