//! Seasonal event calendar and keyword matching
//!
//! A static table of recurring promotional periods. Each event has a
//! month/day start and end (possibly crossing a month or year boundary)
//! and a keyword list. The scorer asks two questions: which events are
//! active on a date, and whether an offer's text matches an active event.

use chrono::{Datelike, NaiveDate};

/// A recurring promotional period
#[derive(Debug, Clone)]
pub struct SeasonalEvent {
    /// Event name (diagnostics and logs)
    pub name: &'static str,

    /// Start month (1-12) and day
    pub start: (u32, u32),

    /// End month (1-12) and day, inclusive; may be before `start` in the
    /// calendar, which makes the event cross the year boundary
    pub end: (u32, u32),

    /// Keywords matched against offer text, lowercase
    pub keywords: &'static [&'static str],
}

impl SeasonalEvent {
    /// Whether the event window contains the given date
    ///
    /// Same-month windows use plain day containment. Cross-month windows
    /// accept day >= start in the start month, day <= end in the end month
    /// and any day in months strictly between. Cross-year windows (end
    /// month before start month) reuse the cross-month test with the
    /// "between" months wrapping through December.
    pub fn is_active(&self, date: NaiveDate) -> bool {
        let (month, day) = (date.month(), date.day());
        let (start_month, start_day) = self.start;
        let (end_month, end_day) = self.end;

        if start_month == end_month && start_day <= end_day {
            return month == start_month && day >= start_day && day <= end_day;
        }

        if month == start_month {
            return day >= start_day;
        }
        if month == end_month {
            return day <= end_day;
        }

        if start_month < end_month {
            month > start_month && month < end_month
        } else {
            // Cross-year window, e.g. Dec 20 - Jan 5
            month > start_month || month < end_month
        }
    }

    /// First keyword contained in the text, if any (case-insensitive)
    pub fn matching_keyword(&self, text: &str) -> Option<&'static str> {
        let lowered = text.to_lowercase();
        self.keywords.iter().copied().find(|kw| lowered.contains(kw))
    }
}

/// Static calendar of recurring promotional events
#[derive(Debug, Clone)]
pub struct SeasonalCalendar {
    events: Vec<SeasonalEvent>,
}

impl SeasonalCalendar {
    /// Build the default promotional calendar
    pub fn new() -> Self {
        Self {
            events: vec![
                SeasonalEvent {
                    name: "new-year",
                    start: (1, 1),
                    end: (1, 15),
                    keywords: &["ano novo", "new year", "resolução", "fitness", "academia"],
                },
                SeasonalEvent {
                    name: "valentines",
                    start: (2, 1),
                    end: (2, 14),
                    keywords: &["valentine", "namorados", "romântico", "presente", "casal"],
                },
                SeasonalEvent {
                    name: "consumer-week",
                    start: (3, 10),
                    end: (3, 16),
                    keywords: &["consumidor", "consumer", "semana do consumidor"],
                },
                SeasonalEvent {
                    name: "mothers-day",
                    start: (4, 25),
                    end: (5, 14),
                    keywords: &["mãe", "mães", "mother", "presente para mãe"],
                },
                SeasonalEvent {
                    name: "winter-sale",
                    start: (6, 15),
                    end: (7, 31),
                    keywords: &["inverno", "winter", "casaco", "aquecedor", "cobertor"],
                },
                SeasonalEvent {
                    name: "back-to-school",
                    start: (7, 15),
                    end: (8, 15),
                    keywords: &["escolar", "school", "caderno", "mochila", "material"],
                },
                SeasonalEvent {
                    name: "childrens-day",
                    start: (9, 20),
                    end: (10, 12),
                    keywords: &["criança", "infantil", "brinquedo", "toy", "kids"],
                },
                SeasonalEvent {
                    name: "black-friday",
                    start: (11, 15),
                    end: (11, 30),
                    keywords: &["black friday", "blackfriday", "bf", "mega oferta"],
                },
                SeasonalEvent {
                    name: "christmas",
                    start: (12, 1),
                    end: (12, 25),
                    keywords: &["natal", "christmas", "presente", "árvore", "decoração"],
                },
                SeasonalEvent {
                    name: "year-end",
                    start: (12, 26),
                    end: (1, 5),
                    keywords: &["réveillon", "ano novo", "festa", "champagne", "virada"],
                },
            ],
        }
    }

    /// Events whose window contains the given date
    pub fn active_events(&self, date: NaiveDate) -> Vec<&SeasonalEvent> {
        self.events.iter().filter(|e| e.is_active(date)).collect()
    }

    /// First active event whose keywords match the text, if any
    pub fn first_active_match(&self, text: &str, date: NaiveDate) -> Option<&SeasonalEvent> {
        self.events
            .iter()
            .filter(|e| e.is_active(date))
            .find(|e| e.matching_keyword(text).is_some())
    }

    /// Whether any active event matches the text
    pub fn matches(&self, text: &str, date: NaiveDate) -> bool {
        self.first_active_match(text, date).is_some()
    }

    /// All configured events
    pub fn events(&self) -> &[SeasonalEvent] {
        &self.events
    }
}

impl Default for SeasonalCalendar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    #[test]
    fn test_same_month_containment() {
        let event = SeasonalEvent {
            name: "black-friday",
            start: (11, 15),
            end: (11, 30),
            keywords: &["black friday"],
        };
        assert!(!event.is_active(date(11, 14)));
        assert!(event.is_active(date(11, 15)));
        assert!(event.is_active(date(11, 30)));
        assert!(!event.is_active(date(12, 1)));
    }

    #[test]
    fn test_cross_month_containment() {
        let event = SeasonalEvent {
            name: "winter",
            start: (6, 15),
            end: (8, 10),
            keywords: &[],
        };
        assert!(!event.is_active(date(6, 14)));
        assert!(event.is_active(date(6, 15)));
        // Month strictly between start and end is unconditionally active
        assert!(event.is_active(date(7, 1)));
        assert!(event.is_active(date(7, 31)));
        assert!(event.is_active(date(8, 10)));
        assert!(!event.is_active(date(8, 11)));
    }

    #[test]
    fn test_cross_year_containment() {
        let event = SeasonalEvent {
            name: "year-end",
            start: (12, 26),
            end: (1, 5),
            keywords: &[],
        };
        assert!(event.is_active(date(12, 26)));
        assert!(event.is_active(date(12, 31)));
        assert!(event.is_active(date(1, 1)));
        assert!(event.is_active(date(1, 5)));
        assert!(!event.is_active(date(1, 6)));
        assert!(!event.is_active(date(12, 25)));
        assert!(!event.is_active(date(6, 1)));
    }

    #[test]
    fn test_keyword_matching_case_insensitive() {
        let event = SeasonalEvent {
            name: "black-friday",
            start: (11, 15),
            end: (11, 30),
            keywords: &["black friday", "mega oferta"],
        };
        assert_eq!(
            event.matching_keyword("BLACK FRIDAY: notebook gamer"),
            Some("black friday")
        );
        assert_eq!(event.matching_keyword("Mega Oferta de TV"), Some("mega oferta"));
        assert_eq!(event.matching_keyword("oferta comum"), None);
    }

    #[test]
    fn test_calendar_active_events() {
        let calendar = SeasonalCalendar::new();

        let active = calendar.active_events(date(11, 20));
        assert!(active.iter().any(|e| e.name == "black-friday"));

        // Dec 28 falls only in the year-end window
        let active = calendar.active_events(date(12, 28));
        assert!(active.iter().any(|e| e.name == "year-end"));
        assert!(!active.iter().any(|e| e.name == "christmas"));
    }

    #[test]
    fn test_calendar_matches_requires_active_window() {
        let calendar = SeasonalCalendar::new();

        // Keyword matches but the window is closed in June
        assert!(!calendar.matches("promoção black friday", date(6, 1)));
        // Window open and keyword present
        assert!(calendar.matches("promoção Black Friday", date(11, 25)));
        // Window open but no keyword
        assert!(!calendar.matches("furadeira 500w", date(11, 25)));
    }

    #[test]
    fn test_first_active_match_short_circuits() {
        let calendar = SeasonalCalendar::new();
        let matched = calendar
            .first_active_match("presente de natal", date(12, 10))
            .unwrap();
        assert_eq!(matched.name, "christmas");
    }
}
