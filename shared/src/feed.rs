//! Newsfeed composition.
//!
//! Turns the raw announcement and calendar-event lists into two ordered
//! display tracks: alerts on top, everything else below. Each track is
//! sorted by the date the item stops being relevant, soonest first.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::dates::{calendar_date, parse_timestamp, today_in_tz};
use crate::{non_blank, Announcement, AnnouncementStatus, CalendarEvent, ContentKey, ContentKind};

/// User-controlled feed filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedFilter {
    pub search_term: String,
    pub category_id: Option<i64>,
    pub grade_level: Option<i32>,
}

impl FeedFilter {
    fn matches_text(&self, fields: &[&str]) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let needle = self.search_term.to_lowercase();
        fields
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_category(&self, category_id: Option<i64>) -> bool {
        self.category_id.is_none() || self.category_id == category_id
    }

    fn matches_grade(&self, grade_level: Option<i32>) -> bool {
        self.grade_level.is_none() || self.grade_level == grade_level
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedContent {
    Announcement(Announcement),
    Event(CalendarEvent),
}

impl FeedContent {
    pub fn key(&self) -> ContentKey {
        match self {
            FeedContent::Announcement(a) => a.key(),
            FeedContent::Event(e) => e.key(),
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.key().kind
    }

    pub fn title(&self) -> &str {
        match self {
            FeedContent::Announcement(a) => &a.title,
            FeedContent::Event(e) => &e.title,
        }
    }

    pub fn is_alert(&self) -> bool {
        match self {
            FeedContent::Announcement(a) => a.is_alert,
            FeedContent::Event(e) => e.is_alert,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub content: FeedContent,
    /// `None` when the underlying date could not be parsed; such items sort
    /// after every dated item.
    pub sort_date: Option<DateTime<Utc>>,
    pub display_date: Option<DateTime<Utc>>,
}

impl FeedItem {
    fn announcement(announcement: Announcement, tz: Tz) -> Self {
        let sort_source = non_blank(&announcement.visibility_end_at)
            .or_else(|| non_blank(&announcement.visibility_start_at))
            .unwrap_or(&announcement.created_at);
        Self {
            sort_date: parse_timestamp(sort_source, tz),
            display_date: parse_timestamp(&announcement.created_at, tz),
            content: FeedContent::Announcement(announcement),
        }
    }

    fn event(event: CalendarEvent, tz: Tz) -> Self {
        Self {
            sort_date: parse_timestamp(event.effective_end(), tz),
            display_date: parse_timestamp(&event.event_date, tz),
            content: FeedContent::Event(event),
        }
    }

    pub fn key(&self) -> ContentKey {
        self.content.key()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposedFeed {
    pub alert_track: Vec<FeedItem>,
    pub regular_track: Vec<FeedItem>,
}

impl ComposedFeed {
    pub fn is_empty(&self) -> bool {
        self.alert_track.is_empty() && self.regular_track.is_empty()
    }

    pub fn len(&self) -> usize {
        self.alert_track.len() + self.regular_track.len()
    }
}

/// Keep the first row for every `calendar_id`. Multi-day events may come
/// back once per day they span.
pub fn dedupe_events(events: &[CalendarEvent]) -> Vec<CalendarEvent> {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|e| seen.insert(e.calendar_id))
        .cloned()
        .collect()
}

/// Whether the announcement's visibility window contains `now`. A bound
/// that cannot be parsed fails the check.
pub fn within_visibility_window(announcement: &Announcement, now: DateTime<Utc>, tz: Tz) -> bool {
    let started = match non_blank(&announcement.visibility_start_at) {
        None => true,
        Some(raw) => parse_timestamp(raw, tz).is_some_and(|start| start <= now),
    };
    let not_ended = match non_blank(&announcement.visibility_end_at) {
        None => true,
        Some(raw) => parse_timestamp(raw, tz).is_some_and(|end| end >= now),
    };
    started && not_ended
}

/// Whether `today` falls within the event's first and last day, inclusive.
pub fn within_activity_window(event: &CalendarEvent, today: NaiveDate, tz: Tz) -> bool {
    match (
        calendar_date(&event.event_date, tz),
        calendar_date(event.effective_end(), tz),
    ) {
        (Some(start), Some(end)) => start <= today && today <= end,
        _ => false,
    }
}

/// Whether the event's last day is already behind `today`. Unparseable end
/// dates count as expired.
pub fn is_expired(event: &CalendarEvent, today: NaiveDate, tz: Tz) -> bool {
    calendar_date(event.effective_end(), tz).map_or(true, |end| end < today)
}

fn compare_sort_dates(a: &Option<DateTime<Utc>>, b: &Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_track(track: &mut [FeedItem]) {
    track.sort_by(|a, b| compare_sort_dates(&a.sort_date, &b.sort_date));
}

pub struct FeedComposer {
    now: DateTime<Utc>,
    tz: Tz,
    filter: FeedFilter,
}

impl FeedComposer {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        Self {
            now,
            tz,
            filter: FeedFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: FeedFilter) -> Self {
        self.filter = filter;
        self
    }

    fn today(&self) -> NaiveDate {
        today_in_tz(self.now, self.tz)
    }

    fn keeps_announcement(&self, announcement: &Announcement) -> bool {
        if announcement.is_withdrawn() {
            return false;
        }
        self.filter
            .matches_text(&[&announcement.title, &announcement.content])
            && self.filter.matches_category(announcement.category_id)
            && self.filter.matches_grade(announcement.grade_level)
            && (announcement.is_alert
                || within_visibility_window(announcement, self.now, self.tz))
    }

    fn keeps_event(&self, event: &CalendarEvent, today: NaiveDate) -> bool {
        let description = event.description.as_deref().unwrap_or("");
        self.filter.matches_text(&[&event.title, description])
            && self.filter.matches_category(event.category_id)
            && event.is_active
            && !event.is_holiday
            && !event.is_deleted()
            && (event.is_alert || within_activity_window(event, today, self.tz))
    }

    pub fn compose(&self, announcements: &[Announcement], events: &[CalendarEvent]) -> ComposedFeed {
        let today = self.today();
        let events = dedupe_events(events);

        let mut feed = ComposedFeed::default();

        let kept_announcements = announcements
            .iter()
            .filter(|a| self.keeps_announcement(a))
            .cloned()
            .map(|a| FeedItem::announcement(a, self.tz));
        let kept_events = events
            .into_iter()
            .filter(|e| self.keeps_event(e, today))
            .map(|e| FeedItem::event(e, self.tz));

        for item in kept_announcements.chain(kept_events) {
            if item.content.is_alert() {
                feed.alert_track.push(item);
            } else {
                feed.regular_track.push(item);
            }
        }

        sort_track(&mut feed.alert_track);
        sort_track(&mut feed.regular_track);

        log::debug!(
            "Composed feed: {} alerts, {} regular",
            feed.alert_track.len(),
            feed.regular_track.len()
        );
        feed
    }

    /// Items an admin may put on the TV display.
    pub fn tv_candidates(&self, announcements: &[Announcement], events: &[CalendarEvent]) -> TvCandidates {
        let today = self.today();

        let announcements = announcements
            .iter()
            .filter(|a| {
                !a.is_withdrawn()
                    && a.status == AnnouncementStatus::Published
                    && (a.is_alert || within_visibility_window(a, self.now, self.tz))
            })
            .cloned()
            .collect();

        let events = dedupe_events(events)
            .into_iter()
            .filter(|e| {
                !e.is_deleted()
                    && !e.is_holiday
                    && e.is_active
                    && (e.is_alert || !is_expired(e, today, self.tz))
            })
            .collect();

        TvCandidates {
            announcements,
            events,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TvCandidates {
    pub announcements: Vec<Announcement>,
    pub events: Vec<CalendarEvent>,
}

impl TvCandidates {
    pub fn announcement_ids(&self) -> HashSet<i64> {
        self.announcements.iter().map(|a| a.id).collect()
    }

    pub fn event_ids(&self) -> HashSet<i64> {
        self.events.iter().map(|e| e.calendar_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// One page of a track. Pages are 1-based and clamped to the valid range.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> FeedPage<T> {
    let per_page = per_page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;

    FeedPage {
        items: items.iter().skip(start).take(per_page).cloned().collect(),
        page,
        total_pages,
        total,
    }
}
