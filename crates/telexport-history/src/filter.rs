// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The filter engine: pure predicates over projected messages.
//!
//! All constraints are AND-combined; an absent option imposes none.
//! Evaluation is non-blocking and allocation-free.

use telexport_core::{HistoryFilter, Message};

/// Whether `message` satisfies every constraint in `filter`.
pub fn matches(message: &Message, filter: &HistoryFilter) -> bool {
    if let Some(ref kinds) = filter.media_types {
        if !kinds.contains(&message.media_type) {
            return false;
        }
    }

    if let Some(wanted) = filter.has_media {
        if message.has_media != wanted {
            return false;
        }
    }

    if let Some(ref senders) = filter.from_users {
        match message.sender {
            Some(ref s) if senders.contains(&s.id) => {}
            _ => return false,
        }
    }

    let views = message.views.unwrap_or(0);
    if let Some(min) = filter.min_views {
        if views < min {
            return false;
        }
    }
    if let Some(max) = filter.max_views {
        if views > max {
            return false;
        }
    }

    true
}

/// Post-hoc text search: case-insensitive substring over the message text.
///
/// Applied on top of any server-side search the provider performed, so the
/// observable contract holds regardless of provider behavior.
pub fn search_matches(message: &Message, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    message
        .text
        .to_lowercase()
        .contains(&query.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use telexport_core::{MediaKind, Sender};

    fn message(id: i64) -> Message {
        Message {
            id,
            date: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            text: "Release notes for v2.0".into(),
            sender: Some(Sender {
                id: 42,
                username: Some("alice".into()),
                display: Some("Alice".into()),
                is_bot: Some(false),
                verified: None,
            }),
            views: Some(150),
            forwards: None,
            replies: None,
            reactions: None,
            pinned: false,
            silent: false,
            post: true,
            noforwards: false,
            media_type: MediaKind::Photo,
            has_media: true,
            reply_to_id: None,
            topic_id: None,
            edit_date: None,
        }
    }

    #[test]
    fn empty_filter_passes_everything() {
        assert!(matches(&message(1), &HistoryFilter::default()));
    }

    #[test]
    fn media_types_constrain() {
        let filter = HistoryFilter {
            media_types: Some([MediaKind::Photo, MediaKind::Video].into_iter().collect()),
            ..Default::default()
        };
        assert!(matches(&message(1), &filter));

        let text_only = HistoryFilter {
            media_types: Some([MediaKind::Text].into_iter().collect()),
            ..Default::default()
        };
        assert!(!matches(&message(1), &text_only));
    }

    #[test]
    fn has_media_constrains_both_ways() {
        let with_media = HistoryFilter {
            has_media: Some(true),
            ..Default::default()
        };
        let without_media = HistoryFilter {
            has_media: Some(false),
            ..Default::default()
        };
        assert!(matches(&message(1), &with_media));
        assert!(!matches(&message(1), &without_media));
    }

    #[test]
    fn from_users_requires_a_sender_in_the_set() {
        let hit = HistoryFilter {
            from_users: Some([42].into_iter().collect()),
            ..Default::default()
        };
        let miss = HistoryFilter {
            from_users: Some([7].into_iter().collect()),
            ..Default::default()
        };
        assert!(matches(&message(1), &hit));
        assert!(!matches(&message(1), &miss));

        let mut anonymous = message(1);
        anonymous.sender = None;
        assert!(!matches(&anonymous, &hit));
    }

    #[test]
    fn view_bounds_treat_missing_views_as_zero() {
        let mut msg = message(1);
        msg.views = None;

        let min = HistoryFilter {
            min_views: Some(1),
            ..Default::default()
        };
        assert!(!matches(&msg, &min));

        let max = HistoryFilter {
            max_views: Some(0),
            ..Default::default()
        };
        assert!(matches(&msg, &max));
    }

    #[test]
    fn constraints_and_combine() {
        let filter = HistoryFilter {
            media_types: Some([MediaKind::Photo].into_iter().collect()),
            has_media: Some(true),
            from_users: Some([42].into_iter().collect()),
            min_views: Some(100),
            max_views: Some(200),
        };
        assert!(matches(&message(1), &filter));

        let mut too_popular = message(1);
        too_popular.views = Some(500);
        assert!(!matches(&too_popular, &filter));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let msg = message(1);
        assert!(search_matches(&msg, "release NOTES"));
        assert!(search_matches(&msg, "v2.0"));
        assert!(!search_matches(&msg, "changelog"));
        assert!(search_matches(&msg, ""));
    }
}
