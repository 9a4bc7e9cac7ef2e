use chrono::Duration;

use crate::models::{IdentityId, Message, WishSignal};

/// Flag gratitude messages that reply to someone else's wish.
///
/// A message is a thanks response when it expressed gratitude and a wish
/// from a different sender appeared no more than `window_hours` before it.
/// Thanks responses are never wishes themselves. `senders[i]` is the
/// canonical sender of `messages[i]`.
pub fn mark_thanks_responses(
    messages: &[Message],
    senders: &[Option<IdentityId>],
    signals: &mut [WishSignal],
    window_hours: u32,
) -> usize {
    let window = Duration::hours(i64::from(window_hours));
    let mut marked = 0;

    for i in 0..signals.len() {
        if !signals[i].gratitude {
            continue;
        }
        let replied_to_wish = (0..i)
            .rev()
            .take_while(|&j| messages[i].timestamp - messages[j].timestamp <= window)
            .any(|j| signals[j].is_wish && senders[j] != senders[i]);
        if replied_to_wish {
            signals[i].is_thanks = true;
            signals[i].is_wish = false;
            marked += 1;
        }
    }
    marked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageKind;
    use chrono::NaiveDate;

    fn message(index: usize, hour: u32, day: u32) -> Message {
        Message {
            index,
            timestamp: NaiveDate::from_ymd_opt(2024, 4, day).unwrap().and_hms_opt(hour, 0, 0).unwrap(),
            sender: String::new(),
            body: String::new(),
            kind: MessageKind::Text,
        }
    }

    fn wish(index: usize) -> WishSignal {
        WishSignal { is_wish: true, relevance: 0.8, ..WishSignal::empty(index) }
    }

    fn grateful(index: usize) -> WishSignal {
        WishSignal { gratitude: true, ..WishSignal::empty(index) }
    }

    #[test]
    fn test_thanks_after_wish_from_other_sender() {
        let messages = vec![message(0, 15, 26), message(1, 16, 26)];
        let senders = vec![Some(IdentityId(0)), Some(IdentityId(1))];
        let mut signals = vec![wish(0), grateful(1)];

        assert_eq!(mark_thanks_responses(&messages, &senders, &mut signals, 24), 1);
        assert!(signals[1].is_thanks);
        assert!(!signals[1].is_wish);
    }

    #[test]
    fn test_self_reply_is_not_thanks() {
        let messages = vec![message(0, 15, 26), message(1, 16, 26)];
        let senders = vec![Some(IdentityId(0)), Some(IdentityId(0))];
        let mut signals = vec![wish(0), grateful(1)];

        assert_eq!(mark_thanks_responses(&messages, &senders, &mut signals, 24), 0);
        assert!(!signals[1].is_thanks);
    }

    #[test]
    fn test_outside_window_is_not_thanks() {
        let messages = vec![message(0, 10, 24), message(1, 11, 26)];
        let senders = vec![Some(IdentityId(0)), Some(IdentityId(1))];
        let mut signals = vec![wish(0), grateful(1)];

        assert_eq!(mark_thanks_responses(&messages, &senders, &mut signals, 24), 0);
    }

    #[test]
    fn test_gratitude_without_any_wish() {
        let messages = vec![message(0, 10, 26)];
        let mut signals = vec![grateful(0)];
        assert_eq!(mark_thanks_responses(&messages, &[Some(IdentityId(0))], &mut signals, 24), 0);
    }
}
