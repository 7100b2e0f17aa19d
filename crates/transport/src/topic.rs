//! Topic convention: one topic per pole
//!
//! `sensors/<pole_id>/waterlevel`, subscribed via `sensors/+/waterlevel`.

use contracts::PoleId;

/// Wildcard matching every pole's topic.
pub const WILDCARD: &str = "sensors/+/waterlevel";

/// Topic for one pole, derived deterministically from its id.
pub fn for_pole(id: PoleId) -> String {
    format!("sensors/{id}/waterlevel")
}

/// Extract the pole id from a topic, or `None` if the topic does not
/// follow the convention.
pub fn parse(topic: &str) -> Option<PoleId> {
    let mut parts = topic.split('/');
    if parts.next()? != "sensors" {
        return None;
    }
    let id: PoleId = parts.next()?.parse().ok()?;
    if parts.next()? != "waterlevel" {
        return None;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_pole_roundtrip() {
        let id = PoleId::new(2).unwrap();
        let topic = for_pole(id);
        assert_eq!(topic, "sensors/2/waterlevel");
        assert_eq!(parse(&topic), Some(id));
    }

    #[test]
    fn test_parse_rejects_malformed_topics() {
        assert_eq!(parse("sensors/waterlevel"), None);
        assert_eq!(parse("sensors/0/waterlevel"), None);
        assert_eq!(parse("sensors/abc/waterlevel"), None);
        assert_eq!(parse("sensors/1/temperature"), None);
        assert_eq!(parse("other/1/waterlevel"), None);
        assert_eq!(parse("sensors/1/waterlevel/extra"), None);
    }
}
