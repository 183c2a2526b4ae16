//! RFC 3339 rendering of `SystemTime` for JSON output.
use serde::{Deserialize, Deserializer, Serializer};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Latest instant humantime can render (9999-12-31T23:59:59Z)
const MAX_RENDERABLE_SECS: u64 = 253_402_300_799;

/// Formats a timestamp as RFC 3339 with nanoseconds, clamped to the renderable range
pub fn to_rfc3339(time: SystemTime) -> String {
    let clamped = match time.duration_since(UNIX_EPOCH) {
        Err(_) => UNIX_EPOCH,
        Ok(d) if d.as_secs() > MAX_RENDERABLE_SECS => {
            UNIX_EPOCH + Duration::from_secs(MAX_RENDERABLE_SECS)
        }
        Ok(_) => time,
    };
    humantime::format_rfc3339_nanos(clamped).to_string()
}

pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_rfc3339(*time))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_rfc3339(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Stamp {
        #[serde(with = "crate::timefmt")]
        at: SystemTime,
    }

    #[test]
    fn test_round_trip_keeps_nanoseconds() {
        let stamp = Stamp {
            at: UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789),
        };
        let json = serde_json::to_string(&stamp).unwrap();
        assert_eq!(json, r#"{"at":"2023-11-14T22:13:20.123456789Z"}"#);
        let back: Stamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stamp);
    }

    #[test]
    fn test_pre_epoch_is_clamped() {
        let before = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(to_rfc3339(before), "1970-01-01T00:00:00.000000000Z");
    }
}
