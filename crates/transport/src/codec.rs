//! Wire codec - the single encode/decode boundary
//!
//! The payload is the structured JSON object
//! `{id, pole_id, water_level, observed_at}`; the bare numeric encoding
//! is not used anywhere. A deployment never mixes the two.

use bytes::Bytes;
use contracts::{Reading, TelemetryError};

use crate::topic;

/// Encode a reading for publication.
pub fn encode(reading: &Reading) -> Result<Bytes, TelemetryError> {
    let raw = serde_json::to_vec(reading)
        .map_err(|e| TelemetryError::Other(format!("payload encode error: {e}")))?;
    Ok(Bytes::from(raw))
}

/// Decode an inbound message into a Reading.
///
/// Rejects payloads that do not parse, topics outside the convention,
/// and payloads whose `pole_id` disagrees with the topic they arrived on.
pub fn decode(topic: &str, payload: &[u8]) -> Result<Reading, TelemetryError> {
    let topic_pole = topic::parse(topic)
        .ok_or_else(|| TelemetryError::payload_decode(topic, "topic outside sensors/+/waterlevel"))?;

    let reading: Reading = serde_json::from_slice(payload)
        .map_err(|e| TelemetryError::payload_decode(topic, format!("invalid payload: {e}")))?;

    if reading.pole_id != topic_pole {
        return Err(TelemetryError::payload_decode(
            topic,
            format!(
                "payload pole {} does not match topic pole {}",
                reading.pole_id, topic_pole
            ),
        ));
    }

    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::PoleId;

    fn sample() -> Reading {
        Reading {
            id: 7,
            pole_id: PoleId::new(1).unwrap(),
            water_level: 4.52,
            observed_at: NaiveDate::from_ymd_opt(2025, 11, 29)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let reading = sample();
        let payload = encode(&reading).unwrap();
        let decoded = decode("sensors/1/waterlevel", &payload).unwrap();
        assert_eq!(decoded, reading);
    }

    #[test]
    fn test_decode_rejects_garbage_payload() {
        let err = decode("sensors/1/waterlevel", b"30").unwrap_err();
        assert!(matches!(err, TelemetryError::PayloadDecode { .. }));

        let err = decode("sensors/1/waterlevel", b"not json").unwrap_err();
        assert!(matches!(err, TelemetryError::PayloadDecode { .. }));
    }

    #[test]
    fn test_decode_rejects_unknown_topic() {
        let payload = encode(&sample()).unwrap();
        assert!(decode("sensors/none/waterlevel", &payload).is_err());
        assert!(decode("sensors/1/temperature", &payload).is_err());
    }

    #[test]
    fn test_decode_rejects_pole_mismatch() {
        let payload = encode(&sample()).unwrap();
        let err = decode("sensors/2/waterlevel", &payload).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("does not match"), "unexpected: {msg}");
    }
}
