//! Event normalization.
//!
//! Projects each accepted raw event into a normalized record: traffic
//! classification from the page URL and referrer, device attributes from
//! the user agent, and purchase/identity details from the structured
//! payload. Pure per-row transform; the only failure mode is a payload
//! that the upstream validator should never have let through.

use engine_core::{
    email_from_payload, payload_object, purchase_from_payload, traffic, AcceptedEvent,
    DeviceAttributes, Error, NormalizedEvent, PurchaseDetails, Result,
};
use woothee::parser::Parser;

/// Normalizer for accepted events.
///
/// Holds the woothee parser so its lookup tables are built once per run,
/// not once per event.
pub struct Normalizer {
    parser: Parser,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Normalize a full batch in ingestion order.
    pub fn normalize_all(&self, events: &[AcceptedEvent]) -> Result<Vec<NormalizedEvent>> {
        events
            .iter()
            .enumerate()
            .map(|(i, event)| self.normalize(event, i))
            .collect()
    }

    /// Normalize one accepted event.
    ///
    /// `ingest_index` is the 0-based position in the accepted stream and
    /// becomes the stable tie-break for identical timestamps.
    pub fn normalize(&self, event: &AcceptedEvent, ingest_index: usize) -> Result<NormalizedEvent> {
        let payload = payload_object(&event.event_data)
            .map_err(|msg| Error::contract(ingest_index + 1, msg))?;

        let traffic = traffic::classify(&event.page_url, event.referrer.as_deref());
        let device = self.classify_device(&event.user_agent);

        let self_identifier = if event.event_name.carries_identity() {
            email_from_payload(&payload)
        } else {
            None
        };

        let PurchaseDetails {
            revenue,
            transaction_id,
            items,
        } = if event.event_name.is_purchase() {
            purchase_from_payload(&payload)
        } else {
            PurchaseDetails::default()
        };

        Ok(NormalizedEvent {
            device_id: event.device_id.clone(),
            event_time: event.timestamp,
            event_type: event.event_name,
            ingest_index,
            traffic,
            device,
            self_identifier,
            revenue,
            transaction_id,
            line_items: items,
        })
    }

    /// Classify platform/os/browser from the user agent.
    fn classify_device(&self, user_agent: &str) -> DeviceAttributes {
        let mut attrs = DeviceAttributes::default();
        if user_agent.is_empty() {
            return attrs;
        }

        if let Some(result) = self.parser.parse(user_agent) {
            if !result.name.is_empty() && result.name != "UNKNOWN" {
                attrs.browser = result.name.to_string();
            }
            if !result.os.is_empty() && result.os != "UNKNOWN" {
                attrs.os = result.os.to_string();
            }
            // woothee categories: pc, smartphone, mobilephone, crawler, appliance, misc
            attrs.platform = match result.category {
                "pc" => "desktop",
                "smartphone" | "mobilephone" => "mobile",
                "crawler" => "bot",
                "appliance" => "other",
                _ => "unknown",
            }
            .to_string();
        }

        attrs
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
