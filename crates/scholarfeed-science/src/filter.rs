use scholarfeed_core::PublicationRecord;

/// Keeps records that carry both a title and an external id, preserving order.
pub fn filter_valid(records: Vec<PublicationRecord>) -> Vec<PublicationRecord> {
    let before = records.len();
    let valid: Vec<_> = records.into_iter().filter(PublicationRecord::is_valid).collect();
    if valid.len() < before {
        tracing::debug!(dropped = before - valid.len(), "dropped records without title or id");
    }
    valid
}
