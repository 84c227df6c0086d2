use crate::Document;

pub fn export_json(doc: &Document) -> serde_json::Result<String> {
    serde_json::to_string_pretty(doc)
}

pub fn export_json_into(doc: &Document, buf: &mut Vec<u8>) -> serde_json::Result<()> {
    buf.clear();
    let target = doc.blocks.len().saturating_mul(128) + 256;
    if buf.capacity() < target {
        buf.reserve(target - buf.capacity());
    }
    serde_json::to_writer(buf, doc)?;
    Ok(())
}

/// Parses a saved document and restores structural invariants.
pub fn import_json(raw: &str) -> serde_json::Result<Document> {
    let mut doc: Document = serde_json::from_str(raw)?;
    doc.normalize();
    Ok(doc)
}
