//! SWORD deposit receipt handling
//!
//! A successful deposit exchange answers with an Atom entry. This module
//! parses that entry into a `DepositReceipt` and extracts the statement
//! reference used for later status tracking.

use crate::core::error::DepositError;
use crate::core::traits::{DepositLink, DepositReceipt, DepositStatus};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Link relation of a SWORD statement document
pub const REL_STATEMENT: &str = "http://purl.org/net/sword/terms/statement";

/// Link relation some repositories answer with for newly created resources
/// that do not yet expose a statement link
pub const REL_ADD: &str = "http://purl.org/net/sword/terms/add";

/// Default packaging identifier declared on deposit exchanges
pub const PACKAGING_METS: &str = "http://purl.org/net/sword/package/METSDSpaceSIP";

/// Parse an Atom entry body into a deposit receipt.
///
/// Only the parts the deposit workflow consumes are extracted: the
/// repository-assigned `atom:id` and the typed links, in response order.
pub fn parse_deposit_receipt(
    body: &str,
    status: DepositStatus,
) -> Result<DepositReceipt, DepositError> {
    let mut reader = Reader::from_str(body);

    let mut deposit_id: Option<String> = None;
    let mut links: Vec<DepositLink> = Vec::new();
    let mut saw_entry = false;
    let mut in_id = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"entry" if depth == 1 => saw_entry = true,
                    // only the entry's own id, not ids nested in source etc.
                    b"id" if depth == 2 && deposit_id.is_none() => in_id = true,
                    b"link" => links.extend(link_from_attributes(&e)?),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"link" {
                    links.extend(link_from_attributes(&e)?);
                }
            }
            Ok(Event::Text(t)) if in_id => {
                let text = t.unescape().map_err(malformed)?;
                deposit_id = Some(text.trim().to_string());
            }
            Ok(Event::End(_)) => {
                in_id = false;
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(e)),
        }
    }

    if !saw_entry {
        return Err(DepositError::MalformedReceipt {
            message: "response body is not an Atom entry".to_string(),
        });
    }

    let deposit_id = deposit_id.filter(|id| !id.is_empty()).ok_or_else(|| {
        DepositError::MalformedReceipt {
            message: "deposit receipt is missing its atom:id".to_string(),
        }
    })?;

    Ok(DepositReceipt {
        deposit_id,
        status,
        links,
    })
}

fn link_from_attributes(
    element: &quick_xml::events::BytesStart<'_>,
) -> Result<Option<DepositLink>, DepositError> {
    let mut rel = None;
    let mut href = None;

    for attr in element.attributes() {
        let attr = attr.map_err(malformed)?;
        match attr.key.as_ref() {
            b"rel" => rel = Some(attr.unescape_value().map_err(malformed)?.into_owned()),
            b"href" => href = Some(attr.unescape_value().map_err(malformed)?.into_owned()),
            _ => {}
        }
    }

    Ok(match (rel, href) {
        (Some(rel), Some(href)) => Some(DepositLink { rel, href }),
        _ => None,
    })
}

fn malformed<E: std::fmt::Display>(e: E) -> DepositError {
    DepositError::MalformedReceipt {
        message: e.to_string(),
    }
}

/// Extract the statement reference from a deposit receipt.
///
/// Preference order: the first link with the statement relation wins; when
/// none is present, the first link with the add relation is used instead.
/// Repositories differ in which of the two they answer with immediately
/// after creation, so both are accepted, in that order.
pub fn extract_statement_href(receipt: &DepositReceipt) -> Result<&str, DepositError> {
    if let Some(link) = receipt.links.iter().find(|l| l.rel == REL_STATEMENT) {
        return Ok(&link.href);
    }

    if let Some(link) = receipt.links.iter().find(|l| l.rel == REL_ADD) {
        return Ok(&link.href);
    }

    Err(DepositError::NoStatementLink)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<entry xmlns="http://www.w3.org/2005/Atom" xmlns:sword="http://purl.org/net/sword/terms/">
  <id>urn:uuid:a4b2c9e1-77d3-4c08-9f5e-d1b2a3c4e5f6</id>
  <title>Deposited item</title>
  <link rel="edit" href="https://repo.example.edu/sword/edit/12"/>
  <link rel="http://purl.org/net/sword/terms/add" href="https://repo.example.edu/sword/add/12"/>
  <link rel="http://purl.org/net/sword/terms/statement" href="https://repo.example.edu/sword/statement/12"/>
</entry>"#;

    #[test]
    fn test_parse_receipt_extracts_id_and_links() {
        let receipt = parse_deposit_receipt(RECEIPT_BODY, DepositStatus::Created).unwrap();

        assert_eq!(
            receipt.deposit_id,
            "urn:uuid:a4b2c9e1-77d3-4c08-9f5e-d1b2a3c4e5f6"
        );
        assert_eq!(receipt.status, DepositStatus::Created);
        assert_eq!(receipt.links.len(), 3);
        assert_eq!(receipt.links[0].rel, "edit");
    }

    #[test]
    fn test_statement_relation_takes_priority_over_add() {
        // the add link appears before the statement link in the body
        let receipt = parse_deposit_receipt(RECEIPT_BODY, DepositStatus::Created).unwrap();

        let href = extract_statement_href(&receipt).unwrap();

        assert_eq!(href, "https://repo.example.edu/sword/statement/12");
    }

    #[test]
    fn test_add_relation_is_used_as_fallback() {
        let body = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <id>urn:uuid:1</id>
  <link rel="edit" href="https://repo.example.edu/sword/edit/1"/>
  <link rel="http://purl.org/net/sword/terms/add" href="https://repo.example.edu/sword/add/1"/>
</entry>"#;
        let receipt = parse_deposit_receipt(body, DepositStatus::Accepted).unwrap();

        let href = extract_statement_href(&receipt).unwrap();

        assert_eq!(href, "https://repo.example.edu/sword/add/1");
    }

    #[test]
    fn test_no_candidate_link_fails() {
        let body = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <id>urn:uuid:1</id>
  <link rel="edit" href="https://repo.example.edu/sword/edit/1"/>
</entry>"#;
        let receipt = parse_deposit_receipt(body, DepositStatus::Created).unwrap();

        let result = extract_statement_href(&receipt);

        assert!(matches!(result, Err(DepositError::NoStatementLink)));
    }

    #[test]
    fn test_self_closing_and_expanded_links_both_parse() {
        let body = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <id>urn:uuid:1</id>
  <link rel="http://purl.org/net/sword/terms/statement" href="https://a.example/st"/>
  <link rel="http://purl.org/net/sword/terms/add" href="https://a.example/add"></link>
</entry>"#;
        let receipt = parse_deposit_receipt(body, DepositStatus::Created).unwrap();

        assert_eq!(receipt.links.len(), 2);
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let body = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <link rel="http://purl.org/net/sword/terms/statement" href="https://a.example/st"/>
</entry>"#;

        let result = parse_deposit_receipt(body, DepositStatus::Created);

        assert!(matches!(result, Err(DepositError::MalformedReceipt { .. })));
    }

    #[test]
    fn test_non_atom_body_is_malformed() {
        let result = parse_deposit_receipt(
            "<html><body>It worked!</body></html>",
            DepositStatus::Created,
        );

        assert!(matches!(result, Err(DepositError::MalformedReceipt { .. })));
    }

    #[test]
    fn test_nested_ids_are_ignored() {
        let body = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <source><id>urn:uuid:wrong</id></source>
  <id>urn:uuid:right</id>
  <link rel="http://purl.org/net/sword/terms/statement" href="https://a.example/st"/>
</entry>"#;
        let receipt = parse_deposit_receipt(body, DepositStatus::Created).unwrap();

        assert_eq!(receipt.deposit_id, "urn:uuid:right");
    }
}
