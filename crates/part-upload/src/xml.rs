//! The two XML documents of the multipart protocol

use crate::types::CompletedPart;

const UPLOAD_ID_TAG: &str = "UploadId";

/// Extracts the upload id from an `InitiateMultipartUpload` response.
///
/// An unqualified `<UploadId>` wins; a prefixed one such as `<s3:UploadId>` is
/// only consulted when the unqualified element is absent.
pub fn parse_upload_id(xml: &str) -> Option<String> {
    element_text(xml, UPLOAD_ID_TAG)
        .or_else(|| prefixed_element_text(xml, UPLOAD_ID_TAG))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Builds the `CompleteMultipartUpload` body. `parts` must already be sorted.
pub fn completion_body(parts: &[CompletedPart]) -> String {
    let parts_xml = parts
        .iter()
        .map(|part| {
            format!(
                "<Part><PartNumber>{}</PartNumber><ETag>\"{}\"</ETag></Part>",
                part.part_number, part.etag
            )
        })
        .collect::<Vec<_>>()
        .join("");
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><CompleteMultipartUpload>{}</CompleteMultipartUpload>",
        parts_xml
    )
}

fn element_text<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let rest = xml.split(open.as_str()).nth(1)?;
    let end = rest.find(close.as_str())?;
    Some(&rest[..end])
}

fn prefixed_element_text<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    let suffix = format!(":{}>", name);
    let mut search_from = 0;

    while let Some(found) = xml[search_from..].find(&suffix) {
        let colon = search_from + found;
        search_from = colon + suffix.len();

        let Some(lt) = xml[..colon].rfind('<') else {
            continue;
        };
        let prefix = &xml[lt + 1..colon];
        if prefix.is_empty() || prefix.starts_with('/') || prefix.contains(char::is_whitespace) {
            continue;
        }

        let close = format!("</{}:{}>", prefix, name);
        let body = &xml[search_from..];
        if let Some(end) = body.find(&close) {
            return Some(&body[..end]);
        }
    }

    None
}
