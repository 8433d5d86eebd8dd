//! OBS XML deserialization: parsing response bodies into model types.

use edc_hw_obs_model::{DeleteError, DeleteResult, InitiatedUpload, ListObjectsPage, ObjectSummary};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::XmlError;

/// Trait for deserializing OBS types from XML.
///
/// The root element has already been consumed by the caller; the
/// implementation reads child elements until the matching end tag.
pub trait ObsDeserialize: Sized {
    /// Deserialize an instance from the given XML reader.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Deserialize an XML document into a typed value.
///
/// Skips the declaration, finds the root element and delegates to the
/// type's [`ObsDeserialize`] implementation.
pub fn from_xml<T: ObsDeserialize>(xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);

    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                return T::deserialize_xml(&mut reader);
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_string()));
            }
            _ => {}
        }
    }
}

/// Parse an `<Error>` document. Returns `None` when the root element is not `Error`.
pub fn parse_error_body(xml: &[u8]) -> Option<ErrorBody> {
    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event().ok()? {
            Event::Start(e) => {
                if e.name().as_ref() != b"Error" {
                    return None;
                }
                return ErrorBody::deserialize_xml(&mut reader).ok();
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Helper functions for reading common XML patterns
// ---------------------------------------------------------------------------

/// Read the text content of the current element and consume its end tag.
///
/// Entity and character references arrive as separate events and are resolved
/// in place.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::GeneralRef(e) => {
                if let Some(ch) = e
                    .resolve_char_ref()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?
                {
                    text.push(ch);
                } else {
                    let name = e
                        .decode()
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    let resolved = quick_xml::escape::resolve_predefined_entity(&name)
                        .ok_or_else(|| XmlError::ParseError(format!("unknown entity &{name};")))?;
                    text.push_str(resolved);
                }
            }
            Event::End(_) => {
                return Ok(text);
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Walk the children of the current element, handing each start tag to `on_child`.
///
/// `on_child` must consume the child (read its text or skip it).
fn for_each_child<F>(reader: &mut Reader<&[u8]>, mut on_child: F) -> Result<(), XmlError>
where
    F: FnMut(&str, &mut Reader<&[u8]>) -> Result<(), XmlError>,
{
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let tag_name = std::str::from_utf8(name.as_ref())
                    .map_err(|e| XmlError::ParseError(e.to_string()))?
                    .to_owned();
                on_child(&tag_name, reader)?;
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF in element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Parse a boolean from XML text ("true"/"false").
fn parse_bool(s: &str) -> Result<bool, XmlError> {
    match s.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(XmlError::ParseError(format!("invalid boolean: {s}"))),
    }
}

/// Parse a u64 from XML text.
fn parse_u64(s: &str) -> Result<u64, XmlError> {
    s.trim()
        .parse::<u64>()
        .map_err(|e| XmlError::ParseError(format!("invalid u64 '{s}': {e}")))
}

/// Strip the surrounding quotes OBS puts around entity tags.
fn unquote(etag: &str) -> String {
    etag.trim().trim_matches('"').to_owned()
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

impl ObsDeserialize for ObjectSummary {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut key = None;
        let mut summary = ObjectSummary::default();

        for_each_child(reader, |tag, reader| {
            match tag {
                "Key" => key = Some(read_text_content(reader)?),
                "Size" => summary.size = parse_u64(&read_text_content(reader)?)?,
                "ETag" => summary.etag = Some(unquote(&read_text_content(reader)?)),
                "LastModified" => summary.last_modified = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;

        summary.key = key.ok_or_else(|| XmlError::MissingElement("Key".to_string()))?;
        Ok(summary)
    }
}

/// `ListBucketResult`.
impl ObsDeserialize for ListObjectsPage {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut page = ListObjectsPage::default();

        for_each_child(reader, |tag, reader| {
            match tag {
                "Contents" => page.objects.push(ObjectSummary::deserialize_xml(reader)?),
                "IsTruncated" => page.is_truncated = parse_bool(&read_text_content(reader)?)?,
                "NextMarker" => {
                    let marker = read_text_content(reader)?;
                    if !marker.is_empty() {
                        page.next_marker = Some(marker);
                    }
                }
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;

        Ok(page)
    }
}

/// `InitiateMultipartUploadResult`.
impl ObsDeserialize for InitiatedUpload {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut bucket = String::new();
        let mut key = String::new();
        let mut upload_id = None;

        for_each_child(reader, |tag, reader| {
            match tag {
                "Bucket" => bucket = read_text_content(reader)?,
                "Key" => key = read_text_content(reader)?,
                "UploadId" => upload_id = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;

        Ok(InitiatedUpload {
            bucket,
            key,
            upload_id: upload_id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| XmlError::MissingElement("UploadId".to_string()))?,
        })
    }
}

/// `DeleteResult`.
impl ObsDeserialize for DeleteResult {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut result = DeleteResult::default();

        for_each_child(reader, |tag, reader| {
            match tag {
                "Deleted" => {
                    let mut key = String::new();
                    for_each_child(reader, |tag, reader| {
                        if tag == "Key" {
                            key = read_text_content(reader)?;
                        } else {
                            skip_element(reader)?;
                        }
                        Ok(())
                    })?;
                    result.deleted.push(key);
                }
                "Error" => {
                    let body = ErrorBody::deserialize_xml(reader)?;
                    result.errors.push(DeleteError {
                        key: body.key.unwrap_or_default(),
                        code: body.code,
                        message: body.message,
                    });
                }
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;

        Ok(result)
    }
}

/// Contents of an `<Error>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Request id.
    pub request_id: Option<String>,
    /// Key the error refers to (batch delete entries).
    pub key: Option<String>,
}

impl ObsDeserialize for ErrorBody {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut body = ErrorBody::default();

        for_each_child(reader, |tag, reader| {
            match tag {
                "Code" => body.code = read_text_content(reader)?,
                "Message" => body.message = read_text_content(reader)?,
                "RequestId" => body.request_id = Some(read_text_content(reader)?),
                "Key" => body.key = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;

        Ok(body)
    }
}
