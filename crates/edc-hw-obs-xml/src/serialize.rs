//! OBS XML serialization: request bodies.

use std::io::{self, Write};

use edc_hw_obs_model::CompletedPart;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

use crate::error::XmlError;

/// The S3 XML namespace, accepted by OBS on its S3-compatible API.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Trait for serializing request bodies to XML.
///
/// Implementors write their content as child elements; the root element is
/// written by [`to_xml`].
pub trait ObsSerialize {
    /// Serialize this value as XML child elements into the given writer.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as an XML document with declaration and namespace.
pub fn to_xml<T: ObsSerialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(256);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

/// Write a simple `<tag>text</tag>` element.
fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Body of `POST /<bucket>/<key>?uploadId=...`.
#[derive(Debug, Clone, Copy)]
pub struct CompleteMultipartUpload<'a> {
    /// Parts in upload order.
    pub parts: &'a [CompletedPart],
}

impl CompleteMultipartUpload<'_> {
    /// Root element name.
    pub const ROOT: &'static str = "CompleteMultipartUpload";
}

impl ObsSerialize for CompleteMultipartUpload<'_> {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        for part in self.parts {
            writer.create_element("Part").write_inner_content(|w| {
                write_text_element(w, "PartNumber", &part.part_number.to_string())?;
                write_text_element(w, "ETag", &part.etag)
            })?;
        }
        Ok(())
    }
}

/// Body of `POST /<bucket>?delete`.
#[derive(Debug, Clone, Copy)]
pub struct DeleteObjects<'a> {
    /// Keys to delete.
    pub keys: &'a [String],
    /// Quiet mode: only failures are reported.
    pub quiet: bool,
}

impl DeleteObjects<'_> {
    /// Root element name.
    pub const ROOT: &'static str = "Delete";
}

impl ObsSerialize for DeleteObjects<'_> {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        if self.quiet {
            write_text_element(writer, "Quiet", "true")?;
        }
        for key in self.keys {
            writer
                .create_element("Object")
                .write_inner_content(|w| write_text_element(w, "Key", key))?;
        }
        Ok(())
    }
}

/// Body of `PUT /<bucket>` naming the bucket region.
#[derive(Debug, Clone, Copy)]
pub struct CreateBucketConfiguration<'a> {
    /// Region of the new bucket.
    pub location: &'a str,
}

impl CreateBucketConfiguration<'_> {
    /// Root element name.
    pub const ROOT: &'static str = "CreateBucketConfiguration";
}

impl ObsSerialize for CreateBucketConfiguration<'_> {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "LocationConstraint", self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_string(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).expect("utf-8")
    }

    #[test]
    fn test_should_serialize_complete_multipart_upload_in_order() {
        let parts = vec![
            CompletedPart {
                part_number: 1,
                etag: "etag-1".into(),
            },
            CompletedPart {
                part_number: 2,
                etag: "etag-2".into(),
            },
        ];
        let xml = as_string(
            to_xml(
                CompleteMultipartUpload::ROOT,
                &CompleteMultipartUpload { parts: &parts },
            )
            .expect("serialize"),
        );
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(
            "<Part><PartNumber>1</PartNumber><ETag>etag-1</ETag></Part>\
             <Part><PartNumber>2</PartNumber><ETag>etag-2</ETag></Part>"
        ));
    }

    #[test]
    fn test_should_write_quoted_etags() {
        let parts = vec![CompletedPart {
            part_number: 1,
            etag: "\"abc\"".into(),
        }];
        let xml = as_string(
            to_xml(
                CompleteMultipartUpload::ROOT,
                &CompleteMultipartUpload { parts: &parts },
            )
            .expect("serialize"),
        );
        assert!(
            xml.contains("<ETag>&quot;abc&quot;</ETag>") || xml.contains("<ETag>\"abc\"</ETag>"),
            "{xml}"
        );
    }

    #[test]
    fn test_should_serialize_quiet_delete() {
        let keys = vec!["a".to_owned(), "b&c".to_owned()];
        let xml = as_string(
            to_xml(
                DeleteObjects::ROOT,
                &DeleteObjects {
                    keys: &keys,
                    quiet: true,
                },
            )
            .expect("serialize"),
        );
        assert!(xml.contains("<Delete xmlns="));
        assert!(xml.contains("<Quiet>true</Quiet>"));
        assert!(xml.contains("<Object><Key>a</Key></Object><Object><Key>b&amp;c</Key></Object>"));
    }

    #[test]
    fn test_should_serialize_location_constraint() {
        let xml = as_string(
            to_xml(
                CreateBucketConfiguration::ROOT,
                &CreateBucketConfiguration {
                    location: "cn-north-4",
                },
            )
            .expect("serialize"),
        );
        assert!(xml.contains("<LocationConstraint>cn-north-4</LocationConstraint>"));
    }
}
