// src/process/reader.rs

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use super::events::{Attrs, FmpEvent};
use crate::error::ImportError;

/// Pulls [`FmpEvent`]s out of any `BufRead` using `quick-xml`.
///
/// Text is passed through untrimmed and unescaped; self-closing elements are
/// reported as a start followed by an end.
pub struct FmpReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending_end: Option<String>,
}

impl FmpReader<BufReader<File>> {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> FmpReader<R> {
    pub fn from_reader(reader: R) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(false);
        Self {
            reader: xml_reader,
            buf: Vec::with_capacity(4096),
            pending_end: None,
        }
    }

    /// Byte offset of the reader in the input, for error reporting.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position()
    }

    /// Next event, or `None` at end of input.
    pub fn next_event(&mut self) -> Result<Option<FmpEvent>, ImportError> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(FmpEvent::End { name }));
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf)? {
                XmlEvent::Start(ref e) => FmpEvent::Start {
                    name: utf8(e.local_name().as_ref())?,
                    attrs: extract_attrs(e)?,
                },
                XmlEvent::Empty(ref e) => {
                    let name = utf8(e.local_name().as_ref())?;
                    let attrs = extract_attrs(e)?;
                    self.pending_end = Some(name.clone());
                    FmpEvent::Start { name, attrs }
                }
                XmlEvent::End(ref e) => FmpEvent::End {
                    name: utf8(e.local_name().as_ref())?,
                },
                XmlEvent::Text(ref e) => FmpEvent::Text(e.unescape()?.into_owned()),
                XmlEvent::CData(ref e) => FmpEvent::Text(utf8(e.as_ref())?),
                XmlEvent::Eof => return Ok(None),
                // declarations, comments, processing instructions, doctype
                _ => continue,
            };
            return Ok(Some(event));
        }
    }
}

impl<R: BufRead> Iterator for FmpReader<R> {
    type Item = Result<FmpEvent, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

fn extract_attrs(e: &BytesStart<'_>) -> Result<Attrs, ImportError> {
    let mut attrs = Vec::new();
    for a in e.attributes() {
        let a = a?;
        let key = utf8(a.key.local_name().as_ref())?;
        let value = a.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

fn utf8(bytes: &[u8]) -> Result<String, ImportError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| ImportError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn events(xml: &str) -> Vec<FmpEvent> {
        FmpReader::from_reader(Cursor::new(xml.as_bytes().to_vec()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_empty_elements_expand() {
        let evs = events(r#"<ROW RECORDID="1"><COL/></ROW>"#);
        assert_eq!(
            evs,
            vec![
                FmpEvent::start("ROW", &[("RECORDID", "1")]),
                FmpEvent::start("COL", &[]),
                FmpEvent::end("COL"),
                FmpEvent::end("ROW"),
            ]
        );
    }

    #[test]
    fn test_text_is_unescaped_and_untrimmed() {
        let evs = events("<DATA> Tom &amp; Jerry </DATA>");
        assert_eq!(evs[1], FmpEvent::text(" Tom & Jerry "));

        let evs = events("<DATA><![CDATA[a<b]]></DATA>");
        assert_eq!(evs[1], FmpEvent::text("a<b"));
    }

    #[test]
    fn test_namespace_prefix_is_dropped() {
        let evs = events(r#"<fm:FIELD xmlns:fm="urn:x" fm:NAME="A" TYPE="TEXT"/>"#);
        let FmpEvent::Start { name, attrs } = &evs[0] else {
            panic!("expected start");
        };
        assert_eq!(name, "FIELD");
        assert!(attrs.contains(&("NAME".to_string(), "A".to_string())));
    }

    #[test]
    fn test_mismatched_tags_are_stream_errors() {
        let mut r = FmpReader::from_reader(Cursor::new(b"<ROW><COL></ROW>".to_vec()));
        let res: Result<Vec<_>, _> = r.by_ref().collect();
        assert!(matches!(res, Err(ImportError::Stream(_))));
    }
}
