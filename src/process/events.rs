// src/process/events.rs

/// Attribute list of a start event, in document order, values unescaped.
pub type Attrs = Vec<(String, String)>;

/// Look up an attribute by (local) name.
pub fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// One token of the input, independent of the XML library that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum FmpEvent {
    Start { name: String, attrs: Attrs },
    Text(String),
    End { name: String },
}

impl FmpEvent {
    pub fn start(name: &str, attrs: &[(&str, &str)]) -> Self {
        FmpEvent::Start {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn text(s: &str) -> Self {
        FmpEvent::Text(s.to_string())
    }

    pub fn end(name: &str) -> Self {
        FmpEvent::End {
            name: name.to_string(),
        }
    }
}

/// The FMPXMLRESULT vocabulary. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    FmpXmlResult,
    ErrorCode,
    Product,
    Database,
    Metadata,
    Field,
    ResultSet,
    Row,
    Col,
    Data,
}

impl Element {
    pub fn from_name(name: &str) -> Option<Self> {
        let el = match name {
            "FMPXMLRESULT" => Element::FmpXmlResult,
            "ERRORCODE" => Element::ErrorCode,
            "PRODUCT" => Element::Product,
            "DATABASE" => Element::Database,
            "METADATA" => Element::Metadata,
            "FIELD" => Element::Field,
            "RESULTSET" => Element::ResultSet,
            "ROW" => Element::Row,
            "COL" => Element::Col,
            "DATA" => Element::Data,
            _ => return None,
        };
        Some(el)
    }
}
