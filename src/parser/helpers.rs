use std::str::FromStr;

use quick_xml::encoding::Decoder;
use quick_xml::events::BytesStart;

use super::ParseError;

/// Decoded attributes of one opened element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    /// Build from already decoded `(name, value)` pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Decode and unescape every attribute of a start tag
    pub(super) fn from_start(e: &BytesStart, decoder: Decoder) -> Result<Self, ParseError> {
        let mut pairs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| ParseError::XmlError(quick_xml::Error::from(e)))?;
            let key = std::str::from_utf8(attr.key.local_name().as_ref())?.to_string();
            let value = attr.decode_and_unescape_value(decoder)?.into_owned();
            pairs.push((key, value));
        }
        Ok(Self { pairs })
    }

    /// Raw value of an attribute
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of an attribute, with empty values treated as absent
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Parse an attribute value; absent or empty values yield `None`
    pub fn parse<T: FromStr>(&self, element: &str, name: &str) -> Result<Option<T>, ParseError> {
        match self.non_empty(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ParseError::InvalidAttributeValue {
                    element: element.to_string(),
                    attribute: name.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when the element had no attributes
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
