//! RS2D `header.xml` reading and writing.
//!
//! The header is a flat list of typed parameters:
//!
//! ```xml
//! <header xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
//!   <params>
//!     <entry>
//!       <key>BASE_FREQ_1</key>
//!       <value xsi:type="numberParam">
//!         <name>BASE_FREQ_1</name>
//!         <value>6.0E8</value>
//!       </value>
//!     </entry>
//!   </params>
//! </header>
//! ```
//!
//! List parameters repeat the inner `<value>` element.  Elements other than
//! `key`, `name` and the inner values are skipped.

use crate::data::Rs2dError;
use nmrdata_core::{format_number, ParameterMap, ParameterStore, Value};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Parsed RS2D header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    params: ParameterMap,
}

#[derive(Default)]
struct EntryBuilder {
    key: Option<String>,
    param_type: Option<String>,
    values: Vec<String>,
}

impl EntryBuilder {
    fn build(self) -> Result<Option<(String, Value)>, Rs2dError> {
        let Some(key) = self.key else {
            return Ok(None);
        };
        let kind = self.param_type.unwrap_or_default();
        let value = match kind.as_str() {
            "numberParam" => match self.values.first() {
                Some(v) => Value::Number(parse_f64(&key, v)?),
                None => Value::NumberList(Vec::new()),
            },
            "listNumberParam" => Value::NumberList(
                self.values
                    .iter()
                    .map(|v| parse_f64(&key, v))
                    .collect::<Result<Vec<f64>, Rs2dError>>()?,
            ),
            "booleanParam" => {
                let text = self.values.first().map(String::as_str).unwrap_or("false");
                match text.trim() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    other => {
                        return Err(Rs2dError::Header(format!(
                            "{}: invalid boolean '{}'",
                            key, other
                        )))
                    }
                }
            }
            "listTextParam" => Value::TextList(self.values),
            _ if self.values.len() > 1 => Value::TextList(self.values),
            _ => Value::Text(self.values.into_iter().next().unwrap_or_default()),
        };
        Ok(Some((key, value)))
    }
}

fn parse_f64(key: &str, text: &str) -> Result<f64, Rs2dError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Rs2dError::Header(format!("{}: invalid number '{}'", key, text)))
}

fn xsi_type(e: &BytesStart) -> Result<Option<String>, Rs2dError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Rs2dError::Header(e.to_string()))?;
        let key = attr.key.as_ref();
        if key == b"xsi:type" || key == b"type" {
            let value = std::str::from_utf8(&attr.value)
                .map_err(|e| Rs2dError::Header(e.to_string()))?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

fn xml_error(e: impl std::fmt::Display) -> Rs2dError {
    Rs2dError::Header(e.to_string())
}

impl Header {
    /// Parse a `header.xml` document. A key repeated across `<entry>`
    /// elements takes its last value, kept at the position of its first
    /// occurrence.
    pub fn parse(xml: &str) -> Result<Self, Rs2dError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut header = Header::default();
        let mut stack: Vec<Vec<u8>> = Vec::new();
        let mut entry: Option<EntryBuilder> = None;
        let mut saw_root = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = e.local_name().as_ref().to_vec();
                    saw_root = true;
                    if name == b"entry" {
                        entry = Some(EntryBuilder::default());
                    } else if name == b"value" && stack.last().map(Vec::as_slice) == Some(&b"entry"[..]) {
                        if let Some(b) = entry.as_mut() {
                            b.param_type = xsi_type(e)?;
                        }
                    }
                    stack.push(name);
                }
                Ok(Event::Empty(ref e)) => {
                    saw_root = true;
                    if e.local_name().as_ref() == b"value"
                        && stack.last().map(Vec::as_slice) == Some(&b"entry"[..])
                    {
                        if let Some(b) = entry.as_mut() {
                            b.param_type = xsi_type(e)?;
                        }
                    }
                }
                Ok(Event::Text(ref t)) => {
                    let text = t.unescape().map_err(xml_error)?.into_owned();
                    let depth = stack.len();
                    if let Some(b) = entry.as_mut() {
                        if depth >= 2 && stack[depth - 2] == b"entry" && stack[depth - 1] == b"key" {
                            b.key = Some(text);
                        } else if depth >= 3
                            && stack[depth - 3] == b"entry"
                            && stack[depth - 2] == b"value"
                            && stack[depth - 1] == b"value"
                        {
                            b.values.push(text);
                        }
                    }
                }
                Ok(Event::End(ref e)) => {
                    if e.local_name().as_ref() == b"entry" {
                        if let Some(b) = entry.take() {
                            if let Some((key, value)) = b.build()? {
                                header.params.put(key, value);
                            }
                        }
                    }
                    stack.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(xml_error(e)),
                _ => {}
            }
            buf.clear();
        }

        if !saw_root {
            return Err(Rs2dError::Header("empty header document".into()));
        }
        log::debug!("Parsed RS2D header with {} parameters", header.params.len());
        Ok(header)
    }

    pub fn read(path: &Path) -> Result<Self, Rs2dError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Insert or replace a parameter.
    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.params.put(key, value);
    }

    pub fn all(&self) -> Vec<(&str, &Value)> {
        self.params.entries()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    // ─── Writing ────────────────────────────────────────────────────────

    pub fn to_xml(&self) -> Result<String, Rs2dError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        let root = BytesStart::new("header").with_attributes([("xmlns:xsi", XSI_NS)]);
        writer.write_event(Event::Start(root)).map_err(xml_error)?;
        writer
            .write_event(Event::Start(BytesStart::new("params")))
            .map_err(xml_error)?;

        for (key, value) in self.params.iter() {
            write_entry(&mut writer, key, value)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("params")))
            .map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("header")))
            .map_err(xml_error)?;
        String::from_utf8(writer.into_inner()).map_err(xml_error)
    }

    pub fn write(&self, path: &Path) -> Result<(), Rs2dError> {
        std::fs::write(path, self.to_xml()?)?;
        Ok(())
    }
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), Rs2dError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;
    Ok(())
}

fn write_entry(writer: &mut Writer<Vec<u8>>, key: &str, value: &Value) -> Result<(), Rs2dError> {
    let (kind, items): (&str, Vec<String>) = match value {
        Value::Number(v) => ("numberParam", vec![format_number(*v)]),
        Value::Text(s) => ("textParam", vec![s.clone()]),
        Value::Bool(b) => ("booleanParam", vec![b.to_string()]),
        Value::NumberList(v) => ("listNumberParam", v.iter().map(|x| format_number(*x)).collect()),
        Value::TextList(v) => ("listTextParam", v.clone()),
    };

    writer
        .write_event(Event::Start(BytesStart::new("entry")))
        .map_err(xml_error)?;
    write_text_element(writer, "key", key)?;
    let param = BytesStart::new("value").with_attributes([("xsi:type", kind)]);
    writer.write_event(Event::Start(param)).map_err(xml_error)?;
    write_text_element(writer, "name", key)?;
    for item in &items {
        write_text_element(writer, "value", item)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("value")))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new("entry")))
        .map_err(xml_error)?;
    Ok(())
}

impl ParameterStore for Header {
    fn optional(&self, key: &str) -> Option<&Value> {
        self.params.optional(key)
    }

    fn entries(&self) -> Vec<(&str, &Value)> {
        self.params.entries()
    }
}
