use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use craftport_core::craft::{Craft, ModelError};
use craftport_core::tree::Element;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Craft, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, craft: &Craft, path: &Path) -> Result<(), IoError>;
}

/// 载具 XML 文件的读写入口。
pub struct CraftXmlFacade;

impl CraftXmlFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CraftXmlFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for CraftXmlFacade {
    fn load(&self, path: &Path) -> Result<Craft, IoError> {
        let data = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = data.len(), "读取载具文件");
        load_craft(&data)
    }
}

impl DocumentSaver for CraftXmlFacade {
    fn save(&self, craft: &Craft, path: &Path) -> Result<(), IoError> {
        let bytes = craft_to_bytes(craft)?;
        fs::write(path, &bytes).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "写出载具文件");
        Ok(())
    }
}

/// 解析 XML 并提升为强类型文档。
pub fn load_craft(bytes: &[u8]) -> Result<Craft, IoError> {
    let root = read_element(bytes)?;
    Ok(Craft::from_element(root)?)
}

/// 序列化文档，带 XML 声明，两空格缩进。
pub fn craft_to_bytes(craft: &Craft) -> Result<Vec<u8>, IoError> {
    write_element(&craft.to_element())
}

/// 把 XML 字节解析为通用树。文本、注释与处理指令都被忽略。
pub fn read_element(bytes: &[u8]) -> Result<Element, IoError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| xml_error(position, err))?;
        match event {
            Event::Start(ref start) => stack.push(open_element(start, position)?),
            Event::Empty(ref start) => {
                let element = open_element(start, position)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| IoError::Xml {
                    position,
                    message: "unexpected closing tag".to_string(),
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(IoError::InvalidDocument(format!(
            "element <{}> is never closed",
            open.name
        )));
    }
    root.ok_or_else(|| IoError::InvalidDocument("document has no root element".to_string()))
}

fn xml_error(position: u64, err: impl std::fmt::Display) -> IoError {
    IoError::Xml {
        position,
        message: err.to_string(),
    }
}

fn open_element(start: &BytesStart<'_>, position: u64) -> Result<Element, IoError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|err| xml_error(position, err))?
        .to_string();
    let mut element = Element::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| xml_error(position, err))?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|err| xml_error(position, err))?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|err| xml_error(position, err))?;
        element.set_attr(key, value.into_owned());
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), IoError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(IoError::InvalidDocument(format!(
            "unexpected second root element <{}>",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

/// 把通用树写成 UTF-8 XML 字节。
pub fn write_element(root: &Element) -> Result<Vec<u8>, IoError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|err| xml_error(0, err))?;
    write_node(&mut writer, root)?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_node(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), IoError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in element.attributes.iter() {
        start.push_attribute((key, value));
    }

    let position = writer.get_ref().len() as u64;
    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|err| xml_error(position, err));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|err| xml_error(position, err))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(Cow::Borrowed(element.name.as_str()))))
        .map_err(|err| xml_error(position, err))
}
