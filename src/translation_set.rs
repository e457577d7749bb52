use crate::utils::GameTextError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// 锚点：一个可翻译文本段的稳定定位符
///
/// 锚点只由结构边界（分隔符/引号/记录边界的字节位置）推导，
/// 永远不依赖文本内容本身——译文长度变化不影响锚点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// 文本段起始字节偏移（引号格式、定宽格式）
    Offset { start: usize },
    /// 记录序号 + 字段序号（键值格式、分节格式）
    RecordField { record: usize, field: usize },
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Offset { start } => write!(f, "offset:{}", start),
            Anchor::RecordField { record, field } => {
                write!(f, "record:{}:field:{}", record, field)
            }
        }
    }
}

impl FromStr for Anchor {
    type Err = GameTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GameTextError::InvalidAnchor(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            ["offset", start] => Ok(Anchor::Offset {
                start: start.parse().map_err(|_| invalid())?,
            }),
            ["record", record, "field", field] => Ok(Anchor::RecordField {
                record: record.parse().map_err(|_| invalid())?,
                field: field.parse().map_err(|_| invalid())?,
            }),
            _ => Err(invalid()),
        }
    }
}

/// 提取的文本条目
///
/// 此结构用于游戏文件的文本提取和应用：
/// - 提取时：`translated_text` 初始化为与 `original_text` 相同
/// - 应用时：`translated_text` 为要写回文件的新文本
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEntry {
    /// 锚点（文件内唯一）
    pub anchor: Anchor,
    /// 原始文本
    pub original_text: String,
    /// 翻译文本
    pub translated_text: String,
}

impl ExtractedEntry {
    /// 创建新条目，译文初始等于原文
    pub fn new(anchor: Anchor, original_text: String) -> Self {
        let translated_text = original_text.clone();
        ExtractedEntry {
            anchor,
            original_text,
            translated_text,
        }
    }

    /// 条目是否尚未翻译（译文仍等于原文）
    pub fn is_untranslated(&self) -> bool {
        self.translated_text == self.original_text
    }
}

/// side file 中单个条目的 JSON 形态
#[derive(Debug, Serialize, Deserialize)]
struct SideEntry {
    original: String,
    translated: String,
}

/// 一个文件的翻译集合
///
/// 生命周期：由提取器创建 → 人工编辑或自动翻译修改 → 应用器消费。
/// 持久化为 JSON side file，结构为按文件顺序排列的
/// `{ anchor_id: { "original": ..., "translated": ... } }`。
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationSet {
    /// 对应的游戏文件名
    pub file_name: String,
    /// 条目序列，按文件内出现顺序排列
    pub entries: Vec<ExtractedEntry>,
}

impl TranslationSet {
    /// 从条目序列创建翻译集合
    pub fn from_entries(file_name: impl Into<String>, entries: Vec<ExtractedEntry>) -> Self {
        TranslationSet {
            file_name: file_name.into(),
            entries,
        }
    }

    /// 序列化为 side file JSON（保持条目顺序）
    pub fn to_json(&self) -> Result<String, GameTextError> {
        let mut map = serde_json::Map::new();
        for entry in &self.entries {
            let value = serde_json::to_value(SideEntry {
                original: entry.original_text.clone(),
                translated: entry.translated_text.clone(),
            })?;
            map.insert(entry.anchor.to_string(), value);
        }
        Ok(serde_json::to_string_pretty(&serde_json::Value::Object(
            map,
        ))?)
    }

    /// 从 side file JSON 解析
    pub fn from_json(file_name: impl Into<String>, json: &str) -> Result<Self, GameTextError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value.as_object().ok_or_else(|| {
            GameTextError::JsonError(serde::de::Error::custom("side file 根节点必须是对象"))
        })?;

        let mut entries = Vec::with_capacity(object.len());
        for (anchor_id, entry_value) in object {
            let anchor = Anchor::from_str(anchor_id)?;
            let side: SideEntry = serde_json::from_value(entry_value.clone())?;
            entries.push(ExtractedEntry {
                anchor,
                original_text: side.original,
                translated_text: side.translated,
            });
        }

        Ok(TranslationSet {
            file_name: file_name.into(),
            entries,
        })
    }

    /// 写入 side file
    pub fn save(&self, path: &Path) -> Result<(), GameTextError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// 读取 side file
    pub fn load(file_name: impl Into<String>, path: &Path) -> Result<Self, GameTextError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(file_name, &json)
    }
}
