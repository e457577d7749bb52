use crate::descriptor::{FormatDescriptor, SectionHeader, TextLocator};
use crate::translation_set::Anchor;
use crate::utils::GameTextError;
use std::ops::Range;

/// 定位到的一个可翻译文本段
///
/// 提取器和应用器共用同一次 scan 的结果，保证两侧推导出的锚点序列
/// 在同一文件上必然一致。
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    /// 锚点
    pub anchor: Anchor,
    /// 原文文本的字节范围（提取侧读取）
    pub text: Range<usize>,
    /// 应用时被替换的字节范围
    ///
    /// 除定宽格式外与 `text` 相同；定宽格式的 `text` 去掉了尾部填充，
    /// 而替换范围覆盖整个字段。
    pub splice: Range<usize>,
    /// 分节格式 `Lines=<n>` 中数字的字节范围（应用时重写为译文行数）
    pub count_digits: Option<Range<usize>>,
}

impl Span {
    fn plain(anchor: Anchor, text: Range<usize>) -> Self {
        Span {
            anchor,
            splice: text.clone(),
            text,
            count_digits: None,
        }
    }
}

/// 对原始字节执行描述符的定位规则，按文件顺序产出文本段
///
/// 文件结构不符合规则时返回 StructuralMismatch（带文件名与大致偏移），
/// 绝不产出部分结果。
pub fn scan(raw: &[u8], descriptor: &FormatDescriptor) -> Result<Vec<Span>, GameTextError> {
    match descriptor.locator {
        TextLocator::QuoteDelimited { quote, escape } => {
            scan_quoted(raw, descriptor.file_name, quote, escape)
        }
        TextLocator::KeyValue { separator } => Ok(scan_key_value(raw, separator)),
        TextLocator::FixedWidth {
            record_len,
            field_offset,
            field_width,
            pad,
        } => Ok(scan_fixed_width(raw, record_len, field_offset, field_width, pad)),
        TextLocator::Section { header } => scan_sections(raw, descriptor.file_name, header),
    }
}

/// 引号格式：每对引号之间为一个文本段，转义感知
fn scan_quoted(
    raw: &[u8],
    file: &str,
    quote: u8,
    escape: u8,
) -> Result<Vec<Span>, GameTextError> {
    let mut spans = Vec::new();
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != quote {
            i += 1;
            continue;
        }

        let open = i;
        let start = i + 1;
        i += 1;
        loop {
            if i >= raw.len() {
                return Err(GameTextError::StructuralMismatch {
                    file: file.to_string(),
                    offset: open,
                    reason: "unbalanced quote".to_string(),
                });
            }
            let b = raw[i];
            if b == escape {
                // 转义只允许出现在引号或转义符之前
                if i + 1 >= raw.len() || (raw[i + 1] != quote && raw[i + 1] != escape) {
                    return Err(GameTextError::StructuralMismatch {
                        file: file.to_string(),
                        offset: i,
                        reason: "invalid escape sequence".to_string(),
                    });
                }
                i += 2;
            } else if b == quote {
                spans.push(Span::plain(Anchor::Offset { start }, start..i));
                i += 1;
                break;
            } else {
                i += 1;
            }
        }
    }

    Ok(spans)
}

/// 键值格式：每行首个分隔符之后到行尾（不含行终止符）为一个文本段
///
/// 不含分隔符的行是纯结构，原样保留；空值字段照常产出空文本段，
/// 否则后续条目的锚点编号会移位。
fn scan_key_value(raw: &[u8], separator: u8) -> Vec<Span> {
    let mut spans = Vec::new();

    for (line_index, line) in lines_with_offsets(raw).into_iter().enumerate() {
        let content = &raw[line.start..line.content_end];
        if let Some(sep_pos) = content.iter().position(|&b| b == separator) {
            let value_start = line.start + sep_pos + 1;
            spans.push(Span::plain(
                Anchor::RecordField {
                    record: line_index,
                    field: 1,
                },
                value_start..line.content_end,
            ));
        }
    }

    spans
}

/// 定宽格式：每条定长记录中的定宽字段，尾部 pad 字节不属于文本
///
/// 最后一条完整记录之后的残余字节原样保留，不参与扫描。
fn scan_fixed_width(
    raw: &[u8],
    record_len: usize,
    field_offset: usize,
    field_width: usize,
    pad: u8,
) -> Vec<Span> {
    let record_count = raw.len() / record_len;
    let mut spans = Vec::with_capacity(record_count);

    for record in 0..record_count {
        let field_start = record * record_len + field_offset;
        let field_end = field_start + field_width;

        let mut text_end = field_end;
        while text_end > field_start && raw[text_end - 1] == pad {
            text_end -= 1;
        }

        spans.push(Span {
            anchor: Anchor::Offset { start: field_start },
            text: field_start..text_end,
            splice: field_start..field_end,
            count_digits: None,
        });
    }

    spans
}

/// 分节格式：节头行 + `Lines=<n>` 行 + 恰好 n 行正文为一个文本段
///
/// 节与节之间的任何字节（空行、注释等）原样保留。
fn scan_sections(
    raw: &[u8],
    file: &str,
    header: SectionHeader,
) -> Result<Vec<Span>, GameTextError> {
    const COUNT_KEYWORD: &[u8] = b"Lines=";

    let lines = lines_with_offsets(raw);
    let mut spans = Vec::new();
    let mut section_index = 0;
    let mut li = 0;

    while li < lines.len() {
        let line = &lines[li];
        if !is_section_header(&raw[line.start..line.content_end], &header) {
            li += 1;
            continue;
        }

        // 节头之后必须紧跟 Lines=<n>
        let count_line = lines.get(li + 1).ok_or_else(|| GameTextError::StructuralMismatch {
            file: file.to_string(),
            offset: line.start,
            reason: "section header at end of file".to_string(),
        })?;
        let count_content = &raw[count_line.start..count_line.content_end];
        if !count_content.starts_with(COUNT_KEYWORD) {
            return Err(GameTextError::StructuralMismatch {
                file: file.to_string(),
                offset: count_line.start,
                reason: "expected Lines=<n> after section header".to_string(),
            });
        }

        let digits_start = count_line.start + COUNT_KEYWORD.len();
        let digits = &raw[digits_start..count_line.content_end];
        let line_count = parse_ascii_usize(digits).ok_or_else(|| {
            GameTextError::StructuralMismatch {
                file: file.to_string(),
                offset: digits_start,
                reason: "invalid section line count".to_string(),
            }
        })?;
        // 空正文用 Lines=1 + 一个空行表示，0 不是合法计数
        if line_count == 0 {
            return Err(GameTextError::StructuralMismatch {
                file: file.to_string(),
                offset: digits_start,
                reason: "section line count must be at least 1".to_string(),
            });
        }

        let body_first = li + 2;
        let body_last = body_first + line_count - 1;
        if body_last >= lines.len() {
            return Err(GameTextError::StructuralMismatch {
                file: file.to_string(),
                offset: line.start,
                reason: "section body truncated".to_string(),
            });
        }

        let body_range = lines[body_first].start..lines[body_last].content_end;
        spans.push(Span {
            anchor: Anchor::RecordField {
                record: section_index,
                field: 0,
            },
            text: body_range.clone(),
            splice: body_range,
            count_digits: Some(digits_start..count_line.content_end),
        });

        section_index += 1;
        li = body_last + 1;
    }

    Ok(spans)
}

/// 判断一行是否为节头
fn is_section_header(content: &[u8], header: &SectionHeader) -> bool {
    let prefix = header.prefix.as_bytes();
    if !content.starts_with(prefix) {
        return false;
    }
    let rest = &content[prefix.len()..];
    if rest.is_empty() {
        return false;
    }
    if header.numbered {
        rest.iter().all(|b| b.is_ascii_digit())
    } else {
        rest.iter().all(|b| b.is_ascii_alphanumeric())
    }
}

/// 解析 ASCII 十进制数
fn parse_ascii_usize(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() || !digits.iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// 一行的字节范围
#[derive(Debug, Clone)]
struct LineSpan {
    /// 行首偏移
    start: usize,
    /// 行内容结束（不含 `\r` 和 `\n`）
    content_end: usize,
}

/// 按 `\n` 切行并记录偏移，`\r\n` 行终止符整体视为结构
///
/// 末尾无换行的最后一行照常产出；行终止符本身不属于任何行内容。
fn lines_with_offsets(raw: &[u8]) -> Vec<LineSpan> {
    let mut lines = Vec::new();
    let mut start = 0;

    for (i, &b) in raw.iter().enumerate() {
        if b == b'\n' {
            let mut content_end = i;
            if content_end > start && raw[content_end - 1] == b'\r' {
                content_end -= 1;
            }
            lines.push(LineSpan { start, content_end });
            start = i + 1;
        }
    }
    if start < raw.len() {
        let mut content_end = raw.len();
        if content_end > start && raw[content_end - 1] == b'\r' {
            content_end -= 1;
        }
        lines.push(LineSpan { start, content_end });
    }

    lines
}
