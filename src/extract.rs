use crate::descriptor::{FormatDescriptor, TextLocator};
use crate::scan::{scan, Span};
use crate::translation_set::ExtractedEntry;
use crate::utils::GameTextError;
use std::borrow::Cow;

/// 提取器：从原始字节产出按文件顺序排列的条目序列
///
/// 纯函数，无副作用；同一文件重复提取得到完全相同的锚点序列。
/// 译文初始化为与原文相同。
pub fn extract(
    raw: &[u8],
    descriptor: &FormatDescriptor,
) -> Result<Vec<ExtractedEntry>, GameTextError> {
    let spans = scan(raw, descriptor)?;
    let mut entries = Vec::with_capacity(spans.len());

    for span in &spans {
        let text = span_text(raw, descriptor, span);
        entries.push(ExtractedEntry::new(span.anchor, text));
    }

    Ok(entries)
}

/// 解码一个文本段的原文
///
/// 提取器与应用器的陈旧检查共用此函数，保证两侧看到的原文一致。
pub(crate) fn span_text(raw: &[u8], descriptor: &FormatDescriptor, span: &Span) -> String {
    let bytes = &raw[span.text.clone()];
    let bytes: Cow<[u8]> = match descriptor.locator {
        TextLocator::QuoteDelimited { escape, .. } => Cow::Owned(unescape_quoted(bytes, escape)),
        _ => Cow::Borrowed(bytes),
    };
    descriptor.encoding.decode(&bytes)
}

/// 去除引号格式文本段内的转义符
///
/// scan 已验证过转义序列合法，此处每个转义符单纯吞掉自身、保留下一字节。
pub(crate) fn unescape_quoted(bytes: &[u8], escape: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == escape && i + 1 < bytes.len() {
            out.push(bytes[i + 1]);
            i += 2;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    out
}

/// 为引号格式重新转义文本（引号与转义符本身）
pub(crate) fn escape_quoted(bytes: &[u8], quote: u8, escape: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if b == quote || b == escape {
            out.push(escape);
        }
        out.push(b);
    }
    out
}
