use crate::descriptor::{FormatDescriptor, TextLocator};
use crate::extract::{escape_quoted, span_text};
use crate::scan::{scan, Span};
use crate::translation_set::{ExtractedEntry, TranslationSet};
use crate::utils::GameTextError;

/// 应用器：把翻译集合写回原始字节，产出完整的新文件内容
///
/// 纯函数：重新运行与提取完全相同的定位规则，校验锚点与原文一致后，
/// 逐段替换文本、逐字节复制其余结构。输出在内存中整体构建，
/// 任何条目失败都不会产出部分结果。
pub fn apply(
    raw: &[u8],
    descriptor: &FormatDescriptor,
    set: &TranslationSet,
) -> Result<Vec<u8>, GameTextError> {
    let spans = scan(raw, descriptor)?;
    verify_against_set(raw, descriptor, &spans, set)?;

    let mut out = Vec::with_capacity(raw.len());
    let mut cursor = 0;

    for (span, entry) in spans.iter().zip(&set.entries) {
        // 分节格式：Lines=<n> 是正文的派生长度字段，随译文行数重写
        if let Some(digits) = &span.count_digits {
            out.extend_from_slice(&raw[cursor..digits.start]);
            let count = entry.translated_text.split('\n').count();
            out.extend_from_slice(count.to_string().as_bytes());
            cursor = digits.end;
        }

        out.extend_from_slice(&raw[cursor..span.splice.start]);
        out.extend_from_slice(&encode_replacement(descriptor, span, entry)?);
        cursor = span.splice.end;
    }

    // 最后一个文本段之后的字节原样保留
    out.extend_from_slice(&raw[cursor..]);

    Ok(out)
}

/// 校验文件当前内容与翻译集合仍然匹配
///
/// 锚点数量、锚点序列、原文三者任一不符都说明文件在提取后被改动过
/// （或 side file 来自另一次提取），此时拒绝应用而不是产出损坏输出。
fn verify_against_set(
    raw: &[u8],
    descriptor: &FormatDescriptor,
    spans: &[Span],
    set: &TranslationSet,
) -> Result<(), GameTextError> {
    let stale = |detail: String| GameTextError::StaleTranslationSet {
        file: descriptor.file_name.to_string(),
        detail,
    };

    if spans.len() != set.entries.len() {
        return Err(stale(format!(
            "file has {} text spans, translation set has {} entries",
            spans.len(),
            set.entries.len()
        )));
    }

    for (span, entry) in spans.iter().zip(&set.entries) {
        if span.anchor != entry.anchor {
            return Err(stale(format!(
                "anchor mismatch: file has {}, translation set has {}",
                span.anchor, entry.anchor
            )));
        }
        let current = span_text(raw, descriptor, span);
        if current != entry.original_text {
            return Err(stale(format!(
                "original text changed at {}",
                span.anchor
            )));
        }
    }

    Ok(())
}

/// 编码一个条目的译文，按定位规则施加格式约束
fn encode_replacement(
    descriptor: &FormatDescriptor,
    span: &Span,
    entry: &ExtractedEntry,
) -> Result<Vec<u8>, GameTextError> {
    let encoded = descriptor
        .encoding
        .encode(&entry.translated_text)
        .ok_or_else(|| GameTextError::EncodingError {
            anchor: entry.anchor.to_string(),
            encoding: descriptor.encoding.label(),
        })?;

    match descriptor.locator {
        TextLocator::QuoteDelimited { quote, escape } => {
            Ok(escape_quoted(&encoded, quote, escape))
        }
        TextLocator::KeyValue { .. } => {
            // 译文带换行会使行记录结构移位，视为结构违例
            if encoded.iter().any(|&b| b == b'\n' || b == b'\r') {
                return Err(GameTextError::StructuralMismatch {
                    file: descriptor.file_name.to_string(),
                    offset: span.splice.start,
                    reason: "translated text contains a line terminator".to_string(),
                });
            }
            Ok(encoded)
        }
        TextLocator::FixedWidth {
            field_width, pad, ..
        } => {
            if encoded.len() > field_width {
                return Err(GameTextError::FieldOverflow {
                    anchor: entry.anchor.to_string(),
                    width: field_width,
                    actual: encoded.len(),
                });
            }
            let mut padded = encoded;
            padded.resize(field_width, pad);
            Ok(padded)
        }
        TextLocator::Section { .. } => Ok(encoded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::descriptor_for;
    use crate::extract::extract;

    /// 未翻译集合的往返必须逐字节还原原文件
    fn assert_roundtrip(file_name: &str, raw: &[u8]) {
        let d = descriptor_for(file_name).unwrap();
        let set = TranslationSet::from_entries(file_name, extract(raw, d).unwrap());
        let rebuilt = apply(raw, d, &set).unwrap();
        assert_eq!(rebuilt, raw, "{} 往返不一致", file_name);
    }

    #[test]
    fn test_roundtrip_quote_delimited() {
        assert_roundtrip("text.dat", br#""Hello"|"World"|"""#);
        assert_roundtrip("text.dat", br#"id=3 "say \"hi\"" trailing bytes"#);
        assert_roundtrip("text.dat", b"no quoted text at all");
    }

    #[test]
    fn test_roundtrip_key_value() {
        assert_roundtrip("systemdata.dat", b"1=Sierra\n; note\n2=\n3=Pyron");
        assert_roundtrip("systemdata.dat", b"Alpha=one\r\nBeta=two\r\n");
    }

    #[test]
    fn test_roundtrip_sections() {
        assert_roundtrip(
            "itemdata.dat",
            b"header junk\n+Item0\nLines=2\nFusion Cell\nStandard power source.\n\n+Item1\nLines=1\nShield Array\ntrailing\n",
        );
        assert_roundtrip("optionsdata.dat", b"+Desc=0\nLines=1\n\n");
        assert_roundtrip("techdata.dat", b"+FusionDrive\nLines=1\nAdvanced propulsion.\n");
    }

    #[test]
    fn test_roundtrip_fixed_width() {
        let mut raw = vec![0u8; 16];
        let mut field = b"Tutorial page".to_vec();
        field.resize(80, b' ');
        raw.extend_from_slice(&field);
        raw.extend_from_slice(b"tail");
        assert_roundtrip("traintext.sw", &raw);
    }

    #[test]
    fn test_apply_substitution() {
        // 规格场景：World → Monde，其余字节不变
        let d = descriptor_for("text.dat").unwrap();
        let raw = br#""Hello"|"World"|"""#;

        let mut set = TranslationSet::from_entries("text.dat", extract(raw, d).unwrap());
        set.entries[1].translated_text = "Monde".to_string();

        let rebuilt = apply(raw, d, &set).unwrap();
        assert_eq!(rebuilt, br#""Hello"|"Monde"|"""#);
    }

    #[test]
    fn test_apply_escapes_translated_quotes() {
        let d = descriptor_for("text.dat").unwrap();
        let raw = br#""plain""#;

        let mut set = TranslationSet::from_entries("text.dat", extract(raw, d).unwrap());
        set.entries[0].translated_text = r#"with "quotes""#.to_string();

        let rebuilt = apply(raw, d, &set).unwrap();
        assert_eq!(rebuilt, br#""with \"quotes\"""#);
        // 替换后的文件必须仍可提取，且条目还原为译文
        let reextracted = extract(&rebuilt, d).unwrap();
        assert_eq!(reextracted[0].original_text, r#"with "quotes""#);
    }

    #[test]
    fn test_apply_rewrites_section_line_count() {
        let d = descriptor_for("itemdata.dat").unwrap();
        let raw = b"+Item0\nLines=2\nFusion Cell\nStandard power source.\n";

        let mut set = TranslationSet::from_entries("itemdata.dat", extract(raw, d).unwrap());
        set.entries[0].translated_text = "Pile a fusion".to_string();

        let rebuilt = apply(raw, d, &set).unwrap();
        assert_eq!(rebuilt, b"+Item0\nLines=1\nPile a fusion\n");

        // 译文行数增加时同样成立
        let mut set = TranslationSet::from_entries("itemdata.dat", extract(raw, d).unwrap());
        set.entries[0].translated_text = "a\nb\nc".to_string();
        let rebuilt = apply(raw, d, &set).unwrap();
        assert_eq!(rebuilt, b"+Item0\nLines=3\na\nb\nc\n");
    }

    #[test]
    fn test_stale_set_detected_on_changed_file() {
        let d = descriptor_for("text.dat").unwrap();
        let raw = br#""Hello"|"World""#;
        let set = TranslationSet::from_entries("text.dat", extract(raw, d).unwrap());

        // 工具之外改动了文件：多出一个文本段
        let modified = br#""Hello"|"World"|"New""#;
        assert!(matches!(
            apply(modified, d, &set),
            Err(GameTextError::StaleTranslationSet { .. })
        ));

        // 原文内容被改动（锚点数量与位置不变）
        let modified = br#""Hullo"|"World""#;
        assert!(matches!(
            apply(modified, d, &set),
            Err(GameTextError::StaleTranslationSet { .. })
        ));
    }

    #[test]
    fn test_field_overflow_rejected() {
        let d = descriptor_for("traintext.sw").unwrap();
        let mut raw = vec![0u8; 16];
        raw.resize(96, b' ');

        let mut set = TranslationSet::from_entries("traintext.sw", extract(&raw, d).unwrap());
        set.entries[0].translated_text = "x".repeat(81);

        match apply(&raw, d, &set).unwrap_err() {
            GameTextError::FieldOverflow {
                anchor,
                width,
                actual,
            } => {
                assert_eq!(anchor, "offset:16");
                assert_eq!(width, 80);
                assert_eq!(actual, 81);
            }
            other => panic!("意外错误: {:?}", other),
        }
    }

    #[test]
    fn test_encoding_error_rejected() {
        let d = descriptor_for("systemdata.dat").unwrap();
        let raw = b"1=Sword\n";

        let mut set = TranslationSet::from_entries("systemdata.dat", extract(raw, d).unwrap());
        set.entries[0].translated_text = "铁剑".to_string();

        assert!(matches!(
            apply(raw, d, &set),
            Err(GameTextError::EncodingError { .. })
        ));
    }

    #[test]
    fn test_key_value_rejects_line_terminator() {
        let d = descriptor_for("systemdata.dat").unwrap();
        let raw = b"1=Sword\n";

        let mut set = TranslationSet::from_entries("systemdata.dat", extract(raw, d).unwrap());
        set.entries[0].translated_text = "two\nlines".to_string();

        assert!(matches!(
            apply(raw, d, &set),
            Err(GameTextError::StructuralMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_span_roundtrip() {
        // 空文本段应用空译文后必须还原空段
        let d = descriptor_for("text.dat").unwrap();
        let raw = br#""Hello"|"""#;

        let set = TranslationSet::from_entries("text.dat", extract(raw, d).unwrap());
        assert_eq!(apply(raw, d, &set).unwrap(), raw);
    }

    #[test]
    fn test_windows1252_translation_applied() {
        let d = descriptor_for("systemdata.dat").unwrap();
        let raw = b"1=Credits\n";

        let mut set = TranslationSet::from_entries("systemdata.dat", extract(raw, d).unwrap());
        set.entries[0].translated_text = "Crédits".to_string();

        let rebuilt = apply(raw, d, &set).unwrap();
        assert_eq!(rebuilt, b"1=Cr\xE9dits\n");
    }
}
