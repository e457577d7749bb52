use crate::translation_set::TranslationSet;
use crate::utils::GameTextError;
use std::time::Duration;

/// 翻译提供方接口
///
/// 按输入顺序返回每条文本的独立结果；单条失败不影响同批其他条目。
pub trait TranslationProvider {
    /// 批量翻译一组文本到目标语言
    fn translate_batch(
        &self,
        batch: &[String],
        target_lang: &str,
    ) -> Vec<Result<String, GameTextError>>;
}

/// Google 免费翻译接口（gtx 端点）
///
/// 工具整体是单线程同步模型，这里使用阻塞式 HTTP 客户端，
/// 逐条请求并在条目粒度上报告失败。
pub struct GoogleProvider {
    client: reqwest::blocking::Client,
    source_lang: String,
}

impl GoogleProvider {
    const ENDPOINT: &'static str = "https://translate.googleapis.com/translate_a/single";

    /// 创建提供方实例
    pub fn new(source_lang: impl Into<String>) -> Result<Self, GameTextError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GameTextError::ProviderFailure(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(GoogleProvider {
            client,
            source_lang: source_lang.into(),
        })
    }

    /// 翻译单条文本
    fn translate_one(&self, text: &str, target_lang: &str) -> Result<String, GameTextError> {
        let response = self
            .client
            .get(Self::ENDPOINT)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_lang.as_str()),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .map_err(|e| GameTextError::ProviderFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GameTextError::ProviderFailure(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| GameTextError::ProviderFailure(e.to_string()))?;

        // 响应形如 [[["译文","原文",...],["续段","原文",...]],...]，拼接所有译文段
        let segments = body
            .get(0)
            .and_then(|v| v.as_array())
            .ok_or_else(|| GameTextError::ProviderFailure("unexpected response shape".to_string()))?;

        let mut translated = String::new();
        for segment in segments {
            if let Some(part) = segment.get(0).and_then(|v| v.as_str()) {
                translated.push_str(part);
            }
        }

        if translated.is_empty() {
            return Err(GameTextError::ProviderFailure(
                "empty translation in response".to_string(),
            ));
        }

        Ok(translated)
    }
}

impl TranslationProvider for GoogleProvider {
    fn translate_batch(
        &self,
        batch: &[String],
        target_lang: &str,
    ) -> Vec<Result<String, GameTextError>> {
        batch
            .iter()
            .map(|text| {
                if text.is_empty() {
                    // 空文本段没有可翻译内容，原样通过
                    Ok(String::new())
                } else {
                    self.translate_one(text, target_lang)
                }
            })
            .collect()
    }
}

/// 自动翻译一个翻译集合中尚未翻译的条目
///
/// 只有单条成功才覆盖该条目的 `translated_text`；失败条目保留原文，
/// 用户之后可以重试。返回（成功数, 失败数）。
pub fn translate_set(
    set: &mut TranslationSet,
    provider: &dyn TranslationProvider,
    target_lang: &str,
) -> (usize, usize) {
    let pending: Vec<usize> = set
        .entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_untranslated() && !e.original_text.is_empty())
        .map(|(i, _)| i)
        .collect();

    if pending.is_empty() {
        return (0, 0);
    }

    let batch: Vec<String> = pending
        .iter()
        .map(|&i| set.entries[i].original_text.clone())
        .collect();

    let results = provider.translate_batch(&batch, target_lang);

    let mut succeeded = 0;
    let mut failed = 0;
    for (&index, result) in pending.iter().zip(results) {
        match result {
            Ok(translated) => {
                set.entries[index].translated_text = translated;
                succeeded += 1;
            }
            Err(_e) => {
                #[cfg(debug_assertions)]
                eprintln!("警告: 条目 {} 翻译失败: {}", set.entries[index].anchor, _e);
                failed += 1;
            }
        }
    }

    (succeeded, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation_set::{Anchor, ExtractedEntry};

    /// 固定应答的测试提供方：偶数条成功、奇数条失败
    struct FlakyProvider;

    impl TranslationProvider for FlakyProvider {
        fn translate_batch(
            &self,
            batch: &[String],
            _target_lang: &str,
        ) -> Vec<Result<String, GameTextError>> {
            batch
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    if i % 2 == 0 {
                        Ok(format!("[es] {}", text))
                    } else {
                        Err(GameTextError::ProviderFailure("timeout".to_string()))
                    }
                })
                .collect()
        }
    }

    fn make_set() -> TranslationSet {
        TranslationSet::from_entries(
            "text.dat",
            vec![
                ExtractedEntry::new(Anchor::Offset { start: 1 }, "Hello".to_string()),
                ExtractedEntry::new(Anchor::Offset { start: 9 }, "World".to_string()),
                ExtractedEntry::new(Anchor::Offset { start: 17 }, String::new()),
            ],
        )
    }

    #[test]
    fn test_partial_failure_keeps_originals() {
        let mut set = make_set();
        let (succeeded, failed) = translate_set(&mut set, &FlakyProvider, "es");

        assert_eq!((succeeded, failed), (1, 1));
        // 成功条目被覆盖
        assert_eq!(set.entries[0].translated_text, "[es] Hello");
        // 失败条目保留原文，可重试
        assert_eq!(set.entries[1].translated_text, "World");
        assert!(set.entries[1].is_untranslated());
    }

    #[test]
    fn test_empty_entries_not_sent() {
        let mut set = make_set();
        translate_set(&mut set, &FlakyProvider, "es");
        assert_eq!(set.entries[2].translated_text, "");
    }

    #[test]
    fn test_already_translated_entries_untouched() {
        let mut set = make_set();
        set.entries[0].translated_text = "Hola".to_string();

        let (succeeded, _) = translate_set(&mut set, &FlakyProvider, "es");
        // 只有未翻译的 World 被送出（本次成为批内第 0 条，成功）
        assert_eq!(succeeded, 1);
        assert_eq!(set.entries[0].translated_text, "Hola");
        assert_eq!(set.entries[1].translated_text, "[es] World");
    }
}
