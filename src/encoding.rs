/// 文本编解码层
///
/// 游戏数据文件使用单字节遗留编码（windows-1252），解码对任意字节总是成功，
/// 编码则可能遇到无法表示的字符——此时拒绝而不是有损替换，
/// 由调用方转换为 EncodingError。

/// 源文件声明的编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Windows1252,
}

impl SourceEncoding {
    /// 编码标签（用于错误信息）
    pub fn label(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Windows1252 => "windows-1252",
        }
    }

    /// 解码原始字节
    ///
    /// windows-1252 对所有 256 个字节值都有映射，解码永不失败且可逆；
    /// utf-8 输入中的非法序列按替换字符处理（与提取侧的容错策略一致）。
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            SourceEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            SourceEncoding::Windows1252 => {
                let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                decoded.into_owned()
            }
        }
    }

    /// 编码文本，无法表示的字符导致 None（严格模式，绝不静默替换）
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            SourceEncoding::Utf8 => Some(text.as_bytes().to_vec()),
            SourceEncoding::Windows1252 => {
                let (encoded, _, had_errors) = encoding_rs::WINDOWS_1252.encode(text);
                if had_errors {
                    None
                } else {
                    Some(encoded.into_owned())
                }
            }
        }
    }
}
