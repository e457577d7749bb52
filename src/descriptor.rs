use crate::encoding::SourceEncoding;
use crate::utils::GameTextError;

/// 文件格式描述符
///
/// 每个受支持的游戏文件对应一个静态描述符，声明文本定位规则与源编码。
/// 新增文件类型只需在 DESCRIPTORS 表中增加一行（必要时补充一个定位规则变体）。
#[derive(Debug, Clone, Copy)]
pub struct FormatDescriptor {
    /// 文件名（表内唯一）
    pub file_name: &'static str,
    /// 文本定位规则
    pub locator: TextLocator,
    /// 源文件编码
    pub encoding: SourceEncoding,
}

/// 文本定位规则（按格式族分派，而不是按文件名的 ad hoc 分支）
#[derive(Debug, Clone, Copy)]
pub enum TextLocator {
    /// 引号之间的文本段，支持转义（`\"` 与 `\\`），引号外的字节一律是结构
    QuoteDelimited { quote: u8, escape: u8 },
    /// 每行 `key<sep>value` 记录，首个分隔符之后到行尾为可翻译字段
    KeyValue { separator: u8 },
    /// 定长记录中的定宽文本字段，尾部以 pad 字节填充
    FixedWidth {
        record_len: usize,
        field_offset: usize,
        field_width: usize,
        pad: u8,
    },
    /// 分节文本块：节头一行 + `Lines=<n>` 一行 + 恰好 n 行正文
    Section { header: SectionHeader },
}

/// 分节格式的节头规则
#[derive(Debug, Clone, Copy)]
pub struct SectionHeader {
    /// 节头前缀，如 `+Item`、`+Desc=`
    pub prefix: &'static str,
    /// true：前缀后要求十进制编号；false：前缀后为字母数字名称
    pub numbered: bool,
}

/// 受支持的游戏文件清单（与 DESCRIPTORS 一一对应）
pub const SUPPORTED_FILES: &[&str] = &[
    "text.dat",
    "systemdata.dat",
    "itemdata.dat",
    "optionsdata.dat",
    "techdata.dat",
    "traintext.sw",
];

/// 静态描述符表，六个条目，运行期不可变
///
/// 定位规则是本工具对上游未文档化格式的明确约定，见 DESIGN.md。
const DESCRIPTORS: &[FormatDescriptor] = &[
    FormatDescriptor {
        file_name: "text.dat",
        locator: TextLocator::QuoteDelimited {
            quote: b'"',
            escape: b'\\',
        },
        encoding: SourceEncoding::Windows1252,
    },
    FormatDescriptor {
        file_name: "systemdata.dat",
        locator: TextLocator::KeyValue { separator: b'=' },
        encoding: SourceEncoding::Windows1252,
    },
    FormatDescriptor {
        file_name: "itemdata.dat",
        locator: TextLocator::Section {
            header: SectionHeader {
                prefix: "+Item",
                numbered: true,
            },
        },
        encoding: SourceEncoding::Windows1252,
    },
    FormatDescriptor {
        file_name: "optionsdata.dat",
        locator: TextLocator::Section {
            header: SectionHeader {
                prefix: "+Desc=",
                numbered: true,
            },
        },
        encoding: SourceEncoding::Windows1252,
    },
    FormatDescriptor {
        file_name: "techdata.dat",
        locator: TextLocator::Section {
            header: SectionHeader {
                prefix: "+",
                numbered: false,
            },
        },
        encoding: SourceEncoding::Windows1252,
    },
    FormatDescriptor {
        file_name: "traintext.sw",
        locator: TextLocator::FixedWidth {
            record_len: 96,
            field_offset: 16,
            field_width: 80,
            pad: b' ',
        },
        encoding: SourceEncoding::Windows1252,
    },
];

/// 按文件名查找描述符
pub fn descriptor_for(file_name: &str) -> Result<&'static FormatDescriptor, GameTextError> {
    DESCRIPTORS
        .iter()
        .find(|d| d.file_name == file_name)
        .ok_or_else(|| GameTextError::UnsupportedFile(file_name.to_string()))
}
