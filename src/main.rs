use anyhow::{bail, Context, Result};
use clap::Parser;
use gametext_extractor::{GoogleProvider, Workspace};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gametext_extractor")]
#[command(about = "提取并应用游戏数据文件的可翻译文本")]
#[command(version)]
struct Cli {
    /// 游戏数据目录
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// 提取模式：提取所有受支持文件的文本到 translation/ 目录
    #[arg(long)]
    extract: bool,

    /// 应用模式：把 side file 中的翻译写回游戏文件
    #[arg(long)]
    apply: bool,

    /// 自动翻译模式：调用在线翻译填充 side file
    #[arg(long)]
    translate: bool,

    /// 源语言代码（自动翻译用）
    #[arg(long, default_value = "en")]
    source_lang: String,

    /// 目标语言代码（自动翻译用）
    #[arg(long, default_value = "es")]
    target_lang: String,
}

/// 菜单/命令行动作
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Extract,
    Apply,
    AutoTranslate {
        source_lang: String,
        target_lang: String,
    },
    Exit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.dir.is_dir() {
        bail!("游戏目录不存在: {:?}", cli.dir);
    }
    let workspace = Workspace::new(&cli.dir);

    let mode_count = [cli.extract, cli.apply, cli.translate]
        .iter()
        .filter(|&&x| x)
        .count();
    if mode_count > 1 {
        bail!("只能选择一种模式：--extract、--apply 或 --translate");
    }

    // 直接模式：执行单个动作后退出
    if cli.extract {
        return dispatch(&workspace, Action::Extract).map(|_| ());
    }
    if cli.apply {
        return dispatch(&workspace, Action::Apply).map(|_| ());
    }
    if cli.translate {
        let action = Action::AutoTranslate {
            source_lang: cli.source_lang.clone(),
            target_lang: cli.target_lang.clone(),
        };
        return dispatch(&workspace, action).map(|_| ());
    }

    // 默认模式：交互式菜单
    run_menu(&workspace)
}

/// 交互式菜单循环
fn run_menu(workspace: &Workspace) -> Result<()> {
    println!("=== 游戏文本翻译助手 ===");
    println!("游戏目录: {:?}", workspace.game_dir());

    loop {
        println!();
        println!("1. 提取文本");
        println!("2. 应用翻译");
        println!("3. 自动翻译");
        println!("4. 退出");

        let choice = read_line("请选择操作 (1-4): ")?;
        let action = match choice.trim() {
            "1" => Action::Extract,
            "2" => Action::Apply,
            "3" => {
                let source_lang = read_line_or("源语言 (默认 en): ", "en")?;
                let target_lang = read_line_or("目标语言 (默认 es): ", "es")?;
                Action::AutoTranslate {
                    source_lang,
                    target_lang,
                }
            }
            "4" => Action::Exit,
            _ => {
                println!("无效选项，请输入 1-4");
                continue;
            }
        };

        if !dispatch(workspace, action)? {
            break;
        }
    }

    Ok(())
}

/// 命令分发器：对指定工作区执行一个动作
///
/// 返回 false 表示应退出循环。单个文件的错误在工作区内部逐文件报告，
/// 不会中断整个批次。
fn dispatch(workspace: &Workspace, action: Action) -> Result<bool> {
    match action {
        Action::Extract => {
            let processed = workspace.extract_all();
            println!("提取完成，共处理 {} 个文件", processed);
            if processed > 0 {
                println!("side file 已写入 translation/ 目录，可手工编辑或使用自动翻译");
            }
        }
        Action::Apply => {
            let processed = workspace.apply_all();
            println!("应用完成，共处理 {} 个文件", processed);
            if processed > 0 {
                println!("原文件已备份为 .bak");
            }
        }
        Action::AutoTranslate {
            source_lang,
            target_lang,
        } => {
            let provider =
                GoogleProvider::new(source_lang).context("初始化翻译提供方失败")?;
            let processed = workspace.auto_translate_all(&provider, &target_lang);
            println!("自动翻译完成，共处理 {} 个文件", processed);
            if processed > 0 {
                println!("注意：机器翻译结果建议人工校对后再应用");
            }
        }
        Action::Exit => {
            println!("再见!");
            return Ok(false);
        }
    }

    Ok(true)
}

/// 读取一行用户输入
fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    let mut buffer = String::new();
    std::io::stdin()
        .read_line(&mut buffer)
        .context("读取标准输入失败")?;
    Ok(buffer.trim().to_string())
}

/// 读取一行输入，空输入使用默认值
fn read_line_or(prompt: &str, default: &str) -> Result<String> {
    let input = read_line(prompt)?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}
