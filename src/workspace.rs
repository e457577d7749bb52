use crate::apply::apply;
use crate::descriptor::{descriptor_for, SUPPORTED_FILES};
use crate::extract::extract;
use crate::provider::{translate_set, TranslationProvider};
use crate::translation_set::TranslationSet;
use crate::utils::{create_backup, write_replace, GameTextError};
use std::path::{Path, PathBuf};

/// 游戏目录工作区
///
/// 每个文件的提取/应用周期相互独立，工作区本身不持有跨文件的可变状态。
/// side file 统一放在游戏目录下的 `translation/` 子目录，
/// 命名为 `<游戏文件名>.json`。
pub struct Workspace {
    game_dir: PathBuf,
    translation_dir: PathBuf,
}

impl Workspace {
    /// 以游戏数据目录创建工作区
    pub fn new(game_dir: impl Into<PathBuf>) -> Self {
        let game_dir = game_dir.into();
        let translation_dir = game_dir.join("translation");
        Workspace {
            game_dir,
            translation_dir,
        }
    }

    /// 游戏文件路径
    pub fn game_file_path(&self, file_name: &str) -> PathBuf {
        self.game_dir.join(file_name)
    }

    /// side file 路径
    pub fn side_file_path(&self, file_name: &str) -> PathBuf {
        self.translation_dir.join(format!("{}.json", file_name))
    }

    /// 提取单个文件的可翻译文本，写入 side file；返回条目数
    pub fn extract_file(&self, file_name: &str) -> Result<usize, GameTextError> {
        let descriptor = descriptor_for(file_name)?;
        let raw = std::fs::read(self.game_file_path(file_name))?;

        let entries = extract(&raw, descriptor)?;
        let set = TranslationSet::from_entries(file_name, entries);

        std::fs::create_dir_all(&self.translation_dir)?;
        set.save(&self.side_file_path(file_name))?;

        Ok(set.entries.len())
    }

    /// 把 side file 中的翻译写回游戏文件；返回实际改动的条目数
    ///
    /// 新内容先在内存中整体构建并通过全部校验，然后才创建备份、
    /// 原子替换目标文件——途中任何失败都不会触碰原文件。
    pub fn apply_file(&self, file_name: &str) -> Result<usize, GameTextError> {
        let descriptor = descriptor_for(file_name)?;
        let game_path = self.game_file_path(file_name);
        let raw = std::fs::read(&game_path)?;
        let set = TranslationSet::load(file_name, &self.side_file_path(file_name))?;

        let new_bytes = apply(&raw, descriptor, &set)?;
        let changed = set.entries.iter().filter(|e| !e.is_untranslated()).count();

        create_backup(&game_path)?;
        write_replace(&game_path, &new_bytes)?;

        Ok(changed)
    }

    /// 自动翻译单个文件的 side file；返回（成功数, 失败数）
    pub fn auto_translate_file(
        &self,
        file_name: &str,
        provider: &dyn TranslationProvider,
        target_lang: &str,
    ) -> Result<(usize, usize), GameTextError> {
        let side_path = self.side_file_path(file_name);
        let mut set = TranslationSet::load(file_name, &side_path)?;

        let (succeeded, failed) = translate_set(&mut set, provider, target_lang);
        set.save(&side_path)?;

        Ok((succeeded, failed))
    }

    /// 提取所有存在的受支持文件
    ///
    /// 单个文件的错误只影响该文件：报告后继续处理下一个。
    /// 返回成功处理的文件数。
    pub fn extract_all(&self) -> usize {
        self.for_each_supported(
            |file_name| self.game_file_path(file_name).exists(),
            |file_name| {
                let count = self.extract_file(file_name)?;
                println!("✓ 从 {} 提取了 {} 个条目", file_name, count);
                Ok(())
            },
        )
    }

    /// 应用所有已有 side file 的受支持文件
    pub fn apply_all(&self) -> usize {
        self.for_each_supported(
            |file_name| self.side_file_path(file_name).exists(),
            |file_name| {
                let changed = self.apply_file(file_name)?;
                println!("✓ 已应用 {} 个翻译到 {}", changed, file_name);
                Ok(())
            },
        )
    }

    /// 自动翻译所有已有 side file 的受支持文件
    pub fn auto_translate_all(
        &self,
        provider: &dyn TranslationProvider,
        target_lang: &str,
    ) -> usize {
        self.for_each_supported(
            |file_name| self.side_file_path(file_name).exists(),
            |file_name| {
                let (succeeded, failed) =
                    self.auto_translate_file(file_name, provider, target_lang)?;
                println!(
                    "✓ {} 自动翻译完成: {} 成功, {} 失败",
                    file_name, succeeded, failed
                );
                Ok(())
            },
        )
    }

    /// 对每个满足条件的受支持文件执行操作，错误逐文件报告、不中断批次
    fn for_each_supported(
        &self,
        ready: impl Fn(&str) -> bool,
        mut op: impl FnMut(&str) -> Result<(), GameTextError>,
    ) -> usize {
        let mut processed = 0;
        for file_name in SUPPORTED_FILES {
            if !ready(file_name) {
                println!("跳过 {} (没有可处理的输入)", file_name);
                continue;
            }
            match op(file_name) {
                Ok(()) => processed += 1,
                Err(e) => eprintln!("错误: {}: {}", file_name, e),
            }
        }
        processed
    }

    /// 游戏目录
    pub fn game_dir(&self) -> &Path {
        &self.game_dir
    }
}
