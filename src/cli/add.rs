use std::path::{Path, PathBuf};

use anyhow::anyhow;
use clap::Parser;
use indicatif::ProgressBar;
use regex::Regex;
use walkdir::WalkDir;

use crate::cli::{SubCommandExtend, open_pipeline};
use crate::config::{OpenAiOptions, Opts};
use crate::describe::SUPPORTED_MODELS;
use crate::pipeline::IndexOutcome;
use crate::utils::pb_style;

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    #[command(flatten)]
    pub openai: OpenAiOptions,
    /// 图片路径，可以是单个文件或目录
    pub path: PathBuf,
    /// 生成描述使用的模型
    #[arg(short, long, default_value = "gpt-4o-mini", value_parser = clap::builder::PossibleValuesParser::new(SUPPORTED_MODELS))]
    pub model: String,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png,webp")]
    pub suffix: String,
    /// 描述生成失败时仍把错误信息写入向量库
    #[arg(long)]
    pub index_failures: bool,
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let re_suf = format!("(?i)^({})$", self.suffix.replace(',', "|"));
        let re_suf = Regex::new(&re_suf)?;

        let files = scan_images(&self.path, &re_suf);
        if files.is_empty() {
            return Err(anyhow!("{} 中没有找到图片", self.path.display()));
        }

        let pipeline = open_pipeline(&opts.data_dir, &self.openai, self.index_failures)?;
        let pb = ProgressBar::new(files.len() as u64).with_style(pb_style());

        // NOTE: 逐张处理，第一个非生成阶段的错误会中断剩余图片
        for file in files {
            let file_name = file.file_name().map(|s| s.to_string_lossy().into_owned());
            let file_name = file_name.ok_or_else(|| anyhow!("无效的文件名: {}", file.display()))?;
            pb.set_message(file_name.clone());

            let data = tokio::fs::read(&file).await?;
            let report = pipeline.index_upload(&file_name, &data, &self.model).await?;
            match report.outcome {
                IndexOutcome::Indexed { description, .. } => {
                    pb.suspend(|| println!("[OK] {}\n{}\n", report.path, description))
                }
                IndexOutcome::Skipped { error } => {
                    pb.suspend(|| println!("[ERR] {}: {}", file.display(), error))
                }
            }
            pb.inc(1);
        }

        pb.finish_with_message("图片添加完成");
        Ok(())
    }
}

fn scan_images(path: &Path, re_suf: &Regex) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension().map(|s| re_suf.is_match(&s.to_string_lossy())) == Some(true)
        })
        .collect();
    files.sort();
    files
}
