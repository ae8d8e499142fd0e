use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;

/// 向量集合名称
pub const COLLECTION_NAME: &str = "photo_descriptions";
/// 上传图片保存目录名
pub const UPLOAD_DIR: &str = "uploaded_images";
/// 向量数据库目录名
pub const VECTOR_DIR: &str = "vector_data";
/// 默认返回的搜索结果数量
pub const DEFAULT_SEARCH_LIMIT: usize = 4;

static DATA_DIR: LazyLock<String> = LazyLock::new(|| match ProjectDirs::from("", "", "picfind") {
    Some(dirs) => dirs.data_dir().to_string_lossy().into_owned(),
    None => String::from("."),
});

fn default_data_dir() -> &'static str {
    DATA_DIR.as_str()
}

#[derive(Parser, Debug, Clone)]
#[command(name = "picfind", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// 数据目录，保存上传的图片与向量数据库
    #[arg(short, long, global = true, default_value = default_data_dir())]
    pub data_dir: DataDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 为图片生成描述并写入向量库
    Add(AddCommand),
    /// 按文本描述搜索图片
    Search(SearchCommand),
    /// 启动 HTTP 服务
    Server(ServerCommand),
    /// 清空并重建向量集合
    Reset(ResetCommand),
    /// 显示向量集合信息
    Info(InfoCommand),
}

/// OpenAI 接口相关参数
#[derive(Parser, Debug, Clone)]
pub struct OpenAiOptions {
    /// OpenAI API 密钥
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,
    /// OpenAI 兼容接口地址
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub base_url: String,
    /// 单次请求超时时间，单位为秒
    #[arg(long, value_name = "SECS", default_value_t = 120)]
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct DataDir {
    path: PathBuf,
}

impl DataDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// 返回上传图片目录
    pub fn uploads(&self) -> PathBuf {
        self.path.join(UPLOAD_DIR)
    }

    /// 返回向量数据库目录
    pub fn vectors(&self) -> PathBuf {
        self.path.join(VECTOR_DIR)
    }
}

impl FromStr for DataDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}
