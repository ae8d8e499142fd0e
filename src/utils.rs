use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indicatif::ProgressStyle;

/// 根据扩展名推断图片的 MIME 类型，未知时按 JPEG 处理
pub fn image_mime(path: &Path) -> &'static str {
    let ext = path.extension().map(|s| s.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

/// 将图片编码为 base64 data URL
pub fn image_data_url(path: &Path, data: &[u8]) -> String {
    format!("data:{};base64,{}", image_mime(path), STANDARD.encode(data))
}

/// 只保留上传文件名的最后一段，防止写出上传目录
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}
