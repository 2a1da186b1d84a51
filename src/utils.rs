//! 实用工具模块
//!
//! 提供日志初始化、输出路径生成等CLI支撑功能

// 标准库导入
use std::path::PathBuf;

// 第三方crate导入
use anyhow::Result;
use tracing::warn;

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 验证输入文件
pub fn validate_input_file(path: &PathBuf) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("输入文件不存在: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("输入路径不是文件: {}", path.display());
    }

    if let Some(ext) = path.extension() {
        if ext != "html" && ext != "htm" {
            warn!("⚠️  文件扩展名不是HTML: {}", ext.to_string_lossy());
        }
    }

    Ok(())
}

/// 生成输出文件路径
pub fn generate_output_path(input: &PathBuf, output: &Option<PathBuf>, lang: &str) -> PathBuf {
    if let Some(output_path) = output {
        return output_path.clone();
    }

    // 自动生成输出路径: input_es.html
    let stem = input.file_stem().unwrap_or_default();
    let extension = input.extension().unwrap_or_default();

    let output_name = format!(
        "{}_{}.{}",
        stem.to_string_lossy(),
        lang,
        extension.to_string_lossy()
    );

    if let Some(parent) = input.parent() {
        parent.join(output_name)
    } else {
        PathBuf::from(output_name)
    }
}

/// 格式化持续时间
pub fn format_duration(duration: std::time::Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_appends_lang() {
        let input = PathBuf::from("/tmp/page.html");
        let output = generate_output_path(&input, &None, "es");
        assert_eq!(output, PathBuf::from("/tmp/page_es.html"));
    }

    #[test]
    fn test_explicit_output_path_wins() {
        let input = PathBuf::from("/tmp/page.html");
        let explicit = Some(PathBuf::from("/out/result.html"));
        let output = generate_output_path(&input, &explicit, "es");
        assert_eq!(output, PathBuf::from("/out/result.html"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(std::time::Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(std::time::Duration::from_millis(1500)), "1.500s");
    }
}
