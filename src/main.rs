use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use batch_localizer::config::{Cli, LocalizerConfig};
use batch_localizer::engine::{LocalizeParams, Localizer};
use batch_localizer::orchestrator::LocalizeProgress;
use batch_localizer::utils::{
    format_duration, generate_output_path, init_logging, validate_input_file,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    // 验证输入文件
    validate_input_file(&cli.input)?;

    // 生成输出文件路径
    let output_path = generate_output_path(&cli.input, &cli.output, &cli.target);

    if !cli.quiet {
        info!("🚀 启动HTML批量本地化");
        info!("📂 输入文件: {}", cli.input.display());
        info!("📄 输出文件: {}", output_path.display());
        info!(
            "🌐 语言: {} -> {}",
            cli.source.as_deref().unwrap_or("自动检测"),
            cli.target
        );
    }

    let total_start = Instant::now();

    match localize_file(&cli, &output_path).await {
        Ok(entry_count) => {
            let total_duration = total_start.elapsed();
            if !cli.quiet {
                info!(
                    "✅ 本地化完成！{} 个条目，总耗时: {}",
                    entry_count,
                    format_duration(total_duration)
                );
            }
        }
        Err(e) => {
            error!("❌ 本地化失败: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// 本地化文件核心函数
async fn localize_file(cli: &Cli, output_path: &std::path::PathBuf) -> Result<usize> {
    // 创建引擎配置
    let config = LocalizerConfig::new(&cli.api_key)
        .with_api_url(&cli.api)
        .with_batch_size(cli.batch_size)
        .with_ideal_batch_item_size(cli.ideal_batch_item_size);

    let localizer = Localizer::new(config).context("创建本地化引擎失败")?;

    // 读取文件
    let html_content = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("读取文件失败: {}", cli.input.display()))?;

    if cli.verbose {
        info!("📏 文件大小: {} 字节", html_content.len());
    }

    // 构造调用参数
    let mut params = LocalizeParams::new(&cli.target).with_fast(cli.fast);
    if let Some(source) = &cli.source {
        params = params.with_source_locale(source);
    }

    // 执行本地化，报告分块进度
    let mut entry_count = 0usize;
    let quiet = cli.quiet;
    let mut on_progress = |progress: LocalizeProgress| {
        entry_count += progress.translated.len();
        if !quiet {
            info!("📊 进度: {}%", progress.percent);
        }
    };

    let translated_content = localizer
        .localize_html(&html_content, &params, Some(&mut on_progress), None)
        .await
        .context("HTML本地化失败")?;

    // 写入文件
    std::fs::write(output_path, &translated_content)
        .with_context(|| format!("写入文件失败: {}", output_path.display()))?;

    Ok(entry_count)
}
