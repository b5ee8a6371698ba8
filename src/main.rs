use anyhow::Result;
use apple_health_parser::config::{Cli, Config};
use apple_health_parser::health::HealthDataType;
use apple_health_parser::pipeline;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    if cli.init_config {
        let path = Config::init_config_file(&cli)?;
        println!("已生成默认配置: {}", path.display());
        return Ok(());
    }

    // 加载配置
    let config = Config::load_with_cli(&cli)?;

    // 初始化日志系统，guard 需存活到退出
    let _log_guard = config.init_logging()?;

    if cli.list_types {
        list_types();
        return Ok(());
    }

    match pipeline::run(&cli, &config).await {
        Ok(summary) => {
            for (record_type, count) in &summary.counts {
                tracing::debug!("{}: {} records", record_type, count);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Error processing Apple Health data: {}", e);
            Err(e.into())
        }
    }
}

fn list_types() {
    println!("支持的类型:");
    for ty in HealthDataType::ALL {
        println!("  {:<32} {}", ty.friendly_name(), ty.as_str());
    }
}
