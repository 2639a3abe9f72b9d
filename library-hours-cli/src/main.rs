mod cache;
mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "library-hours")]
#[command(about = "图书馆开放时间查询工具")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 启用详细日志
    #[arg(short, long)]
    verbose: bool,
}

/// 数据源参数
#[derive(Args, Clone)]
pub struct SourceArgs {
    /// 表格JSON文件路径或 http(s) 地址
    #[arg(short, long)]
    pub data: String,

    /// 远程表格的缓存时间（秒）
    #[arg(long, default_value = "600")]
    pub cache_ttl: u64,

    /// 跳过本地缓存
    #[arg(long)]
    pub no_cache: bool,

    /// 丢弃已缓存的表格并重新下载
    #[arg(long, conflicts_with = "no_cache")]
    pub refresh: bool,

    /// 以JSON格式输出
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 查询某一周每个馆每天的开放时间
    Week {
        #[command(flatten)]
        source: SourceArgs,

        /// 日期（YYYY-MM-DD 或 M/D/YYYY），默认今天
        #[arg(short = 'D', long)]
        date: Option<String>,
    },

    /// 查询某一周的压缩视图（相邻相同时间合并）
    Compact {
        #[command(flatten)]
        source: SourceArgs,

        /// 日期（YYYY-MM-DD 或 M/D/YYYY），默认今天
        #[arg(short = 'D', long)]
        date: Option<String>,
    },

    /// 只看学期常规时间（不含节假日）的压缩视图
    Normal {
        #[command(flatten)]
        source: SourceArgs,

        /// 日期（YYYY-MM-DD 或 M/D/YYYY），默认今天
        #[arg(short = 'D', long)]
        date: Option<String>,
    },

    /// 查询单个馆某一天的开放时间
    Day {
        #[command(flatten)]
        source: SourceArgs,

        /// 馆名
        #[arg(short, long)]
        location: String,

        /// 日期（YYYY-MM-DD 或 M/D/YYYY），默认今天
        #[arg(short = 'D', long)]
        date: Option<String>,
    },

    /// 列出闭馆与特殊开放时间区间
    Calendar {
        #[command(flatten)]
        source: SourceArgs,

        /// 只显示该馆
        #[arg(short, long)]
        location: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 设置日志级别
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("library_hours_cli={0},library_hours_core={0}", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Week { source, date } => commands::week_command(source, date).await,
        Commands::Compact { source, date } => commands::compact_command(source, date).await,
        Commands::Normal { source, date } => commands::normal_command(source, date).await,
        Commands::Day {
            source,
            location,
            date,
        } => commands::day_command(source, location, date).await,
        Commands::Calendar { source, location } => {
            commands::calendar_command(source, location).await
        }
    }
}
