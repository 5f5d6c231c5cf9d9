//! Chit Chat 命令行客户端
//!
//! 非交互式 CLI：每次运行是一个会话，执行一个操作后退出。
//! 没有提供 API key 时自动使用离线演示板。

use anyhow::Result;
use async_trait::async_trait;
use chitchat_sdk_rust::chat::feed::listener::{DisplayedMessage, FeedListener};
use chitchat_sdk_rust::chat::feed::reconcile::PostOutcome;
use chitchat_sdk_rust::chat::geo::locator::{FixedPosition, NoPosition, PositionProvider};
use chitchat_sdk_rust::{ChatError, ChitChatClient, ClientConfig, Coordinate, MessageId, Rating};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

/// Chit Chat 命令行客户端
#[derive(Parser, Debug)]
#[command(name = "chitchat-cli")]
#[command(about = "Chit Chat 命令行客户端 - 浏览、发帖、投票", long_about = None)]
struct Args {
    /// API 基础地址
    #[arg(long, default_value = "https://www.stepoutnyc.com/chitchat")]
    base_url: String,

    /// API key，为空时使用演示模式
    #[arg(short, long, default_value = "")]
    key: String,

    /// 客户端标签
    #[arg(short, long, default_value = "chitchat-cli")]
    client: String,

    /// 本地投票记录数据库
    #[arg(long, default_value = "sqlite://chitchat.db?mode=rwc")]
    db: String,

    /// 设备纬度
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// 设备经度
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// 强制使用离线演示板
    #[arg(long)]
    demo: bool,

    /// 日志级别（默认: warn,chitchat_sdk_rust=info）
    #[arg(long, default_value = "warn,chitchat_sdk_rust=info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 查看留言流
    Feed {
        /// 加载的页数
        #[arg(short, long, default_value = "1")]
        pages: usize,
    },
    /// 发一条留言
    Post { text: String },
    /// 点赞
    Like { id: String },
    /// 点踩
    Dislike { id: String },
    /// 列出本设备的投票记录
    Votes,
}

/// 初始化日志（同时输出到 stderr 和文件）
fn init_logger(log_level: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG，否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("chitchat.log")?;

    // stdout 留给留言内容
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// 把留言流渲染到终端
struct TerminalListener;

fn rating_mark(rating: Rating) -> &'static str {
    match rating {
        Rating::Unset => "  ",
        Rating::Liked => "👍",
        Rating::Disliked => "👎",
    }
}

fn render(item: &DisplayedMessage) {
    let m = &item.message;
    println!(
        "{} [{}] {} · {}{}",
        rating_mark(item.rating),
        m.id,
        m.client,
        m.date,
        if item.distance.is_empty() {
            String::new()
        } else {
            format!(" · {}", item.distance)
        }
    );
    for line in m.message.lines() {
        println!("     {}", line);
    }
    println!("     +{} / -{}", m.likes, m.dislikes);
}

#[async_trait]
impl FeedListener for TerminalListener {
    async fn on_feed_cleared(&self) {}

    async fn on_message_appended(&self, item: DisplayedMessage) {
        render(&item);
    }

    async fn on_message_prepended(&self, item: DisplayedMessage) {
        println!("✅ 已发布:");
        render(&item);
    }

    async fn on_rating_changed(
        &self,
        message_id: MessageId,
        rating: Rating,
        likes: u64,
        dislikes: u64,
    ) {
        println!(
            "{} [{}] +{} / -{}",
            rating_mark(rating),
            message_id,
            likes,
            dislikes
        );
    }

    async fn on_input_cleared(&self) {}

    async fn on_post_finished(&self, outcome: PostOutcome) {
        match outcome {
            PostOutcome::Confirmed(_) => {}
            PostOutcome::Rejected { code, message } => {
                println!("❌ 服务器拒绝了这条留言 (code={}): {}", code, message)
            }
            PostOutcome::Unknown { attempts } => {
                println!("⚠️ 拉取 {} 次仍未看到这条留言，发布结果未知", attempts)
            }
        }
    }

    async fn on_error(&self, error: ChatError) {
        eprintln!("❌ {}", error);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level)?;

    let mut config = ClientConfig::new(args.key.clone(), args.client.clone());
    config.api_base_url = args.base_url.clone();
    config.rating_db_url = args.db.clone();
    config.demo = args.demo;
    if !config.demo && config.api_key.is_empty() {
        warn!("[CLI] 未提供 API key，改用离线演示板");
        config.demo = true;
    }

    let position: Arc<dyn PositionProvider> = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Arc::new(FixedPosition(Coordinate::new(lat, lon))),
        _ => Arc::new(NoPosition),
    };

    let client = ChitChatClient::connect(config, position, Arc::new(TerminalListener)).await?;
    let view = client.view();
    info!("[CLI] 🚀 执行 {:?}", args.command);

    match args.command {
        Command::Feed { pages } => {
            view.refresh().await?;
            for _ in 1..pages {
                if view.load_more().await? == 0 {
                    break;
                }
            }
            info!("[CLI] 共展示 {} 条留言", view.displayed_count().await);
        }
        Command::Post { text } => match view.post(&text).await {
            PostOutcome::Confirmed(_) => {}
            PostOutcome::Rejected { code, message } => {
                anyhow::bail!("发帖被拒绝 (code={}): {}", code, message)
            }
            PostOutcome::Unknown { attempts } => {
                anyhow::bail!("发帖结果未知（已拉取 {} 次）", attempts)
            }
        },
        Command::Like { id } => rate(&client, id, "like").await?,
        Command::Dislike { id } => rate(&client, id, "dislike").await?,
        Command::Votes => {
            for (id, rating) in client.ratings().all_ratings().await? {
                println!("{} {}", rating_mark(rating), id);
            }
        }
    }

    Ok(())
}

/// 先加载第一页，让计数能在界面上更新，再投票
async fn rate(client: &ChitChatClient, id: String, direction: &str) -> Result<()> {
    let view = client.view();
    view.refresh().await?;
    let id = MessageId::new(id);
    if !view.rate(&id, direction).await? {
        println!("已经对 [{}] 投过票了", id);
    }
    Ok(())
}
