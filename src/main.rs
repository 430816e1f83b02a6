//! JanSathi 命令行入口
//!
//! 用法:
//!   jansathi scan <图片>          药品扫描
//!   jansathi prescription <图片>  处方识别
//!   jansathi form <图片>          拍照填表
//!   jansathi chat                 对话（逐行读取标准输入，/quit 退出）
//!
//! 加 `--mock` 使用本地 Mock 网关，无需网络。

use std::sync::Arc;

use anyhow::{bail, Context};
use jansathi::config::load_config_or_default;
use jansathi::core::{notice, Notice, NoticeLevel, ViewState};
use jansathi::gateway::{ActionGateway, HttpGateway, MockGateway};
use jansathi::media::ImageSource;
use jansathi::orchestrator::{
    ChatOrchestrator, ImageActionOrchestrator, ImageFeature, MedicineScanner, PhotoToForm,
    PrescriptionReader, SubmitOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

const USAGE: &str = "usage: jansathi [--mock] <scan|prescription|form> <image> | jansathi [--mock] chat";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 默认只输出警告，避免干扰结果
    jansathi::observability::init_with_default("warn");

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mock = match args.iter().position(|a| a == "--mock") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };

    let config = load_config_or_default(None);
    let gateway: Arc<dyn ActionGateway> = if mock {
        Arc::new(MockGateway::new())
    } else {
        Arc::new(HttpGateway::from_config(&config.gateway))
    };
    let notices = notice::init();
    let mut rx = notices.subscribe();

    let result = match args.first().map(String::as_str) {
        Some("scan") => run_image(MedicineScanner::new(gateway, notices), args.get(1)).await,
        Some("prescription") => {
            run_image(PrescriptionReader::new(gateway, notices), args.get(1)).await
        }
        Some("form") => run_image(PhotoToForm::new(gateway, notices), args.get(1)).await,
        Some("chat") => {
            let chat = ChatOrchestrator::new(gateway, notices).with_greeting(&config.chat.greeting);
            run_chat(chat, &mut rx).await
        }
        _ => {
            eprintln!("{}", USAGE);
            return Ok(());
        }
    };

    print_notices(&mut rx);
    result
}

async fn run_image<F: ImageFeature>(
    orchestrator: ImageActionOrchestrator<F>,
    path: Option<&String>,
) -> anyhow::Result<()> {
    let path = path.context(USAGE)?;
    let source = ImageSource::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;

    orchestrator.submit_source(source).await;
    match orchestrator.view().state {
        ViewState::Success(text) => println!("{}", text),
        ViewState::Error(message) => bail!("{}", message),
        _ => {}
    }
    Ok(())
}

async fn run_chat(chat: ChatOrchestrator, rx: &mut broadcast::Receiver<Notice>) -> anyhow::Result<()> {
    if let Some(greeting) = chat.transcript().last() {
        println!("assistant> {}", greeting.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim() == "/quit" {
            break;
        }
        if chat.submit(&line).await == SubmitOutcome::Succeeded {
            if let Some(turn) = chat.transcript().last() {
                println!("assistant> {}", turn.content);
            }
        }
        print_notices(rx);
    }

    chat.unmount();
    Ok(())
}

fn print_notices(rx: &mut broadcast::Receiver<Notice>) {
    while let Ok(n) = rx.try_recv() {
        let tag = match n.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{}] {}", tag, n.message);
    }
}
