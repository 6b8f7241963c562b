use chrono::Local;
use log::debug;
use std::future::Future;
use tokio::io::{AsyncBufReadExt, BufReader};

// Category of a result notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
    Info,
}

impl NoticeKind {
    fn label(&self) -> &'static str {
        match self {
            NoticeKind::Success => "SUCCESS",
            NoticeKind::Warning => "WARNING",
            NoticeKind::Error => "ERROR",
            NoticeKind::Info => "INFO",
        }
    }
}

// Modal status presentation. Each call supersedes whatever was shown before
pub trait Notifier: Send + Sync {
    // Blocking "please wait" state
    fn show_blocking(&self, title: &str, text: &str);

    // Result notice. Resolves once the user has acknowledged it
    fn show_result(&self, kind: NoticeKind, title: &str, message: &str) -> impl Future<Output = ()> + Send;
}

// Renders notices on the terminal
pub struct TerminalNotifier {

    // Skip waiting for Enter after a result, for unattended kiosks
    auto_acknowledge: bool,
}

impl TerminalNotifier {
    pub fn new(auto_acknowledge: bool) -> Self {
        Self { auto_acknowledge }
    }
}

impl Notifier for TerminalNotifier {
    fn show_blocking(&self, title: &str, text: &str) {
        println!("[{}] {} {}", Local::now().format("%H:%M:%S"), title, text);
    }

    async fn show_result(&self, kind: NoticeKind, title: &str, message: &str) {
        println!("[{}] [{}] {} {}", Local::now().format("%H:%M:%S"), kind.label(), title, message);
        if self.auto_acknowledge {
            return;
        }

        println!("Press Enter to continue...");
        let mut line = String::new();
        if let Err(e) = BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            debug!("Could not read acknowledgement: {}", e);
        }
    }
}
