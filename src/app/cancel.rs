use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Exit status used when an interrupt arrives outside the enrichment loop.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Cooperative cancellation for the enrichment loop.
///
/// The batch driver arms the token while enriching and polls it between
/// items. An interrupt that lands while the token is disarmed is not ours to
/// handle and ends the process.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    armed: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Records a user interrupt. Returns `false` when nothing is armed to absorb it.
    /// An interrupt that was already recorded (e.g. seen first through a killed
    /// yt-dlp child) is absorbed even after the token was disarmed.
    pub fn interrupt(&self) -> bool {
        if self.is_armed() {
            self.cancel();
            true
        } else {
            self.is_cancelled()
        }
    }

    /// Spawns the Ctrl-C listener feeding this token.
    pub fn listen_for_ctrl_c(&self) {
        let token = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                if !token.interrupt() {
                    eprintln!("\nInterrupted.");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
                log::info!("Interrupt received; finishing current playlist with partial results");
            }
        });
    }
}
